//! Mastery Classifier
//!
//! Folds the per-skill levels of an item into one coarse grade. The weakest
//! required dimension decides: recognizing a word without being able to
//! produce it is not mastery.

use crate::types::{ItemType, MasteryLevel, ProgressRecord, SkillDimension, SkillLevels};

pub fn grade_for_level(level: u8) -> MasteryLevel {
    match level {
        0 => MasteryLevel::New,
        1 => MasteryLevel::Learning,
        2 => MasteryLevel::Familiar,
        3 | 4 => MasteryLevel::Proficient,
        _ => MasteryLevel::Mastered,
    }
}

/// Required dimension with the lowest level (first in declaration order on ties).
pub fn weakest_dimension(item_type: ItemType, levels: &SkillLevels) -> (SkillDimension, u8) {
    let required = item_type.required_dimensions();
    let mut weakest = (required[0], levels.get(required[0]));
    for &dimension in &required[1..] {
        let level = levels.get(dimension);
        if level < weakest.1 {
            weakest = (dimension, level);
        }
    }
    weakest
}

pub fn classify_levels(item_type: ItemType, levels: &SkillLevels) -> MasteryLevel {
    grade_for_level(weakest_dimension(item_type, levels).1)
}

pub fn classify_mastery(record: &ProgressRecord) -> MasteryLevel {
    classify_levels(record.item_type, &record.skill_levels)
}
