//! Common Types and Constants
//!
//! Progress records, review outcomes and the closed enumerations shared by
//! every scheduler module.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SrsError;

// ==================== Constants ====================

/// Highest level a single skill dimension can reach
pub const MAX_SKILL_LEVEL: u8 = 5;

/// Upper bound of the UI-facing memory strength score
pub const MAX_MEMORY_STRENGTH: u8 = 100;

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;
pub const DEFAULT_PRIORITY: u8 = 3;

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Tolerance used when comparing ease factors against their bounds
pub const EPSILON: f64 = 1e-9;

// ==================== Item Types ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Vocabulary,
    Kanji,
    Grammar,
    TechnicalTerm,
}

impl ItemType {
    pub const ALL: [ItemType; 4] = [
        ItemType::Vocabulary,
        ItemType::Kanji,
        ItemType::Grammar,
        ItemType::TechnicalTerm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Kanji => "kanji",
            Self::Grammar => "grammar",
            Self::TechnicalTerm => "technical_term",
        }
    }

    /// Dimensions that must all be strong before an item counts as mastered.
    pub fn required_dimensions(&self) -> &'static [SkillDimension] {
        use SkillDimension::*;
        match self {
            Self::Vocabulary => &[Recognition, Production, Listening, Speaking],
            Self::Kanji => &[Recognition, Production, Reading, Writing],
            Self::Grammar => &[Recognition, Production, Understanding, Usage],
            Self::TechnicalTerm => &[Recognition, Production],
        }
    }

    /// Dimensions that are tracked but never hold back mastery.
    pub fn optional_dimensions(&self) -> &'static [SkillDimension] {
        use SkillDimension::*;
        match self {
            Self::Vocabulary => &[Writing],
            Self::Kanji => &[Meaning, Compound],
            Self::Grammar => &[Contextual],
            Self::TechnicalTerm => &[],
        }
    }

    pub fn supports(&self, dimension: SkillDimension) -> bool {
        self.required_dimensions().contains(&dimension)
            || self.optional_dimensions().contains(&dimension)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "vocabulary" | "vocab" | "word" => Ok(Self::Vocabulary),
            "kanji" => Ok(Self::Kanji),
            "grammar" => Ok(Self::Grammar),
            "technicalterm" | "term" => Ok(Self::TechnicalTerm),
            _ => Err(SrsError::Validation(format!("unknown item type: {s}"))),
        }
    }
}

// ==================== Skill Dimensions ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillDimension {
    Recognition,
    Production,
    Listening,
    Speaking,
    Reading,
    Writing,
    Meaning,
    Compound,
    Understanding,
    Usage,
    Contextual,
}

impl SkillDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recognition => "recognition",
            Self::Production => "production",
            Self::Listening => "listening",
            Self::Speaking => "speaking",
            Self::Reading => "reading",
            Self::Writing => "writing",
            Self::Meaning => "meaning",
            Self::Compound => "compound",
            Self::Understanding => "understanding",
            Self::Usage => "usage",
            Self::Contextual => "contextual",
        }
    }

    /// Active recall (producing the answer) rather than recognizing it.
    pub fn is_productive(&self) -> bool {
        matches!(
            self,
            Self::Production | Self::Speaking | Self::Writing | Self::Usage
        )
    }
}

impl fmt::Display for SkillDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillDimension {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_name(s).as_str() {
            "recognition" => Ok(Self::Recognition),
            "production" => Ok(Self::Production),
            "listening" => Ok(Self::Listening),
            "speaking" => Ok(Self::Speaking),
            "reading" => Ok(Self::Reading),
            "writing" => Ok(Self::Writing),
            "meaning" => Ok(Self::Meaning),
            "compound" => Ok(Self::Compound),
            "understanding" => Ok(Self::Understanding),
            "usage" => Ok(Self::Usage),
            "contextual" => Ok(Self::Contextual),
            _ => Err(SrsError::Validation(format!("unknown skill dimension: {s}"))),
        }
    }
}

fn normalize_name(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

// ==================== Mastery ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    #[default]
    New,
    Learning,
    Familiar,
    Proficient,
    Mastered,
}

impl MasteryLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Familiar => "familiar",
            Self::Proficient => "proficient",
            Self::Mastered => "mastered",
        }
    }
}

// ==================== Skill Levels ====================

/// Per-dimension levels (0..=5) kept inside a single progress record.
/// Dimensions that were never exercised read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillLevels(BTreeMap<SkillDimension, u8>);

impl SkillLevels {
    pub fn get(&self, dimension: SkillDimension) -> u8 {
        self.0.get(&dimension).copied().unwrap_or(0)
    }

    pub fn set(&mut self, dimension: SkillDimension, level: u8) {
        self.0.insert(dimension, level.min(MAX_SKILL_LEVEL));
    }

    pub fn raise(&mut self, dimension: SkillDimension) {
        let level = self.get(dimension).saturating_add(1);
        self.set(dimension, level);
    }

    pub fn lower(&mut self, dimension: SkillDimension) {
        let level = self.get(dimension).saturating_sub(1);
        self.set(dimension, level);
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkillDimension, u8)> + '_ {
        self.0.iter().map(|(d, l)| (*d, *l))
    }
}

impl FromIterator<(SkillDimension, u8)> for SkillLevels {
    fn from_iter<I: IntoIterator<Item = (SkillDimension, u8)>>(iter: I) -> Self {
        let mut levels = Self::default();
        for (dimension, level) in iter {
            levels.set(dimension, level);
        }
        levels
    }
}

// ==================== Progress Record ====================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressKey {
    pub learner_id: String,
    pub item_id: String,
    pub item_type: ItemType,
}

impl ProgressKey {
    pub fn new(
        learner_id: impl Into<String>,
        item_id: impl Into<String>,
        item_type: ItemType,
    ) -> Self {
        Self {
            learner_id: learner_id.into(),
            item_id: item_id.into(),
            item_type,
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.learner_id, self.item_type, self.item_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub learner_id: String,
    pub item_id: String,
    pub item_type: ItemType,
    pub memory_strength: u8,
    pub ease_factor: f64,
    pub interval_days: u32,
    pub consecutive_correct: u32,
    pub consecutive_incorrect: u32,
    pub study_count: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_date: Option<DateTime<Utc>>,
    pub skill_levels: SkillLevels,
    pub mastery_level: MasteryLevel,
    pub average_response_time_ms: f64,
    pub best_response_time_ms: Option<u32>,
    pub worst_response_time_ms: Option<u32>,
    pub last_response_time_ms: Option<u32>,
    pub is_bookmarked: bool,
    pub priority: u8,
    pub version: u64,
}

impl ProgressRecord {
    /// Fresh record for an item the learner has just been exposed to.
    pub fn new(key: ProgressKey, initial_ease: f64) -> Self {
        Self {
            learner_id: key.learner_id,
            item_id: key.item_id,
            item_type: key.item_type,
            memory_strength: 0,
            ease_factor: initial_ease,
            interval_days: 0,
            consecutive_correct: 0,
            consecutive_incorrect: 0,
            study_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed_at: None,
            next_review_date: None,
            skill_levels: SkillLevels::default(),
            mastery_level: MasteryLevel::New,
            average_response_time_ms: 0.0,
            best_response_time_ms: None,
            worst_response_time_ms: None,
            last_response_time_ms: None,
            is_bookmarked: false,
            priority: DEFAULT_PRIORITY,
            version: 0,
        }
    }

    pub fn key(&self) -> ProgressKey {
        ProgressKey::new(self.learner_id.clone(), self.item_id.clone(), self.item_type)
    }

    pub fn is_new(&self) -> bool {
        self.study_count == 0
    }

    pub fn accuracy(&self) -> f64 {
        if self.study_count == 0 {
            return 0.0;
        }
        self.correct_count as f64 / self.study_count as f64
    }

    /// Seconds past the scheduled review; negative when not yet due.
    pub fn overdue_seconds(&self, now: DateTime<Utc>) -> Option<i64> {
        self.next_review_date
            .map(|next| now.signed_duration_since(next).num_seconds())
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date.is_some_and(|next| next <= now)
    }

    /// Mastered items count as learned for sync and reporting.
    pub fn is_learned(&self) -> bool {
        self.mastery_level == MasteryLevel::Mastered
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority.clamp(MIN_PRIORITY, MAX_PRIORITY);
        self
    }

    pub fn with_bookmark(mut self, is_bookmarked: bool) -> Self {
        self.is_bookmarked = is_bookmarked;
        self
    }
}

// ==================== Review Outcome ====================

/// One study/review event as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub is_correct: bool,
    pub response_time_ms: i64,
    pub skill_dimension: SkillDimension,
}

impl ReviewOutcome {
    pub fn correct(response_time_ms: i64, skill_dimension: SkillDimension) -> Self {
        Self {
            is_correct: true,
            response_time_ms,
            skill_dimension,
        }
    }

    pub fn incorrect(response_time_ms: i64, skill_dimension: SkillDimension) -> Self {
        Self {
            is_correct: false,
            response_time_ms,
            skill_dimension,
        }
    }

    /// Builds an outcome from loosely typed host input.
    pub fn parse(
        is_correct: bool,
        response_time_ms: i64,
        skill_dimension: &str,
    ) -> Result<Self, SrsError> {
        Ok(Self {
            is_correct,
            response_time_ms,
            skill_dimension: skill_dimension.parse()?,
        })
    }
}
