//! Outcome Sanitization
//!
//! Input checks that run before any state is touched.
//!
//! Functions:
//! - Review outcome validation
//! - Response time clamping
//! - Progress record invariant checks

use crate::config::SchedulerConfig;
use crate::error::SrsError;
use crate::types::{
    ItemType, ProgressRecord, ReviewOutcome, SkillDimension, EPSILON, MAX_MEMORY_STRENGTH,
    MAX_PRIORITY, MAX_SKILL_LEVEL, MIN_PRIORITY,
};

/// Outcome that passed validation; the response time is positive and clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedOutcome {
    pub is_correct: bool,
    pub response_time_ms: u32,
    pub skill_dimension: SkillDimension,
}

pub fn validate_outcome(
    item_type: ItemType,
    outcome: &ReviewOutcome,
    config: &SchedulerConfig,
) -> Result<ValidatedOutcome, SrsError> {
    if outcome.response_time_ms <= 0 {
        return Err(SrsError::Validation(format!(
            "response time must be positive, got {}ms",
            outcome.response_time_ms
        )));
    }
    if !item_type.supports(outcome.skill_dimension) {
        return Err(SrsError::Validation(format!(
            "skill dimension {} is not tracked for {}",
            outcome.skill_dimension, item_type
        )));
    }

    Ok(ValidatedOutcome {
        is_correct: outcome.is_correct,
        response_time_ms: clamp_response_time(
            outcome.response_time_ms,
            config.response_time.max_ms,
        ),
        skill_dimension: outcome.skill_dimension,
    })
}

/// Caps response times so an abandoned session does not skew the statistics.
pub fn clamp_response_time(response_time_ms: i64, max_ms: u32) -> u32 {
    response_time_ms.clamp(1, i64::from(max_ms.max(1))) as u32
}

/// Checks the structural invariants of a record. Returns the first violation.
pub fn check_invariants(
    record: &ProgressRecord,
    config: &SchedulerConfig,
) -> Result<(), SrsError> {
    match first_violation(record, config) {
        Some(detail) => Err(violation(record, detail)),
        None => Ok(()),
    }
}

fn first_violation(record: &ProgressRecord, config: &SchedulerConfig) -> Option<String> {
    let ease = &config.ease;
    if !record.ease_factor.is_finite()
        || record.ease_factor < ease.floor - EPSILON
        || record.ease_factor > ease.ceiling + EPSILON
    {
        return Some(format!(
            "ease factor {} outside [{}, {}]",
            record.ease_factor, ease.floor, ease.ceiling
        ));
    }
    if record.consecutive_correct > 0 && record.consecutive_incorrect > 0 {
        return Some(format!(
            "both streaks nonzero (correct {}, incorrect {})",
            record.consecutive_correct, record.consecutive_incorrect
        ));
    }
    if record.study_count > 0 && record.interval_days == 0 {
        return Some("reviewed record with zero interval".to_string());
    }
    if record.correct_count.checked_add(record.incorrect_count) != Some(record.study_count) {
        return Some(format!(
            "study count {} != correct {} + incorrect {}",
            record.study_count, record.correct_count, record.incorrect_count
        ));
    }
    if record.last_reviewed_at.is_some() != record.next_review_date.is_some() {
        return Some("review timestamps set inconsistently".to_string());
    }
    if let (Some(last), Some(next)) = (record.last_reviewed_at, record.next_review_date) {
        if next < last {
            return Some("next review scheduled before last review".to_string());
        }
    }
    if record.memory_strength > MAX_MEMORY_STRENGTH {
        return Some(format!(
            "memory strength {} > {MAX_MEMORY_STRENGTH}",
            record.memory_strength
        ));
    }
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&record.priority) {
        return Some(format!(
            "priority {} outside [{MIN_PRIORITY}, {MAX_PRIORITY}]",
            record.priority
        ));
    }
    record
        .skill_levels
        .iter()
        .find(|(d, l)| *l > MAX_SKILL_LEVEL || !record.item_type.supports(*d))
        .map(|(dimension, level)| {
            format!("skill level {dimension}={level} invalid for {}", record.item_type)
        })
}

fn violation(record: &ProgressRecord, detail: String) -> SrsError {
    let message = format!("{}: {detail}", record.key());
    tracing::error!(
        learner_id = %record.learner_id,
        item_id = %record.item_id,
        item_type = %record.item_type,
        version = record.version,
        detail = %detail,
        "progress record invariant violated"
    );
    SrsError::InvariantViolation(message)
}
