//! Memory Model Updater
//!
//! Bounded SM-2 variant. One validated outcome moves the streak counters,
//! interval, ease factor and the exercised skill level of a record.
//!
//! - correct: 1 day on the first-ever correct answer, 6 on the second
//!   consecutive one, round(interval × ease) otherwise; ease rewarded by speed
//! - incorrect: interval back to 1 day, fixed ease penalty
//!
//! Timestamps, version and mastery grade are set by the engine afterwards.

use crate::config::{EaseParams, IntervalParams, ResponseTimeParams, SchedulerConfig};
use crate::sanitize::ValidatedOutcome;
use crate::types::{ProgressRecord, SkillDimension, MAX_MEMORY_STRENGTH};

/// Interval at which the interval component of memory strength saturates
const STRENGTH_INTERVAL_HORIZON_DAYS: f64 = 365.0;
/// Streak length at which the streak component saturates
const STRENGTH_STREAK_HORIZON: f64 = 10.0;

const STRENGTH_EASE_WEIGHT: f64 = 20.0;
const STRENGTH_INTERVAL_WEIGHT: f64 = 50.0;
const STRENGTH_STREAK_WEIGHT: f64 = 30.0;

/// Interval after any incorrect answer
pub const LAPSE_INTERVAL_DAYS: u32 = 1;

/// Applies one outcome to `record` in place.
///
/// `ease_modifier` is the learner's personal growth multiplier; it scales the
/// interval growth only and never the stored ease factor.
pub fn apply_review(
    record: &mut ProgressRecord,
    outcome: &ValidatedOutcome,
    ease_modifier: f64,
    config: &SchedulerConfig,
) {
    record.study_count = record.study_count.saturating_add(1);

    if outcome.is_correct {
        record.consecutive_correct = record.consecutive_correct.saturating_add(1);
        record.consecutive_incorrect = 0;
        record.correct_count = record.correct_count.saturating_add(1);

        // Interval grows with the ease from before this review.
        record.interval_days = next_correct_interval(
            record.interval_days,
            record.correct_count,
            record.consecutive_correct,
            record.ease_factor,
            ease_modifier,
            &config.interval,
        );
        let delta = ease_delta(
            outcome.response_time_ms,
            outcome.skill_dimension,
            &config.ease,
            &config.response_time,
        );
        record.ease_factor = clamp_ease(record.ease_factor + delta, &config.ease);
        record.skill_levels.raise(outcome.skill_dimension);
    } else {
        record.consecutive_incorrect = record.consecutive_incorrect.saturating_add(1);
        record.consecutive_correct = 0;
        record.incorrect_count = record.incorrect_count.saturating_add(1);

        record.interval_days = LAPSE_INTERVAL_DAYS;
        record.ease_factor =
            clamp_ease(record.ease_factor - config.ease.incorrect_penalty, &config.ease);
        record.skill_levels.lower(outcome.skill_dimension);
    }

    update_response_stats(record, outcome.response_time_ms);
    record.memory_strength = memory_strength(
        record.ease_factor,
        record.interval_days,
        record.consecutive_correct,
        &config.ease,
    );
}

/// Interval after a correct answer. `correct_count` and `streak` already
/// include this answer. Only the first-ever correct answer starts at the first
/// step; a correct answer right after a lapse grows from the lapse interval.
pub fn next_correct_interval(
    previous_days: u32,
    correct_count: u32,
    streak: u32,
    ease_factor: f64,
    ease_modifier: f64,
    params: &IntervalParams,
) -> u32 {
    let max_days = params.max_days.max(1);
    let days = match (correct_count, streak) {
        (0 | 1, _) => params.first_days,
        (_, 2) => params.second_days,
        _ => {
            let multiplier = (ease_factor * ease_modifier).max(1.0);
            let grown = (f64::from(previous_days) * multiplier).round();
            let grown = if grown.is_finite() {
                grown.min(f64::from(max_days)) as u32
            } else {
                max_days
            };
            grown.max(previous_days)
        }
    };
    days.clamp(1, max_days)
}

/// Ease adjustment for a correct answer: fast answers earn the full bonus,
/// slow ones little or nothing. Productive dimensions weigh more.
pub fn ease_delta(
    response_time_ms: u32,
    dimension: SkillDimension,
    ease: &EaseParams,
    thresholds: &ResponseTimeParams,
) -> f64 {
    let base = if response_time_ms <= thresholds.fast_ms {
        ease.fast_bonus
    } else if response_time_ms <= thresholds.slow_ms {
        ease.normal_bonus
    } else {
        ease.slow_bonus
    };
    if dimension.is_productive() {
        base * ease.productive_weight
    } else {
        base
    }
}

pub fn clamp_ease(value: f64, ease: &EaseParams) -> f64 {
    if value.is_nan() {
        return ease.floor;
    }
    value.clamp(ease.floor, ease.ceiling)
}

/// UI-facing confidence score in 0..=100, monotonic in ease, interval and
/// streak length.
pub fn memory_strength(
    ease_factor: f64,
    interval_days: u32,
    streak: u32,
    ease: &EaseParams,
) -> u8 {
    let span = ease.ceiling - ease.floor;
    let ease_part = if span > 0.0 {
        ((ease_factor - ease.floor) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let interval_part = ((1.0 + f64::from(interval_days)).ln()
        / (1.0 + STRENGTH_INTERVAL_HORIZON_DAYS).ln())
    .min(1.0);
    let streak_part = (f64::from(streak) / STRENGTH_STREAK_HORIZON).min(1.0);

    let score = STRENGTH_EASE_WEIGHT * ease_part
        + STRENGTH_INTERVAL_WEIGHT * interval_part
        + STRENGTH_STREAK_WEIGHT * streak_part;
    score.round().clamp(0.0, f64::from(MAX_MEMORY_STRENGTH)) as u8
}

fn update_response_stats(record: &mut ProgressRecord, response_time_ms: u32) {
    let rt = f64::from(response_time_ms);
    let n = f64::from(record.study_count.max(1));
    record.average_response_time_ms += (rt - record.average_response_time_ms) / n;
    record.best_response_time_ms = Some(
        record
            .best_response_time_ms
            .map_or(response_time_ms, |best| best.min(response_time_ms)),
    );
    record.worst_response_time_ms = Some(
        record
            .worst_response_time_ms
            .map_or(response_time_ms, |worst| worst.max(response_time_ms)),
    );
    record.last_response_time_ms = Some(response_time_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemType, ProgressKey};

    fn outcome(is_correct: bool, rt: u32) -> ValidatedOutcome {
        ValidatedOutcome {
            is_correct,
            response_time_ms: rt,
            skill_dimension: SkillDimension::Recognition,
        }
    }

    fn fresh() -> ProgressRecord {
        ProgressRecord::new(ProgressKey::new("u1", "w1", ItemType::Vocabulary), 2.5)
    }

    #[test]
    fn test_first_correct_sets_one_day() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        apply_review(&mut r, &outcome(true, 1200), 1.0, &config);
        assert_eq!(r.interval_days, 1);
        assert_eq!(r.consecutive_correct, 1);
        assert_eq!(r.correct_count, 1);
        assert_eq!(r.study_count, 1);
        assert!(r.memory_strength > 0);
        assert_eq!(r.skill_levels.get(SkillDimension::Recognition), 1);
    }

    #[test]
    fn test_correct_sequence_follows_sm2_steps() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        apply_review(&mut r, &outcome(true, 5000), 1.0, &config);
        apply_review(&mut r, &outcome(true, 5000), 1.0, &config);
        assert_eq!(r.interval_days, 6);
        // 6 × 2.5 with ease pinned at the ceiling
        apply_review(&mut r, &outcome(true, 5000), 1.0, &config);
        assert_eq!(r.interval_days, 15);
    }

    #[test]
    fn test_third_correct_uses_previous_ease() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        r.interval_days = 6;
        r.ease_factor = 2.0;
        r.consecutive_correct = 2;
        r.correct_count = 2;
        r.study_count = 2;
        apply_review(&mut r, &outcome(true, 1200), 1.0, &config);
        assert_eq!(r.interval_days, 12);
        assert!((r.ease_factor - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_incorrect_resets_interval_and_penalizes_ease() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        r.interval_days = 30;
        r.consecutive_correct = 5;
        r.correct_count = 5;
        r.study_count = 5;
        r.skill_levels.set(SkillDimension::Recognition, 3);
        apply_review(&mut r, &outcome(false, 4000), 1.0, &config);
        assert_eq!(r.interval_days, 1);
        assert_eq!(r.consecutive_correct, 0);
        assert_eq!(r.consecutive_incorrect, 1);
        assert!((r.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(r.skill_levels.get(SkillDimension::Recognition), 2);
    }

    #[test]
    fn test_correct_after_lapse_grows_from_lapse_interval() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        r.interval_days = 15;
        r.consecutive_correct = 3;
        r.correct_count = 3;
        r.study_count = 3;
        apply_review(&mut r, &outcome(false, 4000), 1.0, &config);
        assert_eq!(r.interval_days, LAPSE_INTERVAL_DAYS);

        // round(1 × 2.3), not the first-ever step
        apply_review(&mut r, &outcome(true, 1200), 1.0, &config);
        assert_eq!(r.consecutive_correct, 1);
        assert_eq!(r.interval_days, 2);

        apply_review(&mut r, &outcome(true, 1200), 1.0, &config);
        assert_eq!(r.interval_days, 6);
    }

    #[test]
    fn test_ease_never_leaves_bounds() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        for _ in 0..20 {
            apply_review(&mut r, &outcome(false, 900), 1.0, &config);
        }
        assert_eq!(r.ease_factor, config.ease.floor);
        for _ in 0..20 {
            apply_review(&mut r, &outcome(true, 900), 1.0, &config);
        }
        assert_eq!(r.ease_factor, config.ease.ceiling);
    }

    #[test]
    fn test_ease_delta_rewards_speed() {
        let config = SchedulerConfig::default();
        let delta = |rt, dim| ease_delta(rt, dim, &config.ease, &config.response_time);
        let fast = delta(1000, SkillDimension::Recognition);
        let normal = delta(5000, SkillDimension::Recognition);
        let slow = delta(20_000, SkillDimension::Recognition);
        assert!(fast > normal && normal > slow);
        let productive = delta(1000, SkillDimension::Speaking);
        assert!(productive > fast);
    }

    #[test]
    fn test_ease_modifier_scales_growth_only() {
        let params = IntervalParams::default();
        assert_eq!(next_correct_interval(10, 5, 3, 2.0, 1.0, &params), 20);
        assert_eq!(next_correct_interval(10, 5, 3, 2.0, 1.5, &params), 30);
        // Never shrinks below the previous interval
        assert_eq!(next_correct_interval(10, 5, 3, 1.3, 0.5, &params), 10);
    }

    #[test]
    fn test_interval_is_capped() {
        let params = IntervalParams::default();
        assert_eq!(
            next_correct_interval(30_000, 9, 9, 2.5, 1.0, &params),
            params.max_days
        );
    }

    #[test]
    fn test_memory_strength_is_monotonic() {
        let ease = EaseParams::default();
        let base = memory_strength(2.0, 10, 2, &ease);
        assert!(memory_strength(2.2, 10, 2, &ease) >= base);
        assert!(memory_strength(2.0, 30, 2, &ease) >= base);
        assert!(memory_strength(2.0, 10, 4, &ease) >= base);
        assert_eq!(memory_strength(2.5, 36_500, 100, &ease), MAX_MEMORY_STRENGTH);
    }

    #[test]
    fn test_response_stats() {
        let config = SchedulerConfig::default();
        let mut r = fresh();
        apply_review(&mut r, &outcome(true, 1000), 1.0, &config);
        apply_review(&mut r, &outcome(false, 3000), 1.0, &config);
        apply_review(&mut r, &outcome(true, 2000), 1.0, &config);
        assert!((r.average_response_time_ms - 2000.0).abs() < 1e-9);
        assert_eq!(r.best_response_time_ms, Some(1000));
        assert_eq!(r.worst_response_time_ms, Some(3000));
        assert_eq!(r.last_response_time_ms, Some(2000));
    }
}
