//! Due-Date Scheduler
//!
//! Turns an interval into a concrete next-review timestamp. A bounded random
//! offset spreads reviews so a cohort that studied together does not come due
//! in the same minute.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::config::JitterParams;
use crate::error::SrsError;
use crate::types::SECONDS_PER_DAY;

/// Source of jitter samples, injectable for deterministic tests.
pub trait JitterSource: Send + Sync {
    /// Uniform sample in `[-1.0, 1.0]`.
    fn unit(&self) -> f64;
}

/// Always schedules exactly on the interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn unit(&self) -> f64 {
        0.0
    }
}

/// Returns the same sample every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn unit(&self) -> f64 {
        self.0
    }
}

/// Per-thread RNG; holds no shared state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn unit(&self) -> f64 {
        rand::thread_rng().gen_range(-1.0..=1.0)
    }
}

/// Reproducible jitter for replays and tests.
pub struct SeededJitter {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn unit(&self) -> f64 {
        self.rng.lock().gen_range(-1.0..=1.0)
    }
}

/// Largest allowed offset, in days, for an interval.
pub fn jitter_bound_days(interval_days: u32, params: &JitterParams) -> f64 {
    (f64::from(interval_days) * params.ratio)
        .min(params.max_days)
        .max(0.0)
}

/// `last_reviewed_at + interval_days ± jitter`, never earlier than
/// `last_reviewed_at`.
pub fn next_review_date(
    last_reviewed_at: DateTime<Utc>,
    interval_days: u32,
    params: &JitterParams,
    jitter: &dyn JitterSource,
) -> Result<DateTime<Utc>, SrsError> {
    let unit = jitter.unit();
    let unit = if unit.is_finite() { unit.clamp(-1.0, 1.0) } else { 0.0 };
    let bound_seconds = jitter_bound_days(interval_days, params) * SECONDS_PER_DAY as f64;
    let offset_seconds = (unit * bound_seconds).round() as i64;

    let total_seconds = i64::from(interval_days) * SECONDS_PER_DAY + offset_seconds;
    let next = last_reviewed_at
        .checked_add_signed(Duration::seconds(total_seconds.max(0)))
        .ok_or_else(|| {
            SrsError::InvariantViolation(format!(
                "next review date overflows: {last_reviewed_at} + {interval_days}d"
            ))
        })?;
    Ok(next.max(last_reviewed_at))
}
