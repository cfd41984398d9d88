#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use danci_srs::{
    FixedClock, ItemType, NoJitter, ProgressKey, ProgressRecord, SchedulerConfig, SrsEngine,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 7, 30, 0).unwrap()
}

pub fn test_engine() -> (SrsEngine, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(t0()));
    let engine = SrsEngine::new(SchedulerConfig::default())
        .unwrap()
        .with_clock(clock.clone())
        .with_jitter(Arc::new(NoJitter));
    (engine, clock)
}

pub fn vocab_key(item_id: &str) -> ProgressKey {
    ProgressKey::new("learner-1", item_id, ItemType::Vocabulary)
}

/// Record mid-streak: `streak` correct answers in a row, last seen a day
/// before its scheduled date.
pub fn reviewed_record(
    key: ProgressKey,
    interval_days: u32,
    ease_factor: f64,
    streak: u32,
    next_review_date: DateTime<Utc>,
) -> ProgressRecord {
    let mut record = ProgressRecord::new(key, ease_factor);
    record.interval_days = interval_days;
    record.consecutive_correct = streak;
    record.correct_count = streak.max(1);
    record.study_count = streak.max(1);
    record.last_reviewed_at = Some(next_review_date - Duration::days(i64::from(interval_days)));
    record.next_review_date = Some(next_review_date);
    record.version = u64::from(streak.max(1));
    record
}
