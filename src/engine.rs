//! SRS Engine - entry point for review scheduling
//!
//! Pipeline per review: validate → update memory model → schedule next
//! review → classify mastery. The engine owns no record state; callers load
//! and persist records themselves.

use std::sync::Arc;

use rayon::prelude::*;

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::error::{RepositoryError, SrsError};
use crate::mastery;
use crate::memory;
use crate::preferences::LearnerPreferences;
use crate::queue::{self, DueQuery, DueQueue, DueQueueRequest};
use crate::sanitize::{check_invariants, validate_outcome};
use crate::schedule::{self, JitterSource, ThreadRngJitter};
use crate::types::{MasteryLevel, ProgressKey, ProgressRecord, ReviewOutcome};

/// One entry of a batch submitted to [`SrsEngine::apply_outcomes`].
#[derive(Debug, Clone)]
pub struct OutcomeBatchItem {
    pub record: ProgressRecord,
    pub outcome: ReviewOutcome,
    pub expected_version: u64,
    pub preferences: Option<LearnerPreferences>,
}

#[derive(Clone)]
pub struct SrsEngine {
    config: SchedulerConfig,
    clock: Arc<dyn Clock>,
    jitter: Arc<dyn JitterSource>,
}

impl SrsEngine {
    pub fn new(config: SchedulerConfig) -> Result<Self, SrsError> {
        config.validate()?;
        Ok(Self {
            config,
            clock: Arc::new(SystemClock),
            jitter: Arc::new(ThreadRngJitter),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Default record for a first exposure: initial ease, zero counters.
    pub fn new_record(&self, key: ProgressKey) -> ProgressRecord {
        ProgressRecord::new(key, self.config.ease.initial)
    }

    pub fn apply_outcome(
        &self,
        record: &ProgressRecord,
        outcome: &ReviewOutcome,
        expected_version: u64,
    ) -> Result<ProgressRecord, SrsError> {
        self.apply_outcome_with_preferences(
            record,
            outcome,
            expected_version,
            &LearnerPreferences::default(),
        )
    }

    /// Applies one review outcome and returns the next record state.
    ///
    /// Fails with `ConcurrencyConflict` when `expected_version` does not match
    /// the record, and with `Validation` for malformed outcomes. The input is
    /// never modified.
    pub fn apply_outcome_with_preferences(
        &self,
        record: &ProgressRecord,
        outcome: &ReviewOutcome,
        expected_version: u64,
        preferences: &LearnerPreferences,
    ) -> Result<ProgressRecord, SrsError> {
        if record.version != expected_version {
            tracing::warn!(
                learner_id = %record.learner_id,
                item_id = %record.item_id,
                expected_version,
                actual_version = record.version,
                "stale review rejected"
            );
            return Err(SrsError::ConcurrencyConflict {
                key: record.key(),
                expected: expected_version,
                actual: record.version,
            });
        }
        check_invariants(record, &self.config)?;
        let validated = validate_outcome(record.item_type, outcome, &self.config)?;

        let mut next = record.clone();
        memory::apply_review(
            &mut next,
            &validated,
            preferences.effective_ease_modifier(),
            &self.config,
        );

        let now = self.clock.now();
        next.last_reviewed_at = Some(now);
        next.next_review_date = Some(schedule::next_review_date(
            now,
            next.interval_days,
            &self.config.jitter,
            self.jitter.as_ref(),
        )?);
        next.mastery_level = mastery::classify_mastery(&next);
        next.version = record.version.checked_add(1).ok_or_else(|| {
            SrsError::InvariantViolation(format!("{}: version overflow", record.key()))
        })?;

        check_invariants(&next, &self.config)?;

        tracing::debug!(
            learner_id = %next.learner_id,
            item_id = %next.item_id,
            item_type = %next.item_type,
            is_correct = validated.is_correct,
            dimension = %validated.skill_dimension,
            interval_days = next.interval_days,
            ease_factor = next.ease_factor,
            mastery = next.mastery_level.as_str(),
            version = next.version,
            "review outcome applied"
        );
        Ok(next)
    }

    /// Applies independent outcomes in parallel, one result per input in order.
    /// Items must address distinct keys; same-key ordering is the caller's job.
    pub fn apply_outcomes(
        &self,
        batch: &[OutcomeBatchItem],
    ) -> Vec<Result<ProgressRecord, SrsError>> {
        batch
            .par_iter()
            .map(|item| match &item.preferences {
                Some(prefs) => self.apply_outcome_with_preferences(
                    &item.record,
                    &item.outcome,
                    item.expected_version,
                    prefs,
                ),
                None => self.apply_outcome(&item.record, &item.outcome, item.expected_version),
            })
            .collect()
    }

    pub fn build_due_queue<F, I>(
        &self,
        request: &DueQueueRequest,
        query: F,
    ) -> Result<DueQueue, SrsError>
    where
        F: FnOnce(&DueQuery) -> Result<I, RepositoryError>,
        I: IntoIterator<Item = ProgressRecord>,
    {
        queue::build_due_queue(request, &self.config.queue, query)
    }

    pub fn classify_mastery(&self, record: &ProgressRecord) -> MasteryLevel {
        mastery::classify_mastery(record)
    }
}
