//! Review Service - load / apply / save around a repository
//!
//! Host-side glue for callers that keep progress in a [`ProgressRepository`].
//! Every write goes through the repository's compare-and-swap, so a retried
//! submission of the same review is rejected instead of counted twice.

use crate::engine::SrsEngine;
use crate::error::{RepositoryError, SrsError};
use crate::preferences::LearnerPreferences;
use crate::queue::{DueQueue, DueQueueRequest};
use crate::repository::ProgressRepository;
use crate::types::{ProgressKey, ProgressRecord, ReviewOutcome};

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSubmission {
    pub key: ProgressKey,
    pub outcome: ReviewOutcome,
    /// Version the client last saw; 0 for an item never stored
    pub expected_version: u64,
    pub create_on_first_exposure: bool,
    pub preferences: LearnerPreferences,
}

impl ReviewSubmission {
    pub fn new(key: ProgressKey, outcome: ReviewOutcome, expected_version: u64) -> Self {
        Self {
            key,
            outcome,
            expected_version,
            create_on_first_exposure: false,
            preferences: LearnerPreferences::default(),
        }
    }

    pub fn create_on_first_exposure(mut self) -> Self {
        self.create_on_first_exposure = true;
        self
    }

    pub fn with_preferences(mut self, preferences: LearnerPreferences) -> Self {
        self.preferences = preferences;
        self
    }
}

pub struct ReviewService<R> {
    engine: SrsEngine,
    repository: R,
}

impl<R: ProgressRepository> ReviewService<R> {
    pub fn new(engine: SrsEngine, repository: R) -> Self {
        Self { engine, repository }
    }

    pub fn engine(&self) -> &SrsEngine {
        &self.engine
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Stores a default record for `key` unless one already exists.
    pub fn ensure_record(&self, key: &ProgressKey) -> Result<ProgressRecord, SrsError> {
        match self.repository.load(key) {
            Ok(record) => Ok(record),
            Err(RepositoryError::NotFound(_)) => {
                let record = self.engine.new_record(key.clone());
                match self.repository.save(&record) {
                    Ok(()) => Ok(record),
                    // lost a creation race; the winner's record is just as good
                    Err(RepositoryError::VersionConflict { .. }) => Ok(self.repository.load(key)?),
                    Err(err) => Err(err.into()),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn submit(&self, submission: &ReviewSubmission) -> Result<ProgressRecord, SrsError> {
        let current = match self.repository.load(&submission.key) {
            Ok(record) => record,
            Err(RepositoryError::NotFound(key)) if submission.create_on_first_exposure => {
                tracing::debug!(key = %key, "creating progress record on first exposure");
                self.engine.new_record(key)
            }
            Err(err) => return Err(err.into()),
        };

        let updated = self.engine.apply_outcome_with_preferences(
            &current,
            &submission.outcome,
            submission.expected_version,
            &submission.preferences,
        )?;

        if let Err(err) = self.repository.save(&updated) {
            if matches!(err, RepositoryError::VersionConflict { .. }) {
                tracing::warn!(
                    key = %submission.key,
                    error = %err,
                    "concurrent review lost the save race"
                );
            }
            return Err(err.into());
        }
        Ok(updated)
    }

    pub fn due_queue(&self, request: &DueQueueRequest) -> Result<DueQueue, SrsError> {
        self.engine
            .build_due_queue(request, |query| self.repository.scan(query))
    }
}
