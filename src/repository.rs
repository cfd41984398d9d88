use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::RepositoryError;
use crate::queue::DueQuery;
use crate::types::{ProgressKey, ProgressRecord};

/// Storage collaborator. `save` is a compare-and-swap on `version`: it only
/// succeeds when the stored record is exactly one version behind.
pub trait ProgressRepository: Send + Sync {
    fn load(&self, key: &ProgressKey) -> Result<ProgressRecord, RepositoryError>;

    fn save(&self, record: &ProgressRecord) -> Result<(), RepositoryError>;

    /// Candidate records for a due-queue build; may return a superset.
    fn scan(&self, query: &DueQuery) -> Result<Vec<ProgressRecord>, RepositoryError>;
}

/// In-process store, used by tests and single-node hosts.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    records: RwLock<HashMap<ProgressKey, ProgressRecord>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ProgressRepository for InMemoryProgressStore {
    fn load(&self, key: &ProgressKey) -> Result<ProgressRecord, RepositoryError> {
        self.records
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(key.clone()))
    }

    fn save(&self, record: &ProgressRecord) -> Result<(), RepositoryError> {
        let key = record.key();
        let mut records = self.records.write();
        let expected_prior = record.version.checked_sub(1);
        match (records.get(&key), expected_prior) {
            // fresh record, or created and reviewed in one step
            (None, None) | (None, Some(0)) => {}
            (None, Some(_)) => return Err(RepositoryError::NotFound(key)),
            (Some(stored), Some(prior)) if stored.version == prior => {}
            (Some(stored), _) => {
                return Err(RepositoryError::VersionConflict {
                    expected: expected_prior.unwrap_or(0),
                    actual: stored.version,
                    key,
                });
            }
        }
        records.insert(key, record.clone());
        Ok(())
    }

    fn scan(&self, query: &DueQuery) -> Result<Vec<ProgressRecord>, RepositoryError> {
        let records = self.records.read();
        Ok(records
            .values()
            .filter(|r| r.learner_id == query.learner_id)
            .filter(|r| query.item_type.map_or(true, |t| t == r.item_type))
            .filter(|r| r.is_due(query.now) || (query.include_new && r.next_review_date.is_none()))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemType;
    use chrono::Utc;

    fn record(version: u64) -> ProgressRecord {
        let mut r = ProgressRecord::new(ProgressKey::new("u1", "w1", ItemType::Vocabulary), 2.5);
        r.version = version;
        r
    }

    #[test]
    fn test_insert_then_load() {
        let store = InMemoryProgressStore::new();
        store.save(&record(0)).unwrap();
        assert_eq!(store.load(&record(0).key()).unwrap(), record(0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_compare_and_swap() {
        let store = InMemoryProgressStore::new();
        store.save(&record(0)).unwrap();
        store.save(&record(1)).unwrap();
        // second writer with the same base version loses
        let err = store.save(&record(1)).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::VersionConflict {
                expected: 0,
                actual: 1,
                ..
            }
        ));
        store.save(&record(2)).unwrap();
        assert_eq!(store.load(&record(0).key()).unwrap().version, 2);
    }

    #[test]
    fn test_cannot_recreate_existing_record() {
        let store = InMemoryProgressStore::new();
        store.save(&record(0)).unwrap();
        assert!(matches!(
            store.save(&record(0)),
            Err(RepositoryError::VersionConflict { .. })
        ));
    }

    #[test]
    fn test_missing_record_with_history_is_not_found() {
        let store = InMemoryProgressStore::new();
        assert!(matches!(store.save(&record(5)), Err(RepositoryError::NotFound(_))));
        assert!(matches!(
            store.load(&record(0).key()),
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_scan_filters_learner() {
        let store = InMemoryProgressStore::new();
        store.save(&record(0)).unwrap();
        let query = DueQuery {
            learner_id: "u1".into(),
            item_type: None,
            now: Utc::now(),
            include_new: true,
        };
        assert_eq!(store.scan(&query).unwrap().len(), 1);
        let query = DueQuery {
            learner_id: "u2".into(),
            ..query
        };
        assert!(store.scan(&query).unwrap().is_empty());
    }
}
