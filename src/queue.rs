//! Due Queue Builder
//!
//! Selects the records a learner should review now and hands them out
//! most-overdue first. Priority and bookmarks nudge the order by a bounded
//! amount, so manual prioritization can never starve an overdue review.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::iter::FusedIterator;

use chrono::{DateTime, Utc};

use crate::config::QueueParams;
use crate::error::{RepositoryError, SrsError};
use crate::preferences::LearnerPreferences;
use crate::types::{ItemType, ProgressRecord, DEFAULT_PRIORITY};

#[derive(Debug, Clone, PartialEq)]
pub struct DueQueueRequest {
    pub learner_id: String,
    pub item_type: Option<ItemType>,
    pub now: DateTime<Utc>,
    /// `None` uses the configured default batch size
    pub limit: Option<usize>,
    pub include_new: bool,
    pub new_item_limit: usize,
    /// Items already served in this session
    pub exclude_item_ids: HashSet<String>,
}

impl DueQueueRequest {
    pub fn new(learner_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            learner_id: learner_id.into(),
            item_type: None,
            now,
            limit: None,
            include_new: false,
            new_item_limit: 0,
            exclude_item_ids: HashSet::new(),
        }
    }

    /// Batch sized from the learner's daily goals, new items included.
    pub fn for_learner(
        learner_id: impl Into<String>,
        now: DateTime<Utc>,
        prefs: &LearnerPreferences,
    ) -> Self {
        let new_items = prefs.new_items_goal() as usize;
        Self::new(learner_id, now)
            .limit(prefs.reviews_goal() as usize + new_items)
            .with_new_items(new_items)
    }

    pub fn item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_new_items(mut self, max_new: usize) -> Self {
        self.include_new = max_new > 0;
        self.new_item_limit = max_new;
        self
    }

    pub fn exclude<I, S>(mut self, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_item_ids.extend(item_ids.into_iter().map(Into::into));
        self
    }

    pub fn query(&self) -> DueQuery {
        DueQuery {
            learner_id: self.learner_id.clone(),
            item_type: self.item_type,
            now: self.now,
            include_new: self.include_new,
        }
    }

    fn accepts(&self, record: &ProgressRecord) -> bool {
        if record.learner_id != self.learner_id {
            return false;
        }
        if self.item_type.is_some_and(|t| t != record.item_type) {
            return false;
        }
        !self.exclude_item_ids.contains(&record.item_id)
    }
}

/// What the host's query callback is asked to fetch. The builder re-checks
/// every returned record, so a superset is fine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueQuery {
    pub learner_id: String,
    pub item_type: Option<ItemType>,
    pub now: DateTime<Utc>,
    pub include_new: bool,
}

struct Ranked {
    score: i64,
    record: ProgressRecord,
}

impl Ranked {
    fn key(&self) -> (i64, bool, u8) {
        (self.score, self.record.is_bookmarked, self.record.priority)
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key()
            .cmp(&other.key())
            // lower ids first on full ties
            .then_with(|| other.record.item_id.cmp(&self.record.item_id))
            .then_with(|| other.record.item_type.cmp(&self.record.item_type))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Ordered, size-bounded batch of reviews. Entries are ranked lazily as they
/// are pulled; once drained the queue cannot be restarted.
pub struct DueQueue {
    due: BinaryHeap<Ranked>,
    new: BinaryHeap<Ranked>,
    remaining: usize,
    new_remaining: usize,
}

impl DueQueue {
    pub fn empty() -> Self {
        Self {
            due: BinaryHeap::new(),
            new: BinaryHeap::new(),
            remaining: 0,
            new_remaining: 0,
        }
    }

    fn available(&self) -> usize {
        let new = self.new.len().min(self.new_remaining);
        (self.due.len() + new).min(self.remaining)
    }
}

impl Iterator for DueQueue {
    type Item = ProgressRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let ranked = match self.due.pop() {
            Some(ranked) => ranked,
            None if self.new_remaining > 0 => {
                self.new_remaining -= 1;
                self.new.pop()?
            }
            None => return None,
        };
        self.remaining -= 1;
        Some(ranked.record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.available();
        (n, Some(n))
    }
}

impl ExactSizeIterator for DueQueue {}

impl FusedIterator for DueQueue {}

/// Manual boost in seconds, capped at `max_boost_hours` either way.
pub fn boost_seconds(record: &ProgressRecord, params: &QueueParams) -> i64 {
    let priority_hours =
        (f64::from(record.priority) - f64::from(DEFAULT_PRIORITY)) * params.priority_step_hours;
    let bookmark_hours = if record.is_bookmarked {
        params.bookmark_boost_hours
    } else {
        0.0
    };
    let cap = params.max_boost_hours.max(0.0);
    let hours = (priority_hours + bookmark_hours).clamp(-cap, cap);
    (hours * 3600.0).round() as i64
}

/// Builds the queue from the records returned by `query`.
pub fn build_due_queue<F, I>(
    request: &DueQueueRequest,
    params: &QueueParams,
    query: F,
) -> Result<DueQueue, SrsError>
where
    F: FnOnce(&DueQuery) -> Result<I, RepositoryError>,
    I: IntoIterator<Item = ProgressRecord>,
{
    let limit = request
        .limit
        .unwrap_or(params.default_limit)
        .min(params.max_limit);
    if limit == 0 {
        return Ok(DueQueue::empty());
    }

    let mut due = Vec::new();
    let mut new = Vec::new();
    let mut scanned = 0usize;
    for record in query(&request.query())? {
        scanned += 1;
        if !request.accepts(&record) {
            continue;
        }
        let boost = boost_seconds(&record, params);
        match record.overdue_seconds(request.now) {
            Some(overdue) if overdue >= 0 => due.push(Ranked {
                score: overdue.saturating_add(boost),
                record,
            }),
            Some(_) => {}
            None if request.include_new && record.is_new() => {
                new.push(Ranked { score: boost, record })
            }
            None => {}
        }
    }

    tracing::debug!(
        learner_id = %request.learner_id,
        item_type = ?request.item_type,
        scanned,
        due = due.len(),
        new = new.len(),
        limit,
        "due queue built"
    );

    Ok(DueQueue {
        due: BinaryHeap::from(due),
        new: BinaryHeap::from(new),
        remaining: limit,
        new_remaining: if request.include_new { request.new_item_limit } else { 0 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProgressKey;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn due_record(item_id: &str, overdue: Duration) -> ProgressRecord {
        let mut r = ProgressRecord::new(ProgressKey::new("u1", item_id, ItemType::Vocabulary), 2.5);
        let next = now() - overdue;
        r.study_count = 1;
        r.correct_count = 1;
        r.consecutive_correct = 1;
        r.interval_days = 1;
        r.last_reviewed_at = Some(next - Duration::days(1));
        r.next_review_date = Some(next);
        r
    }

    fn new_record(item_id: &str) -> ProgressRecord {
        ProgressRecord::new(ProgressKey::new("u1", item_id, ItemType::Vocabulary), 2.5)
    }

    fn build(
        request: &DueQueueRequest,
        params: &QueueParams,
        records: Vec<ProgressRecord>,
    ) -> DueQueue {
        build_due_queue(request, params, |_| Ok::<_, RepositoryError>(records)).unwrap()
    }

    fn ids(queue: DueQueue) -> Vec<String> {
        queue.map(|r| r.item_id).collect()
    }

    #[test]
    fn test_most_overdue_first() {
        let records = vec![
            due_record("two", Duration::days(2)),
            due_record("zero", Duration::zero()),
            due_record("five", Duration::days(5)),
        ];
        let request = DueQueueRequest::new("u1", now());
        let queue = build(&request, &QueueParams::default(), records);
        assert_eq!(ids(queue), vec!["five", "two", "zero"]);
    }

    #[test]
    fn test_not_yet_due_and_new_are_skipped_by_default() {
        let records = vec![
            due_record("future", Duration::hours(-3)),
            new_record("fresh"),
            due_record("due", Duration::hours(1)),
        ];
        let request = DueQueueRequest::new("u1", now());
        let queue = build(&request, &QueueParams::default(), records);
        assert_eq!(ids(queue), vec!["due"]);
    }

    #[test]
    fn test_boost_cannot_override_large_overdue_gap() {
        let favored = due_record("favored", Duration::hours(1))
            .with_priority(5)
            .with_bookmark(true);
        let urgent = due_record("urgent", Duration::days(3));
        let request = DueQueueRequest::new("u1", now());
        let queue = build_due_queue(&request, &QueueParams::default(), |_| {
            Ok::<_, RepositoryError>(vec![favored, urgent])
        })
        .unwrap();
        assert_eq!(ids(queue), vec!["urgent", "favored"]);
    }

    #[test]
    fn test_boost_breaks_near_ties() {
        let plain = due_record("plain", Duration::hours(2));
        let bookmarked = due_record("bookmarked", Duration::hours(1)).with_bookmark(true);
        let request = DueQueueRequest::new("u1", now());
        let queue = build_due_queue(&request, &QueueParams::default(), |_| {
            Ok::<_, RepositoryError>(vec![plain, bookmarked])
        })
        .unwrap();
        assert_eq!(ids(queue), vec!["bookmarked", "plain"]);
    }

    #[test]
    fn test_boost_is_capped() {
        let params = QueueParams::default();
        let r = due_record("x", Duration::zero()).with_priority(5).with_bookmark(true);
        assert_eq!(boost_seconds(&r, &params), 24 * 3600);
        let r = due_record("y", Duration::zero()).with_priority(1);
        assert_eq!(boost_seconds(&r, &params), -12 * 3600);
    }

    #[test]
    fn test_limit_and_new_items() {
        let records = vec![
            due_record("a", Duration::days(1)),
            due_record("b", Duration::days(2)),
            new_record("n1"),
            new_record("n2").with_priority(5),
            new_record("n3"),
        ];
        let request = DueQueueRequest::new("u1", now()).limit(3).with_new_items(2);
        let queue = build_due_queue(&request, &QueueParams::default(), |q| {
            assert!(q.include_new);
            Ok::<_, RepositoryError>(records)
        })
        .unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(ids(queue), vec!["b", "a", "n2"]);
    }

    #[test]
    fn test_new_item_limit_applies() {
        let records = vec![new_record("n1"), new_record("n2"), new_record("n3")];
        let request = DueQueueRequest::new("u1", now()).limit(10).with_new_items(2);
        let queue = build(&request, &QueueParams::default(), records);
        assert_eq!(ids(queue), vec!["n1", "n2"]);
    }

    #[test]
    fn test_filters_learner_type_and_exclusions() {
        let mut other_learner = due_record("other", Duration::days(1));
        other_learner.learner_id = "u2".into();
        let mut kanji = due_record("kanji", Duration::days(1));
        kanji.item_type = ItemType::Kanji;
        let records = vec![
            other_learner,
            kanji,
            due_record("seen", Duration::days(4)),
            due_record("keep", Duration::days(1)),
        ];
        let request = DueQueueRequest::new("u1", now())
            .item_type(ItemType::Vocabulary)
            .exclude(["seen"]);
        let queue = build(&request, &QueueParams::default(), records);
        assert_eq!(ids(queue), vec!["keep"]);
    }

    #[test]
    fn test_limit_is_capped_by_config() {
        let records: Vec<_> = (0..20)
            .map(|i| due_record(&format!("w{i:02}"), Duration::days(1)))
            .collect();
        let params = QueueParams {
            max_limit: 5,
            ..QueueParams::default()
        };
        let request = DueQueueRequest::new("u1", now()).limit(1000);
        let queue = build(&request, &params, records);
        assert_eq!(queue.count(), 5);
    }

    #[test]
    fn test_queue_is_not_restartable() {
        let records = vec![due_record("a", Duration::days(1))];
        let request = DueQueueRequest::new("u1", now());
        let mut queue = build(&request, &QueueParams::default(), records);
        assert!(queue.next().is_some());
        assert!(queue.next().is_none());
        assert!(queue.next().is_none());
    }

    #[test]
    fn test_query_error_propagates() {
        let request = DueQueueRequest::new("u1", now());
        let result = build_due_queue(&request, &QueueParams::default(), |_| {
            Err::<Vec<ProgressRecord>, _>(RepositoryError::Backend("connection reset".into()))
        });
        assert!(matches!(result, Err(SrsError::Repository(_))));
    }

    #[test]
    fn test_for_learner_uses_daily_goals() {
        let prefs = LearnerPreferences {
            daily_reviews_goal: 20,
            daily_new_items_goal: 5,
            ..LearnerPreferences::default()
        };
        let request = DueQueueRequest::for_learner("u1", now(), &prefs);
        assert_eq!(request.limit, Some(25));
        assert_eq!(request.new_item_limit, 5);
        assert!(request.include_new);
    }
}
