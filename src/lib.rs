//! # danci-srs - spaced-repetition review scheduler
//!
//! One generic progress record per (learner, item, item type) covers
//! vocabulary, kanji, grammar and technical terms. After every review the
//! engine recomputes memory strength, ease, interval and mastery, and decides
//! when the item comes back.
//!
//! ## Pipeline
//!
//! review outcome → [`sanitize`] → [`memory`] → [`schedule`] → [`mastery`]
//! → updated record handed back to the caller for persistence.
//!
//! [`queue`] runs separately over stored records and returns what is due.
//!
//! ## Modules
//!
//! - [`engine`] - `SrsEngine`, the entry point
//! - [`memory`] - bounded SM-2 update of ease, interval, streaks and skills
//! - [`schedule`] - next-review timestamps with bounded jitter
//! - [`mastery`] - weakest-dimension mastery grade
//! - [`queue`] - ordered, size-bounded due queues
//! - [`sanitize`] - outcome validation and invariant checks
//! - [`repository`] / [`service`] - storage seam with compare-and-swap saves
//! - [`config`], [`preferences`], [`clock`], [`logging`]
//!
//! ## Example
//!
//! ```rust
//! use danci_srs::{
//!     ItemType, ProgressKey, ReviewOutcome, SchedulerConfig, SkillDimension, SrsEngine,
//! };
//!
//! let engine = SrsEngine::new(SchedulerConfig::default()).unwrap();
//! let record = engine.new_record(ProgressKey::new("learner-1", "word-42", ItemType::Vocabulary));
//! let outcome = ReviewOutcome::correct(1200, SkillDimension::Recognition);
//! let next = engine.apply_outcome(&record, &outcome, record.version).unwrap();
//! assert_eq!(next.interval_days, 1);
//! assert!(next.memory_strength > 0);
//! ```

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod mastery;
pub mod memory;
pub mod preferences;
pub mod queue;
pub mod repository;
pub mod sanitize;
pub mod schedule;
pub mod service;
pub mod types;

pub use types::*;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SchedulerConfig;
pub use engine::{OutcomeBatchItem, SrsEngine};
pub use error::{RepositoryError, SrsError};
pub use mastery::classify_mastery;
pub use preferences::LearnerPreferences;
pub use queue::{DueQuery, DueQueue, DueQueueRequest};
pub use repository::{InMemoryProgressStore, ProgressRepository};
pub use schedule::{FixedJitter, JitterSource, NoJitter, SeededJitter, ThreadRngJitter};
pub use service::{ReviewService, ReviewSubmission};
