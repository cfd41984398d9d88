use serde::{Deserialize, Serialize};

const MIN_EASE_MODIFIER: f64 = 0.5;
const MAX_EASE_MODIFIER: f64 = 2.0;
const MIN_DAILY_GOAL: u32 = 1;
const MAX_DAILY_GOAL: u32 = 100;

/// Per-learner study preferences that shape scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LearnerPreferences {
    /// Scales interval growth; 1.0 keeps the plain schedule
    pub ease_factor_modifier: f64,
    pub daily_reviews_goal: u32,
    pub daily_new_items_goal: u32,
}

impl Default for LearnerPreferences {
    fn default() -> Self {
        Self {
            ease_factor_modifier: 1.0,
            daily_reviews_goal: 30,
            daily_new_items_goal: 10,
        }
    }
}

impl LearnerPreferences {
    pub fn effective_ease_modifier(&self) -> f64 {
        if !self.ease_factor_modifier.is_finite() {
            return 1.0;
        }
        self.ease_factor_modifier.clamp(MIN_EASE_MODIFIER, MAX_EASE_MODIFIER)
    }

    pub fn reviews_goal(&self) -> u32 {
        self.daily_reviews_goal.clamp(MIN_DAILY_GOAL, MAX_DAILY_GOAL)
    }

    pub fn new_items_goal(&self) -> u32 {
        self.daily_new_items_goal.clamp(MIN_DAILY_GOAL, MAX_DAILY_GOAL)
    }
}
