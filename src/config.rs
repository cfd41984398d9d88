use serde::{Deserialize, Serialize};

use crate::error::SrsError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EaseParams {
    pub initial: f64,
    pub floor: f64,
    pub ceiling: f64,
    pub fast_bonus: f64,
    pub normal_bonus: f64,
    pub slow_bonus: f64,
    /// Multiplier applied to the bonus on productive dimensions
    pub productive_weight: f64,
    pub incorrect_penalty: f64,
}

impl Default for EaseParams {
    fn default() -> Self {
        Self {
            initial: 2.5,
            floor: 1.3,
            ceiling: 2.5,
            fast_bonus: 0.10,
            normal_bonus: 0.05,
            slow_bonus: 0.0,
            productive_weight: 1.2,
            incorrect_penalty: 0.20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntervalParams {
    pub first_days: u32,
    pub second_days: u32,
    pub max_days: u32,
}

impl Default for IntervalParams {
    fn default() -> Self {
        Self {
            first_days: 1,
            second_days: 6,
            max_days: 36_500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseTimeParams {
    pub fast_ms: u32,
    pub slow_ms: u32,
    /// Longer responses are clamped before they reach the statistics
    pub max_ms: u32,
}

impl Default for ResponseTimeParams {
    fn default() -> Self {
        Self {
            fast_ms: 3_000,
            slow_ms: 8_000,
            max_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JitterParams {
    pub ratio: f64,
    pub max_days: f64,
}

impl Default for JitterParams {
    fn default() -> Self {
        Self {
            ratio: 0.1,
            max_days: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueParams {
    pub default_limit: usize,
    pub max_limit: usize,
    pub priority_step_hours: f64,
    pub bookmark_boost_hours: f64,
    /// Manual boosts never move an item by more than this
    pub max_boost_hours: f64,
}

impl Default for QueueParams {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
            priority_step_hours: 6.0,
            bookmark_boost_hours: 12.0,
            max_boost_hours: 24.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchedulerConfig {
    pub ease: EaseParams,
    pub interval: IntervalParams,
    pub response_time: ResponseTimeParams,
    pub jitter: JitterParams,
    pub queue: QueueParams,
}

impl SchedulerConfig {
    /// Defaults overridden by `SRS_*` environment variables. Unparseable
    /// values fall back to the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        let ease = &mut config.ease;
        ease.initial = env_or("SRS_EASE_INITIAL", ease.initial);
        ease.floor = env_or("SRS_EASE_FLOOR", ease.floor);
        ease.ceiling = env_or("SRS_EASE_CEILING", ease.ceiling);
        ease.incorrect_penalty = env_or("SRS_EASE_PENALTY", ease.incorrect_penalty);

        let interval = &mut config.interval;
        interval.max_days = env_or("SRS_MAX_INTERVAL_DAYS", interval.max_days);

        let rt = &mut config.response_time;
        rt.fast_ms = env_or("SRS_FAST_RESPONSE_MS", rt.fast_ms);
        rt.slow_ms = env_or("SRS_SLOW_RESPONSE_MS", rt.slow_ms);
        rt.max_ms = env_or("SRS_MAX_RESPONSE_MS", rt.max_ms);

        let jitter = &mut config.jitter;
        jitter.ratio = env_or("SRS_JITTER_RATIO", jitter.ratio);
        jitter.max_days = env_or("SRS_JITTER_MAX_DAYS", jitter.max_days);

        let queue = &mut config.queue;
        queue.default_limit = env_or("SRS_QUEUE_DEFAULT_LIMIT", queue.default_limit);
        queue.max_limit = env_or("SRS_QUEUE_MAX_LIMIT", queue.max_limit);
        config
    }

    /// Partial JSON overrides on top of the defaults, e.g. from a settings table.
    pub fn from_json_str(raw: &str) -> Result<Self, SrsError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| SrsError::Config(format!("malformed config json: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SrsError> {
        let ease = &self.ease;
        check_range("ease.ceiling", ease.ceiling, 1.0, f64::MAX)?;
        check_range("ease.floor", ease.floor, 1.0, ease.ceiling)?;
        check_range("ease.initial", ease.initial, ease.floor, ease.ceiling)?;
        check_range("ease.incorrectPenalty", ease.incorrect_penalty, 0.0, 1.0)?;
        check_range("ease.fastBonus", ease.fast_bonus, 0.0, 1.0)?;
        check_range("ease.normalBonus", ease.normal_bonus, 0.0, ease.fast_bonus)?;
        check_range("ease.slowBonus", ease.slow_bonus, 0.0, ease.normal_bonus)?;
        check_range("ease.productiveWeight", ease.productive_weight, 0.0, 10.0)?;

        let interval = &self.interval;
        if interval.first_days == 0 || interval.second_days < interval.first_days {
            return Err(SrsError::Config(
                "intervals must satisfy 1 <= first <= second".into(),
            ));
        }
        if interval.max_days < interval.second_days {
            return Err(SrsError::Config(
                "max interval shorter than the second step".into(),
            ));
        }

        let rt = &self.response_time;
        if rt.fast_ms == 0 || rt.fast_ms > rt.slow_ms || rt.slow_ms > rt.max_ms {
            return Err(SrsError::Config(
                "response thresholds must satisfy 0 < fast <= slow <= max".into(),
            ));
        }

        if !(0.0..1.0).contains(&self.jitter.ratio) {
            return Err(SrsError::Config(format!(
                "jitter.ratio must be in [0, 1), got {}",
                self.jitter.ratio
            )));
        }
        check_range("jitter.maxDays", self.jitter.max_days, 0.0, f64::MAX)?;

        let queue = &self.queue;
        if queue.max_limit == 0 || queue.default_limit > queue.max_limit {
            return Err(SrsError::Config(
                "queue limits must satisfy 0 < default <= max".into(),
            ));
        }
        check_range("queue.maxBoostHours", queue.max_boost_hours, 0.0, f64::MAX)?;
        check_range("queue.priorityStepHours", queue.priority_step_hours, 0.0, f64::MAX)?;
        check_range("queue.bookmarkBoostHours", queue.bookmark_boost_hours, 0.0, f64::MAX)?;
        Ok(())
    }
}

/// Rejects NaN and infinities along with out-of-range values.
fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), SrsError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(SrsError::Config(format!(
            "{name} must be finite and within [{min}, {max}], got {value}"
        )))
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| env_parse(&value))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.trim().parse::<T>().ok()
}
