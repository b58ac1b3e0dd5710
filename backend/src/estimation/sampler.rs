use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::estimation::{MAX_BASE_MINUTES, MIN_BASE_MINUTES, clamp, round_half_up};
use crate::logger::warn_if_slow;
use crate::order::model::PrepSample;
use crate::order::repository::OrderRepository;
use crate::time::minutes_between;

/// Fewer valid samples than this and the default is used instead.
pub const MIN_VALID_SAMPLES: usize = 5;

/// Durations outside this range (minutes) are treated as bad data.
pub const MIN_SAMPLE_MINUTES: f64 = 2.0;
pub const MAX_SAMPLE_MINUTES: f64 = 120.0;

/// Derives a merchant+type "typical prep minutes" figure from recent history.
pub struct PrepTimeSampler {
    repo: Arc<dyn OrderRepository>,
    default_minutes: i64,
    limit: usize,
}

impl PrepTimeSampler {
    pub fn new(repo: Arc<dyn OrderRepository>, default_minutes: i64, limit: usize) -> Self {
        Self {
            repo,
            default_minutes: clamp(default_minutes, MIN_BASE_MINUTES, MAX_BASE_MINUTES),
            limit,
        }
    }

    pub fn default_minutes(&self) -> i64 {
        self.default_minutes
    }

    /// Never fails: a store error counts as "no history".
    #[instrument(skip(self), target = "sampler")]
    pub async fn sample(&self, merchant_id: &str, order_type: &str) -> i64 {
        let fetched = warn_if_slow(
            "db_fetch_recent_completed",
            Duration::from_millis(200),
            self.repo
                .fetch_recent_completed(merchant_id, order_type, self.limit),
        )
        .await;

        let samples = match fetched {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "prep sample fetch failed; using default base");
                return self.default_minutes;
            }
        };

        let base = base_from_samples(&samples, self.default_minutes);
        debug!(fetched = samples.len(), base, "base prep minutes sampled");
        base
    }
}

/// Prep durations in minutes that fall inside the valid range.
pub fn valid_durations(samples: &[PrepSample]) -> Vec<f64> {
    samples
        .iter()
        .filter_map(|s| Some(minutes_between(s.placed_at, s.ready_at()?)))
        .filter(|m| (MIN_SAMPLE_MINUTES..=MAX_SAMPLE_MINUTES).contains(m))
        .collect()
}

/// Median; the mean of the two middle values for an even count.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Rounded, clamped median of the valid durations, or `default_minutes` when
/// fewer than [`MIN_VALID_SAMPLES`] remain.
pub fn base_from_samples(samples: &[PrepSample], default_minutes: i64) -> i64 {
    let mut durations = valid_durations(samples);
    if durations.len() < MIN_VALID_SAMPLES {
        return default_minutes;
    }

    match median(&mut durations) {
        Some(m) => clamp(round_half_up(m), MIN_BASE_MINUTES, MAX_BASE_MINUTES),
        None => default_minutes,
    }
}
