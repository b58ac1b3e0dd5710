use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, instrument};

use crate::config::EstimatorConfig;
use crate::estimation::schedule::{resolve_scheduled_at, resolve_timezone, scheduled_window};
use crate::estimation::{
    MAX_WAIT_MINUTES, PrepTimeCache, PrepTimeSampler, QueuePositionCounter, clamp, round_half_up,
};
use crate::order::model::{MerchantInfo, OrderSnapshot, OrderStatus, WaitEstimate};
use crate::order::repository::OrderRepository;
use crate::time::{Clock, minutes_between};

/// Accepted orders start moving sooner than their raw queue position implies.
const ACCEPTED_QUEUE_DAMPING: f64 = 0.7;

/// Total estimate bounds before elapsed time is subtracted.
const MIN_TOTAL_MINUTES: i64 = 5;

/// Band around the remaining-time point estimate.
const WINDOW_LOW_FACTOR: f64 = 0.75;
const WINDOW_HIGH_FACTOR: f64 = 1.25;

/// A `{min, max}` minute window before it is decorated with queue details.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub min: i64,
    pub max: i64,
    pub capped_at60: bool,
}

/// Computes customer-facing wait windows from the order's current status.
///
/// Stateless apart from the shared prep-time cache; every call re-reads the
/// queue and re-evaluates the status.
pub struct WaitEstimator {
    cache: Arc<PrepTimeCache>,
    sampler: PrepTimeSampler,
    queue: QueuePositionCounter,
    clock: Arc<dyn Clock>,
    default_timezone: Tz,
}

impl WaitEstimator {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        cache: Arc<PrepTimeCache>,
        clock: Arc<dyn Clock>,
        cfg: &EstimatorConfig,
    ) -> Self {
        Self {
            cache,
            sampler: PrepTimeSampler::new(
                Arc::clone(&repo),
                cfg.default_base_minutes,
                cfg.sample_limit,
            ),
            queue: QueuePositionCounter::new(repo),
            clock,
            default_timezone: cfg.default_timezone,
        }
    }

    /// Builds the estimator together with its own cache sized from `cfg`.
    pub fn from_config(
        repo: Arc<dyn OrderRepository>,
        clock: Arc<dyn Clock>,
        cfg: &EstimatorConfig,
    ) -> Self {
        let cache = Arc::new(PrepTimeCache::new(cfg.cache_ttl, cfg.cache_max_entries));
        Self::new(repo, cache, clock, cfg)
    }

    pub fn cache(&self) -> &Arc<PrepTimeCache> {
        &self.cache
    }

    #[instrument(
        skip(self, order, merchant),
        target = "estimator",
        fields(order_number = %order.order_number, status = %order.status)
    )]
    pub async fn estimate(&self, order: &OrderSnapshot, merchant: &MerchantInfo) -> WaitEstimate {
        if order.status.is_terminal() {
            return WaitEstimate::terminal(order.status.clone());
        }

        let base = self
            .base_prep_minutes(&merchant.merchant_id, &order.order_type)
            .await;
        let now = self.clock.now();

        if order.status.is_queued() {
            if let Some(w) = self.scheduled(order, merchant, now, base) {
                debug!(min = w.min, max = w.max, base, "scheduled-order window");
                return WaitEstimate {
                    min_minutes: w.min,
                    max_minutes: w.max,
                    capped_at60: w.capped_at60,
                    queue_ahead: 0,
                    queue_position: None,
                    base_prep_minutes: Some(base),
                    status: order.status.clone(),
                    is_scheduled: Some(true),
                };
            }
        }

        let (queue_ahead, queue_position) = if order.status.is_queued() {
            let ahead = self
                .queue
                .count_ahead(&merchant.merchant_id, &order.order_type, order.placed_at)
                .await;
            (ahead, Some(ahead + 1))
        } else {
            (0, None)
        };

        let multiplier = queue_multiplier(&order.status, queue_ahead);
        let elapsed_from = match &order.status {
            OrderStatus::InProgress => order.updated_at,
            _ => order.placed_at,
        };
        let elapsed = minutes_between(elapsed_from, now).max(0.0);

        let w = queue_window(base, multiplier, elapsed);
        debug!(
            queue_ahead,
            multiplier,
            elapsed,
            min = w.min,
            max = w.max,
            base,
            "queue-based window"
        );

        WaitEstimate {
            min_minutes: w.min,
            max_minutes: w.max,
            capped_at60: w.capped_at60,
            queue_ahead,
            queue_position,
            base_prep_minutes: Some(base),
            status: order.status.clone(),
            is_scheduled: Some(order.is_scheduled),
        }
    }

    async fn base_prep_minutes(&self, merchant_id: &str, order_type: &str) -> i64 {
        self.cache
            .get_or_compute(merchant_id, order_type, || {
                self.sampler.sample(merchant_id, order_type)
            })
            .await
    }

    /// Window for a future scheduled slot, or `None` to fall through to the
    /// queue computation.
    fn scheduled(
        &self,
        order: &OrderSnapshot,
        merchant: &MerchantInfo,
        now: DateTime<Utc>,
        base: i64,
    ) -> Option<Window> {
        if !order.is_scheduled {
            return None;
        }
        let (date, time) = (order.scheduled_date.as_deref()?, order.scheduled_time.as_deref()?);

        let tz = resolve_timezone(&merchant.timezone, self.default_timezone);
        let Some(at) = resolve_scheduled_at(date, time, tz) else {
            debug!(date, time, "scheduled slot unparsable; using queue estimate");
            return None;
        };

        scheduled_window(now, at, base)
    }
}

/// Scale applied to base prep time for the order's queue situation.
pub fn queue_multiplier(status: &OrderStatus, queue_ahead: i64) -> i64 {
    match status {
        OrderStatus::Pending => queue_ahead + 1,
        OrderStatus::Accepted => {
            let damped = ((queue_ahead + 1) as f64 * ACCEPTED_QUEUE_DAMPING).ceil() as i64;
            damped.max(1)
        }
        _ => 1,
    }
}

/// Total estimate for `base × multiplier`, clamped.
pub fn total_estimate(base_minutes: i64, multiplier: i64) -> i64 {
    clamp(
        round_half_up(base_minutes as f64 * multiplier as f64),
        MIN_TOTAL_MINUTES,
        MAX_WAIT_MINUTES,
    )
}

/// Window for the time still left after `elapsed_minutes`.
///
/// An overdue order shows `0..0` rather than a negative wait; in that case
/// `capped_at60` reports whether the total estimate itself saturated.
pub fn queue_window(base_minutes: i64, multiplier: i64, elapsed_minutes: f64) -> Window {
    let total = total_estimate(base_minutes, multiplier);
    let remaining = clamp(
        round_half_up(total as f64 - elapsed_minutes),
        0,
        MAX_WAIT_MINUTES,
    );

    if remaining <= 0 {
        return Window {
            min: 0,
            max: 0,
            capped_at60: total >= MAX_WAIT_MINUTES,
        };
    }

    let min = clamp(
        round_half_up(remaining as f64 * WINDOW_LOW_FACTOR),
        1,
        MAX_WAIT_MINUTES,
    );
    let max = clamp(
        round_half_up(remaining as f64 * WINDOW_HIGH_FACTOR),
        min,
        MAX_WAIT_MINUTES,
    );

    Window {
        min,
        max,
        capped_at60: max >= MAX_WAIT_MINUTES,
    }
}
