use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use crate::logger::warn_if_slow;
use crate::order::repository::OrderRepository;

/// Counts active orders ahead of a given placement time.
pub struct QueuePositionCounter {
    repo: Arc<dyn OrderRepository>,
}

impl QueuePositionCounter {
    pub fn new(repo: Arc<dyn OrderRepository>) -> Self {
        Self { repo }
    }

    /// Fails open: a store error reads as an empty queue.
    #[instrument(skip(self), target = "queue")]
    pub async fn count_ahead(
        &self,
        merchant_id: &str,
        order_type: &str,
        placed_at: DateTime<Utc>,
    ) -> i64 {
        let counted = warn_if_slow(
            "db_count_active_before",
            Duration::from_millis(100),
            self.repo
                .count_active_before(merchant_id, order_type, placed_at),
        )
        .await;

        match counted {
            Ok(n) => n.max(0),
            Err(e) => {
                warn!(error = %e, "queue count failed; assuming nothing ahead");
                0
            }
        }
    }
}
