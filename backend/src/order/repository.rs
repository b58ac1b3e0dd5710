use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::order::model::{MerchantInfo, OrderSnapshot, PrepSample};

/// Read access to orders and merchants needed by the estimator.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// `Ok(None)` when no such order exists.
    async fn fetch_order_and_merchant(
        &self,
        order_number: &str,
    ) -> Result<Option<(OrderSnapshot, MerchantInfo)>>;

    /// Most recently placed `COMPLETED` orders of this merchant+type that carry
    /// an actual-ready or completed timestamp, newest first.
    async fn fetch_recent_completed(
        &self,
        merchant_id: &str,
        order_type: &str,
        limit: usize,
    ) -> Result<Vec<PrepSample>>;

    /// Active (`PENDING`, `ACCEPTED`, `IN_PROGRESS`) orders of this
    /// merchant+type placed strictly before `before`.
    async fn count_active_before(
        &self,
        merchant_id: &str,
        order_type: &str,
        before: DateTime<Utc>,
    ) -> Result<i64>;
}
