use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{AnyPool, Row};

use crate::order::model::{MerchantInfo, OrderSnapshot, OrderStatus, PrepSample};
use crate::order::repository::OrderRepository;
use crate::time::{from_epoch_ms, to_epoch_ms};

/// SQLx-backed implementation of OrderRepository.
/// Responsible only for queries and row mapping.
///
/// Queries use `$N` placeholders, which both the sqlite and postgres drivers
/// accept through the Any pool.
pub struct SqlxOrderRepository {
    pool: AnyPool,
}

impl SqlxOrderRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqlxOrderRepository {
    async fn fetch_order_and_merchant(
        &self,
        order_number: &str,
    ) -> anyhow::Result<Option<(OrderSnapshot, MerchantInfo)>> {
        let row = sqlx::query(
            r#"
SELECT
  o.order_number, o.status, o.order_type,
  o.placed_at_ms, o.updated_at_ms,
  o.is_scheduled, o.scheduled_date, o.scheduled_time,
  m.merchant_id, m.merchant_code, m.timezone
FROM orders o
JOIN merchants m ON m.merchant_id = o.merchant_id
WHERE o.order_number = $1;
"#,
        )
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_order(&r)?)),
            None => Ok(None),
        }
    }

    async fn fetch_recent_completed(
        &self,
        merchant_id: &str,
        order_type: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PrepSample>> {
        let rows = sqlx::query(
            r#"
SELECT placed_at_ms, actual_ready_at_ms, completed_at_ms
FROM orders
WHERE merchant_id = $1
  AND order_type = $2
  AND status = 'COMPLETED'
  AND (actual_ready_at_ms IS NOT NULL OR completed_at_ms IS NOT NULL)
ORDER BY placed_at_ms DESC
LIMIT $3;
"#,
        )
        .bind(merchant_id)
        .bind(order_type)
        .bind(usize_to_i64(limit)?)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_sample(&r) {
                Ok(s) => out.push(s),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the sample set
                    tracing::warn!(error = %e, merchant_id, "skipping malformed sample row");
                }
            }
        }

        Ok(out)
    }

    async fn count_active_before(
        &self,
        merchant_id: &str,
        order_type: &str,
        before: DateTime<Utc>,
    ) -> anyhow::Result<i64> {
        let row = sqlx::query(
            r#"
SELECT COUNT(*) AS ahead
FROM orders
WHERE merchant_id = $1
  AND order_type = $2
  AND status IN ('PENDING', 'ACCEPTED', 'IN_PROGRESS')
  AND placed_at_ms < $3;
"#,
        )
        .bind(merchant_id)
        .bind(order_type)
        .bind(to_epoch_ms(before))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get::<i64, _>("ahead")?)
    }
}

/* =========================
Row mapping + conversions
========================= */

fn row_to_order(r: &sqlx::any::AnyRow) -> anyhow::Result<(OrderSnapshot, MerchantInfo)> {
    let status_str: String = r.try_get("status")?;
    let status: OrderStatus = status_str.parse().context("invalid order status")?;

    let order = OrderSnapshot {
        order_number: r.try_get("order_number")?,
        status,
        order_type: r.try_get("order_type")?,
        placed_at: ms_to_time(r.try_get("placed_at_ms")?)?,
        updated_at: ms_to_time(r.try_get("updated_at_ms")?)?,
        is_scheduled: r.try_get::<i64, _>("is_scheduled")? == 1,
        scheduled_date: r.try_get("scheduled_date")?,
        scheduled_time: r.try_get("scheduled_time")?,
    };

    let merchant = MerchantInfo {
        merchant_id: r.try_get("merchant_id")?,
        merchant_code: r.try_get("merchant_code")?,
        timezone: r.try_get("timezone")?,
    };

    Ok((order, merchant))
}

fn row_to_sample(r: &sqlx::any::AnyRow) -> anyhow::Result<PrepSample> {
    Ok(PrepSample {
        placed_at: ms_to_time(r.try_get("placed_at_ms")?)?,
        actual_ready_at: opt_ms_to_time(r.try_get("actual_ready_at_ms")?)?,
        completed_at: opt_ms_to_time(r.try_get("completed_at_ms")?)?,
    })
}

/* =========================
Numeric safety helpers
========================= */

fn ms_to_time(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    from_epoch_ms(ms).ok_or_else(|| anyhow!("epoch millis out of range: {ms}"))
}

fn opt_ms_to_time(ms: Option<i64>) -> anyhow::Result<Option<DateTime<Utc>>> {
    ms.map(ms_to_time).transpose()
}

fn usize_to_i64(v: usize) -> anyhow::Result<i64> {
    i64::try_from(v).map_err(|_| anyhow!("usize too large for i64: {v}"))
}
