use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Lifecycle status of an order as owned by the order-management side.
///
/// Statuses this service does not know are kept verbatim in `Other` and
/// treated as non-terminal, non-queued work.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Accepted,
    InProgress,
    Ready,
    Completed,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Ready => "READY",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Nothing left to wait for.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Ready | OrderStatus::Completed | OrderStatus::Cancelled
        )
    }

    /// Statuses that still occupy a kitchen slot for queue counting.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Accepted | OrderStatus::InProgress
        )
    }

    /// Statuses whose wait depends on how many orders are ahead.
    pub fn is_queued(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("blank order status")]
pub struct BlankStatus;

impl FromStr for OrderStatus {
    type Err = BlankStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(BlankStatus);
        }

        Ok(OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s))
            .unwrap_or_else(|| OrderStatus::Other(s.to_string())))
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Fields of the owning merchant the estimator reads.
#[derive(Clone, Debug)]
pub struct MerchantInfo {
    pub merchant_id: String,
    /// Public merchant code, part of the signed order token.
    pub merchant_code: String,
    /// IANA timezone name, e.g. `Asia/Jakarta`.
    pub timezone: String,
}

/// Read-only view of an order at request time. Never cached.
#[derive(Clone, Debug)]
pub struct OrderSnapshot {
    pub order_number: String,
    pub status: OrderStatus,
    /// Free-form, e.g. `DINE_IN`, `TAKEAWAY`, `DELIVERY`.
    pub order_type: String,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_scheduled: bool,
    /// Merchant-local `YYYY-MM-DD`.
    pub scheduled_date: Option<String>,
    /// Merchant-local `HH:MM` or `HH:MM:SS`.
    pub scheduled_time: Option<String>,
}

/// One historically completed order of a merchant+type.
#[derive(Clone, Debug)]
pub struct PrepSample {
    pub placed_at: DateTime<Utc>,
    pub actual_ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl PrepSample {
    /// Actual-ready time when recorded, else completion time.
    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.actual_ready_at.or(self.completed_at)
    }
}

/// Customer-facing wait window.
///
/// `is_scheduled` is `None` for terminal orders so it is left out of the
/// response body entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitEstimate {
    pub min_minutes: i64,
    pub max_minutes: i64,
    pub capped_at60: bool,
    pub queue_ahead: i64,
    pub queue_position: Option<i64>,
    pub base_prep_minutes: Option<i64>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_scheduled: Option<bool>,
}

impl WaitEstimate {
    pub fn terminal(status: OrderStatus) -> Self {
        Self {
            min_minutes: 0,
            max_minutes: 0,
            capped_at60: false,
            queue_ahead: 0,
            queue_position: None,
            base_prep_minutes: None,
            status,
            is_scheduled: None,
        }
    }
}
