use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Span, field, warn};

/// Records the resolved order on the current request span.
pub fn annotate_span(order_number: &str, merchant_id: Option<&str>) {
    let span = Span::current();
    span.record("order_number", field::display(order_number));
    if let Some(mid) = merchant_id {
        span.record("merchant_id", field::display(mid));
    }
}

/// Awaits a store call and warns under the `performance` target when it ran
/// past `budget`. Measured on the tokio clock.
pub async fn warn_if_slow<F, T>(operation: &'static str, budget: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let started = Instant::now();
    let out = fut.await;

    let elapsed = started.elapsed();
    if elapsed > budget {
        warn!(
            target: "performance",
            operation,
            budget_ms = budget.as_millis() as u64,
            elapsed_ms = elapsed.as_millis() as u64,
            "store call over budget"
        );
    }
    out
}
