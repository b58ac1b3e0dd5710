use tracing::{Span, field};

use super::TraceId;

/// Root span for one inbound request. `order_number` and `merchant_id` start
/// empty and are recorded once the order is resolved.
pub fn request_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "request",
        name = %name,
        trace_id = %trace_id.as_str(),
        order_number = field::Empty,
        merchant_id = field::Empty
    )
}

/// Child span (inherits trace_id through the span tree).
pub fn child_span(name: &'static str) -> Span {
    tracing::info_span!("child", name = %name)
}
