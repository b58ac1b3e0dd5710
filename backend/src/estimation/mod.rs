//! Wait-time estimation: historical prep sampling, its short-lived cache,
//! queue counting and the final window computation.

pub mod cache;
pub mod queue;
pub mod sampler;
pub mod schedule;
pub mod window;

pub use cache::PrepTimeCache;
pub use queue::QueuePositionCounter;
pub use sampler::PrepTimeSampler;
pub use window::WaitEstimator;

/// Upper bound of any window the customer sees.
pub const MAX_WAIT_MINUTES: i64 = 60;

/// Bounds of the base prep figure.
pub const MIN_BASE_MINUTES: i64 = 5;
pub const MAX_BASE_MINUTES: i64 = 60;

/// Rounds half-up (`2.5 -> 3`, `-2.5 -> -2`).
pub(crate) fn round_half_up(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Clamp that never panics: `lo` wins when the bounds cross.
pub(crate) fn clamp(v: i64, lo: i64, hi: i64) -> i64 {
    v.min(hi).max(lo)
}
