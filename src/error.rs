use thiserror::Error;

/// Errors raised by the aggregation engine.
///
/// Parameter problems are fatal at configuration load; a malformed sample
/// fails only the refresh cycle that saw it (the caller keeps showing its
/// last good snapshot). An undefined baseline comparison is *not* an error,
/// it is an absent value on [`crate::rolling::WindowDelta`].
#[derive(Debug, Error)]
pub enum MarketError {
    /// A sample is missing a required value. Never silently zero-filled:
    /// a coerced zero would corrupt every average downstream.
    #[error("malformed sample at block {block}: {reason}")]
    MalformedSample { block: u64, reason: String },

    /// Protocol parameters violate `0 < target < max`.
    #[error("invalid protocol parameters: {0}")]
    InvalidParams(String),
}
