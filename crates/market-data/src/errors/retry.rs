/// Classification for retry policy.
///
/// Used by [`with_retry`](crate::provider::with_retry) to decide whether a
/// failed provider call is worth repeating.
///
/// | Class | Retried? |
/// |-------|----------|
/// | `Never` | No |
/// | `WithBackoff` | Yes, after an exponentially growing delay |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, unsupported operation, or malformed data.
    /// The request is fundamentally invalid and retrying won't help.
    Never,

    /// Retry after a delay.
    ///
    /// Used for transient errors like rate limiting (429), timeouts and
    /// dropped connections.
    WithBackoff,
}
