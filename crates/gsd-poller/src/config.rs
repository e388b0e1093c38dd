use std::time::Duration;

/// How a poller pool picks work.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Walk the entire authoritative server set instead of draining the
    /// interest queue. Used for `poller --all`.
    pub passive: bool,
    /// How long a worker sleeps after finding the interest queue empty
    /// before retrying. Irrelevant in passive mode, which is fully
    /// continuous by design.
    pub idle_backoff: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            passive: false,
            idle_backoff: Duration::from_millis(100),
        }
    }
}
