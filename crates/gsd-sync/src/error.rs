use thiserror::Error;

use gsd_cache::CacheError;

/// Failures synchronising against the upstream master-server directory.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No response within the per-request timeout. Recoverable: the
    /// caller logs and moves on to the next region.
    #[error("master server query timed out")]
    Timeout,
    /// A response arrived but didn't match the expected packet shape.
    #[error("malformed master server response")]
    MalformedResponse,
    #[error("master server socket error: {0}")]
    Io(#[from] std::io::Error),
    /// A cache write failed. Unlike the two variants above, this is
    /// fatal and kills the enclosing subcommand.
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}
