//! The CLI's exit-status contract: `OK=0`, `FATAL_ERROR=1`,
//! `UNEXPECTED_ERROR=2`, ported from the original implementation's
//! `ExitStatus` enum and its top-level try/except dispatch.

use std::fmt;

/// Process exit code for a completed subcommand invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Ok = 0,
    FatalError = 1,
    UnexpectedError = 2,
}

/// An error surfaced by a subcommand that distinguishes `FatalError` (a
/// recognized, unrecoverable condition — a lost cache connection, a bind
/// failure) from anything else, which is treated as `UnexpectedError`.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Fatal(#[from] FatalError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl CliError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            CliError::Fatal(_) => ExitStatus::FatalError,
            CliError::Unexpected(_) => ExitStatus::UnexpectedError,
        }
    }
}

/// The recognized unrecoverable failures: a Redis connection lost or
/// never established, a master-server sync pass hitting a cache error, or
/// the websocket gateway failing to bind or being killed by a fatal cache
/// error from a client connection.
#[derive(Debug, thiserror::Error)]
pub enum FatalError {
    #[error("cache error: {0}")]
    Cache(#[from] gsd_cache::CacheError),
    #[error("sync error: {0}")]
    Sync(#[from] gsd_sync::SyncError),
    #[error("websocket gateway error: {0}")]
    WebSocket(#[from] gsd_websocket::WebSocketError),
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = *self as u8;
        write!(f, "{code}")
    }
}
