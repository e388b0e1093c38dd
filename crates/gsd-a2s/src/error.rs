use thiserror::Error;

/// A transient A2S query failure. Always logged by the caller, never
/// fatal; the address being polled is simply skipped for this cycle.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("server did not respond within the query timeout")]
    NoResponse,
    #[error("server sent a malformed or truncated response: {0}")]
    BrokenMessage(String),
    #[error("server uses multi-packet compressed responses, which are not supported")]
    CompressedFragmentUnsupported,
}

/// Best-effort classification of the underlying `a2s` crate error into
/// one of the three kinds the spec names. The crate doesn't expose a
/// stable enum for this, so we pattern-match on the rendered message.
pub(crate) fn classify(err: &a2s::errors::Error) -> PollError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("compressed") {
        PollError::CompressedFragmentUnsupported
    } else if lowered.contains("timed out") || lowered.contains("timeout") {
        PollError::NoResponse
    } else {
        PollError::BrokenMessage(message)
    }
}
