//! Error kinds surfaced by the cache and its notifier.

use thiserror::Error;

/// Programming errors in cache usage, plus any transient Redis failure.
///
/// Redis errors are never retried locally; they propagate to the caller,
/// which for the `poller`/`sync`/`websocket` subcommands means turning
/// into a `FatalError` that kills the process.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("interesting() called while an item is already active on this handle")]
    ActiveItemAlreadySet,
    #[error("update_interest_queue() called with no active item")]
    NoActiveItem,
    #[error("queue item could not be decoded")]
    MalformedQueueItem,
}

/// `interesting()`'s own error type: an empty queue is an expected,
/// distinct outcome from a Redis-level failure, so callers can match on
/// it without downcasting.
#[derive(Debug, Error)]
pub enum InterestingError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("interest queue is empty")]
    EmptyQueue,
}

/// Misuse of a [`crate::Notifier`]: publishing while in watch mode or
/// vice versa, or watching before any watch call has been made.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("notifier is already in publish mode")]
    AlreadyPublishing,
    #[error("notifier is already in watch mode")]
    AlreadyWatching,
    #[error("notifier has not been put into watch mode")]
    NotWatching,
    #[error("notification channel closed")]
    ChannelClosed,
    #[error("received a notification with a malformed payload")]
    MalformedPayload,
}
