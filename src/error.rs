//! Cache error types

/// Boxed error type used at injected seams (factory, codec).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors reported by a remote store implementation.
///
/// All variants are transient from the coordinator's point of view:
/// callers may retry or fall back to treating the key as absent. The
/// coordinator itself never retries and never converts a remote error
/// into a miss, so a timed-out remote entry is never masked as absent.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote operation timed out")]
    Timeout,

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("remote store error: {0}")]
    Other(#[source] BoxError),
}

/// Cache-related errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The remote tier failed or timed out. Recoverable by the caller.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// A remote payload exists but could not be deserialized. Fatal for
    /// the lookup; treating it as a miss would mask data loss.
    #[error("corrupt remote payload: {0}")]
    Corrupt(#[source] BoxError),

    /// A value could not be serialized for write-through.
    #[error("serialization error: {0}")]
    Codec(#[source] BoxError),

    /// The caller-supplied factory failed.
    #[error("factory error: {0}")]
    Factory(#[source] BoxError),
}
