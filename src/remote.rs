//! Remote cache tier
//!
//! The coordinator talks to the remote (distributed) tier through the
//! narrow `RemoteStore` capability: try-get, set, delete by string key,
//! over opaque string payloads. The trait is injected at construction so
//! the coordinator never knows the concrete store and is fully testable
//! with in-memory fakes.
//!
//! `RedisRemoteStore` is the production implementation, built on a
//! `redis::aio::ConnectionManager` shared across clones.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::RemoteError;

/// Capability set the coordinator requires from the remote tier.
///
/// Implementations own their connection handling and may block or
/// suspend on network I/O; the coordinator never holds a local-tier lock
/// across these calls. A timeout must surface as `RemoteError::Timeout`,
/// never as an absent key.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the payload for `key`, or `None` if the key is absent.
    async fn try_get(&self, key: &str) -> Result<Option<String>, RemoteError>;

    /// Write `raw` under `key`, returning the store's success flag.
    async fn set(&self, key: &str, raw: &str) -> Result<bool, RemoteError>;

    /// Delete `key`, returning whether an entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, RemoteError>;
}

/// Redis-backed remote store.
#[derive(Clone)]
pub struct RedisRemoteStore {
    conn: redis::aio::ConnectionManager,
    op_timeout: Option<Duration>,
}

impl RedisRemoteStore {
    /// Connect via a connection manager (auto-reconnecting, cheap to
    /// clone per operation).
    pub async fn connect(client: redis::Client) -> Result<Self, redis::RedisError> {
        let conn = redis::aio::ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            op_timeout: None,
        })
    }

    /// Bound every operation with a timeout, surfaced as
    /// `RemoteError::Timeout`.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = Some(timeout);
        self
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, redis::RedisError>>,
    {
        match self.op_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(RemoteError::Timeout),
            },
            None => Ok(fut.await?),
        }
    }
}

#[async_trait]
impl RemoteStore for RedisRemoteStore {
    async fn try_get(&self, key: &str) -> Result<Option<String>, RemoteError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = self.bounded(conn.get(key)).await?;
        debug!(key, found = value.is_some(), "remote GET");
        Ok(value)
    }

    async fn set(&self, key: &str, raw: &str) -> Result<bool, RemoteError> {
        let mut conn = self.conn.clone();
        self.bounded(conn.set::<_, _, ()>(key, raw)).await?;
        debug!(key, "remote SET");
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool, RemoteError> {
        let mut conn = self.conn.clone();
        let removed: i64 = self.bounded(conn.del(key)).await?;
        debug!(key, removed, "remote DEL");
        Ok(removed > 0)
    }
}
