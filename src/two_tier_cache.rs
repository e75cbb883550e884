//! Two-tier cache coordinator
//!
//! Composes the local store, the remote store accessor, and the value
//! codec into the public `get`/`set`/`remove` surface:
//! - `get` resolves across both tiers and, on a full miss, invokes the
//!   caller-supplied factory and writes the produced value through to
//!   both tiers before returning it.
//! - `set` writes the local tier unconditionally, then the remote tier.
//! - `remove` drops the key from both tiers.
//!
//! The remote store and codec are injected at construction; the factory
//! is supplied per call, so one coordinator instance serves arbitrary
//! producers for the same key/value shape.
//!
//! No local-tier lock is ever held across a remote await. By default,
//! concurrent misses for the same key each invoke their own factory and
//! the last write-through wins; `CacheConfig::single_flight` opts in to
//! coalescing them into one invocation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::{debug, warn};

use crate::codec::ValueCodec;
use crate::config::CacheConfig;
use crate::decision::{Decision, Resolution, resolve};
use crate::error::{BoxError, CacheError};
use crate::local_store::{CacheKey, CacheValue, LocalStore};
use crate::remote::RemoteStore;

/// Handle onto an in-flight factory production that other misses for the
/// same key can wait on. Errors cross the channel as strings so waiters
/// each get an owned copy.
type InFlightRx<V> = watch::Receiver<Option<Result<Arc<V>, String>>>;
type InFlightTx<V> = watch::Sender<Option<Result<Arc<V>, String>>>;

/// Guard that keeps the in-flight map consistent even if the producing
/// task panics or is cancelled: on drop, waiters are notified with an
/// error and the map entry is removed.
struct InFlightGuard<K: CacheKey, V: CacheValue> {
    key: K,
    in_flight: Arc<RwLock<HashMap<K, InFlightRx<V>>>>,
    tx: Option<InFlightTx<V>>,
}

impl<K: CacheKey, V: CacheValue> InFlightGuard<K, V> {
    fn new(
        key: K,
        in_flight: Arc<RwLock<HashMap<K, InFlightRx<V>>>>,
        tx: InFlightTx<V>,
    ) -> Self {
        Self {
            key,
            in_flight,
            tx: Some(tx),
        }
    }

    /// Publish the production result to waiters, consuming the guard.
    fn complete(mut self, result: Result<Arc<V>, String>) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(result));
        }
    }
}

impl<K: CacheKey, V: CacheValue> Drop for InFlightGuard<K, V> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Some(Err("production was cancelled or panicked".to_owned())));
        }

        // Never block in drop; clean the map entry up asynchronously.
        let key = self.key.clone();
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            let mut guard = in_flight.write().await;
            guard.remove(&key);
        });
    }
}

struct TwoTierCacheInner<K, V, R, C>
where
    K: CacheKey,
    V: CacheValue,
    R: RemoteStore,
    C: ValueCodec<V>,
{
    local: LocalStore<K, V>,
    remote: R,
    codec: C,
    config: CacheConfig,
    in_flight: Arc<RwLock<HashMap<K, InFlightRx<V>>>>,
}

/// Two-tier cache coordinator.
///
/// Owns the local tier; references the remote tier, which is an
/// externally managed resource the coordinator never closes. Cloning is
/// cheap and clones share both tiers.
pub struct TwoTierCache<K, V, R, C>
where
    K: CacheKey,
    V: CacheValue,
    R: RemoteStore,
    C: ValueCodec<V>,
{
    inner: Arc<TwoTierCacheInner<K, V, R, C>>,
}

impl<K, V, R, C> Clone for TwoTierCache<K, V, R, C>
where
    K: CacheKey,
    V: CacheValue,
    R: RemoteStore,
    C: ValueCodec<V>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, R, C> TwoTierCache<K, V, R, C>
where
    K: CacheKey,
    V: CacheValue,
    R: RemoteStore,
    C: ValueCodec<V>,
{
    pub fn new(remote: R, codec: C, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(TwoTierCacheInner {
                local: LocalStore::new(),
                remote,
                codec,
                config,
                in_flight: Arc::new(RwLock::new(HashMap::new())),
            }),
        }
    }

    fn remote_key(&self, key: &K) -> String {
        format!("{}{}", self.inner.config.remote_key_prefix, key)
    }

    /// Get the value for `key`, producing it with `factory` on a full
    /// miss.
    ///
    /// Returns the value together with the [`Decision`] that resolved
    /// it. On `ReturnFactory`, the produced value is written into the
    /// local tier and then through to the remote tier before this
    /// returns, so a subsequent `get` for the same key resolves as
    /// `ReturnLocal`.
    pub async fn get<F, Fut>(&self, key: &K, factory: F) -> Result<(Decision, Arc<V>), CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, BoxError>>,
    {
        let remote_key = self.remote_key(key);
        let resolution = resolve(
            &self.inner.local,
            &self.inner.remote,
            &self.inner.codec,
            key,
            &remote_key,
        )
        .await?;

        match resolution {
            Resolution::Local(value) => Ok((Decision::ReturnLocal, value)),
            Resolution::Distributed(value) => Ok((Decision::ReturnDistributed, value)),
            Resolution::Miss => {
                let value = if self.inner.config.single_flight {
                    self.produce_coalesced(key, &remote_key, factory).await?
                } else {
                    self.produce(key, &remote_key, factory).await?
                };
                Ok((Decision::ReturnFactory, value))
            }
        }
    }

    /// Write `value` into both tiers.
    ///
    /// The local write is synchronous and always succeeds; the returned
    /// flag is the remote store's. Remote transport failures propagate
    /// as errors after the local tier has already been updated.
    pub async fn set(&self, key: K, value: V) -> Result<bool, CacheError> {
        let remote_key = self.remote_key(&key);
        let value = Arc::new(value);
        self.inner.local.set(key, Arc::clone(&value));

        let raw = self
            .inner
            .codec
            .serialize(&value)
            .map_err(CacheError::Codec)?;
        Ok(self.inner.remote.set(&remote_key, &raw).await?)
    }

    /// Remove `key` from both tiers.
    ///
    /// The local removal is best-effort (a no-op if absent); the
    /// returned flag is the remote deletion's. The two removals are not
    /// transactional: the remote tier stays authoritative if only the
    /// local removal lands.
    pub async fn remove(&self, key: &K) -> Result<bool, CacheError> {
        self.inner.local.remove(key);
        let remote_key = self.remote_key(key);
        Ok(self.inner.remote.delete(&remote_key).await?)
    }

    /// Invoke the factory and write the result through to both tiers.
    async fn produce<F, Fut>(&self, key: &K, remote_key: &str, factory: F) -> Result<Arc<V>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, BoxError>>,
    {
        let value = factory().await.map_err(CacheError::Factory)?;
        let value = Arc::new(value);

        // Local first, so readers arriving after this call returns hit
        // locally even if the remote write is still propagating.
        self.inner.local.set(key.clone(), Arc::clone(&value));

        let raw = self
            .inner
            .codec
            .serialize(&value)
            .map_err(CacheError::Codec)?;
        if !self.inner.remote.set(remote_key, &raw).await? {
            warn!(%key, "remote tier rejected write-through");
        }

        debug!(%key, "produced and wrote through");
        Ok(value)
    }

    /// Single-flight production: concurrent misses for the same key
    /// share one factory invocation and one write-through.
    async fn produce_coalesced<F, Fut>(
        &self,
        key: &K,
        remote_key: &str,
        factory: F,
    ) -> Result<Arc<V>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, BoxError>>,
    {
        // Fast path: another caller is already producing this key.
        {
            let in_flight = self.inner.in_flight.read().await;
            if let Some(rx) = in_flight.get(key) {
                let rx = rx.clone();
                drop(in_flight);
                debug!(%key, "waiting on in-flight production");
                return Self::wait_in_flight(rx).await;
            }
        }

        let (tx, rx) = watch::channel(None);
        let guard = {
            let mut in_flight = self.inner.in_flight.write().await;
            // Double-check: another caller may have registered while we
            // waited for the write lock.
            if let Some(existing) = in_flight.get(key) {
                let rx = existing.clone();
                drop(in_flight);
                debug!(%key, "waiting on in-flight production (registration race)");
                return Self::wait_in_flight(rx).await;
            }
            in_flight.insert(key.clone(), rx);
            InFlightGuard::new(key.clone(), Arc::clone(&self.inner.in_flight), tx)
        };

        let result = self.produce(key, remote_key, factory).await;
        guard.complete(match &result {
            Ok(value) => Ok(Arc::clone(value)),
            Err(e) => Err(e.to_string()),
        });
        result
    }

    async fn wait_in_flight(mut rx: InFlightRx<V>) -> Result<Arc<V>, CacheError> {
        loop {
            if let Some(result) = rx.borrow().as_ref() {
                return match result {
                    Ok(value) => Ok(Arc::clone(value)),
                    Err(msg) => Err(CacheError::Factory(msg.clone().into())),
                };
            }
            if rx.changed().await.is_err() {
                return Err(CacheError::Factory(
                    "in-flight production was cancelled".into(),
                ));
            }
        }
    }
}
