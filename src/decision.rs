//! Lookup resolution
//!
//! The decision engine classifies how a lookup was satisfied: local hit,
//! remote hit, or full miss. It is the only place the two tiers are
//! consulted in order, and its only side effect is populating the local
//! tier when the remote tier hits, so a repeat lookup for the same key
//! resolves locally.

use std::sync::Arc;

use tracing::debug;

use crate::codec::ValueCodec;
use crate::error::CacheError;
use crate::local_store::{CacheKey, CacheValue, LocalStore};
use crate::remote::RemoteStore;

/// Classification of how a lookup was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    /// The local tier held the value.
    ReturnLocal,
    /// The remote tier held the value; the local tier was populated.
    ReturnDistributed,
    /// Both tiers missed; the factory must produce the value.
    ReturnFactory,
    /// Reserved. Part of the decision vocabulary but never produced by
    /// resolution.
    SetDistributed,
}

/// Resolution outcome carrying the value alongside its classification,
/// so callers match exhaustively instead of pairing a decision tag with
/// a maybe-value.
#[derive(Debug)]
pub(crate) enum Resolution<V> {
    Local(Arc<V>),
    Distributed(Arc<V>),
    Miss,
}

impl<V> Resolution<V> {
    pub(crate) fn decision(&self) -> Decision {
        match self {
            Resolution::Local(_) => Decision::ReturnLocal,
            Resolution::Distributed(_) => Decision::ReturnDistributed,
            Resolution::Miss => Decision::ReturnFactory,
        }
    }
}

/// Resolve `key` across the two tiers.
///
/// Local hit wins. On a local miss the remote tier is consulted; a
/// remote hit is deserialized, written into the local store, and
/// returned. A payload that exists but fails to deserialize is a
/// `Corrupt` error, never a miss. Remote errors and timeouts propagate.
pub(crate) async fn resolve<K, V, R, C>(
    local: &LocalStore<K, V>,
    remote: &R,
    codec: &C,
    key: &K,
    remote_key: &str,
) -> Result<Resolution<V>, CacheError>
where
    K: CacheKey,
    V: CacheValue,
    R: RemoteStore,
    C: ValueCodec<V>,
{
    if let Some(value) = local.get(key) {
        debug!(%key, "local tier hit");
        return Ok(Resolution::Local(value));
    }

    match remote.try_get(remote_key).await? {
        Some(raw) => {
            debug!(%key, "remote tier hit");
            let value = codec.deserialize(&raw).map_err(CacheError::Corrupt)?;
            let value = Arc::new(value);
            local.set(key.clone(), Arc::clone(&value));
            Ok(Resolution::Distributed(value))
        }
        None => {
            debug!(%key, "both tiers missed");
            Ok(Resolution::Miss)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::error::RemoteError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory remote store; `fail` forces every call to error.
    struct FakeRemote {
        entries: Mutex<HashMap<String, String>>,
        fail: bool,
    }

    impl FakeRemote {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                fail: false,
            }
        }

        fn with(entries: &[(&str, &str)]) -> Self {
            let map = entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect();
            Self {
                entries: Mutex::new(map),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl RemoteStore for FakeRemote {
        async fn try_get(&self, key: &str) -> Result<Option<String>, RemoteError> {
            if self.fail {
                return Err(RemoteError::Timeout);
            }
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set(&self, key: &str, raw: &str) -> Result<bool, RemoteError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_owned(), raw.to_owned());
            Ok(true)
        }

        async fn delete(&self, key: &str) -> Result<bool, RemoteError> {
            Ok(self.entries.lock().unwrap().remove(key).is_some())
        }
    }

    #[tokio::test]
    async fn test_local_hit_skips_remote() {
        let local: LocalStore<String, String> = LocalStore::new();
        local.set("p1".to_owned(), Arc::new("Widget".to_owned()));
        // Remote would time out if consulted
        let remote = FakeRemote {
            entries: Mutex::new(HashMap::new()),
            fail: true,
        };

        let res = resolve(&local, &remote, &JsonCodec, &"p1".to_owned(), "p1")
            .await
            .unwrap();
        assert_eq!(res.decision(), Decision::ReturnLocal);
        match res {
            Resolution::Local(v) => assert_eq!(v.as_str(), "Widget"),
            _ => panic!("expected local hit"),
        }
    }

    #[tokio::test]
    async fn test_remote_hit_populates_local() {
        let local: LocalStore<String, String> = LocalStore::new();
        let remote = FakeRemote::with(&[("p2", "\"Gizmo\"")]);

        let res = resolve(&local, &remote, &JsonCodec, &"p2".to_owned(), "p2")
            .await
            .unwrap();
        assert_eq!(res.decision(), Decision::ReturnDistributed);
        assert_eq!(local.get(&"p2".to_owned()).unwrap().as_str(), "Gizmo");
    }

    #[tokio::test]
    async fn test_double_miss_is_factory() {
        let local: LocalStore<String, String> = LocalStore::new();
        let remote = FakeRemote::new();

        let res = resolve(&local, &remote, &JsonCodec, &"p3".to_owned(), "p3")
            .await
            .unwrap();
        assert_eq!(res.decision(), Decision::ReturnFactory);
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_payload_is_not_a_miss() {
        let local: LocalStore<String, String> = LocalStore::new();
        let remote = FakeRemote::with(&[("p4", "{not json")]);

        let err = resolve(&local, &remote, &JsonCodec, &"p4".to_owned(), "p4")
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Corrupt(_)));
        // The corrupt entry must not leak into the local tier
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn test_remote_error_propagates() {
        let local: LocalStore<String, String> = LocalStore::new();
        let remote = FakeRemote {
            entries: Mutex::new(HashMap::new()),
            fail: true,
        };

        let err = resolve(&local, &remote, &JsonCodec, &"p5".to_owned(), "p5")
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Remote(RemoteError::Timeout)));
    }
}
