//! Value serialization for the remote tier
//!
//! The coordinator never inspects a value's structure; everything that
//! crosses to the remote store goes through a `ValueCodec`. Codecs must
//! round-trip: `deserialize(serialize(v)) == v` for every value the
//! coordinator stores.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::BoxError;

/// Encodes values to and from the opaque string payloads held by the
/// remote tier.
pub trait ValueCodec<V>: Send + Sync {
    fn serialize(&self, value: &V) -> Result<String, BoxError>;

    fn deserialize(&self, raw: &str) -> Result<V, BoxError>;
}

/// JSON codec over serde
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<V> ValueCodec<V> for JsonCodec
where
    V: Serialize + DeserializeOwned,
{
    fn serialize(&self, value: &V) -> Result<String, BoxError> {
        Ok(serde_json::to_string(value)?)
    }

    fn deserialize(&self, raw: &str) -> Result<V, BoxError> {
        Ok(serde_json::from_str(raw)?)
    }
}
