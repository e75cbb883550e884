//! duocache - Two-tier caching library
//!
//! This library provides a generic two-tier caching strategy:
//! - Local tier: in-process concurrent map (fastest, non-durable)
//! - Remote tier: external key-value store (durable, shared across
//!   instances, source of truth on local miss)
//!
//! The cache supports:
//! - Lookup resolution across both tiers with an explicit [`Decision`]
//!   classifying every hit and miss
//! - On-miss value production via a caller-supplied factory, with
//!   write-through population of both tiers
//! - Pluggable remote stores ([`RemoteStore`]) and value codecs
//!   ([`ValueCodec`]), injected at construction
//! - Optional single-flight coalescing of concurrent misses
//!
//! The local tier is unbounded and never evicts; the remote tier is
//! authoritative whenever the local tier lacks a key.

mod codec;
mod config;
mod decision;
mod error;
mod local_store;
mod memo;
mod remote;
mod two_tier_cache;

pub use codec::{JsonCodec, ValueCodec};
pub use config::CacheConfig;
pub use decision::Decision;
pub use error::{BoxError, CacheError, RemoteError};
pub use local_store::{CacheKey, CacheValue, LocalStore};
pub use memo::Memo;
pub use remote::{RedisRemoteStore, RemoteStore};
pub use two_tier_cache::TwoTierCache;

// Re-export async_trait for implementing RemoteStore downstream
pub use async_trait::async_trait;
