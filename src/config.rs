//! Cache configuration

/// Configuration for the two-tier cache
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Prefix prepended to the key's `Display` form to build the remote
    /// store key (e.g. `"cache:product:"`)
    pub remote_key_prefix: String,
    /// Coalesce concurrent misses for the same key into a single factory
    /// invocation and write-through. Off by default: without it, racing
    /// misses each invoke the factory and the last writer wins.
    pub single_flight: bool,
}
