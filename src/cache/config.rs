//! Quiz cache configuration

use std::time::Duration;

/// Configuration for the quiz content cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Base lifetime of a cached quiz (zero = never expire)
    ///
    /// Each entry gets up to 10% extra on top so entries written together
    /// do not expire together.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
        }
    }
}

impl CacheConfig {
    /// Set the base TTL
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Keep entries forever
    pub fn no_expiry(mut self) -> Self {
        self.ttl = Duration::ZERO;
        self
    }

    /// Check if entries expire at all
    pub fn expires(&self) -> bool {
        !self.ttl.is_zero()
    }
}
