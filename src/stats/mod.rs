//! Runtime statistics

pub mod metrics;

pub(crate) use metrics::CacheCounters;
pub use metrics::{CacheStats, ServerStats, SessionStats};
