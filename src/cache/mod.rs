//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration and an opt-in LRU
//! capacity bound.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;


use std::time::Duration;

// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub(crate) use entry::CacheEntry;
pub(crate) use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{get_or_fetch, SharedCache, TtlCache};

// == Public Constants ==
/// Lifetime of an entry stored without an explicit TTL
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
