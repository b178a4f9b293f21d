//! Cache layer for banner lookups.
//!
//! The cache is an optimization layer over the banner store: a hit serves a
//! possibly stale copy, a miss falls through to storage. Entries carry an
//! expiry deadline and expired entries read as misses.

pub mod key;
pub mod lmdb_backend;
pub mod memory;
pub mod traits;

pub use key::BannerKey;
pub use lmdb_backend::{LmdbBannerCache, LmdbCacheError};
pub use memory::MemoryBannerCache;
pub use traits::BannerCache;
