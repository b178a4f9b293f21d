//! Pennant Core - Banner Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

pub mod banner;
pub mod error;
pub mod filter;

pub use banner::{Banner, BannerDraft, BannerId, FeatureId, TagId, Timestamp};
pub use error::{CacheError, ConfigError, PennantError, PennantResult, StorageError};
pub use filter::{BannerFilter, Page};
