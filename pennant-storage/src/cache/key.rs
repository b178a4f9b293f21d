//! Cache key derivation for (tag, feature) banner lookups.
//!
//! Keys are the SHA-256 digest of the decimal tag and feature ids joined by
//! a separator, rendered as lowercase hex. The separator matters: without it
//! the pairs (1, 23) and (12, 3) would concatenate to the same input and
//! collide. Key derivation is pure and deterministic, so any two processes
//! sharing a backend address the same entries.

use pennant_core::{FeatureId, TagId};
use sha2::{Digest, Sha256};

/// Separator between the tag and feature components of the digest input.
const SEPARATOR: u8 = b':';

/// A derived cache key for a (tag, feature) banner lookup.
///
/// Always 64 lowercase hex characters regardless of input magnitude. Order
/// sensitive: the tag component always comes first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BannerKey(String);

impl BannerKey {
    /// Derive the cache key for a (tag, feature) pair.
    pub fn derive(tag_id: TagId, feature_id: FeatureId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(tag_id.as_i64().to_string().as_bytes());
        hasher.update([SEPARATOR]);
        hasher.update(feature_id.as_i64().to_string().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The hex form used as the backend storage key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BannerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = BannerKey::derive(TagId::new(4), FeatureId::new(9));
        let b = BannerKey::derive(TagId::new(4), FeatureId::new(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_is_64_hex_chars() {
        let key = BannerKey::derive(TagId::new(i64::MAX), FeatureId::new(i64::MIN));
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key.as_str(), key.as_str().to_lowercase());
    }

    #[test]
    fn test_order_sensitive() {
        let ab = BannerKey::derive(TagId::new(3), FeatureId::new(8));
        let ba = BannerKey::derive(TagId::new(8), FeatureId::new(3));
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_concatenation_ambiguity_resolved() {
        // Without a separator, "1" + "23" and "12" + "3" hash identically.
        let first = BannerKey::derive(TagId::new(1), FeatureId::new(23));
        let second = BannerKey::derive(TagId::new(12), FeatureId::new(3));
        assert_ne!(first, second);
    }

    #[test]
    fn test_negative_ids_are_distinct() {
        let neg = BannerKey::derive(TagId::new(-1), FeatureId::new(5));
        let pos = BannerKey::derive(TagId::new(1), FeatureId::new(5));
        assert_ne!(neg, pos);
    }
}
