//! Error types for pennant operations

use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Banner not found")]
    NotFound,

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Cache layer errors.
///
/// A cache miss is NOT an error: gateway reads return `Option` and reserve
/// this type for genuine failures (backend fault, corrupt entry). Callers
/// must never treat a `CacheError` as a miss.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Serialization error: {reason}")]
    Serialization { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all pennant errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PennantError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl PennantError {
    /// Whether this error is the single-banner "not found" outcome, as
    /// opposed to a system failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PennantError::Storage(StorageError::NotFound))
    }
}

/// Result type alias for pennant operations.
pub type PennantResult<T> = Result<T, PennantError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::NotFound;
        assert_eq!(format!("{}", err), "Banner not found");
    }

    #[test]
    fn test_storage_error_display_query_failed() {
        let err = StorageError::QueryFailed {
            reason: "syntax error".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Query failed"));
        assert!(msg.contains("syntax error"));
    }

    #[test]
    fn test_cache_error_display_backend() {
        let err = CacheError::Backend {
            reason: "transaction aborted".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Cache backend error"));
        assert!(msg.contains("transaction aborted"));
    }

    #[test]
    fn test_config_error_display_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "port".to_string(),
            value: "bad".to_string(),
            reason: "must be numeric".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("port"));
        assert!(msg.contains("bad"));
        assert!(msg.contains("must be numeric"));
    }

    #[test]
    fn test_pennant_error_from_variants() {
        let storage = PennantError::from(StorageError::NotFound);
        assert!(matches!(storage, PennantError::Storage(_)));

        let cache = PennantError::from(CacheError::Backend {
            reason: "io".to_string(),
        });
        assert!(matches!(cache, PennantError::Cache(_)));

        let config = PennantError::from(ConfigError::MissingRequired {
            field: "jwt_secret".to_string(),
        });
        assert!(matches!(config, PennantError::Config(_)));
    }

    #[test]
    fn test_is_not_found() {
        assert!(PennantError::from(StorageError::NotFound).is_not_found());
        assert!(!PennantError::from(StorageError::Unavailable {
            reason: "down".to_string()
        })
        .is_not_found());
        assert!(!PennantError::from(CacheError::Backend {
            reason: "down".to_string()
        })
        .is_not_found());
    }
}
