//! Error types for the column registry

use std::path::PathBuf;
use thiserror::Error;

/// Result type for column registry operations
pub type Result<T> = std::result::Result<T, DepotError>;

/// Errors that can occur while building or querying a column registry.
///
/// Resolving a default value never produces one of these; only registry
/// construction, descriptor loading and the column factory can fail.
#[derive(Debug, Error)]
pub enum DepotError {
    /// A descriptor carries a `typeStr` that is not a known column type
    #[error("unknown column type: {tag}")]
    UnknownType { tag: String },

    /// The same column type appears twice in one defaults set
    #[error("duplicate column type: {tag}")]
    DuplicateType { tag: String },

    /// The registry has no descriptor for a known type
    #[error("column type not registered: {tag}")]
    NotRegistered { tag: String },

    /// An editor widget tag could not be parsed
    #[error("invalid editor widget '{tag}': {message}")]
    InvalidEditor { tag: String, message: String },

    /// Overrides directory does not exist
    #[error("overrides directory not found: {path}")]
    OverridesNotFound { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be extracted
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl From<figment::Error> for DepotError {
    fn from(error: figment::Error) -> Self {
        DepotError::Config(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DepotError::UnknownType {
            tag: "currency".into(),
        };
        assert_eq!(err.to_string(), "unknown column type: currency");
    }

    #[test]
    fn test_invalid_editor_error() {
        let err = DepotError::InvalidEditor {
            tag: "lineSelect@".into(),
            message: "missing target field".into(),
        };
        assert!(err.to_string().contains("lineSelect@"));
        assert!(err.to_string().contains("missing target field"));
    }

    #[test]
    fn test_not_registered_error() {
        let err = DepotError::NotRegistered { tag: "grid".into() };
        assert_eq!(err.to_string(), "column type not registered: grid");
    }
}
