use thiserror::Error;

/// Top-level error type for the Tabula system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for TabulaError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TabulaError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TabulaError {
    fn from(err: toml::de::Error) -> Self {
        TabulaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for TabulaError {
    fn from(err: toml::ser::Error) -> Self {
        TabulaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for TabulaError {
    fn from(err: serde_json::Error) -> Self {
        TabulaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Tabula operations.
pub type Result<T> = std::result::Result<T, TabulaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TabulaError::Validation("table has zero rows".to_string());
        assert_eq!(err.to_string(), "Validation error: table has zero rows");
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(TabulaError, &str)> = vec![
            (
                TabulaError::NotFound("session abc".to_string()),
                "Not found: session abc",
            ),
            (
                TabulaError::ColumnNotFound("Zorblatt".to_string()),
                "Column not found: Zorblatt",
            ),
            (
                TabulaError::CollaboratorUnavailable("timeout".to_string()),
                "Collaborator unavailable: timeout",
            ),
            (
                TabulaError::Storage("map poisoned".to_string()),
                "Storage error: map poisoned",
            ),
            (
                TabulaError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                TabulaError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                TabulaError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TabulaError = io_err.into();
        assert!(matches!(err, TabulaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(parsed.is_err());
        let err: TabulaError = parsed.unwrap_err().into();
        assert!(matches!(err, TabulaError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(parsed.is_err());
        let err: TabulaError = parsed.unwrap_err().into();
        assert!(matches!(err, TabulaError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(TabulaError::Validation("fail".to_string()))
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_debug_impl() {
        let err = TabulaError::ColumnNotFound("Cabin".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("ColumnNotFound"));
        assert!(debug_str.contains("Cabin"));
    }
}
