//! Structured error types for property resolution.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Usage errors
    InvalidName,
    InvalidUnit,

    // Not found errors
    MissingProperty,
    UnknownUnit,

    // Source errors
    MalformedSource,
    ManifestError,
    IoError,
}

/// Errors raised by the resolution API and its surrounding wiring.
#[derive(Debug, thiserror::Error)]
pub enum PropertyError {
    /// The property name was absent, empty, or whitespace-only.
    #[error("External property name is invalid. name = {name:?}")]
    InvalidName { name: Option<String> },

    /// No resolver anywhere in the unit hierarchy produced a value.
    #[error("No external property found with name \"{name}\" (searched from unit '{unit}')")]
    MissingProperty { name: String, unit: String },

    #[error("Unknown unit: {unit}")]
    UnknownUnit { unit: String },

    #[error("Invalid unit '{name}': {reason}")]
    InvalidUnit { name: String, reason: String },

    /// A properties source could not be parsed.
    #[error("Malformed properties source {location}: {reason}")]
    MalformedSource { location: String, reason: String },

    #[error("Invalid manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PropertyError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PropertyError::InvalidName { .. } => ErrorCode::InvalidName,
            PropertyError::MissingProperty { .. } => ErrorCode::MissingProperty,
            PropertyError::UnknownUnit { .. } => ErrorCode::UnknownUnit,
            PropertyError::InvalidUnit { .. } => ErrorCode::InvalidUnit,
            PropertyError::MalformedSource { .. } => ErrorCode::MalformedSource,
            PropertyError::Manifest { .. } => ErrorCode::ManifestError,
            PropertyError::Io { .. } => ErrorCode::IoError,
        }
    }

    // Convenience constructors

    pub fn invalid_name(name: Option<&str>) -> Self {
        PropertyError::InvalidName {
            name: name.map(str::to_string),
        }
    }

    pub fn missing_property(name: &str, unit: &str) -> Self {
        PropertyError::MissingProperty {
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }

    pub fn unknown_unit(unit: impl Into<String>) -> Self {
        PropertyError::UnknownUnit { unit: unit.into() }
    }

    pub fn invalid_unit(name: &str, reason: impl Into<String>) -> Self {
        PropertyError::InvalidUnit {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        PropertyError::MalformedSource {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PropertyError::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PropertyError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the condition that `get_or`/`exists` turn into a normal return.
    pub fn is_missing(&self) -> bool {
        matches!(self, PropertyError::MissingProperty { .. })
    }
}

/// Result type for property operations.
pub type PropertyResult<T> = std::result::Result<T, PropertyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_variants() {
        assert_eq!(
            PropertyError::invalid_name(None).code(),
            ErrorCode::InvalidName
        );
        assert_eq!(
            PropertyError::missing_property("a", "root").code(),
            ErrorCode::MissingProperty
        );
        assert_eq!(
            PropertyError::unknown_unit("x").code(),
            ErrorCode::UnknownUnit
        );
        assert!(PropertyError::missing_property("a", "root").is_missing());
        assert!(!PropertyError::invalid_name(Some(" ")).is_missing());
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::MissingProperty).unwrap();
        assert_eq!(json, "\"MISSING_PROPERTY\"");
    }

    #[test]
    fn test_missing_property_message() {
        let err = PropertyError::missing_property("db.url", "app/core");
        assert_eq!(
            err.to_string(),
            "No external property found with name \"db.url\" (searched from unit 'app/core')"
        );
    }
}
