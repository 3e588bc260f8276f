use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaystoneError {
    #[error("Waystone '{0}' not found")]
    NotFound(String),

    #[error("A waystone named '{0}' already exists")]
    NameTaken(String),

    #[error("Name must be {max} characters or less (got {len})")]
    NameTooLong { len: usize, max: usize },

    #[error("Invalid value for {property}: {value}")]
    InvalidValue { property: String, value: String },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Editing {0} is not supported. Destroy and recreate the waystone.")]
    ImmutableProperty(String),

    #[error("Editing {0} is not supported by the edit command")]
    UnsupportedProperty(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Waystone limit reached ({limit})")]
    LimitReached { limit: i32 },

    #[error("Destination is blocked: {0}")]
    UnsafeDestination(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, WaystoneError>;

impl From<std::io::Error> for WaystoneError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl WaystoneError {
    /// Builds an `InvalidValue` error for a property/value pair.
    pub fn invalid_value(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            property: property.into(),
            value: value.into(),
        }
    }

    /// True for failures that a caller surfaces to a user as a validation
    /// message rather than an access or storage problem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NameTaken(_)
                | Self::NameTooLong { .. }
                | Self::InvalidValue { .. }
                | Self::UnknownProperty(_)
                | Self::ImmutableProperty(_)
                | Self::UnsupportedProperty(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(WaystoneError::NameTaken("Spawn".into()).is_validation());
        assert!(WaystoneError::NameTooLong { len: 120, max: 100 }.is_validation());
        assert!(!WaystoneError::PermissionDenied("break".into()).is_validation());
        assert!(!WaystoneError::Io("disk full".into()).is_validation());
    }

    #[test]
    fn test_io_error_conversion() {
        let err: WaystoneError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into();
        assert!(matches!(err, WaystoneError::Io(msg) if msg.contains("read-only")));
    }
}
