use crate::domain::errors::ValidationError;
use crate::domain::value_objects::ObjectKey;

/// Errors that can occur during storage operations
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Object not found
    ObjectNotFound { key: ObjectKey },

    /// Access denied
    AccessDenied { key: ObjectKey, operation: String },

    /// Configuration rejected before any request was made
    Configuration(ValidationError),

    /// The store answered a listing request with a page that cannot be followed
    MalformedListing { message: String },

    /// The caller cancelled the operation
    Cancelled { operation: String },

    /// Invalid input handed to the adapter
    ValidationError { message: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        status: Option<u16>,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl StorageError {
    /// True when the store reported the target key as absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::ObjectNotFound { .. })
    }

    /// HTTP status reported by the store, if the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            StorageError::ObjectNotFound { .. } => Some(404),
            StorageError::AccessDenied { .. } => Some(403),
            StorageError::InfrastructureError { status, .. } => *status,
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ObjectNotFound { key } => {
                write!(f, "Object not found: {}", key)
            }
            StorageError::AccessDenied { key, operation } => {
                write!(
                    f,
                    "Access denied for operation '{}' on object: {}",
                    operation, key
                )
            }
            StorageError::Configuration(err) => {
                write!(f, "Invalid storage configuration: {}", err)
            }
            StorageError::MalformedListing { message } => {
                write!(f, "Malformed listing response: {}", message)
            }
            StorageError::Cancelled { operation } => {
                write!(f, "Operation '{}' was cancelled", operation)
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::InfrastructureError {
                message,
                status: Some(status),
                ..
            } => {
                write!(f, "Infrastructure error (status {}): {}", status, message)
            }
            StorageError::InfrastructureError { message, .. } => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::MissingConfigFields(_) | ValidationError::InvalidEndpoint(_) => {
                StorageError::Configuration(err)
            }
            other => StorageError::ValidationError {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
