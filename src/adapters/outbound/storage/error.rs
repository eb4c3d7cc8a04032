use crate::domain::{errors::StorageError, value_objects::ObjectKey};
use http::StatusCode;
use std::io;
use thiserror::Error as ThisError;

/// Errors reported by an OBS client
#[derive(ThisError, Debug)]
pub enum ObsError {
    #[error("OBS service error: {status} {code} - {message}")]
    Service {
        status: StatusCode,
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl ObsError {
    /// Build a service error from a bare status, without an error body
    pub fn from_status(status: StatusCode) -> Self {
        ObsError::Service {
            status,
            code: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: String::new(),
            request_id: None,
        }
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ObsError::Service { status, .. } => Some(*status),
            ObsError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }

    /// Translate into the domain vocabulary for an operation on `key`
    pub fn into_storage_error(self, key: &ObjectKey, operation: &str) -> StorageError {
        match self.status() {
            Some(StatusCode::NOT_FOUND) => StorageError::ObjectNotFound { key: key.clone() },
            Some(StatusCode::FORBIDDEN) => StorageError::AccessDenied {
                key: key.clone(),
                operation: operation.to_string(),
            },
            _ => self.into_infrastructure_error(operation),
        }
    }

    /// Translate a failure that is not tied to a single key
    pub fn into_infrastructure_error(self, operation: &str) -> StorageError {
        StorageError::InfrastructureError {
            message: format!("Failed to {}: {}", operation, self),
            status: self.status().map(|s| s.as_u16()),
            source: Some(self.to_string()),
        }
    }
}
