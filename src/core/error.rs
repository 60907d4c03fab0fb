//! Typed error handling for the anycrud engine
//!
//! # Error Categories
//!
//! - [`ValidationError`]: unknown fields, values that do not fit a field,
//!   invalid flag combinations, invalid request parameters
//! - [`StorageError`]: failures reported by the persistence engine
//! - [`AuthError`]: failures of the credential check or token issuance
//! - [`ConfigError`]: configuration loading failures, reported by
//!   [`AppConfig`](crate::config::AppConfig) before any handler runs
//!
//! Engine operations never translate a storage failure: the
//! [`StorageError`] produced by the store reaches the caller inside
//! [`CrudError::Storage`] exactly as it was returned.
//!
//! # Example
//!
//! ```rust,ignore
//! match logic.get_by_key("colour", "red").await {
//!     Ok(found) => println!("{:?}", found.data),
//!     Err(CrudError::Validation(ValidationError::UnknownField { field, .. })) => {
//!         println!("no field named {}", field);
//!     }
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use crate::core::field::{FieldKind, FieldValue};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The main error type returned by engine operations
#[derive(Debug, Error)]
pub enum CrudError {
    /// Input rejected before reaching the store
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failure reported by the persistence engine
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Login flow failures
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl CrudError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            CrudError::Validation(_) => StatusCode::BAD_REQUEST,
            CrudError::Storage(e) => e.status_code(),
            CrudError::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            CrudError::Validation(e) => e.error_code(),
            CrudError::Storage(e) => e.error_code(),
            CrudError::Auth(_) => "AUTH_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            CrudError::Validation(ValidationError::UnknownField { entity_type, field }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "field": field,
                }))
            }
            CrudError::Validation(ValidationError::InvalidParameter { name, .. }) => {
                Some(serde_json::json!({ "parameter": name }))
            }
            CrudError::Storage(
                StorageError::RowNotFound { entity_type, id }
                | StorageError::KeyOutOfRange { entity_type, id },
            ) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id,
                }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for CrudError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors raised while building queries or checking request input
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A filter or key lookup named a field the entity does not have
    #[error("No field '{field}' on entity type '{entity_type}'")]
    UnknownField { entity_type: String, field: String },

    /// A filter value does not fit the field it is compared with
    #[error("Value '{value}' cannot be compared with {expected} field '{field}' of '{entity_type}'")]
    TypeMismatch {
        entity_type: String,
        field: String,
        expected: FieldKind,
        value: FieldValue,
    },

    /// A raw key-lookup value could not be coerced to the field kind
    #[error("Value '{value}' is not a valid {kind} for field '{field}' of '{entity_type}'")]
    InvalidValue {
        entity_type: String,
        field: String,
        kind: FieldKind,
        value: String,
    },

    /// Substring search requested on a type without string fields
    #[error("Entity type '{entity_type}' has no textual fields to search")]
    NoTextualFields { entity_type: String },

    /// `exclude_actived` was set without `include_deleted`
    #[error("Cannot exclude active items without including deleted ones")]
    ExcludeActiveWithoutDeleted,

    /// An entity type's descriptor breaks an engine invariant
    #[error("Invalid descriptor for '{entity_type}': {message}")]
    InvalidDescriptor {
        entity_type: String,
        message: String,
    },

    /// A caller-supplied parameter is out of range
    #[error("Invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::UnknownField { .. } => "UNKNOWN_FIELD",
            ValidationError::TypeMismatch { .. } => "TYPE_MISMATCH",
            ValidationError::InvalidValue { .. } => "INVALID_VALUE",
            ValidationError::NoTextualFields { .. } => "NO_TEXTUAL_FIELDS",
            ValidationError::ExcludeActiveWithoutDeleted => "INVALID_FLAG_COMBINATION",
            ValidationError::InvalidDescriptor { .. } => "INVALID_DESCRIPTOR",
            ValidationError::InvalidParameter { .. } => "INVALID_PARAMETER",
        }
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors reported by a persistence engine
#[derive(Debug, Error)]
pub enum StorageError {
    /// An update or removal targeted a row that is not stored
    #[error("{entity_type} with id '{id}' not found in store")]
    RowNotFound { entity_type: String, id: i64 },

    /// An insert collided with an existing primary key
    #[error("{entity_type} with id '{id}' already exists")]
    DuplicateKey { entity_type: String, id: i64 },

    /// A key the store cannot assign or advance past
    #[error("{entity_type} id '{id}' is outside the assignable key range")]
    KeyOutOfRange { entity_type: String, id: i64 },

    /// A related-entity path the store cannot expand
    #[error("Cannot include '{path}' on '{entity_type}'")]
    UnknownInclude { entity_type: String, path: String },

    /// The backend could not be reached
    #[error("{backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    /// Internal lock poisoned
    #[error("Store lock poisoned: {message}")]
    Lock { message: String },
}

impl StorageError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::UnknownInclude { .. } | StorageError::KeyOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            StorageError::DuplicateKey { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StorageError::RowNotFound { .. } => "ROW_NOT_FOUND",
            StorageError::DuplicateKey { .. } => "DUPLICATE_KEY",
            StorageError::KeyOutOfRange { .. } => "KEY_OUT_OF_RANGE",
            StorageError::UnknownInclude { .. } => "UNKNOWN_INCLUDE",
            StorageError::Unavailable { .. } => "STORAGE_UNAVAILABLE",
            StorageError::Lock { .. } => "STORAGE_LOCK_ERROR",
        }
    }
}

// =============================================================================
// Auth Errors
// =============================================================================

/// Errors raised by the login flow collaborators
#[derive(Debug, Error)]
pub enum AuthError {
    /// The credential store could not answer
    #[error("Credential check failed: {message}")]
    CredentialCheck { message: String },

    /// The token could not be signed
    #[error("Token issuance failed: {message}")]
    TokenIssuance { message: String },
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading configuration
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse configuration
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Invalid value in configuration
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
