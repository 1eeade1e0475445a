//! API error types for handler operations
//!
//! Every handler returns `Result<_, ApiError>`. The error carries structured
//! context for the logs and renders as `{"detail": "..."}` on the wire.
//!
//! # Example
//!
//! ```rust
//! use todo_service::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("Todo", "17");
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.message, "Todo not found");
//! assert_eq!(error.entity_id, Some("17".to_string()));
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::auth::DenyReason;
use crate::error::{Error, ErrorResponse};
use crate::listing::{InvalidSortField, PageError};
use crate::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};

/// Message returned when the policy refuses a caller
pub const AUTHENTICATION_FAILED: &str = "Authentication Failed";

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Operation that was being performed when an API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing a collection
    List,
    /// Reading one item
    Get,
    /// Creating an item
    Create,
    /// Updating an item
    Update,
    /// Deleting an item
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl From<RepositoryOperation> for ApiOperation {
    fn from(op: RepositoryOperation) -> Self {
        match op {
            RepositoryOperation::FindOne => Self::Get,
            RepositoryOperation::Fetch | RepositoryOperation::Count => Self::List,
            RepositoryOperation::Insert => Self::Create,
            RepositoryOperation::Update => Self::Update,
            RepositoryOperation::Delete => Self::Delete,
        }
    }
}

/// Category of API error, which determines the HTTP status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// No identity on the request
    Unauthenticated,
    /// Identity lacks the required role
    Forbidden,
    /// Resource does not exist (or is not visible to the caller)
    NotFound,
    /// Malformed or out-of-range input
    Validation,
    /// A unique field is already taken
    Conflict,
    /// Anything the caller cannot fix
    Internal,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

impl ApiErrorKind {
    /// HTTP status code for this kind
    ///
    /// Role failures answer 401 like missing credentials, and unique-field
    /// conflicts answer 400, matching what existing clients expect.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated | Self::Forbidden => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation | Self::Conflict => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Structured error returned by handlers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed
    pub operation: ApiOperation,
    /// The kind of error
    pub kind: ApiErrorKind,
    /// Client-facing message
    pub message: String,
    /// Entity type involved, if any
    pub entity_type: Option<String>,
    /// Entity identifier involved, if any
    pub entity_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// `401 Authentication Failed`
    pub fn unauthenticated() -> Self {
        Self::new(
            ApiOperation::Get,
            ApiErrorKind::Unauthenticated,
            AUTHENTICATION_FAILED,
        )
    }

    /// Caller authenticated but lacks the role; still answers 401
    pub fn forbidden() -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::Forbidden, AUTHENTICATION_FAILED)
    }

    /// `404 <Entity> not found`
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            operation: ApiOperation::Get,
            kind: ApiErrorKind::NotFound,
            message: format!("{} not found", entity_type),
            entity_type: Some(entity_type),
            entity_id: Some(entity_id.into()),
        }
    }

    /// `400` for bad input
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::Validation, message)
    }

    /// `400 <Entity> already exists`
    pub fn conflict(entity_type: impl Into<String>, field: impl Into<String>) -> Self {
        let entity_type = entity_type.into();
        Self {
            operation: ApiOperation::Create,
            kind: ApiErrorKind::Conflict,
            message: format!("{} already exists", entity_type),
            entity_type: Some(entity_type),
            entity_id: Some(field.into()),
        }
    }

    /// `500` with a generic message; `detail` only reaches the logs
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::Internal, detail)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Replace the client-facing message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let detail = if status.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
            INTERNAL_MESSAGE.to_string()
        } else {
            tracing::warn!(
                operation = %self.operation,
                kind = %self.kind,
                entity_type = ?self.entity_type,
                entity_id = ?self.entity_id,
                status = status.as_u16(),
                "API error: {}", self.message
            );
            self.message
        };

        (status, Json(ErrorResponse::new(detail))).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        let operation = ApiOperation::from(err.operation);
        let entity_type = err.entity_type.clone().unwrap_or_else(|| "Entity".to_string());

        let (kind, message) = match err.kind {
            RepositoryErrorKind::NotFound => {
                (ApiErrorKind::NotFound, format!("{} not found", entity_type))
            }
            RepositoryErrorKind::AlreadyExists => (
                ApiErrorKind::Conflict,
                format!("{} already exists", entity_type),
            ),
            RepositoryErrorKind::ConstraintViolation => (
                ApiErrorKind::Validation,
                format!("{} violates a data constraint", entity_type),
            ),
            RepositoryErrorKind::ConnectionFailed
            | RepositoryErrorKind::Timeout
            | RepositoryErrorKind::DatabaseError
            | RepositoryErrorKind::Other => (ApiErrorKind::Internal, err.to_string()),
        };

        Self {
            operation,
            kind,
            message,
            entity_type: err.entity_type,
            entity_id: err.entity_id,
        }
    }
}

impl From<DenyReason> for ApiError {
    fn from(reason: DenyReason) -> Self {
        tracing::debug!(%reason, "Policy denied request");
        match reason {
            DenyReason::Unauthenticated => Self::unauthenticated(),
            DenyReason::NotAdmin => Self::forbidden(),
        }
    }
}

impl From<InvalidSortField> for ApiError {
    fn from(err: InvalidSortField) -> Self {
        Self::new(ApiOperation::List, ApiErrorKind::Validation, err.to_string())
    }
}

impl From<PageError> for ApiError {
    fn from(err: PageError) -> Self {
        Self::new(ApiOperation::List, ApiErrorKind::Validation, err.to_string())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::ValidationError(msg) => Self::validation(msg),
            Error::Unauthorized(msg) => {
                Self::new(ApiOperation::Get, ApiErrorKind::Unauthenticated, msg)
            }
            other => Self::internal(other.to_string()),
        }
    }
}
