//! Error types for the lending library

use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use validator::ValidationErrors;

/// Stable numeric codes reported alongside errors to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchData = 5,
    BadValue = 18,
    Duplicate = 19,
    InvalidOperation = 20,
}

/// Message attached to `full_name` when another person already holds the name
pub const DUPLICATE_NAME: &str = "This name already exist";

/// A constraint violation attached to one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Flatten declarative validation errors into field/message pairs, ordered by field
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut result: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    result.sort_by(|a, b| a.field.cmp(&b.field));
    result
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Integrity constraint violations are rejected operations, not storage faults
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            match db.kind() {
                ErrorKind::ForeignKeyViolation
                | ErrorKind::CheckViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::UniqueViolation => {
                    return AppError::constraint(db.constraint().unwrap_or("unknown"));
                }
                _ => {}
            }
        }
        AppError::Database(e)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(field_errors(&errors))
    }
}

impl AppError {
    /// Rejection raised by a storage integrity constraint, whatever the backend
    pub fn constraint(name: &str) -> Self {
        AppError::InvalidOperation(format!("Constraint {} violated", name))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::InvalidOperation(_) => ErrorCode::InvalidOperation,
            AppError::Validation(errors) => {
                if errors.iter().any(|e| e.message == DUPLICATE_NAME) {
                    ErrorCode::Duplicate
                } else {
                    ErrorCode::BadValue
                }
            }
            AppError::InvariantViolation(_) | AppError::Config(_) => ErrorCode::Failure,
            AppError::Database(_) => ErrorCode::DbFailure,
        }
    }

    /// Expected failures a caller can act on, as opposed to faults
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_) | AppError::InvalidOperation(_) | AppError::Validation(_)
        )
    }

    /// Field errors carried by a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            AppError::Validation(errors) => errors,
            _ => &[],
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
