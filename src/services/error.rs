use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::PasswordError;
use crate::database::{FieldErrors, StoreError};
use crate::policy::Operation;

/// Client-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    AlreadyExists,
    InvalidInput,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("not allowed to {operation} this {kind}")]
    Forbidden { kind: &'static str, operation: Operation },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    AlreadyExists(&'static str),

    #[error("{message}")]
    InvalidInput {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("request processing timed out")]
    Timeout,

    #[error(transparent)]
    Store(StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Unauthenticated => ErrorKind::Unauthenticated,
            ServiceError::Forbidden { .. } => ErrorKind::Forbidden,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ServiceError::InvalidInput { .. } => ErrorKind::InvalidInput,
            ServiceError::Timeout | ServiceError::Store(_) | ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn forbidden(kind: &'static str, operation: Operation) -> Self {
        ServiceError::Forbidden { kind, operation }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.clone());
        ServiceError::InvalidInput {
            message: format!("{}: {}", field, message),
            field_errors,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // A concurrent writer won the race for the unique key
            StoreError::Conflict(kind) => ServiceError::AlreadyExists(kind),
            other => ServiceError::Store(other),
        }
    }
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::InvalidInput {
            message: "Validation failed".to_string(),
            field_errors: errors.0,
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let field_errors: HashMap<String, String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let message = errors
                    .first()
                    .map(|e| match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("failed validation: {}", e.code),
                    })
                    .unwrap_or_else(|| "is invalid".to_string());
                (field.to_string(), message)
            })
            .collect();

        tracing::debug!("Request validation failed: {:?}", field_errors);
        ServiceError::InvalidInput {
            message: "Validation failed".to_string(),
            field_errors,
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch => ServiceError::Unauthenticated,
            other => ServiceError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Input {
        #[validate(length(min = 3, message = "too short"))]
        name: String,
        #[validate(range(min = 1))]
        count: i32,
    }

    #[test]
    fn conflict_becomes_already_exists() {
        let err = ServiceError::from(StoreError::Conflict("car"));
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        assert_eq!(err.to_string(), "car already exists");
    }

    #[test]
    fn validator_errors_become_field_errors() {
        let input = Input { name: "ab".into(), count: 0 };
        let err = ServiceError::from(input.validate().unwrap_err());
        match err {
            ServiceError::InvalidInput { field_errors, .. } => {
                assert_eq!(field_errors.get("name").map(String::as_str), Some("too short"));
                assert_eq!(field_errors.get("count").map(String::as_str), Some("failed validation: range"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn timeouts_and_store_failures_are_internal() {
        assert_eq!(ServiceError::Timeout.kind(), ErrorKind::Internal);
        let corrupt = StoreError::Corrupt { kind: "user", message: "role".into() };
        assert_eq!(ServiceError::from(corrupt).kind(), ErrorKind::Internal);
        assert_eq!(ServiceError::from(PasswordError::Mismatch).kind(), ErrorKind::Unauthenticated);
    }
}
