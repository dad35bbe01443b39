use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cabline_core::{AuthError, DatabaseError};
use log::{error, info};
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

/// Everything a handler can fail with, rendered as `{ success: false, message }`
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{} not found", capitalize(.resource))]
    NotFound { resource: &'static str },
    /// Only the field is shown to visitors, so `Email already exists`
    #[error("{} already exists", capitalize(.field))]
    Conflict {
        resource: &'static str,
        field: &'static str,
    },
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unknown(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Internal failures are logged here and never leak their details
    fn message(&self) -> String {
        match self {
            Self::Unknown(reason) => {
                error!("Request failed: {}", reason);
                "Internal server error".to_string()
            }
            Self::Conflict { resource, field } => {
                info!("Refused duplicate {} of {}", field, resource);
                self.to_string()
            }
            e => e.to_string(),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();

    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({ "success": false, "message": self.message() });

        (self.status(), Json(body)).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::Db(e) => e.into(),
            AuthError::HashError(reason) => Self::Unknown(format!("Hashing failed: {reason}")),
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound { resource, .. } => Self::NotFound { resource },
            DatabaseError::Conflict {
                resource, field, ..
            } => Self::Conflict { resource, field },
            DatabaseError::Invalid { resource, reason } => {
                Self::BadRequest(format!("Invalid {resource}: {reason}"))
            }
            DatabaseError::Internal(e) => Self::Unknown(format!("Data file error: {e}")),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_messages() {
        let conflict = ServerError::from(DatabaseError::Conflict {
            resource: "customer",
            field: "email",
            value: "ada@example.com".to_string(),
        });
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        assert_eq!(conflict.message(), "Email already exists");

        let missing = ServerError::from(DatabaseError::NotFound {
            resource: "page",
            identifier: "slug",
        });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.message(), "Page not found");

        let internal = ServerError::from(AuthError::HashError("salt".to_string()));
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.message(), "Internal server error");
    }

    #[test]
    fn test_invalid_records_are_bad_requests() {
        let error = ServerError::from(DatabaseError::Invalid {
            resource: "booking",
            reason: "details must be an object".to_string(),
        });

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "Invalid booking: details must be an object");
    }
}
