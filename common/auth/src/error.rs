use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use jsonwebtoken::Algorithm;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid verifier configuration: {0}")]
    Configuration(String),
    #[error("failed to fetch public key: {0}")]
    KeyFetch(String),
    #[error("no public key available")]
    MissingKey,
    #[error("failed to parse public key: {0}")]
    KeyParse(String),
    #[error("failed to decode token header: {0}")]
    InvalidHeader(String),
    #[error("token algorithm {0:?} is not allowed")]
    DisallowedAlgorithm(Algorithm),
    #[error("token rejected: {0}")]
    Token(String),
    #[error("malformed claim payload: {0}")]
    InvalidJson(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("token verification failed")]
    VerificationFailed,
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(value: jsonwebtoken::errors::Error) -> Self {
        Self::Token(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingAuthorization => (StatusCode::UNAUTHORIZED, "AUTH_HEADER"),
            AuthError::VerificationFailed
            | AuthError::MissingKey
            | AuthError::KeyParse(_)
            | AuthError::InvalidHeader(_)
            | AuthError::DisallowedAlgorithm(_)
            | AuthError::Token(_)
            | AuthError::InvalidJson(_) => (StatusCode::UNAUTHORIZED, "AUTH_TOKEN"),
            AuthError::Configuration(_) | AuthError::KeyFetch(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_KEY")
            }
        };

        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
