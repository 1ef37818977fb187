use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt::Display;

// Authentication failures, each mapped to an HTTP status at the boundary.
// Signature failures, expiry and malformed input stay distinct variants so
// handlers and logs can tell them apart even though clients only see 401.
#[derive(Debug, PartialEq)]
pub(crate) enum AuthError {
    InvalidCredentials,
    AuthenticationExpired,
    SessionTokenRequired,
    InvalidSession,
    SessionExpired,
    NoToken,
    InvalidToken,
    TokenExpired,
    WrongApiKey,
    FailedToEncodeToken,
    ServerError(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid Telegram authentication"),
            AuthError::AuthenticationExpired => write!(f, "Authentication expired"),
            AuthError::SessionTokenRequired => write!(f, "Session token required"),
            AuthError::InvalidSession => write!(f, "Invalid or expired session"),
            AuthError::SessionExpired => write!(f, "Session expired"),
            AuthError::NoToken => write!(f, "No token provided"),
            AuthError::InvalidToken => write!(f, "Invalid token"),
            AuthError::TokenExpired => write!(f, "Token expired"),
            AuthError::WrongApiKey => write!(f, "Invalid API key"),
            AuthError::FailedToEncodeToken => write!(f, "Failed to generate auth token"),
            // internal detail stays out of the response body
            AuthError::ServerError(_) => write!(f, "Internal server error"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        if let AuthError::ServerError(detail) = self {
            log::error!("internal error during authentication: {}", detail);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::SessionTokenRequired => StatusCode::BAD_REQUEST,
            AuthError::FailedToEncodeToken | AuthError::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}
