use axum::response::{IntoResponse, Response};
use http::StatusCode;

/// Why a request could not be authenticated from its login cookie.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// No login cookie was sent.
    #[error("No login information found, please log in")]
    Unauthenticated,

    /// The cookie is not a token this crate issued.
    #[error("Login information failed validation, please log in")]
    InvalidToken,

    /// The token decoded but carried no record.
    #[error("Login information is unreadable, please log in again")]
    CorruptToken,

    #[error("Login has expired, please log in again")]
    Expired,

    #[error("User could not be found, please log in again")]
    UserNotFound,

    #[error("User is disabled, please contact an administrator")]
    UserDisabled,

    /// The directory's username no longer matches the one in the token.
    #[error("Username does not match our records, please log in again")]
    IdentityMismatch,

    /// An internal fault while handling the login cookie.
    #[error("{0}")]
    Session(String),
}

impl LoginError {
    pub(crate) fn internal() -> Self {
        Self::Session("Error while processing login information, please log in again".into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated
            | Self::InvalidToken
            | Self::CorruptToken
            | Self::Expired
            | Self::UserNotFound
            | Self::IdentityMismatch => StatusCode::UNAUTHORIZED,
            Self::UserDisabled => StatusCode::FORBIDDEN,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
