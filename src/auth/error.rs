//! Error information surfaced by the login core.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

/// Error kinds a login attempt can end with.
///
/// `WrongPassword`, `UserNotFound`, `MultipleMatches` and `DirectoryUnavailable` are produced by
/// the [`Authenticator`](super::authenticator::Authenticator) and travel through the core untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Username, password or the JSON body is missing.
    MissingParameter,
    /// Anti-forgery token missing or not matching the session.
    InvalidRequestToken,
    /// The directory rejected the secret.
    WrongPassword,
    /// No directory entry matched the username.
    UserNotFound,
    /// More than one directory entry matched the username.
    MultipleMatches,
    /// The directory could not be reached or answered unexpectedly.
    DirectoryUnavailable,
    Internal,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingParameter => "missing_parameter",
            Self::InvalidRequestToken => "invalid_request_token",
            Self::WrongPassword => "wrong_password",
            Self::UserNotFound => "user_not_found",
            Self::MultipleMatches => "multiple_matches",
            Self::DirectoryUnavailable => "directory_unavailable",
            Self::Internal => "internal",
        }
    }

    /// Whether the code came out of the authentication collaborator.
    #[must_use]
    pub const fn is_authentication_failure(self) -> bool {
        matches!(
            self,
            Self::WrongPassword
                | Self::UserNotFound
                | Self::MultipleMatches
                | Self::DirectoryUnavailable
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure, as shown to exactly one response strategy.
#[derive(Clone, Debug, Eq, PartialEq, Error, Serialize, Deserialize, ToSchema)]
#[error("{code}: {message}")]
pub struct ErrorInformation {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorInformation {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingParameter, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}
