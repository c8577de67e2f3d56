//! Request/response types for the login core.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::{ErrorCode, ErrorInformation};

/// A directory entry, as returned by the authenticator.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserIdentity {
    pub user_dn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl UserIdentity {
    #[must_use]
    pub fn new(user_dn: impl Into<String>, profile: Option<String>) -> Self {
        Self {
            user_dn: user_dn.into(),
            profile,
        }
    }
}

/// How the current session was authenticated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationType {
    #[default]
    Unauthenticated,
    /// Identity and password were both verified.
    Full,
    /// Identity is known but no password was checked (SSO hand-off, recovery flows).
    WithoutPassword,
}

/// Result of a successful directory check.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    pub identity: UserIdentity,
    pub authentication_type: AuthenticationType,
}

/// Credentials for one login request. Never persisted.
///
/// The secret is zeroized on drop and redacted from `Debug`.
#[derive(Debug)]
pub struct LoginAttempt {
    pub username: Option<String>,
    pub secret: Option<SecretString>,
    pub context: Option<String>,
    pub auth_profile: Option<String>,
    pub password_only: bool,
}

impl LoginAttempt {
    /// Username, if present and non-empty.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|value| !value.is_empty())
    }

    /// Secret, if present and non-empty.
    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.secret
            .as_ref()
            .filter(|secret| !secret.expose_secret().is_empty())
    }
}

/// Neutral result of the orchestrator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoginOutcome {
    /// Destination the user was heading to before the login interruption.
    Success { next_url: String },
    Failure(ErrorInformation),
}

/// Payload of a successful REST login.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct NextUrl {
    #[serde(rename = "nextURL")]
    pub next_url: String,
}

/// JSON envelope returned by `restLogin`.
#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct RestResult {
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NextUrl>,
}

impl RestResult {
    #[must_use]
    pub fn from_error(error: &ErrorInformation) -> Self {
        Self {
            error: true,
            code: Some(error.code),
            message: Some(error.message.clone()),
            data: None,
        }
    }

    #[must_use]
    pub fn next_url(next_url: String) -> Self {
        Self {
            error: false,
            code: None,
            message: None,
            data: Some(NextUrl { next_url }),
        }
    }
}
