//! Turn a [`LoginOutcome`] into a protocol-specific response.

use tracing::debug;

use super::error::ErrorInformation;
use super::navigation::Navigation;
use super::types::{LoginOutcome, RestResult};

/// Which login page to show.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PageVariant {
    /// Username and password.
    Login,
    /// Password only, for a session that already carries an identity.
    PasswordOnly,
}

impl PageVariant {
    #[must_use]
    pub const fn from_password_only(password_only: bool) -> Self {
        if password_only {
            Self::PasswordOnly
        } else {
            Self::Login
        }
    }
}

/// Protocol-neutral description of what to send back.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LoginResponse {
    Page {
        variant: PageVariant,
        error: Option<ErrorInformation>,
    },
    Redirect {
        location: String,
    },
    Json(RestResult),
    /// A login action arrived on a method other than POST.
    MethodNotAllowed,
}

impl LoginResponse {
    #[must_use]
    pub const fn page(variant: PageVariant) -> Self {
        Self::Page {
            variant,
            error: None,
        }
    }

    #[must_use]
    pub fn json_error(error: &ErrorInformation) -> Self {
        Self::Json(RestResult::from_error(error))
    }
}

/// Form submissions: redirect on success, re-render the same page variant on failure.
#[must_use]
pub fn form_response(outcome: LoginOutcome, variant: PageVariant) -> LoginResponse {
    match outcome {
        LoginOutcome::Success { next_url } => LoginResponse::Redirect { location: next_url },
        LoginOutcome::Failure(error) => LoginResponse::Page {
            variant,
            error: Some(error),
        },
    }
}

/// REST submissions: a JSON envelope either way.
#[must_use]
pub fn rest_response(outcome: LoginOutcome, navigation: &Navigation) -> LoginResponse {
    match outcome {
        LoginOutcome::Success { next_url } => {
            debug!("rest login succeeded");
            LoginResponse::Json(RestResult::next_url(
                navigation.post_login_url(&next_url),
            ))
        }
        LoginOutcome::Failure(error) => LoginResponse::json_error(&error),
    }
}
