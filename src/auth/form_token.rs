//! Anti-forgery token validation.

use super::error::{ErrorCode, ErrorInformation};
use super::session::SessionState;
use super::LoginRequest;
use subtle::ConstantTimeEq;

pub const FORM_TOKEN_PARAM: &str = "formToken";
pub const FORM_TOKEN_HEADER: &str = "x-form-token";

#[derive(Debug, PartialEq, Eq)]
pub(super) enum FormTokenError {
    Missing,
    Mismatch,
}

/// Check the submitted token against the one bound to the session.
pub(super) fn require_form_token(
    request: &dyn LoginRequest,
    session: &SessionState,
) -> Result<(), FormTokenError> {
    let Some(submitted) = extract_form_token(request) else {
        return Err(FormTokenError::Missing);
    };

    let matches: bool = submitted
        .as_bytes()
        .ct_eq(session.form_token.as_bytes())
        .into();
    if !session.form_token.is_empty() && matches {
        Ok(())
    } else {
        Err(FormTokenError::Mismatch)
    }
}

pub(super) fn form_token_error(err: &FormTokenError) -> ErrorInformation {
    match err {
        FormTokenError::Missing => {
            ErrorInformation::new(ErrorCode::InvalidRequestToken, "missing form token")
        }
        FormTokenError::Mismatch => {
            ErrorInformation::new(ErrorCode::InvalidRequestToken, "invalid form token")
        }
    }
}

fn extract_form_token(request: &dyn LoginRequest) -> Option<&str> {
    request
        .parameter(FORM_TOKEN_PARAM)
        .or_else(|| request.header(FORM_TOKEN_HEADER))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
