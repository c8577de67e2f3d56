//! Pull credentials out of a form submission or a JSON body.

use secrecy::SecretString;
use std::collections::HashMap;

use super::error::ErrorInformation;
use super::types::LoginAttempt;
use super::utils::{Sanitizer, MAX_INPUT_LENGTH};
use super::LoginRequest;

pub const PARAM_USERNAME: &str = "username";
pub const PARAM_PASSWORD: &str = "password";
pub const PARAM_CONTEXT: &str = "context";
pub const PARAM_LDAP_PROFILE: &str = "ldapProfile";

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}

/// Read the four form parameters as-is. No cross-field validation happens here.
pub fn from_form(request: &dyn LoginRequest, password_only: bool) -> LoginAttempt {
    LoginAttempt {
        username: non_empty(request.parameter(PARAM_USERNAME)),
        secret: request
            .parameter(PARAM_PASSWORD)
            .map(|value| SecretString::from(value.to_string())),
        context: non_empty(request.parameter(PARAM_CONTEXT)),
        auth_profile: non_empty(request.parameter(PARAM_LDAP_PROFILE)),
        password_only,
    }
}

/// Decode the JSON body into a flat string map.
///
/// Non-string values are skipped. A missing, unparsable or empty body is the only hard stop.
pub fn json_string_map(body: Option<&[u8]>) -> Result<HashMap<String, String>, ErrorInformation> {
    let map: HashMap<String, String> = body
        .filter(|bytes| !bytes.is_empty())
        .and_then(|bytes| serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(bytes).ok())
        .map(|object| {
            object
                .into_iter()
                .filter_map(|(key, value)| match value {
                    serde_json::Value::String(value) => Some((key, value)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if map.is_empty() {
        return Err(ErrorInformation::missing_parameter("missing json request body"));
    }
    Ok(map)
}

/// Build an attempt from a decoded JSON body, sanitizing every value.
pub fn from_json(
    values: &HashMap<String, String>,
    sanitizer: &Sanitizer,
    password_only: bool,
) -> LoginAttempt {
    let read = |name: &str| {
        values
            .get(name)
            .map(|value| sanitizer.sanitize(value, MAX_INPUT_LENGTH))
            .filter(|value| !value.is_empty())
    };

    LoginAttempt {
        username: read(PARAM_USERNAME),
        secret: values
            .get(PARAM_PASSWORD)
            .map(|value| sanitizer.sanitize_secret(value, MAX_INPUT_LENGTH)),
        context: read(PARAM_CONTEXT),
        auth_profile: read(PARAM_LDAP_PROFILE),
        password_only,
    }
}
