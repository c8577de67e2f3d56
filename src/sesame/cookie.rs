//! Session cookie helpers.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};

use crate::auth::{LoginConfig, SessionId};

pub const SESSION_COOKIE_NAME: &str = "sesame_session";

/// Build an `HttpOnly` cookie carrying the session id.
pub fn session_cookie(config: &LoginConfig, id: &SessionId) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}",
        id.as_str()
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn extract_session_id(headers: &HeaderMap) -> Option<SessionId> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let (Some(key), Some(val)) = (parts.next(), parts.next()) else {
                continue;
            };
            let val = val.trim();
            if key.trim() == SESSION_COOKIE_NAME && !val.is_empty() {
                return Some(SessionId::new(val));
            }
        }
    }
    None
}
