//! Login core: credential extraction, anti-forgery checks, the orchestrator and the response
//! strategies.
//!
//! Nothing in here knows about HTTP. The transport implements [`LoginRequest`] and renders the
//! [`LoginResponse`] it gets back.
//!
//! ## Session renewal
//!
//! A successful login never reuses the session identifier the browser presented. The store
//! drops the old entry and issues a new identifier with a new form token, so an identifier
//! planted before login is worthless afterwards.

pub mod authenticator;
pub mod dispatch;
pub mod error;
pub mod extract;
mod form_token;
pub mod login;
pub mod navigation;
pub mod session;
mod state;
pub mod strategy;
pub mod types;
mod utils;

pub use authenticator::Authenticator;
pub use dispatch::{LoginController, ProcessAction, PARAM_ACTION, PARAM_NEXT};
pub use error::{ErrorCode, ErrorInformation};
pub use form_token::{FORM_TOKEN_HEADER, FORM_TOKEN_PARAM};
pub use login::LoginService;
pub use navigation::Navigation;
pub use session::{
    ActiveSession, MemorySessionStore, SessionError, SessionId, SessionState, SessionStore,
};
pub use state::{LoginConfig, LoginState};
pub use strategy::{LoginResponse, PageVariant};
pub use types::{
    AuthenticatedUser, AuthenticationType, LoginAttempt, LoginOutcome, NextUrl, RestResult,
    UserIdentity,
};
pub use utils::{Sanitizer, MAX_INPUT_LENGTH};

/// Read-only view of an incoming login request.
///
/// Parameters merge the query string and a urlencoded form body; the raw body is only read by
/// `restLogin`.
pub trait LoginRequest: Sync {
    /// Whether the request arrived as a POST; `login` and `restLogin` are refused otherwise.
    fn is_post(&self) -> bool;

    fn parameter(&self, name: &str) -> Option<&str>;

    /// Header lookup; implementations match names case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    fn body(&self) -> Option<&[u8]>;
}

#[cfg(test)]
mod tests;
