//! # Sesame (login authentication gateway)
//!
//! `sesame` accepts user credentials through an HTML form and a JSON endpoint, delegates the
//! actual credential check to a directory service, and hands back a redirect, a re-rendered
//! login page, or a JSON result.
//!
//! ## Session fixation
//!
//! Every successful login replaces the session identifier with a freshly generated one and
//! stores a brand new session state. The pre-login identifier is dropped from the store, so a
//! fixed identifier planted by an attacker never becomes authenticated.
//!
//! ## Anti-forgery tokens
//!
//! Each session carries a random form token. Both login actions (`login` and `restLogin`)
//! must echo it back, either as the `formToken` parameter or the `X-Form-Token` header, before
//! any credential is read.

pub mod auth;
pub mod cli;
pub mod directory;
pub mod sesame;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
