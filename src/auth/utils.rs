//! Small helpers for token generation, input sanitizing and redirect targets.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use secrecy::SecretString;

/// Upper bound, in characters, for every value read from a JSON login body.
pub const MAX_INPUT_LENGTH: usize = 1024;

const DEFAULT_DISALLOWED_PATTERNS: &[&str] = &[r"[<>]"];

/// Create a new random token (session ids, anti-forgery tokens).
pub(crate) fn generate_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate random token")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}

/// Truncate to at most `max_len` characters.
fn truncate_chars(value: &str, max_len: usize) -> &str {
    match value.char_indices().nth(max_len) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

/// Accept only same-origin relative paths as a post-login destination.
pub(crate) fn safe_relative_url(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    let is_relative = candidate.starts_with('/')
        && !candidate.starts_with("//")
        && !candidate.starts_with("/\\")
        && !candidate.chars().any(char::is_control);
    is_relative.then(|| candidate.to_string())
}

/// Length-limits user input and strips disallowed content.
#[derive(Clone, Debug)]
pub struct Sanitizer {
    disallowed: Vec<Regex>,
}

impl Sanitizer {
    /// Build a sanitizer from regex patterns; an empty list falls back to the defaults.
    ///
    /// # Errors
    /// Returns an error if a pattern is not a valid regular expression.
    pub fn new(patterns: &[String]) -> Result<Self> {
        let disallowed = if patterns.is_empty() {
            DEFAULT_DISALLOWED_PATTERNS
                .iter()
                .map(|pattern| Regex::new(pattern))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            patterns
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).with_context(|| format!("invalid sanitize pattern: {pattern}"))
                })
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Self { disallowed })
    }

    /// Truncate to `max_len` characters, drop control characters and remove every match of the
    /// disallowed patterns.
    #[must_use]
    pub fn sanitize(&self, value: &str, max_len: usize) -> String {
        let mut cleaned: String = truncate_chars(value, max_len)
            .chars()
            .filter(|c| !c.is_control())
            .collect();
        for pattern in &self.disallowed {
            if pattern.is_match(&cleaned) {
                cleaned = pattern.replace_all(&cleaned, "").into_owned();
            }
        }
        cleaned
    }

    /// Secrets are only length-limited; their content is never altered.
    #[must_use]
    pub fn sanitize_secret(&self, value: &str, max_len: usize) -> SecretString {
        SecretString::from(truncate_chars(value, max_len).to_string())
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        let disallowed = DEFAULT_DISALLOWED_PATTERNS
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();
        Self { disallowed }
    }
}
