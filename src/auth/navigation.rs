//! Where to send the user once the login succeeds.

use anyhow::{Context, Result};
use url::Url;

use super::session::SessionState;

#[derive(Clone, Debug)]
pub struct Navigation {
    public_base_url: Url,
    forward_url: String,
}

impl Navigation {
    /// # Errors
    /// Returns an error if `public_base_url` is not an absolute URL.
    pub fn new(public_base_url: &str, forward_url: impl Into<String>) -> Result<Self> {
        let public_base_url = Url::parse(public_base_url)
            .with_context(|| format!("Invalid public base URL: {public_base_url}"))?;
        Ok(Self {
            public_base_url,
            forward_url: forward_url.into(),
        })
    }

    /// The destination the user was heading to before the login interruption, falling back to
    /// the configured forward URL.
    #[must_use]
    pub fn pre_login_target(&self, state: &SessionState) -> String {
        state
            .original_url
            .clone()
            .unwrap_or_else(|| self.forward_url.clone())
    }

    /// Absolute URL handed to API clients, resolved against the public base URL.
    #[must_use]
    pub fn post_login_url(&self, target: &str) -> String {
        self.public_base_url
            .join(target)
            .map_or_else(|_| target.to_string(), |url| url.to_string())
    }
}
