//! Login configuration and the shared state handed to the HTTP layer.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::authenticator::Authenticator;
use super::dispatch::LoginController;
use super::login::LoginService;
use super::navigation::Navigation;
use super::session::{MemorySessionStore, SessionStore};
use super::utils::Sanitizer;

const DEFAULT_FORWARD_URL: &str = "/";
const DEFAULT_SESSION_TTL_SECONDS: u64 = 30 * 60;

#[derive(Clone, Debug)]
pub struct LoginConfig {
    public_base_url: String,
    forward_url: String,
    session_ttl_seconds: u64,
    sanitize_patterns: Vec<String>,
}

impl LoginConfig {
    #[must_use]
    pub fn new(public_base_url: String) -> Self {
        Self {
            public_base_url,
            forward_url: DEFAULT_FORWARD_URL.to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            sanitize_patterns: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_forward_url(mut self, forward_url: String) -> Self {
        self.forward_url = forward_url;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_sanitize_patterns(mut self, patterns: Vec<String>) -> Self {
        self.sanitize_patterns = patterns;
        self
    }

    #[must_use]
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    #[must_use]
    pub fn forward_url(&self) -> &str {
        &self.forward_url
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.public_base_url.starts_with("https://")
    }
}

pub struct LoginState {
    config: LoginConfig,
    controller: LoginController,
}

impl LoginState {
    /// # Errors
    /// Returns an error if the base URL or a sanitize pattern is invalid.
    pub fn new(
        config: LoginConfig,
        authenticator: Arc<dyn Authenticator>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let navigation = Navigation::new(&config.public_base_url, config.forward_url.clone())?;
        let sanitizer = Sanitizer::new(&config.sanitize_patterns)?;
        let service = LoginService::new(authenticator, sessions, navigation);
        Ok(Self {
            config,
            controller: LoginController::new(service, sanitizer),
        })
    }

    /// Same as [`LoginState::new`] with an in-process session store sized by the config TTL.
    ///
    /// # Errors
    /// Returns an error if the base URL or a sanitize pattern is invalid.
    pub fn with_memory_sessions(
        config: LoginConfig,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let sessions = Arc::new(MemorySessionStore::new(config.session_ttl()));
        Self::new(config, authenticator, sessions)
    }

    #[must_use]
    pub fn config(&self) -> &LoginConfig {
        &self.config
    }

    #[must_use]
    pub fn controller(&self) -> &LoginController {
        &self.controller
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        self.controller.service().sessions()
    }
}
