//! Session state and the store it lives in.
//!
//! A session is addressed by a random identifier carried in a cookie. The state behind it is
//! never patched field by field on login: [`SessionStore::renew`] drops the old identifier and
//! stores a brand new state under a brand new identifier.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use super::types::{AuthenticatedUser, AuthenticationType, UserIdentity};
use super::utils::generate_token;

#[derive(Clone, Eq, PartialEq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Session ids are bearer credentials; keep them out of logs.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionId(***)")
    }
}

#[derive(Clone, Default, Eq, PartialEq)]
pub struct SessionState {
    pub authenticated: bool,
    pub authentication_type: AuthenticationType,
    pub identity: Option<UserIdentity>,
    pub form_token: String,
    /// Where the user was heading before being sent to the login page.
    pub original_url: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn anonymous(form_token: String) -> Self {
        Self {
            form_token,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn authenticated(user: AuthenticatedUser, form_token: String) -> Self {
        Self {
            authenticated: true,
            authentication_type: user.authentication_type,
            identity: Some(user.identity),
            form_token,
            original_url: None,
        }
    }

    /// The session already has an identity that was established without a password, so only
    /// the password needs to be checked.
    #[must_use]
    pub fn password_only(&self) -> bool {
        self.authenticated && self.authentication_type == AuthenticationType::WithoutPassword
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("authenticated", &self.authenticated)
            .field("authentication_type", &self.authentication_type)
            .field("identity", &self.identity)
            .field("form_token", &"***")
            .field("original_url", &self.original_url)
            .finish()
    }
}

/// A session bound to the current request.
#[derive(Clone, Debug)]
pub struct ActiveSession {
    pub id: SessionId,
    pub state: SessionState,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to generate session token: {0}")]
    Token(String),
}

/// Token generation is the only fallible step of the in-memory store.
impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Token(err.to_string())
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a new anonymous session.
    async fn create(&self) -> Result<ActiveSession, SessionError>;

    /// Look up a live session; expired or unknown ids yield `None`.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, SessionError>;

    /// Persist changes made to an anonymous session (e.g. the original URL).
    async fn save(&self, session: &ActiveSession) -> Result<(), SessionError>;

    /// Invalidate `previous` and store a fresh authenticated state under a new identifier.
    async fn renew(
        &self,
        previous: &SessionId,
        user: AuthenticatedUser,
    ) -> Result<ActiveSession, SessionError>;
}

struct Entry {
    state: SessionState,
    touched: Instant,
}

/// In-process session store with a sliding TTL.
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Entry>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    fn prune(&self, sessions: &mut HashMap<String, Entry>, now: Instant) {
        let ttl = self.ttl;
        sessions.retain(|_, entry| now.duration_since(entry.touched) < ttl);
    }
}

impl fmt::Debug for MemorySessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySessionStore")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self) -> Result<ActiveSession, SessionError> {
        let id = SessionId::new(generate_token()?);
        let state = SessionState::anonymous(generate_token()?);
        let now = Instant::now();

        let mut sessions = self.sessions.lock().await;
        self.prune(&mut sessions, now);
        sessions.insert(
            id.as_str().to_string(),
            Entry {
                state: state.clone(),
                touched: now,
            },
        );

        Ok(ActiveSession { id, state })
    }

    async fn load(&self, id: &SessionId) -> Result<Option<SessionState>, SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let expired = match sessions.get_mut(id.as_str()) {
            None => return Ok(None),
            Some(entry) if now.duration_since(entry.touched) >= self.ttl => true,
            Some(entry) => {
                entry.touched = now;
                return Ok(Some(entry.state.clone()));
            }
        };
        if expired {
            debug!("session expired");
            sessions.remove(id.as_str());
        }
        Ok(None)
    }

    async fn save(&self, session: &ActiveSession) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            session.id.as_str().to_string(),
            Entry {
                state: session.state.clone(),
                touched: Instant::now(),
            },
        );
        Ok(())
    }

    async fn renew(
        &self,
        previous: &SessionId,
        user: AuthenticatedUser,
    ) -> Result<ActiveSession, SessionError> {
        let id = SessionId::new(generate_token()?);
        let state = SessionState::authenticated(user, generate_token()?);

        let mut sessions = self.sessions.lock().await;
        sessions.remove(previous.as_str());
        sessions.insert(
            id.as_str().to_string(),
            Entry {
                state: state.clone(),
                touched: Instant::now(),
            },
        );

        Ok(ActiveSession { id, state })
    }
}
