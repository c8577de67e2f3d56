//! The login orchestrator shared by the form and REST entry points.

use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::authenticator::Authenticator;
use super::error::ErrorInformation;
use super::navigation::Navigation;
use super::session::{ActiveSession, SessionError, SessionState, SessionStore};
use super::types::{AuthenticatedUser, LoginAttempt, LoginOutcome};

pub struct LoginService {
    authenticator: Arc<dyn Authenticator>,
    sessions: Arc<dyn SessionStore>,
    navigation: Navigation,
}

impl LoginService {
    #[must_use]
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        sessions: Arc<dyn SessionStore>,
        navigation: Navigation,
    ) -> Self {
        Self {
            authenticator,
            sessions,
            navigation,
        }
    }

    #[must_use]
    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Persist changes made to an anonymous session, such as a recorded destination.
    ///
    /// # Errors
    /// Returns an error if the session store rejects the write.
    pub async fn save_session(&self, session: &ActiveSession) -> Result<(), SessionError> {
        self.sessions.save(session).await
    }

    /// Authenticate the attempt and, on success, swap the caller's session for a freshly
    /// identified one.
    ///
    /// The session is left untouched on every failure path.
    #[instrument(skip_all, fields(password_only = attempt.password_only))]
    pub async fn login(&self, attempt: LoginAttempt, session: &mut ActiveSession) -> LoginOutcome {
        let user = match self.authenticate(&attempt, &session.state).await {
            Ok(user) => user,
            Err(err) => {
                if err.code.is_authentication_failure() {
                    info!(code = %err.code, "login rejected");
                } else {
                    debug!("login failed: {}", err.code);
                }
                return LoginOutcome::Failure(err);
            }
        };
        drop(attempt);

        let next_url = self.navigation.pre_login_target(&session.state);

        // Never carry the pre-login identifier over into the authenticated session.
        match self.sessions.renew(&session.id, user).await {
            Ok(renewed) => {
                *session = renewed;
                info!(
                    user_dn = session
                        .state
                        .identity
                        .as_ref()
                        .map_or("", |identity| identity.user_dn.as_str()),
                    "login succeeded"
                );
                LoginOutcome::Success { next_url }
            }
            Err(err) => {
                error!("Failed to renew session: {err}");
                LoginOutcome::Failure(ErrorInformation::internal("unable to establish session"))
            }
        }
    }

    async fn authenticate(
        &self,
        attempt: &LoginAttempt,
        state: &SessionState,
    ) -> Result<AuthenticatedUser, ErrorInformation> {
        let username = attempt.username();
        if !attempt.password_only && username.is_none() {
            return Err(ErrorInformation::missing_parameter(
                "missing username parameter",
            ));
        }

        let Some(secret) = attempt.secret() else {
            return Err(ErrorInformation::missing_parameter(
                "missing password parameter",
            ));
        };

        if attempt.password_only {
            let identity = state
                .identity
                .as_ref()
                .ok_or_else(|| ErrorInformation::internal("session has no bound identity"))?;
            return self
                .authenticator
                .authenticate_known_identity(identity, secret)
                .await;
        }

        match username {
            Some(username) => {
                self.authenticator
                    .search_and_authenticate(
                        username,
                        secret,
                        attempt.context.as_deref(),
                        attempt.auth_profile.as_deref(),
                    )
                    .await
            }
            None => Err(ErrorInformation::missing_parameter(
                "missing username parameter",
            )),
        }
    }
}
