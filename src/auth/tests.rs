//! Login core tests against an in-memory directory.

use super::authenticator::Authenticator;
use super::dispatch::LoginController;
use super::error::{ErrorCode, ErrorInformation};
use super::login::LoginService;
use super::navigation::Navigation;
use super::session::{ActiveSession, MemorySessionStore, SessionStore};
use super::strategy::{LoginResponse, PageVariant};
use super::types::{AuthenticatedUser, AuthenticationType, LoginOutcome, RestResult, UserIdentity};
use super::utils::Sanitizer;
use super::{LoginRequest, FORM_TOKEN_HEADER, FORM_TOKEN_PARAM};
use anyhow::{Context, Result};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ALICE_DN: &str = "uid=alice,ou=people,dc=example,dc=com";
const BOB_DN: &str = "uid=bob,ou=people,dc=example,dc=com";

pub(crate) struct FakeRequest {
    post: bool,
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl FakeRequest {
    pub(crate) fn new() -> Self {
        Self {
            post: true,
            params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub(crate) fn get(mut self) -> Self {
        self.post = false;
        self
    }

    pub(crate) fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub(crate) fn header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub(crate) fn body(mut self, body: &str) -> Self {
        self.body = Some(body.as_bytes().to_vec());
        self
    }
}

impl LoginRequest for FakeRequest {
    fn is_post(&self) -> bool {
        self.post
    }

    fn parameter(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// alice/s3cret can search-authenticate; bob can only confirm a known identity with "pin".
#[derive(Default)]
pub(crate) struct FakeAuthenticator {
    searches: AtomicUsize,
    known: AtomicUsize,
}

impl FakeAuthenticator {
    fn calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst) + self.known.load(Ordering::SeqCst)
    }
}

fn wrong_password() -> ErrorInformation {
    ErrorInformation::new(ErrorCode::WrongPassword, "invalid credentials")
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn authenticate_known_identity(
        &self,
        identity: &UserIdentity,
        secret: &SecretString,
    ) -> Result<AuthenticatedUser, ErrorInformation> {
        self.known.fetch_add(1, Ordering::SeqCst);
        if identity.user_dn == BOB_DN && secret.expose_secret() == "pin" {
            Ok(AuthenticatedUser {
                identity: identity.clone(),
                authentication_type: AuthenticationType::Full,
            })
        } else {
            Err(wrong_password())
        }
    }

    async fn search_and_authenticate(
        &self,
        username: &str,
        secret: &SecretString,
        _context: Option<&str>,
        profile: Option<&str>,
    ) -> Result<AuthenticatedUser, ErrorInformation> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        match username {
            "alice" if secret.expose_secret() == "s3cret" => Ok(AuthenticatedUser {
                identity: UserIdentity::new(ALICE_DN, profile.map(str::to_string)),
                authentication_type: AuthenticationType::Full,
            }),
            "alice" => Err(wrong_password()),
            _ => Err(ErrorInformation::new(
                ErrorCode::UserNotFound,
                "no such user",
            )),
        }
    }
}

struct Harness {
    controller: LoginController,
    authenticator: Arc<FakeAuthenticator>,
    sessions: Arc<MemorySessionStore>,
}

impl Harness {
    fn new() -> Result<Self> {
        let authenticator = Arc::new(FakeAuthenticator::default());
        let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(60)));
        let navigation = Navigation::new("https://sso.example.com", "/welcome")?;
        let service = LoginService::new(authenticator.clone(), sessions.clone(), navigation);
        Ok(Self {
            controller: LoginController::new(service, Sanitizer::default()),
            authenticator,
            sessions,
        })
    }

    async fn anonymous(&self) -> Result<ActiveSession> {
        Ok(self.sessions.create().await?)
    }

    /// A session whose identity was established without a password (e.g. by a token).
    async fn identified(&self) -> Result<ActiveSession> {
        let session = self.sessions.create().await?;
        let user = AuthenticatedUser {
            identity: UserIdentity::new(BOB_DN, None),
            authentication_type: AuthenticationType::WithoutPassword,
        };
        Ok(self.sessions.renew(&session.id, user).await?)
    }
}

fn form_login(session: &ActiveSession) -> FakeRequest {
    FakeRequest::new()
        .param("processAction", "login")
        .param(FORM_TOKEN_PARAM, &session.state.form_token)
}

fn rest_login(session: &ActiveSession, body: &str) -> FakeRequest {
    FakeRequest::new()
        .param("processAction", "restLogin")
        .header(FORM_TOKEN_HEADER, &session.state.form_token)
        .body(body)
}

fn page_error(response: LoginResponse) -> Result<(PageVariant, Option<ErrorInformation>)> {
    match response {
        LoginResponse::Page { variant, error } => Ok((variant, error)),
        other => anyhow::bail!("expected page, got {other:?}"),
    }
}

fn json(response: LoginResponse) -> Result<RestResult> {
    match response {
        LoginResponse::Json(result) => Ok(result),
        other => anyhow::bail!("expected json, got {other:?}"),
    }
}

#[tokio::test]
async fn no_action_renders_login_page() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;
    let before = session.clone();

    let response = harness
        .controller
        .process(&FakeRequest::new().param("username", "alice"), &mut session)
        .await;

    assert_eq!(response, LoginResponse::page(PageVariant::Login));
    assert_eq!(session.id, before.id);
    assert_eq!(harness.authenticator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn unknown_action_renders_login_page() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let request = form_login(&session).param("processAction", "logout");
    let response = harness.controller.process(&request, &mut session).await;

    assert_eq!(response, LoginResponse::page(PageVariant::Login));
    assert_eq!(harness.authenticator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn password_only_session_renders_password_page() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.identified().await?;

    let response = harness
        .controller
        .process(&FakeRequest::new(), &mut session)
        .await;

    assert_eq!(response, LoginResponse::page(PageVariant::PasswordOnly));
    Ok(())
}

#[tokio::test]
async fn form_login_without_token_never_authenticates() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;
    let before = session.clone();

    let request = FakeRequest::new()
        .param("processAction", "login")
        .param("username", "alice")
        .param("password", "s3cret");
    let (variant, error) = page_error(harness.controller.process(&request, &mut session).await)?;

    assert_eq!(variant, PageVariant::Login);
    let error = error.context("expected error")?;
    assert_eq!(error.code, ErrorCode::InvalidRequestToken);
    assert_eq!(error.message, "missing form token");
    assert_eq!(harness.authenticator.calls(), 0);
    assert_eq!(session.id, before.id);
    assert!(!session.state.authenticated);
    Ok(())
}

#[tokio::test]
async fn rest_login_with_forged_token_never_authenticates() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let request = FakeRequest::new()
        .param("processAction", "restLogin")
        .header(FORM_TOKEN_HEADER, "forged")
        .body(r#"{"username":"alice","password":"s3cret"}"#);
    let result = json(harness.controller.process(&request, &mut session).await)?;

    assert!(result.error);
    assert_eq!(result.code, Some(ErrorCode::InvalidRequestToken));
    assert_eq!(result.message.as_deref(), Some("invalid form token"));
    assert_eq!(harness.authenticator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn login_actions_require_post() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;
    let before = session.clone();

    let requests = [
        form_login(&session)
            .param("username", "alice")
            .param("password", "s3cret")
            .get(),
        rest_login(&session, r#"{"username":"alice","password":"s3cret"}"#).get(),
    ];
    for request in &requests {
        let response = harness.controller.process(request, &mut session).await;
        assert_eq!(response, LoginResponse::MethodNotAllowed);
    }

    assert_eq!(harness.authenticator.calls(), 0);
    assert_eq!(session.id, before.id);
    assert!(!session.state.authenticated);
    Ok(())
}

#[tokio::test]
async fn login_page_is_served_on_get() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let response = harness
        .controller
        .process(&FakeRequest::new().get(), &mut session)
        .await;

    assert_eq!(response, LoginResponse::page(PageVariant::Login));
    Ok(())
}

#[tokio::test]
async fn form_login_success_renews_session_and_redirects() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;
    let before = session.clone();

    let request = form_login(&session)
        .param("username", "alice")
        .param("password", "s3cret")
        .param("ldapProfile", "corp");
    let response = harness.controller.process(&request, &mut session).await;

    assert_eq!(
        response,
        LoginResponse::Redirect {
            location: "/welcome".to_string()
        }
    );
    assert_ne!(session.id, before.id);
    assert_ne!(session.state.form_token, before.state.form_token);
    assert!(session.state.authenticated);
    assert_eq!(session.state.authentication_type, AuthenticationType::Full);
    let identity = session.state.identity.clone().context("missing identity")?;
    assert_eq!(identity.user_dn, ALICE_DN);
    assert_eq!(identity.profile.as_deref(), Some("corp"));
    assert!(harness.sessions.load(&before.id).await?.is_none());
    assert!(harness.sessions.load(&session.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn form_login_wrong_password_keeps_session() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;
    let before = session.clone();

    for _ in 0..3 {
        let request = form_login(&session)
            .param("username", "alice")
            .param("password", "nope");
        let (variant, error) =
            page_error(harness.controller.process(&request, &mut session).await)?;
        assert_eq!(variant, PageVariant::Login);
        assert_eq!(error, Some(wrong_password()));
    }

    assert_eq!(session.id, before.id);
    assert_eq!(session.state, before.state);
    assert_eq!(harness.authenticator.calls(), 3);
    let stored = harness
        .sessions
        .load(&session.id)
        .await?
        .context("session dropped")?;
    assert!(!stored.authenticated);
    Ok(())
}

#[tokio::test]
async fn directory_errors_pass_through_unchanged() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let request = form_login(&session)
        .param("username", "mallory")
        .param("password", "whatever");
    let (_, error) = page_error(harness.controller.process(&request, &mut session).await)?;

    assert_eq!(
        error,
        Some(ErrorInformation::new(ErrorCode::UserNotFound, "no such user"))
    );
    Ok(())
}

#[tokio::test]
async fn missing_username_is_reported_before_password() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let (_, error) = page_error(
        harness
            .controller
            .process(&form_login(&session), &mut session)
            .await,
    )?;

    let error = error.context("expected error")?;
    assert_eq!(error.code, ErrorCode::MissingParameter);
    assert_eq!(error.message, "missing username parameter");
    assert_eq!(harness.authenticator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn missing_password_is_reported() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let request = form_login(&session).param("username", "alice");
    let (_, error) = page_error(harness.controller.process(&request, &mut session).await)?;

    let error = error.context("expected error")?;
    assert_eq!(error.code, ErrorCode::MissingParameter);
    assert_eq!(error.message, "missing password parameter");
    assert_eq!(harness.authenticator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn password_only_missing_password_is_reported() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.identified().await?;
    let before = session.clone();

    let request = form_login(&session).param("username", "alice");
    let (variant, error) = page_error(harness.controller.process(&request, &mut session).await)?;

    assert_eq!(variant, PageVariant::PasswordOnly);
    let error = error.context("expected error")?;
    assert_eq!(error.code, ErrorCode::MissingParameter);
    assert_eq!(error.message, "missing password parameter");
    assert_eq!(harness.authenticator.calls(), 0);
    assert_eq!(session.id, before.id);
    assert!(session.state.password_only());
    Ok(())
}

#[tokio::test]
async fn password_only_ignores_username() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.identified().await?;
    let before = session.clone();

    let request = form_login(&session)
        .param("username", "alice")
        .param("password", "pin");
    let response = harness.controller.process(&request, &mut session).await;

    assert!(matches!(response, LoginResponse::Redirect { .. }));
    assert_eq!(harness.authenticator.known.load(Ordering::SeqCst), 1);
    assert_eq!(harness.authenticator.searches.load(Ordering::SeqCst), 0);
    assert_ne!(session.id, before.id);
    assert_eq!(session.state.authentication_type, AuthenticationType::Full);
    assert!(!session.state.password_only());
    Ok(())
}

#[tokio::test]
async fn password_only_failure_rerenders_password_page() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.identified().await?;

    let request = form_login(&session).param("password", "wrong");
    let (variant, error) = page_error(harness.controller.process(&request, &mut session).await)?;

    assert_eq!(variant, PageVariant::PasswordOnly);
    assert_eq!(error, Some(wrong_password()));
    assert!(session.state.password_only());
    Ok(())
}

#[tokio::test]
async fn rest_login_empty_body_is_rejected() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let result = json(
        harness
            .controller
            .process(&rest_login(&session, "{}"), &mut session)
            .await,
    )?;

    assert!(result.error);
    assert_eq!(result.code, Some(ErrorCode::MissingParameter));
    assert_eq!(result.message.as_deref(), Some("missing json request body"));
    assert_eq!(harness.authenticator.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn rest_login_success_returns_absolute_next_url() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;
    let before = session.clone();

    let request = rest_login(&session, r#"{"username":"alice","password":"s3cret","extra":1}"#);
    let result = json(harness.controller.process(&request, &mut session).await)?;

    assert_eq!(
        result,
        RestResult::next_url("https://sso.example.com/welcome".to_string())
    );
    assert_ne!(session.id, before.id);
    assert!(session.state.authenticated);
    Ok(())
}

#[tokio::test]
async fn rest_login_password_only_renews_session() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.identified().await?;
    let before = session.clone();

    let request = rest_login(&session, r#"{"password":"pin"}"#);
    let result = json(harness.controller.process(&request, &mut session).await)?;

    assert_eq!(
        result,
        RestResult::next_url("https://sso.example.com/welcome".to_string())
    );
    assert_eq!(harness.authenticator.known.load(Ordering::SeqCst), 1);
    assert_eq!(harness.authenticator.searches.load(Ordering::SeqCst), 0);
    assert_ne!(session.id, before.id);
    assert_eq!(session.state.authentication_type, AuthenticationType::Full);
    assert!(harness.sessions.load(&before.id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn rest_login_sanitizes_username() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let request = rest_login(&session, r#"{"username":"<alice>","password":"s3cret"}"#);
    let result = json(harness.controller.process(&request, &mut session).await)?;

    assert!(!result.error);
    Ok(())
}

#[tokio::test]
async fn next_parameter_becomes_login_destination() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    harness
        .controller
        .process(&FakeRequest::new().param("next", "/account?tab=1"), &mut session)
        .await;
    assert_eq!(session.state.original_url.as_deref(), Some("/account?tab=1"));

    let request = form_login(&session)
        .param("username", "alice")
        .param("password", "s3cret");
    let response = harness.controller.process(&request, &mut session).await;

    assert_eq!(
        response,
        LoginResponse::Redirect {
            location: "/account?tab=1".to_string()
        }
    );
    assert_eq!(session.state.original_url, None);
    Ok(())
}

#[tokio::test]
async fn offsite_next_parameter_is_ignored() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    for next in ["https://evil.example", "//evil.example", "account"] {
        harness
            .controller
            .process(&FakeRequest::new().param("next", next), &mut session)
            .await;
    }

    assert_eq!(session.state.original_url, None);
    Ok(())
}

#[tokio::test]
async fn login_service_reports_success_without_strategy() -> Result<()> {
    let harness = Harness::new()?;
    let mut session = harness.anonymous().await?;

    let request = FakeRequest::new()
        .param("username", "alice")
        .param("password", "s3cret");
    let attempt = super::extract::from_form(&request, false);
    let outcome = harness.controller.service().login(attempt, &mut session).await;

    assert_eq!(
        outcome,
        LoginOutcome::Success {
            next_url: "/welcome".to_string()
        }
    );
    Ok(())
}
