//! Action dispatch: route a request to the form or REST login, or show the login page.

use std::fmt;
use tracing::{instrument, warn};

use super::extract;
use super::form_token::{form_token_error, require_form_token};
use super::login::LoginService;
use super::session::ActiveSession;
use super::strategy::{form_response, rest_response, LoginResponse, PageVariant};
use super::utils::{safe_relative_url, Sanitizer};
use super::LoginRequest;

pub const PARAM_ACTION: &str = "processAction";
pub const PARAM_NEXT: &str = "next";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessAction {
    Login,
    RestLogin,
}

impl ProcessAction {
    /// Unknown or absent selectors yield `None`.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value? {
            "login" => Some(Self::Login),
            "restLogin" => Some(Self::RestLogin),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => f.write_str("login"),
            Self::RestLogin => f.write_str("restLogin"),
        }
    }
}

pub struct LoginController {
    service: LoginService,
    sanitizer: Sanitizer,
}

impl LoginController {
    #[must_use]
    pub fn new(service: LoginService, sanitizer: Sanitizer) -> Self {
        Self { service, sanitizer }
    }

    #[must_use]
    pub fn service(&self) -> &LoginService {
        &self.service
    }

    /// Handle one request against the caller's session.
    ///
    /// `session` is replaced in place when a login succeeds.
    #[instrument(skip_all)]
    pub async fn process(
        &self,
        request: &dyn LoginRequest,
        session: &mut ActiveSession,
    ) -> LoginResponse {
        let password_only = session.state.password_only();
        let variant = PageVariant::from_password_only(password_only);

        let Some(action) = ProcessAction::parse(request.parameter(PARAM_ACTION)) else {
            self.remember_destination(request, session).await;
            return LoginResponse::page(variant);
        };

        if !request.is_post() {
            warn!("Rejected {action} request: method not allowed");
            return LoginResponse::MethodNotAllowed;
        }

        if let Err(err) = require_form_token(request, &session.state) {
            let error = form_token_error(&err);
            warn!("Rejected {action} request: {}", error.message);
            return match action {
                ProcessAction::Login => LoginResponse::Page {
                    variant,
                    error: Some(error),
                },
                ProcessAction::RestLogin => LoginResponse::json_error(&error),
            };
        }

        match action {
            ProcessAction::Login => self.process_login(request, session, variant).await,
            ProcessAction::RestLogin => {
                self.process_rest_login(request, session, password_only).await
            }
        }
    }

    async fn process_login(
        &self,
        request: &dyn LoginRequest,
        session: &mut ActiveSession,
        variant: PageVariant,
    ) -> LoginResponse {
        let attempt = extract::from_form(request, variant == PageVariant::PasswordOnly);
        let outcome = self.service.login(attempt, session).await;
        form_response(outcome, variant)
    }

    async fn process_rest_login(
        &self,
        request: &dyn LoginRequest,
        session: &mut ActiveSession,
        password_only: bool,
    ) -> LoginResponse {
        let values = match extract::json_string_map(request.body()) {
            Ok(values) => values,
            Err(error) => return LoginResponse::json_error(&error),
        };

        let attempt = extract::from_json(&values, &self.sanitizer, password_only);
        drop(values);

        let outcome = self.service.login(attempt, session).await;
        rest_response(outcome, self.service.navigation())
    }

    /// Record a same-origin `next` destination on an anonymous session.
    async fn remember_destination(&self, request: &dyn LoginRequest, session: &mut ActiveSession) {
        let Some(next) = request.parameter(PARAM_NEXT).and_then(safe_relative_url) else {
            return;
        };
        if session.state.authenticated
            || session.state.original_url.as_deref() == Some(next.as_str())
        {
            return;
        }
        session.state.original_url = Some(next);
        if let Err(err) = self.service.save_session(session).await {
            warn!("Failed to store original URL: {err}");
        }
    }
}
