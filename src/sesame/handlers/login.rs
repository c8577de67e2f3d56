//! HTTP adapter for the login core.

use axum::{
    body::Bytes,
    extract::{Extension, RawQuery},
    http::{
        header::{ALLOW, CACHE_CONTROL, CONTENT_TYPE, LOCATION, SET_COOKIE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{Html, IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

use crate::auth::{
    ActiveSession, ErrorCode, LoginRequest, LoginResponse, LoginState, RestResult, SessionError,
};
use crate::sesame::{cookie, page};

/// Status sent with an error, for both the page and the JSON rendering.
#[must_use]
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::MissingParameter | ErrorCode::InvalidRequestToken => StatusCode::BAD_REQUEST,
        ErrorCode::WrongPassword | ErrorCode::UserNotFound | ErrorCode::MultipleMatches => {
            StatusCode::UNAUTHORIZED
        }
        ErrorCode::DirectoryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body accepted by `restLogin`, documented in the OpenAPI output only; the login core
/// reads the raw body itself.
#[derive(ToSchema, Deserialize, Debug)]
pub struct RestLoginBody {
    pub username: Option<String>,
    pub password: Option<String>,
    pub context: Option<String>,
    #[serde(rename = "ldapProfile")]
    pub ldap_profile: Option<String>,
}

/// Query string and urlencoded form fields merged into one view; form fields win.
struct HttpLoginRequest {
    post: bool,
    params: HashMap<String, String>,
    headers: HeaderMap,
    body: Bytes,
}

impl HttpLoginRequest {
    fn new(method: &Method, query: Option<&str>, headers: HeaderMap, body: Bytes) -> Self {
        let mut params: HashMap<String, String> = query
            .map(|query| url::form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let is_form = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            params.extend(url::form_urlencoded::parse(&body).into_owned());
        }

        Self {
            post: method == Method::POST,
            params,
            headers,
            body,
        }
    }
}

impl LoginRequest for HttpLoginRequest {
    fn is_post(&self) -> bool {
        self.post
    }

    fn parameter(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn body(&self) -> Option<&[u8]> {
        (!self.body.is_empty()).then_some(self.body.as_ref())
    }
}

async fn resolve_session(
    state: &LoginState,
    headers: &HeaderMap,
) -> Result<ActiveSession, SessionError> {
    if let Some(id) = cookie::extract_session_id(headers) {
        if let Some(session) = state.sessions().load(&id).await? {
            return Ok(ActiveSession { id, state: session });
        }
    }
    state.sessions().create().await
}

fn render(response: LoginResponse, session: &ActiveSession) -> Response {
    match response {
        LoginResponse::Redirect { location } => match HeaderValue::from_str(&location) {
            Ok(location) => (StatusCode::SEE_OTHER, [(LOCATION, location)]).into_response(),
            Err(err) => {
                error!("Invalid redirect location: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        LoginResponse::Page { variant, error } => {
            let status = error
                .as_ref()
                .map_or(StatusCode::OK, |error| status_for(error.code));
            let html = page::render(variant, &session.state.form_token, error.as_ref());
            (status, Html(html)).into_response()
        }
        LoginResponse::Json(result) => {
            let status = result.code.map_or(StatusCode::OK, status_for);
            (status, Json(result)).into_response()
        }
        LoginResponse::MethodNotAllowed => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(ALLOW, HeaderValue::from_static("POST"))],
        )
            .into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/login",
    params(
        ("processAction" = Option<String>, Query, description = "`login` or `restLogin`; absent renders the login page"),
        ("X-Form-Token" = Option<String>, Header, description = "Anti-forgery token, alternative to the formToken parameter"),
    ),
    request_body(
        content = RestLoginBody,
        description = "restLogin credentials; non-string values are ignored",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Login succeeded", body = RestResult),
        (status = 400, description = "Missing parameter or invalid form token", body = RestResult),
        (status = 405, description = "Login action sent with a method other than POST"),
        (status = 401, description = "Authentication failed", body = RestResult),
        (status = 503, description = "Directory unavailable", body = RestResult),
        (status = 500, description = "Internal error", body = RestResult)
    ),
    tag = "login"
)]
#[instrument(skip_all)]
pub async fn login(
    method: Method,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    state: Extension<Arc<LoginState>>,
    body: Bytes,
) -> impl IntoResponse {
    let mut session = match resolve_session(&state, &headers).await {
        Ok(session) => session,
        Err(err) => {
            error!("Failed to resolve session: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "session unavailable").into_response();
        }
    };

    let request = HttpLoginRequest::new(&method, query.as_deref(), headers, body);
    let outcome = state.controller().process(&request, &mut session).await;
    drop(request);

    let mut response = render(outcome, &session);

    match cookie::session_cookie(state.config(), &session.id) {
        Ok(cookie) => {
            response.headers_mut().insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}
