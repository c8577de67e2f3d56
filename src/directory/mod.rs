//! HTTP directory client.
//!
//! Credentials are checked by a remote directory service; this module is the only place that
//! knows its wire format and turns its answers into [`ErrorInformation`] values.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::auth::{
    AuthenticatedUser, AuthenticationType, Authenticator, ErrorCode, ErrorInformation,
    UserIdentity,
};
use crate::cli::globals::GlobalArgs;
use crate::APP_USER_AGENT;

const SEARCH_AUTHENTICATE_PATH: &str = "/v1/search-authenticate";
const AUTHENTICATE_PATH: &str = "/v1/authenticate";

/// Build `{scheme}://{host}:{port}{endpoint}` from the configured directory URL.
pub fn endpoint_url(directory_url: &str, endpoint: &str) -> Result<String> {
    let url = Url::parse(directory_url)
        .with_context(|| format!("Error parsing directory URL: {directory_url}"))?;

    let scheme = url.scheme();

    let host = url
        .host()
        .ok_or_else(|| anyhow!("Error parsing URL: no host specified"))?
        .to_owned();

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(anyhow!("Error parsing URL: unsupported scheme {scheme}")),
        },
    };

    let base_path = url.path().trim_end_matches('/');

    Ok(format!("{scheme}://{host}:{port}{base_path}{endpoint}"))
}

#[derive(Serialize)]
struct SearchAuthenticateRequest<'a> {
    username: &'a str,
    password: &'a str,
    context: Option<&'a str>,
    profile: Option<&'a str>,
}

#[derive(Serialize)]
struct AuthenticateRequest<'a> {
    user_dn: &'a str,
    profile: Option<&'a str>,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthenticateResponse {
    user_dn: String,
    profile: Option<String>,
    authentication_type: Option<AuthenticationType>,
}

#[derive(Deserialize, Default)]
struct DirectoryError {
    message: Option<String>,
}

/// Map a non-success directory status to the error shown to the user.
pub fn error_for_status(status: StatusCode, message: Option<String>) -> ErrorInformation {
    let (code, fallback) = match status {
        StatusCode::UNAUTHORIZED => (ErrorCode::WrongPassword, "wrong password"),
        StatusCode::NOT_FOUND => (ErrorCode::UserNotFound, "user not found"),
        StatusCode::CONFLICT => (ErrorCode::MultipleMatches, "multiple users matched"),
        _ => (ErrorCode::DirectoryUnavailable, "directory unavailable"),
    };
    let message = message
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string());
    ErrorInformation::new(code, message)
}

fn unavailable() -> ErrorInformation {
    ErrorInformation::new(ErrorCode::DirectoryUnavailable, "directory unavailable")
}

#[derive(Debug)]
pub struct HttpDirectory {
    client: Client,
    search_url: String,
    authenticate_url: String,
    token: SecretString,
}

impl HttpDirectory {
    /// # Errors
    /// Returns an error if the directory URL is invalid or the HTTP client can't be built.
    pub fn new(globals: &GlobalArgs, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            search_url: endpoint_url(&globals.directory_url, SEARCH_AUTHENTICATE_PATH)?,
            authenticate_url: endpoint_url(&globals.directory_url, AUTHENTICATE_PATH)?,
            token: globals.directory_token.clone(),
        })
    }

    async fn post<T: Serialize + Sync>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<AuthenticatedUser, ErrorInformation> {
        let mut request = self.client.post(url).json(payload);
        if !self.token.expose_secret().is_empty() {
            request = request.bearer_auth(self.token.expose_secret());
        }

        let response = request.send().await.map_err(|err| {
            error!("Directory request failed: {err}");
            unavailable()
        })?;

        let status = response.status();
        if !status.is_success() {
            let body: DirectoryError = response.json().await.unwrap_or_default();
            let err = error_for_status(status, body.message);
            if err.code == ErrorCode::DirectoryUnavailable {
                warn!("{url} - {status}, {}", err.message);
            } else {
                debug!("{url} - {status}, {}", err.code);
            }
            return Err(err);
        }

        let body: AuthenticateResponse = response.json().await.map_err(|err| {
            error!("Error parsing JSON response: {err}");
            unavailable()
        })?;

        Ok(AuthenticatedUser {
            identity: UserIdentity::new(body.user_dn, body.profile),
            authentication_type: body.authentication_type.unwrap_or(AuthenticationType::Full),
        })
    }
}

#[async_trait]
impl Authenticator for HttpDirectory {
    #[instrument(skip(self, secret), fields(user_dn = %identity.user_dn))]
    async fn authenticate_known_identity(
        &self,
        identity: &UserIdentity,
        secret: &SecretString,
    ) -> Result<AuthenticatedUser, ErrorInformation> {
        let payload = AuthenticateRequest {
            user_dn: &identity.user_dn,
            profile: identity.profile.as_deref(),
            password: secret.expose_secret(),
        };
        self.post(&self.authenticate_url, &payload).await
    }

    #[instrument(skip(self, secret))]
    async fn search_and_authenticate(
        &self,
        username: &str,
        secret: &SecretString,
        context: Option<&str>,
        profile: Option<&str>,
    ) -> Result<AuthenticatedUser, ErrorInformation> {
        let payload = SearchAuthenticateRequest {
            username,
            password: secret.expose_secret(),
            context,
            profile,
        };
        self.post(&self.search_url, &payload).await
    }
}
