#![allow(clippy::needless_for_each)]

use crate::{
    auth::{ErrorCode, LoginState, NextUrl, RestResult},
    sesame::handlers::{
        health::{Health, __path_health},
        login::{RestLoginBody, __path_login},
    },
};
use anyhow::Result;
use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;
use utoipa::OpenApi;

pub mod cookie;
pub mod handlers;
pub mod page;

#[derive(OpenApi)]
#[openapi(
    paths(health, login),
    components(
        schemas(Health, RestResult, NextUrl, ErrorCode, RestLoginBody)
    ),
    tags(
        (name = "sesame", description = "Login authentication gateway"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Build the application router around a shared login state.
pub fn router(state: LoginState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login).post(handlers::login))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(state)),
        )
        .route("/health", get(handlers::health).options(handlers::health))
}

/// Serve the login gateway until ctrl-c.
/// # Errors
/// Returns an error if the listener can't bind or the server fails
pub async fn new(port: u16, state: LoginState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let path = request.uri().path();
    let method = request.method();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    // Headers carry cookies and form tokens, keep them out of the span.
    debug_span!("http-request", %method, path, request_id)
}
