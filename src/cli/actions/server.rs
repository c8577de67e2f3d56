use crate::{
    auth::{LoginConfig, LoginState},
    cli::{globals::GlobalArgs, telemetry},
    directory::HttpDirectory,
    sesame,
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub directory_url: String,
    pub directory_token: Option<SecretString>,
    pub directory_timeout_seconds: u64,
    pub public_base_url: String,
    pub forward_url: String,
    pub session_ttl_seconds: u64,
    pub sanitize_patterns: Vec<String>,
}

fn log_startup_args(args: &Args) {
    debug!(
        port = args.port,
        directory_url = %args.directory_url,
        directory_token = args.directory_token.is_some(),
        directory_timeout_seconds = args.directory_timeout_seconds,
        public_base_url = %args.public_base_url,
        forward_url = %args.forward_url,
        session_ttl_seconds = args.session_ttl_seconds,
        sanitize_patterns = args.sanitize_patterns.len(),
        "startup arguments"
    );
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let mut globals = GlobalArgs::new(args.directory_url);
    if let Some(token) = args.directory_token {
        globals.set_token(token);
    }

    let directory = HttpDirectory::new(
        &globals,
        Duration::from_secs(args.directory_timeout_seconds),
    )
    .context("Failed to build directory client")?;

    let config = LoginConfig::new(args.public_base_url)
        .with_forward_url(args.forward_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_sanitize_patterns(args.sanitize_patterns);

    let state = LoginState::with_memory_sessions(config, Arc::new(directory))
        .context("Invalid login configuration")?;

    info!(
        "Directory: {}, public base URL: {}",
        globals.directory_url,
        state.config().public_base_url()
    );

    let result = sesame::new(args.port, state).await;

    telemetry::shutdown_tracer();

    result
}
