//! Map validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{directory, session};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let directory_opts = directory::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        directory_url: directory_opts.url,
        directory_token: directory_opts.token,
        directory_timeout_seconds: directory_opts.timeout_seconds,
        public_base_url: session_opts.public_base_url,
        forward_url: session_opts.forward_url,
        session_ttl_seconds: session_opts.session_ttl_seconds,
        sanitize_patterns: session_opts.sanitize_patterns,
    }))
}
