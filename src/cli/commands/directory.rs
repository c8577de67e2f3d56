use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_DIRECTORY_URL: &str = "directory-url";
pub const ARG_DIRECTORY_TOKEN: &str = "directory-token";
pub const ARG_DIRECTORY_TIMEOUT_SECONDS: &str = "directory-timeout-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: String,
    pub token: Option<SecretString>,
    pub timeout_seconds: u64,
}

impl Options {
    /// Parse directory arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the directory URL is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = matches
            .get_one::<String>(ARG_DIRECTORY_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("missing required argument: --{ARG_DIRECTORY_URL}"))?;

        Ok(Self {
            url,
            token: matches
                .get_one::<String>(ARG_DIRECTORY_TOKEN)
                .filter(|v| !v.is_empty())
                .map(|v| SecretString::from(v.clone())),
            timeout_seconds: matches
                .get_one::<u64>(ARG_DIRECTORY_TIMEOUT_SECONDS)
                .copied()
                .unwrap_or(10),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DIRECTORY_URL)
                .long(ARG_DIRECTORY_URL)
                .help("Directory service base URL, example: https://directory.tld:9000")
                .env("SESAME_DIRECTORY_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DIRECTORY_TOKEN)
                .long(ARG_DIRECTORY_TOKEN)
                .help("Bearer token sent to the directory service")
                .env("SESAME_DIRECTORY_TOKEN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DIRECTORY_TIMEOUT_SECONDS)
                .long(ARG_DIRECTORY_TIMEOUT_SECONDS)
                .help("Timeout for directory requests in seconds")
                .env("SESAME_DIRECTORY_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64)),
        )
}
