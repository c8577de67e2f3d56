use clap::{Arg, ArgAction, ArgMatches, Command};

pub const ARG_PUBLIC_BASE_URL: &str = "public-base-url";
pub const ARG_FORWARD_URL: &str = "forward-url";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SANITIZE_PATTERN: &str = "sanitize-pattern";

#[derive(Debug, Clone)]
pub struct Options {
    pub public_base_url: String,
    pub forward_url: String,
    pub session_ttl_seconds: u64,
    pub sanitize_patterns: Vec<String>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        let read = |id: &str, default: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            public_base_url: read(ARG_PUBLIC_BASE_URL, "http://localhost:8080"),
            forward_url: read(ARG_FORWARD_URL, "/"),
            session_ttl_seconds: matches
                .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
                .copied()
                .unwrap_or(1800),
            sanitize_patterns: matches
                .get_many::<String>(ARG_SANITIZE_PATTERN)
                .map(|values| values.cloned().collect())
                .unwrap_or_default(),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PUBLIC_BASE_URL)
                .long(ARG_PUBLIC_BASE_URL)
                .help("Externally visible base URL, used for REST next URLs and secure cookies")
                .env("SESAME_PUBLIC_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_FORWARD_URL)
                .long(ARG_FORWARD_URL)
                .help("Where to send users after login when no original URL was recorded")
                .env("SESAME_FORWARD_URL")
                .default_value("/"),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Idle session TTL in seconds")
                .env("SESAME_SESSION_TTL_SECONDS")
                .default_value("1800")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_SANITIZE_PATTERN)
                .long(ARG_SANITIZE_PATTERN)
                .help("Regex of content stripped from JSON login values, can be repeated")
                .env("SESAME_SANITIZE_PATTERN")
                .action(ArgAction::Append),
        )
}
