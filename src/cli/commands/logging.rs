//! `-v` counting and `SESAME_LOG_LEVEL` parsing.

use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accept a level name (any case) or its verbosity count.
fn parse_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    let index = match value.parse::<usize>() {
        Ok(count) => (count < LEVELS.len()).then_some(count),
        Err(_) => LEVELS
            .iter()
            .position(|level| level.eq_ignore_ascii_case(value)),
    };

    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level {value:?}, expected one of {LEVELS:?}"))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("SESAME_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}
