//! `-v` counter and `USERBOARD_LOG_LEVEL`, both mapped onto [`LEVELS`].

use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Index is the `-v` count; the env var may use either the index or the name.
pub const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

fn parse_level(value: &str) -> Result<u8, String> {
    let value = value.trim().to_ascii_lowercase();
    let index = match value.parse::<usize>() {
        Ok(index) if index < LEVELS.len() => Some(index),
        Ok(_) => None,
        Err(_) => LEVELS.iter().position(|(name, _)| *name == value),
    };

    index.and_then(|i| u8::try_from(i).ok()).ok_or_else(|| {
        let names: Vec<&str> = LEVELS.iter().map(|(name, _)| *name).collect();
        format!("expected one of {} or 0-{}", names.join(", "), LEVELS.len() - 1)
    })
}

/// Tracing level for a verbosity count; counts past the table stay at TRACE.
#[must_use]
pub fn level(verbosity: u8) -> Level {
    LEVELS
        .get(usize::from(verbosity))
        .map_or(Level::TRACE, |(_, level)| *level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log more: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .env("USERBOARD_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::new(parse_level)),
    )
}
