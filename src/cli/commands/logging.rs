use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count.
const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Highest numeric level accepted from `WARDEN_LOG_LEVEL`.
const MAX_VERBOSITY: u8 = 5;

/// Accepts either a count (`0`..=`5`) or a level name, case insensitive.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|level: &str| -> Result<u8, String> {
        match level.parse::<u8>() {
            Ok(count) if count <= MAX_VERBOSITY => return Ok(count),
            Ok(count) => return Err(format!("log level {count} is above {MAX_VERBOSITY}")),
            Err(_) => {}
        }

        LEVELS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(level.trim()))
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("invalid log level '{level}', expected one of {LEVELS:?}"))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .long_help(
                "Log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace (default: error).\n\
                 WARDEN_LOG_LEVEL takes a count (0-5) or a level name. RUST_LOG directives \
                 refine the resulting filter.",
            )
            .env("WARDEN_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(level: &str) -> Result<u8, String> {
        let command = Command::new("warden").arg(
            Arg::new("level")
                .long("level")
                .value_parser(validator_log_level()),
        );

        command
            .try_get_matches_from(["warden", "--level", level])
            .map(|matches| matches.get_one::<u8>("level").copied().unwrap_or_default())
            .map_err(|e| e.to_string())
    }

    #[test]
    fn level_names_map_to_counts() {
        assert_eq!(parse("error"), Ok(0));
        assert_eq!(parse("WARN"), Ok(1));
        assert_eq!(parse("Info"), Ok(2));
        assert_eq!(parse("debug"), Ok(3));
        assert_eq!(parse("trace"), Ok(4));
    }

    #[test]
    fn numeric_levels_are_bounded() {
        assert_eq!(parse("5"), Ok(5));
        assert!(parse("6").is_err());
        assert!(parse("verbose").is_err());
    }
}
