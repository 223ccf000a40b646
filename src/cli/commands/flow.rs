use anyhow::anyhow;
use clap::{builder::PossibleValuesParser, Arg, ArgMatches, Command};
use std::time::Duration;

use super::client::split_list;
use crate::warden::grant::GrantPolicy;

pub const ARG_PRESENTATION: &str = "presentation";
pub const ARG_GRANT_POLICY: &str = "grant-policy";
pub const ARG_GRANT_SCOPES: &str = "grant-scopes";
pub const ARG_STATE_TTL: &str = "state-ttl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Html,
    Headless,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub presentation: Presentation,
    pub grant_policy: GrantPolicy,
    pub state_ttl: Duration,
}

impl Options {
    /// Parse presentation and consent arguments from matches.
    ///
    /// # Errors
    /// Returns an error for an unknown grant policy.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let presentation = match matches.get_one::<String>(ARG_PRESENTATION).map(String::as_str) {
            Some("headless") => Presentation::Headless,
            _ => Presentation::Html,
        };

        let scopes = matches
            .get_one::<String>(ARG_GRANT_SCOPES)
            .map(|s| split_list(s))
            .unwrap_or_default();
        let name = matches
            .get_one::<String>(ARG_GRANT_POLICY)
            .map_or("fixed", String::as_str);
        let grant_policy = GrantPolicy::from_name(name, scopes).map_err(|e| anyhow!(e))?;

        let ttl = matches.get_one::<u64>(ARG_STATE_TTL).copied().unwrap_or(600);

        Ok(Self {
            presentation,
            grant_policy,
            state_ttl: Duration::from_secs(ttl),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PRESENTATION)
                .long(ARG_PRESENTATION)
                .help("HTML pages for browsers, or JSON with automatic consent")
                .default_value("html")
                .env("WARDEN_PRESENTATION")
                .value_parser(PossibleValuesParser::new(["html", "headless"])),
        )
        .arg(
            Arg::new(ARG_GRANT_POLICY)
                .long(ARG_GRANT_POLICY)
                .help("How granted scopes are derived on consent")
                .default_value("fixed")
                .env("WARDEN_GRANT_POLICY")
                .value_parser(PossibleValuesParser::new([
                    "fixed",
                    "requested",
                    "user-selected",
                ])),
        )
        .arg(
            Arg::new(ARG_GRANT_SCOPES)
                .long(ARG_GRANT_SCOPES)
                .help("Comma separated scopes granted by the fixed policy")
                .default_value("offline_access,offline,openid")
                .env("WARDEN_GRANT_SCOPES"),
        )
        .arg(
            Arg::new(ARG_STATE_TTL)
                .long(ARG_STATE_TTL)
                .help("Seconds a started flow may take to reach the callback")
                .default_value("600")
                .env("WARDEN_STATE_TTL")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
