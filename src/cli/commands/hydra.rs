use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use std::time::Duration;
use url::Url;

pub const ARG_ADMIN_URL: &str = "admin-url";
pub const ARG_UPSTREAM_TIMEOUT: &str = "upstream-timeout";

#[derive(Debug, Clone)]
pub struct Options {
    pub admin_url: Url,
    pub upstream_timeout: Duration,
}

impl Options {
    /// Parse Authorization Server admin arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the admin URL is missing or malformed.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let admin_url = matches
            .get_one::<String>(ARG_ADMIN_URL)
            .context("missing required argument: --admin-url")?;
        let admin_url =
            Url::parse(admin_url).with_context(|| format!("invalid --admin-url: {admin_url}"))?;

        let timeout = matches
            .get_one::<u64>(ARG_UPSTREAM_TIMEOUT)
            .copied()
            .unwrap_or(10);

        Ok(Self {
            admin_url,
            upstream_timeout: Duration::from_secs(timeout),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ADMIN_URL)
                .long(ARG_ADMIN_URL)
                .help("Authorization Server admin API base URL")
                .default_value("http://127.0.0.1:4445/")
                .env("WARDEN_ADMIN_URL"),
        )
        .arg(
            Arg::new(ARG_UPSTREAM_TIMEOUT)
                .long(ARG_UPSTREAM_TIMEOUT)
                .help("Timeout in seconds for every call to the Authorization Server")
                .default_value("10")
                .env("WARDEN_UPSTREAM_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}
