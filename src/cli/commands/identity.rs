use anyhow::{bail, Context};
use clap::{builder::PossibleValuesParser, Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::warden::config::DEFAULT_SUBJECT_HEADER;

pub const ARG_IDENTITY_POLICY: &str = "identity-policy";
pub const ARG_SUBJECT_HEADER: &str = "subject-header";
pub const ARG_LOGIN_USERNAME: &str = "login-username";
pub const ARG_LOGIN_PASSWORD: &str = "login-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPolicy {
    /// Username and password checked against the configured login.
    Credentials,
    /// Subject taken from a header set by a trusted gateway.
    TrustedHeader,
}

#[derive(Debug, Clone)]
pub struct Options {
    pub policy: IdentityPolicy,
    pub subject_header: String,
    pub username: String,
    pub password: SecretString,
}

impl Options {
    /// Parse identity verification arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the login password is missing or the header name is blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let policy = match matches
            .get_one::<String>(ARG_IDENTITY_POLICY)
            .map(String::as_str)
        {
            Some("trusted-header") => IdentityPolicy::TrustedHeader,
            _ => IdentityPolicy::Credentials,
        };

        let subject_header = matches
            .get_one::<String>(ARG_SUBJECT_HEADER)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .with_context(|| format!("missing required argument: --{ARG_SUBJECT_HEADER}"))?;

        let username = matches
            .get_one::<String>(ARG_LOGIN_USERNAME)
            .cloned()
            .unwrap_or_default();

        let password = match matches.get_one::<String>(ARG_LOGIN_PASSWORD) {
            Some(password) if !password.is_empty() => SecretString::from(password.clone()),
            _ => bail!("missing required argument: --{ARG_LOGIN_PASSWORD}"),
        };

        Ok(Self {
            policy,
            subject_header,
            username,
            password,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_IDENTITY_POLICY)
                .long(ARG_IDENTITY_POLICY)
                .help("How the login subject is established")
                .default_value("credentials")
                .env("WARDEN_IDENTITY_POLICY")
                .value_parser(PossibleValuesParser::new(["credentials", "trusted-header"])),
        )
        .arg(
            Arg::new(ARG_SUBJECT_HEADER)
                .long(ARG_SUBJECT_HEADER)
                .help("Header carrying the subject asserted by the gateway")
                .default_value(DEFAULT_SUBJECT_HEADER)
                .env("WARDEN_SUBJECT_HEADER"),
        )
        .arg(
            Arg::new(ARG_LOGIN_USERNAME)
                .long(ARG_LOGIN_USERNAME)
                .help("User name accepted by the login form")
                .default_value("simon")
                .env("WARDEN_LOGIN_USERNAME"),
        )
        .arg(
            Arg::new(ARG_LOGIN_PASSWORD)
                .long(ARG_LOGIN_PASSWORD)
                .help("Password accepted by the login form")
                .env("WARDEN_LOGIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}
