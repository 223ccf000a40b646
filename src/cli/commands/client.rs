use anyhow::{bail, Context};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use url::Url;

use crate::oauth::ClientConfig;

pub const ARG_AUTH_URL: &str = "auth-url";
pub const ARG_TOKEN_URL: &str = "token-url";
pub const ARG_CLIENT_ID: &str = "client-id";
pub const ARG_CLIENT_SECRET: &str = "client-secret";
pub const ARG_REDIRECT_URI: &str = "redirect-uri";
pub const ARG_SCOPES: &str = "scopes";

/// Split a comma separated list, dropping blanks.
pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn url_arg(matches: &ArgMatches, id: &str) -> anyhow::Result<Url> {
    let value = matches
        .get_one::<String>(id)
        .with_context(|| format!("missing required argument: --{id}"))?;
    Url::parse(value).with_context(|| format!("invalid --{id}: {value}"))
}

/// Parse the OAuth2 client registration.
///
/// # Errors
/// Returns an error if a URL is malformed or the client secret is missing.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<ClientConfig> {
    let client_id = matches
        .get_one::<String>(ARG_CLIENT_ID)
        .cloned()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("missing required argument: --{ARG_CLIENT_ID}"))?;

    let client_secret = match matches.get_one::<String>(ARG_CLIENT_SECRET) {
        Some(secret) if !secret.is_empty() => SecretString::from(secret.clone()),
        _ => bail!("missing required argument: --{ARG_CLIENT_SECRET}"),
    };

    let scopes = matches
        .get_one::<String>(ARG_SCOPES)
        .map(|s| split_list(s))
        .unwrap_or_default();

    Ok(ClientConfig {
        client_id,
        client_secret,
        auth_url: url_arg(matches, ARG_AUTH_URL)?,
        token_url: url_arg(matches, ARG_TOKEN_URL)?,
        redirect_uri: url_arg(matches, ARG_REDIRECT_URI)?,
        scopes,
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_AUTH_URL)
                .long(ARG_AUTH_URL)
                .help("Authorization endpoint the browser is sent to")
                .default_value("http://127.0.0.1:4444/oauth2/auth")
                .env("WARDEN_AUTH_URL"),
        )
        .arg(
            Arg::new(ARG_TOKEN_URL)
                .long(ARG_TOKEN_URL)
                .help("Token endpoint used to redeem authorization codes")
                .default_value("http://127.0.0.1:4444/oauth2/token")
                .env("WARDEN_TOKEN_URL"),
        )
        .arg(
            Arg::new(ARG_CLIENT_ID)
                .long(ARG_CLIENT_ID)
                .help("OAuth2 client id")
                .default_value("my-app-client")
                .env("WARDEN_CLIENT_ID"),
        )
        .arg(
            Arg::new(ARG_CLIENT_SECRET)
                .long(ARG_CLIENT_SECRET)
                .help("OAuth2 client secret")
                .env("WARDEN_CLIENT_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_REDIRECT_URI)
                .long(ARG_REDIRECT_URI)
                .help("Redirect URI registered for the client")
                .default_value("http://127.0.0.1:9091/callback")
                .env("WARDEN_REDIRECT_URI"),
        )
        .arg(
            Arg::new(ARG_SCOPES)
                .long(ARG_SCOPES)
                .help("Comma separated scopes requested when starting a flow")
                .default_value("openid,offline")
                .env("WARDEN_SCOPES"),
        )
}
