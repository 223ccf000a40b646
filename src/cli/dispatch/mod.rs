//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run, resolving every option
//! group into its typed configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{client, flow, hydra, identity, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or malformed.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(9091);

    let hydra_opts = hydra::Options::parse(matches)?;
    let client = client::parse(matches)?;
    let identity_opts = identity::Options::parse(matches)?;
    let flow_opts = flow::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        admin_url: hydra_opts.admin_url,
        upstream_timeout: hydra_opts.upstream_timeout,
        client,
        identity_policy: identity_opts.policy,
        subject_header: identity_opts.subject_header,
        login_username: identity_opts.username,
        login_password: identity_opts.password,
        presentation: flow_opts.presentation,
        grant_policy: flow_opts.grant_policy,
        state_ttl: flow_opts.state_ttl,
    }))
}
