use crate::{
    cli::commands::{flow::Presentation, identity::IdentityPolicy},
    hydra::HydraAdmin,
    oauth::{ClientConfig, TokenClient},
    warden::{
        self,
        config::FlowConfig,
        grant::GrantPolicy,
        identity::{IdentityVerifier, StaticCredentials, TrustedHeader},
        presenter::{HeadlessPresenter, HtmlPresenter, Presenter},
        AppState,
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub admin_url: Url,
    pub upstream_timeout: Duration,
    pub client: ClientConfig,
    pub identity_policy: IdentityPolicy,
    pub subject_header: String,
    pub login_username: String,
    pub login_password: SecretString,
    pub presentation: Presentation,
    pub grant_policy: GrantPolicy,
    pub state_ttl: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if an HTTP client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("server args: {:?}", args);

    let admin = HydraAdmin::new(&args.admin_url, args.upstream_timeout)
        .context("Failed to build admin API client")?;
    let tokens =
        TokenClient::new(args.upstream_timeout).context("Failed to build token endpoint client")?;

    let credentials = StaticCredentials::new(args.login_username, args.login_password);
    let verifier: Arc<dyn IdentityVerifier> = match args.identity_policy {
        IdentityPolicy::Credentials => Arc::new(credentials),
        IdentityPolicy::TrustedHeader => Arc::new(TrustedHeader::new(credentials)),
    };

    let presenter: Arc<dyn Presenter> = match args.presentation {
        Presentation::Html => Arc::new(HtmlPresenter),
        Presentation::Headless => Arc::new(HeadlessPresenter),
    };

    let config = FlowConfig::new(args.client)
        .with_grant_policy(args.grant_policy)
        .with_subject_header(args.subject_header)
        .with_state_ttl(args.state_ttl);

    info!(
        "admin API {}, identity policy {:?}, presentation {:?}",
        args.admin_url, args.identity_policy, args.presentation
    );

    let state = AppState::new(config, Arc::new(admin), Arc::new(tokens), verifier, presenter);

    warden::new(args.port, state).await
}
