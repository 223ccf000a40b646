//! Shared handler state.

use std::sync::Arc;

use super::{config::FlowConfig, identity::IdentityVerifier, presenter::Presenter};
use crate::{
    hydra::AdminApi,
    oauth::{PendingStates, RedeemedCodes, TokenExchange},
};

/// Everything a request handler needs. Cloned per request; all members are
/// immutable apart from the `state` nonce store and the redeemed codes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<FlowConfig>,
    pub admin: Arc<dyn AdminApi>,
    pub tokens: Arc<dyn TokenExchange>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub presenter: Arc<dyn Presenter>,
    pub states: PendingStates,
    pub codes: RedeemedCodes,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: FlowConfig,
        admin: Arc<dyn AdminApi>,
        tokens: Arc<dyn TokenExchange>,
        verifier: Arc<dyn IdentityVerifier>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let states = PendingStates::new(config.state_ttl());
        let codes = RedeemedCodes::new(config.state_ttl());

        Self {
            config: Arc::new(config),
            admin,
            tokens,
            verifier,
            presenter,
            states,
            codes,
        }
    }
}
