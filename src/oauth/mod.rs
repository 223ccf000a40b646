//! Relying party leg of the authorization code flow.

pub mod exchange;
pub mod state;

pub use self::exchange::{ExchangeError, TokenClient, TokenExchange, TokenSet};
pub use self::state::{PendingStates, RedeemedCodes};

use secrecy::SecretString;
use url::Url;

/// Registered OAuth2 client used to start flows and redeem codes.
#[derive(Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: Url,
    pub token_url: Url,
    pub redirect_uri: Url,
    pub scopes: Vec<String>,
}

impl ClientConfig {
    /// Authorization endpoint URL the browser is sent to for a new flow.
    #[must_use]
    pub fn authorization_url(&self, state: &str) -> Url {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_uri.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);
        url
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("scopes", &self.scopes)
            .finish()
    }
}
