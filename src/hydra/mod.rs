//! Authorization Server admin API client.
//!
//! The login and consent legs talk to the Authorization Server only through the
//! four admin operations defined in [`AdminApi`]. [`HydraAdmin`] implements them
//! against the ORY Hydra admin REST endpoints; tests swap in their own doubles.

pub mod retry;

pub use self::retry::RetryPolicy;

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::APP_USER_AGENT;

const LOGIN_REQUEST_PATH: &str = "oauth2/auth/requests/login";
const LOGIN_ACCEPT_PATH: &str = "oauth2/auth/requests/login/accept";
const CONSENT_REQUEST_PATH: &str = "oauth2/auth/requests/consent";
const CONSENT_ACCEPT_PATH: &str = "oauth2/auth/requests/consent/accept";
const READY_PATH: &str = "health/ready";

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The Authorization Server refused the request (unknown, expired or used challenge).
    #[error("authorization server rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("authorization server unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },
    #[error("authorization server unreachable: {0}")]
    Transport(String),
    #[error("unexpected authorization server response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Transport faults and 5xx answers may succeed on a later attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Unavailable { .. })
    }

    /// Whether the fault lies with the request rather than the server.
    #[must_use]
    pub const fn is_client_fault(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// Pending login request as reported by the Authorization Server.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct LoginRequest {
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub requested_scope: Vec<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub client: Option<OAuth2Client>,
}

/// Pending consent request as reported by the Authorization Server.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConsentRequest {
    #[serde(default)]
    pub challenge: String,
    #[serde(default)]
    pub requested_scope: Vec<String>,
    #[serde(default)]
    pub skip: bool,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub client: Option<OAuth2Client>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OAuth2Client {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_name: String,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AcceptLogin {
    pub subject: String,
    pub remember: bool,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AcceptConsent {
    pub grant_scope: Vec<String>,
    pub remember: bool,
}

/// Where the browser goes next after an accept operation.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Completed {
    pub redirect_to: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
    #[serde(default)]
    error_hint: String,
}

impl ErrorBody {
    fn message(self, status: StatusCode) -> String {
        [self.error_description, self.error_hint, self.error]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| status.to_string())
    }
}

/// Admin operations of the Authorization Server used by the login/consent legs.
///
/// `login_request` and `consent_request` are reads and safe to repeat. The accept
/// operations transition the challenge on the server and must be called at most
/// once per challenge.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn login_request(&self, challenge: &str) -> Result<LoginRequest, UpstreamError>;

    async fn accept_login(
        &self,
        challenge: &str,
        body: &AcceptLogin,
    ) -> Result<Completed, UpstreamError>;

    async fn consent_request(&self, challenge: &str) -> Result<ConsentRequest, UpstreamError>;

    async fn accept_consent(
        &self,
        challenge: &str,
        body: &AcceptConsent,
    ) -> Result<Completed, UpstreamError>;

    async fn ready(&self) -> Result<(), UpstreamError>;
}

#[derive(Clone, Debug)]
pub struct HydraAdmin {
    client: Client,
    base: Url,
}

impl HydraAdmin {
    /// Build an admin client rooted at `admin_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(admin_url: &Url, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base: with_trailing_slash(admin_url),
        })
    }

    fn endpoint(&self, path: &str, param: (&str, &str)) -> Result<Url, UpstreamError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| UpstreamError::Decode(format!("invalid admin endpoint {path}: {e}")))?;
        url.query_pairs_mut().append_pair(param.0, param.1);
        Ok(url)
    }

    async fn call<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, UpstreamError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, url.path());

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = check(request.send().await?).await?;

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl AdminApi for HydraAdmin {
    #[instrument(skip(self))]
    async fn login_request(&self, challenge: &str) -> Result<LoginRequest, UpstreamError> {
        let url = self.endpoint(LOGIN_REQUEST_PATH, ("login_challenge", challenge))?;
        self.call::<(), _>(Method::GET, url, None).await
    }

    #[instrument(skip(self, body), fields(subject = %body.subject))]
    async fn accept_login(
        &self,
        challenge: &str,
        body: &AcceptLogin,
    ) -> Result<Completed, UpstreamError> {
        let url = self.endpoint(LOGIN_ACCEPT_PATH, ("login_challenge", challenge))?;
        self.call(Method::PUT, url, Some(body)).await
    }

    #[instrument(skip(self))]
    async fn consent_request(&self, challenge: &str) -> Result<ConsentRequest, UpstreamError> {
        let url = self.endpoint(CONSENT_REQUEST_PATH, ("consent_challenge", challenge))?;
        self.call::<(), _>(Method::GET, url, None).await
    }

    #[instrument(skip(self, body), fields(grant_scope = ?body.grant_scope))]
    async fn accept_consent(
        &self,
        challenge: &str,
        body: &AcceptConsent,
    ) -> Result<Completed, UpstreamError> {
        let url = self.endpoint(CONSENT_ACCEPT_PATH, ("consent_challenge", challenge))?;
        self.call(Method::PUT, url, Some(body)).await
    }

    #[instrument(skip(self))]
    async fn ready(&self) -> Result<(), UpstreamError> {
        let url = self
            .base
            .join(READY_PATH)
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;
        check(self.client.get(url).send().await?).await?;
        Ok(())
    }
}

/// Turn a non-success response into an [`UpstreamError`].
async fn check(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body.message(status);

    if status.is_client_error() {
        Err(UpstreamError::Rejected {
            status: status.as_u16(),
            message,
        })
    } else {
        Err(UpstreamError::Unavailable {
            status: status.as_u16(),
            message,
        })
    }
}

fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
