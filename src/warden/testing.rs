//! In-process doubles for the Authorization Server, used by unit tests.
#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use super::{
    config::FlowConfig,
    identity::{IdentityVerifier, StaticCredentials},
    presenter::Presenter,
    state::AppState,
};
use crate::{
    hydra::{
        AcceptConsent, AcceptLogin, AdminApi, Completed, ConsentRequest, LoginRequest,
        OAuth2Client, RetryPolicy, UpstreamError,
    },
    oauth::{tests::client_config, ClientConfig, ExchangeError, TokenExchange, TokenSet},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Calls {
    pub login_request: usize,
    pub accept_login: usize,
    pub consent_request: usize,
    pub accept_consent: usize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.login_request + self.accept_login + self.consent_request + self.accept_consent
    }

    pub fn accepts(&self) -> usize {
        self.accept_login + self.accept_consent
    }
}

#[derive(Debug)]
pub struct FakeAdmin {
    calls: Mutex<Calls>,
    requested_scope: Vec<String>,
    login_subject: String,
    login_skip: bool,
    consent_skip: bool,
    failing_reads: AtomicU32,
    reject: Option<String>,
    subjects: Mutex<Vec<String>>,
    grants: Mutex<Vec<Vec<String>>>,
}

impl Default for FakeAdmin {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Calls::default()),
            requested_scope: vec!["openid".to_string(), "offline".to_string()],
            login_subject: String::new(),
            login_skip: false,
            consent_skip: false,
            failing_reads: AtomicU32::new(0),
            reject: None,
            subjects: Mutex::new(Vec::new()),
            grants: Mutex::new(Vec::new()),
        }
    }
}

impl FakeAdmin {
    pub fn with_login_subject(mut self, subject: &str, skip: bool) -> Self {
        self.login_subject = subject.to_string();
        self.login_skip = skip;
        self
    }

    pub fn with_consent_skip(mut self) -> Self {
        self.consent_skip = true;
        self
    }

    pub fn with_requested_scope(mut self, scopes: &[&str]) -> Self {
        self.requested_scope = scopes.iter().map(ToString::to_string).collect();
        self
    }

    /// Fail the next `count` reads with a transport error.
    pub fn failing_reads(self, count: u32) -> Self {
        self.failing_reads.store(count, Ordering::SeqCst);
        self
    }

    /// Reject every call for `challenge` as already used.
    pub fn rejecting(mut self, challenge: &str) -> Self {
        self.reject = Some(challenge.to_string());
        self
    }

    pub fn calls(&self) -> Calls {
        *self.calls.lock().unwrap()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.subjects.lock().unwrap().clone()
    }

    pub fn grants(&self) -> Vec<Vec<String>> {
        self.grants.lock().unwrap().clone()
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.calls.lock().unwrap());
    }

    fn check(&self, challenge: &str, read: bool) -> Result<(), UpstreamError> {
        if self.reject.as_deref() == Some(challenge) {
            return Err(UpstreamError::Rejected {
                status: 409,
                message: "The resource has already been used".to_string(),
            });
        }

        if read
            && self
                .failing_reads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(UpstreamError::Transport("connection reset".to_string()));
        }

        Ok(())
    }

    fn client() -> Option<OAuth2Client> {
        Some(OAuth2Client {
            client_id: "my-app-client".to_string(),
            client_name: String::new(),
        })
    }
}

#[async_trait]
impl AdminApi for FakeAdmin {
    async fn login_request(&self, challenge: &str) -> Result<LoginRequest, UpstreamError> {
        self.record(|c| c.login_request += 1);
        self.check(challenge, true)?;

        Ok(LoginRequest {
            challenge: challenge.to_string(),
            requested_scope: self.requested_scope.clone(),
            skip: self.login_skip,
            subject: self.login_subject.clone(),
            client: Self::client(),
        })
    }

    async fn accept_login(
        &self,
        challenge: &str,
        body: &AcceptLogin,
    ) -> Result<Completed, UpstreamError> {
        self.record(|c| c.accept_login += 1);
        self.check(challenge, false)?;
        self.subjects.lock().unwrap().push(body.subject.clone());

        Ok(Completed {
            redirect_to: format!("http://127.0.0.1:4444/oauth2/auth?login_verifier=lv-{challenge}"),
        })
    }

    async fn consent_request(&self, challenge: &str) -> Result<ConsentRequest, UpstreamError> {
        self.record(|c| c.consent_request += 1);
        self.check(challenge, true)?;

        Ok(ConsentRequest {
            challenge: challenge.to_string(),
            requested_scope: self.requested_scope.clone(),
            skip: self.consent_skip,
            subject: "simon".to_string(),
            client: Self::client(),
        })
    }

    async fn accept_consent(
        &self,
        challenge: &str,
        body: &AcceptConsent,
    ) -> Result<Completed, UpstreamError> {
        self.record(|c| c.accept_consent += 1);
        self.check(challenge, false)?;
        self.grants.lock().unwrap().push(body.grant_scope.clone());

        Ok(Completed {
            redirect_to: format!(
                "http://127.0.0.1:4444/oauth2/auth?consent_verifier=cv-{challenge}"
            ),
        })
    }

    async fn ready(&self) -> Result<(), UpstreamError> {
        Ok(())
    }
}

/// Token endpoint double that hands out one token set per code and rejects
/// codes it has seen before.
#[derive(Debug, Default)]
pub struct FakeTokens {
    exchanges: Mutex<Vec<String>>,
}

impl FakeTokens {
    /// Every code presented, including rejected repeats.
    pub fn codes(&self) -> Vec<String> {
        self.exchanges.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenExchange for FakeTokens {
    async fn exchange(&self, code: &str, _client: &ClientConfig) -> Result<TokenSet, ExchangeError> {
        let mut exchanges = self.exchanges.lock().unwrap();
        let seen = exchanges.iter().any(|c| c == code);
        exchanges.push(code.to_string());
        if seen {
            return Err(ExchangeError::Rejected {
                status: 400,
                error: "invalid_grant".to_string(),
                description: "The authorization code has already been used.".to_string(),
            });
        }

        Ok(TokenSet {
            access_token: format!("access-{code}"),
            refresh_token: format!("refresh-{code}"),
            expiry: Some(Utc::now() + Duration::hours(1)),
            id_token: format!("id-{code}"),
        })
    }
}

pub fn simon() -> StaticCredentials {
    StaticCredentials::new("simon".to_string(), SecretString::from("test"))
}

pub fn app_state(
    admin: Arc<FakeAdmin>,
    tokens: Arc<FakeTokens>,
    verifier: Arc<dyn IdentityVerifier>,
    presenter: Arc<dyn Presenter>,
) -> AppState {
    let config = FlowConfig::new(client_config("http://127.0.0.1:4444"))
        .with_read_retry(RetryPolicy::none());

    AppState::new(config, admin, tokens, verifier, presenter)
}
