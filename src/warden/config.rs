//! Immutable flow configuration, built once at start-up.

use std::time::Duration;

use super::grant::GrantPolicy;
use crate::{
    hydra::RetryPolicy,
    oauth::{state::DEFAULT_STATE_TTL, ClientConfig},
};

pub const DEFAULT_SUBJECT_HEADER: &str = "Username";

#[derive(Clone, Debug)]
pub struct FlowConfig {
    client: ClientConfig,
    grant_policy: GrantPolicy,
    subject_header: String,
    state_ttl: Duration,
    read_retry: RetryPolicy,
}

impl FlowConfig {
    #[must_use]
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            grant_policy: GrantPolicy::default(),
            subject_header: DEFAULT_SUBJECT_HEADER.to_string(),
            state_ttl: DEFAULT_STATE_TTL,
            read_retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_grant_policy(mut self, policy: GrantPolicy) -> Self {
        self.grant_policy = policy;
        self
    }

    #[must_use]
    pub fn with_subject_header(mut self, header: String) -> Self {
        self.subject_header = header;
        self
    }

    #[must_use]
    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_read_retry(mut self, retry: RetryPolicy) -> Self {
        self.read_retry = retry;
        self
    }

    #[must_use]
    pub fn client(&self) -> &ClientConfig {
        &self.client
    }

    #[must_use]
    pub fn grant_policy(&self) -> &GrantPolicy {
        &self.grant_policy
    }

    #[must_use]
    pub fn subject_header(&self) -> &str {
        &self.subject_header
    }

    #[must_use]
    pub fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    #[must_use]
    pub fn read_retry(&self) -> &RetryPolicy {
        &self.read_retry
    }
}
