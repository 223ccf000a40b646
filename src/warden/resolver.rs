//! Challenge resolution: look up the pending request behind a challenge.

use serde::Serialize;
use std::fmt;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::error::FlowError;
use crate::hydra::{AdminApi, RetryPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeKind {
    Login,
    Consent,
}

impl ChallengeKind {
    /// Query parameter the Authorization Server uses for this kind of challenge.
    #[must_use]
    pub const fn param(self) -> &'static str {
        match self {
            Self::Login => "login_challenge",
            Self::Consent => "consent_challenge",
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::Consent => write!(f, "consent"),
        }
    }
}

/// A challenge exactly as received on the incoming redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    id: String,
    kind: ChallengeKind,
}

impl Challenge {
    /// # Errors
    /// Returns [`FlowError::MissingParameter`] when `id` is absent or blank.
    pub fn new(id: Option<String>, kind: ChallengeKind) -> Result<Self, FlowError> {
        match id {
            Some(id) if !id.trim().is_empty() => Ok(Self { id, kind }),
            _ => Err(FlowError::MissingParameter(kind.param())),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ChallengeKind {
        self.kind
    }
}

/// What the presentation layer needs to know about a pending request.
#[derive(ToSchema, Clone, Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub challenge: String,
    pub requested_scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_hint: Option<String>,
    pub skip: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

/// Fetch the pending login or consent request for `challenge`.
///
/// The lookup is read-only, so transport failures are retried per `retry`.
///
/// # Errors
/// Returns [`FlowError::Upstream`] if the Authorization Server rejects the challenge
/// or cannot be reached.
#[instrument(skip(admin, retry), fields(kind = %challenge.kind()))]
pub async fn resolve(
    admin: &dyn AdminApi,
    retry: &RetryPolicy,
    challenge: &Challenge,
) -> Result<RequestContext, FlowError> {
    let context = match challenge.kind() {
        ChallengeKind::Login => {
            let request = retry.run(|| admin.login_request(challenge.id())).await?;
            RequestContext {
                challenge: challenge.id().to_string(),
                requested_scopes: request.requested_scope,
                subject_hint: non_empty(request.subject),
                skip: request.skip,
                client_id: request.client.map(|c| c.client_id),
            }
        }
        ChallengeKind::Consent => {
            let request = retry.run(|| admin.consent_request(challenge.id())).await?;
            RequestContext {
                challenge: challenge.id().to_string(),
                requested_scopes: request.requested_scope,
                subject_hint: non_empty(request.subject),
                skip: request.skip,
                client_id: request.client.map(|c| c.client_id),
            }
        }
    };

    debug!(
        "resolved {} challenge: scopes={:?} skip={}",
        challenge.kind(),
        context.requested_scopes,
        context.skip
    );

    Ok(context)
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warden::testing::FakeAdmin;
    use std::time::Duration;

    #[test]
    fn blank_challenge_is_missing() {
        assert!(matches!(
            Challenge::new(None, ChallengeKind::Login),
            Err(FlowError::MissingParameter("login_challenge"))
        ));
        assert!(matches!(
            Challenge::new(Some("  ".into()), ChallengeKind::Consent),
            Err(FlowError::MissingParameter("consent_challenge"))
        ));
    }

    #[tokio::test]
    async fn consent_challenge_exposes_requested_scopes() -> anyhow::Result<()> {
        let admin = FakeAdmin::default();
        let challenge = Challenge::new(Some("def456".into()), ChallengeKind::Consent)?;

        let context = resolve(&admin, &RetryPolicy::none(), &challenge).await?;

        assert_eq!(context.challenge, "def456");
        assert_eq!(context.requested_scopes, vec!["openid", "offline"]);
        assert_eq!(admin.calls().consent_request, 1);
        assert_eq!(admin.calls().accepts(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn login_challenge_carries_subject_hint() -> anyhow::Result<()> {
        let admin = FakeAdmin::default().with_login_subject("simon", true);
        let challenge = Challenge::new(Some("abc123".into()), ChallengeKind::Login)?;

        let context = resolve(&admin, &RetryPolicy::none(), &challenge).await?;

        assert_eq!(context.subject_hint.as_deref(), Some("simon"));
        assert!(context.skip);
        Ok(())
    }

    #[tokio::test]
    async fn transport_failures_are_retried() -> anyhow::Result<()> {
        let admin = FakeAdmin::default().failing_reads(2);
        let challenge = Challenge::new(Some("abc123".into()), ChallengeKind::Login)?;
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
            multiplier: 1.0,
        };

        resolve(&admin, &retry, &challenge).await?;

        assert_eq!(admin.calls().login_request, 3);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_challenge_is_not_retried() -> anyhow::Result<()> {
        let admin = FakeAdmin::default().rejecting("used");
        let challenge = Challenge::new(Some("used".into()), ChallengeKind::Consent)?;

        let err = resolve(&admin, &RetryPolicy::default(), &challenge)
            .await
            .err();

        assert!(matches!(err, Some(FlowError::Upstream(ref e)) if e.is_client_fault()));
        assert_eq!(admin.calls().consent_request, 1);
        Ok(())
    }
}
