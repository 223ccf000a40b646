use axum::{
    extract::{Extension, Query, RawForm},
    response::Response,
};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::form_urlencoded;
use utoipa::IntoParams;

use super::found;
use crate::{
    hydra::AcceptConsent,
    warden::{
        error::FlowError,
        resolver::{resolve, Challenge, ChallengeKind},
        state::AppState,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConsentQuery {
    /// Consent challenge issued by the Authorization Server
    consent_challenge: Option<String>,
}

#[utoipa::path(
    get,
    path = "/consent",
    params(ConsentQuery),
    responses(
        (status = 200, description = "Consent prompt with the requested scopes"),
        (status = 302, description = "Consent accepted, continue at the Authorization Server"),
        (status = 400, description = "Missing, unknown or expired challenge", body = String),
        (status = 502, description = "Authorization Server unavailable", body = String)
    ),
    tag = "consent"
)]
#[instrument(skip_all, fields(challenge = tracing::field::Empty))]
pub async fn consent(
    Query(query): Query<ConsentQuery>,
    Extension(state): Extension<AppState>,
) -> Result<Response, FlowError> {
    let challenge = Challenge::new(query.consent_challenge, ChallengeKind::Consent)?;
    tracing::Span::current().record("challenge", challenge.id());

    if !state.presenter.prompts_user() {
        debug!("no consent prompt, accepting with the grant policy");
        return accept(&state, &challenge, None).await;
    }

    let context = resolve(state.admin.as_ref(), state.config.read_retry(), &challenge).await?;

    if context.skip {
        debug!("consent already given, skipping prompt");
        let grant = state
            .config
            .grant_policy()
            .grant(&context.requested_scopes, &context.requested_scopes);
        return send(&state, &challenge, grant).await;
    }

    state.presenter.consent(&context)
}

#[utoipa::path(
    post,
    path = "/consent",
    params(ConsentQuery),
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "Repeated `grant_scope` fields"),
    responses(
        (status = 302, description = "Consent accepted, continue at the Authorization Server"),
        (status = 400, description = "Missing, unknown or expired challenge", body = String),
        (status = 502, description = "Authorization Server unavailable", body = String)
    ),
    tag = "consent"
)]
#[instrument(skip_all, fields(challenge = tracing::field::Empty))]
pub async fn consent_submit(
    Query(query): Query<ConsentQuery>,
    Extension(state): Extension<AppState>,
    RawForm(form): RawForm,
) -> Result<Response, FlowError> {
    let challenge = Challenge::new(query.consent_challenge, ChallengeKind::Consent)?;
    tracing::Span::current().record("challenge", challenge.id());

    let selected: Vec<String> = form_urlencoded::parse(&form)
        .filter(|(key, _)| key == "grant_scope")
        .map(|(_, value)| value.into_owned())
        .collect();

    accept(&state, &challenge, Some(&selected)).await
}

/// Derive the grant with the configured policy, resolving the request first
/// only when the policy depends on the requested scopes. Without a user
/// selection every requested scope counts as selected.
async fn accept(
    state: &AppState,
    challenge: &Challenge,
    selected: Option<&[String]>,
) -> Result<Response, FlowError> {
    let policy = state.config.grant_policy();

    let requested = if policy.needs_requested_scopes() {
        resolve(state.admin.as_ref(), state.config.read_retry(), challenge)
            .await?
            .requested_scopes
    } else {
        Vec::new()
    };

    let grant = policy.grant(&requested, selected.unwrap_or(&requested));
    send(state, challenge, grant).await
}

/// Not retried: a challenge is single use.
async fn send(
    state: &AppState,
    challenge: &Challenge,
    grant_scope: Vec<String>,
) -> Result<Response, FlowError> {
    let body = AcceptConsent {
        grant_scope,
        remember: false,
    };
    let completed = state.admin.accept_consent(challenge.id(), &body).await?;

    info!("consent accepted: grant_scope={:?}", body.grant_scope);

    found(&completed.redirect_to)
}
