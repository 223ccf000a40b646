use axum::{
    extract::{Extension, Form, Query},
    http::HeaderMap,
    response::Response,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use utoipa::IntoParams;

use super::{found, header_value};
use crate::{
    hydra::AcceptLogin,
    warden::{
        error::FlowError,
        identity::IdentityAssertion,
        resolver::{resolve, Challenge, ChallengeKind},
        state::AppState,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoginQuery {
    /// Login challenge issued by the Authorization Server
    login_challenge: Option<String>,
}

#[derive(Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[utoipa::path(
    get,
    path = "/login",
    params(LoginQuery),
    responses(
        (status = 200, description = "Login prompt"),
        (status = 302, description = "Login accepted, continue at the Authorization Server"),
        (status = 400, description = "Missing, unknown or expired challenge", body = String),
        (status = 502, description = "Authorization Server unavailable", body = String)
    ),
    tag = "login"
)]
#[instrument(skip_all, fields(challenge = tracing::field::Empty))]
pub async fn login(
    headers: HeaderMap,
    Query(query): Query<LoginQuery>,
    Extension(state): Extension<AppState>,
) -> Result<Response, FlowError> {
    let challenge = Challenge::new(query.login_challenge, ChallengeKind::Login)?;
    tracing::Span::current().record("challenge", challenge.id());

    if state.verifier.trusts_subject_header() {
        if let Some(subject) = header_value(&headers, state.config.subject_header()) {
            let subject = state.verifier.verify(&IdentityAssertion::Subject(subject))?;
            debug!("subject asserted by {} header", state.config.subject_header());
            return accept(&state, &challenge, subject).await;
        }
    }

    let context = resolve(state.admin.as_ref(), state.config.read_retry(), &challenge).await?;

    if context.skip {
        let subject = context.subject_hint.clone().ok_or_else(|| {
            FlowError::Validation("login request can be skipped but has no subject".to_string())
        })?;
        debug!("login already authenticated, skipping prompt");
        return accept(&state, &challenge, subject).await;
    }

    state.presenter.login(&context)
}

#[utoipa::path(
    post,
    path = "/login",
    params(LoginQuery),
    request_body(content = String, content_type = "application/x-www-form-urlencoded", description = "`username` and `password`"),
    responses(
        (status = 302, description = "Login accepted, continue at the Authorization Server"),
        (status = 400, description = "Missing challenge or incorrect credentials", body = String),
        (status = 502, description = "Authorization Server unavailable", body = String)
    ),
    tag = "login"
)]
#[instrument(skip_all, fields(challenge = tracing::field::Empty))]
pub async fn login_submit(
    Query(query): Query<LoginQuery>,
    Extension(state): Extension<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, FlowError> {
    let challenge = Challenge::new(query.login_challenge, ChallengeKind::Login)?;
    tracing::Span::current().record("challenge", challenge.id());

    let subject = state.verifier.verify(&IdentityAssertion::Credentials {
        username: form.username,
        password: SecretString::from(form.password),
    })?;

    accept(&state, &challenge, subject).await
}

/// Report the authenticated subject. Not retried: a challenge is single use.
async fn accept(
    state: &AppState,
    challenge: &Challenge,
    subject: String,
) -> Result<Response, FlowError> {
    let body = AcceptLogin {
        subject,
        remember: false,
    };
    let completed = state.admin.accept_login(challenge.id(), &body).await?;

    info!("login accepted for subject {}", body.subject);

    found(&completed.redirect_to)
}
