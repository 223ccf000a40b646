use axum::{
    extract::{Extension, Json},
    http::HeaderMap,
    response::Response,
};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use super::{found, header_value};
use crate::warden::{error::FlowError, identity::IdentityAssertion, state::AppState};

#[derive(ToSchema, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    password: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Authorization URL for a fresh flow")
    ),
    tag = "relying-party"
)]
#[instrument(skip_all)]
pub async fn home(Extension(state): Extension<AppState>) -> Result<Response, FlowError> {
    let nonce = state.states.issue().await;
    let url = state.config.client().authorization_url(&nonce);

    state.presenter.home(&url)
}

#[utoipa::path(
    post,
    path = "/getToken",
    request_body = TokenRequest,
    params(
        ("Username" = String, Header, description = "Subject asserted by the gateway, must match `userName`")
    ),
    responses(
        (status = 302, description = "Redirect to the authorization endpoint"),
        (status = 400, description = "Missing or mismatched subject header, or incorrect credentials", body = String)
    ),
    tag = "relying-party"
)]
#[instrument(skip_all)]
pub async fn get_token(
    headers: HeaderMap,
    Extension(state): Extension<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Response, FlowError> {
    let header = state.config.subject_header();
    let asserted = header_value(&headers, header)
        .ok_or_else(|| FlowError::Validation(format!("missing {header} header")))?;

    if asserted != request.user_name {
        return Err(FlowError::Validation(format!(
            "{header} header does not match userName"
        )));
    }

    let subject = state.verifier.verify(&IdentityAssertion::Credentials {
        username: request.user_name,
        password: SecretString::from(request.password),
    })?;

    let nonce = state.states.issue().await;
    debug!("starting authorization flow for {}", subject);

    found(state.config.client().authorization_url(&nonce).as_str())
}
