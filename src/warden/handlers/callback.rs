use axum::{
    extract::{Extension, Query},
    response::Response,
};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::IntoParams;

use crate::{
    oauth::{ExchangeError, TokenSet},
    warden::{error::FlowError, state::AppState},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// Authorization code
    code: Option<String>,
    /// State issued when the flow was started
    state: Option<String>,
    /// Error reported by the Authorization Server
    error: Option<String>,
    /// Human readable error description
    error_description: Option<String>,
}

#[utoipa::path(
    get,
    path = "/callback",
    params(CallbackQuery),
    responses(
        (status = 200, description = "Token set", body = TokenSet),
        (status = 400, description = "Authorization denied, missing code, state mismatch or code already redeemed", body = String),
        (status = 502, description = "Token endpoint unavailable", body = String)
    ),
    tag = "relying-party"
)]
#[instrument(skip_all)]
pub async fn callback(
    Query(query): Query<CallbackQuery>,
    Extension(state): Extension<AppState>,
) -> Result<Response, FlowError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        return Err(FlowError::AuthorizationDenied(if description.is_empty() {
            error
        } else {
            format!("{error}: {description}")
        }));
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or(FlowError::MissingParameter("code"))?;

    let nonce = query.state.unwrap_or_default();
    if nonce.is_empty() || !state.states.consume(&nonce).await {
        return Err(FlowError::StateMismatch);
    }

    if !state.codes.claim(&code).await {
        return Err(FlowError::CodeReplayed);
    }

    let tokens = match state.tokens.exchange(&code, state.config.client()).await {
        Ok(tokens) => tokens,
        Err(err @ ExchangeError::Rejected { .. }) => {
            warn!("authorization code rejected after state was consumed: {}", err);
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    match tokens.expiry {
        Some(expiry) => info!("authorization code exchanged, expires at {}", expiry),
        None => info!("authorization code exchanged, no expiry reported"),
    }

    state.presenter.tokens(&tokens)
}
