//! Flow errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{hydra::UpstreamError, oauth::ExchangeError};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("missing {0}")]
    MissingParameter(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("user login info incorrect")]
    InvalidCredentials,
    #[error("identity assertion not accepted by this login policy")]
    UnsupportedAssertion,
    #[error("state mismatch: unknown, expired or already used")]
    StateMismatch,
    #[error("authorization code already redeemed")]
    CodeReplayed,
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
    #[error("failed to render page: {0}")]
    Render(String),
    #[error("invalid redirect target: {0}")]
    InvalidRedirect(String),
}

impl FlowError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_)
            | Self::Validation(_)
            | Self::InvalidCredentials
            | Self::UnsupportedAssertion
            | Self::StateMismatch
            | Self::CodeReplayed
            | Self::AuthorizationDenied(_)
            | Self::Upstream(UpstreamError::Rejected { .. })
            | Self::Exchange(ExchangeError::Rejected { .. }) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::Exchange(_) => StatusCode::BAD_GATEWAY,
            Self::Render(_) | Self::InvalidRedirect(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FlowError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(status = status.as_u16(), "{}", message);
        } else {
            warn!(status = status.as_u16(), "{}", message);
        }

        (status, message).into_response()
    }
}
