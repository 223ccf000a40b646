pub mod callback;
pub mod consent;
pub mod health;
pub mod login;
pub mod token;

pub use self::callback::callback;
pub use self::consent::{consent, consent_submit};
pub use self::health::health;
pub use self::login::{login, login_submit};
pub use self::token::{get_token, home};

use axum::{
    body::Body,
    http::{header::LOCATION, HeaderMap, StatusCode},
    response::Response,
};

use super::error::FlowError;

/// Relay `target` to the browser with a `302 Found`, unmodified.
pub(crate) fn found(target: &str) -> Result<Response, FlowError> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target)
        .body(Body::empty())
        .map_err(|e| FlowError::InvalidRedirect(e.to_string()))
}

/// Trimmed, non-empty header value.
pub(crate) fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
