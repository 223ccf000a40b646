//! # warden
//!
//! Login and consent provider for an OAuth2/OpenID Connect Authorization
//! Server that delegates user authentication (Ory Hydra admin API), together
//! with the relying party endpoints that start the authorization code flow and
//! redeem the code on the callback.

pub mod cli;
pub mod hydra;
pub mod oauth;
pub mod warden;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
