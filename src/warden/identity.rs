//! Identity verification strategies for the login leg.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::error::FlowError;

/// Who the browser claims to be. Request scoped, never stored.
pub enum IdentityAssertion {
    /// Username and password submitted by the user.
    Credentials {
        username: String,
        password: SecretString,
    },
    /// Subject asserted by a trusted upstream gateway header.
    Subject(String),
}

impl fmt::Debug for IdentityAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials { username, .. } => f
                .debug_struct("Credentials")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Self::Subject(subject) => f.debug_tuple("Subject").field(subject).finish(),
        }
    }
}

/// Turns an [`IdentityAssertion`] into the subject reported to the Authorization Server.
pub trait IdentityVerifier: Send + Sync {
    /// # Errors
    /// Returns [`FlowError::InvalidCredentials`] on a mismatch and
    /// [`FlowError::UnsupportedAssertion`] for an assertion kind this policy ignores.
    fn verify(&self, assertion: &IdentityAssertion) -> Result<String, FlowError>;

    /// Whether a subject header on the login request is taken at face value.
    fn trusts_subject_header(&self) -> bool {
        false
    }
}

/// Checks credentials against a single configured identity.
#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password: SecretString,
}

impl StaticCredentials {
    #[must_use]
    pub fn new(username: String, password: SecretString) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

impl IdentityVerifier for StaticCredentials {
    fn verify(&self, assertion: &IdentityAssertion) -> Result<String, FlowError> {
        match assertion {
            IdentityAssertion::Credentials { username, password } => {
                if username.is_empty() {
                    return Err(FlowError::Validation("user name cannot be empty".into()));
                }

                if *username == self.username
                    && password.expose_secret() == self.password.expose_secret()
                {
                    Ok(username.clone())
                } else {
                    Err(FlowError::InvalidCredentials)
                }
            }
            IdentityAssertion::Subject(_) => Err(FlowError::UnsupportedAssertion),
        }
    }
}

/// Delegates authentication to a gateway that forwards the subject in a header.
///
/// Credentials (as posted to the headless token endpoint) are still checked
/// against the wrapped [`StaticCredentials`].
#[derive(Clone, Debug)]
pub struct TrustedHeader {
    credentials: StaticCredentials,
}

impl TrustedHeader {
    #[must_use]
    pub fn new(credentials: StaticCredentials) -> Self {
        Self { credentials }
    }
}

impl IdentityVerifier for TrustedHeader {
    fn verify(&self, assertion: &IdentityAssertion) -> Result<String, FlowError> {
        match assertion {
            IdentityAssertion::Subject(subject) => {
                let subject = subject.trim();
                if subject.is_empty() {
                    Err(FlowError::Validation("user name cannot be empty".into()))
                } else {
                    Ok(subject.to_string())
                }
            }
            credentials @ IdentityAssertion::Credentials { .. } => {
                self.credentials.verify(credentials)
            }
        }
    }

    fn trusts_subject_header(&self) -> bool {
        true
    }
}
