//! Per-call authorization context.
//!
//! Supports configuration via environment variables:
//! - `REPORTGEN_TOKEN`: Session token issued by the provider
//! - `REPORTGEN_EMAIL`: Account email the session belongs to
//! - `REPORTGEN_ORGANIZATION`: Organization the session acts for

use std::env;
use std::fmt;

/// Error type for credential construction.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Immutable credential threaded explicitly through every provider call.
///
/// Built once after login and never looked up from ambient session state.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    email: String,
    organization: String,
}

impl Credential {
    pub fn new(
        token: impl Into<String>,
        email: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            email: email.into(),
            organization: organization.into(),
        }
    }

    /// Load the credential from environment variables.
    ///
    /// `REPORTGEN_TOKEN` and `REPORTGEN_EMAIL` are required,
    /// `REPORTGEN_ORGANIZATION` defaults to an empty string.
    pub fn from_env() -> Result<Self, CredentialError> {
        let token = env::var("REPORTGEN_TOKEN")
            .map_err(|_| CredentialError::MissingEnvVar("REPORTGEN_TOKEN".to_string()))?;
        let email = env::var("REPORTGEN_EMAIL")
            .map_err(|_| CredentialError::MissingEnvVar("REPORTGEN_EMAIL".to_string()))?;
        let organization = env::var("REPORTGEN_ORGANIZATION").unwrap_or_default();

        Ok(Self::new(token, email, organization))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("email", &self.email)
            .field("organization", &self.organization)
            .finish()
    }
}
