//! Configuration module for reportgen.
//!
//! Handles the settings file, environment variables and credentials.

mod credential;
mod settings;

pub use credential::{Credential, CredentialError};
pub use settings::{
    expand_env_vars, CacheSettings, CredentialSettings, FilterSettings, ProviderSettings,
    ReportSettings, Settings, SettingsError,
};
