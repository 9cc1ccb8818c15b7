//! TOML-based configuration for reportgen.
//!
//! Supports a config file (reportgen.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [providers.voyanta]
//! worker = "./voyanta-worker"
//! timeout_secs = 30
//!
//! [providers.voyanta.credential]
//! token = "${VOYANTA_TOKEN}"
//! email = "analyst@example.com"
//! organization = "Demo Co."
//!
//! [cache]
//! path = "${HOME}/.reportgen/cache.db"
//!
//! [report]
//! join_strategy = "recursive"
//! nan_policy = "propagate"
//!
//! [report.filter]
//! enabled = true
//! operator = "is not equal to"
//! value = ""
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::credential::{Credential, CredentialError};
use crate::report::{JoinKind, NanPolicy};
use crate::worker::DEFAULT_TIMEOUT_SECS;

/// Why a configuration could not be loaded or used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no config file at {0}")]
    FileNotFound(PathBuf),

    #[error("cannot read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("config is not valid TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),

    #[error("no provider named '{0}' is configured")]
    ProviderNotFound(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("bad configuration: {0}")]
    InvalidConfig(String),
}

/// Everything `reportgen.toml` can hold.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Named provider backends.
    pub providers: HashMap<String, ProviderSettings>,

    /// Metadata cache configuration.
    pub cache: CacheSettings,

    /// Report generation behaviour.
    pub report: ReportSettings,
}

/// Provider backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderSettings {
    /// Path to the provider worker binary (supports ${ENV_VAR} expansion).
    pub worker: String,

    /// Extra command-line arguments for the worker.
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Credential to use; falls back to `REPORTGEN_*` environment variables.
    #[serde(default)]
    pub credential: Option<CredentialSettings>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ProviderSettings {
    /// Worker path with environment variables expanded.
    pub fn worker_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.worker)?))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build the credential for this provider.
    pub fn resolved_credential(&self) -> Result<Credential, SettingsError> {
        match &self.credential {
            Some(c) => Ok(Credential::new(
                expand_env_vars(&c.token)?,
                expand_env_vars(&c.email)?,
                expand_env_vars(&c.organization)?,
            )),
            None => Ok(Credential::from_env()?),
        }
    }
}

/// Credential fields as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialSettings {
    pub token: String,
    pub email: String,
    #[serde(default)]
    pub organization: String,
}

/// Metadata cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Cache database path; defaults to `~/.reportgen/cache.db`.
    pub path: Option<String>,
}

impl CacheSettings {
    pub fn cache_path(&self) -> Result<PathBuf, SettingsError> {
        match &self.path {
            Some(path) => Ok(PathBuf::from(expand_env_vars(path)?)),
            None => crate::cache::MetadataCache::default_path()
                .map_err(|e| SettingsError::InvalidConfig(e.to_string())),
        }
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    pub join_strategy: JoinKind,
    pub nan_policy: NanPolicy,
    pub filter: FilterSettings,
}

/// Default filter applied when fetching data dimensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterSettings {
    /// When false, dimension rows are fetched without filters.
    pub enabled: bool,

    /// Operator description looked up in the provider's operator catalog.
    pub operator: String,

    /// Value compared against the first selected column.
    pub value: String,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            operator: "is not equal to".to_string(),
            value: String::new(),
        }
    }
}

impl Settings {
    /// Parse the TOML file at `path`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SettingsError::FileNotFound(path.to_path_buf()),
            _ => SettingsError::ReadError(e),
        })?;
        let settings: Settings = toml::from_str(&text)?;
        tracing::debug!(path = %path.display(), providers = settings.providers.len(), "loaded config");
        Ok(settings)
    }

    /// `REPORTGEN_CONFIG` if set (and then it must exist), otherwise the first
    /// of `./reportgen.toml` and `<config dir>/reportgen/config.toml` that
    /// exists, otherwise defaults.
    pub fn load() -> Result<Self, SettingsError> {
        if let Some(explicit) = env::var_os("REPORTGEN_CONFIG") {
            return Self::from_file(PathBuf::from(explicit));
        }

        let candidates = std::iter::once(PathBuf::from("reportgen.toml"))
            .chain(dirs::config_dir().map(|dir| dir.join("reportgen").join("config.toml")));
        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(candidate);
            }
        }

        Ok(Self::default())
    }

    /// Get a provider by name.
    pub fn get_provider(&self, name: &str) -> Result<&ProviderSettings, SettingsError> {
        self.providers
            .get(name)
            .ok_or_else(|| SettingsError::ProviderNotFound(name.to_string()))
    }

    /// Configured provider names, sorted.
    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let lookup =
        |name: &str| env::var(name).map_err(|_| SettingsError::MissingEnvVar(name.to_string()));

    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find('$') {
        result.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            let end = braced.find('}').ok_or_else(|| {
                SettingsError::InvalidConfig(format!("unterminated variable in '{}'", s))
            })?;
            result.push_str(&lookup(&braced[..end])?);
            rest = &braced[end + 1..];
        } else {
            let len = after
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if len == 0 {
                result.push('$');
            } else {
                result.push_str(&lookup(&after[..len])?);
            }
            rest = &after[len..];
        }
    }

    result.push_str(rest);
    Ok(result)
}
