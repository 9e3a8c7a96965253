//! Arbiter and host configuration.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then `SONAR_`-prefixed environment variables (`SONAR_RUNTIME__TRIGGER_QUEUE_CAPACITY=128`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "SONAR";

/// Errors raised while loading, validating, or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// The layered sources could not be merged or deserialized.
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// The configuration file could not be written.
    #[error("Failed to write {path}: {source}")]
    WriteError {
        /// Target path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A single field holds an invalid value.
    #[error("Invalid value for '{field}': {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several fields failed validation.
    #[error("{} validation errors", .0.len())]
    MultipleValidationErrors(Vec<ConfigError>),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    /// How radio states map to remediation.
    pub remediation: RemediationPolicy,
    /// Trigger queue sizing.
    pub runtime: RuntimeConfig,
    /// Product feature flags consulted by the main flow.
    pub features: FeatureFlags,
    /// HTTP host settings.
    pub server: ServerConfig,
}

/// Mapping from radio power states to remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationPolicy {
    /// When `true` a resetting radio raises the radio-off overlay like any
    /// other non-powered state. When `false` a reset leaves the current
    /// overlay untouched until the radio settles.
    pub resetting_is_off: bool,
}

impl Default for RemediationPolicy {
    fn default() -> Self {
        Self {
            resetting_is_off: true,
        }
    }
}

/// Settings for the trigger event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Capacity of the bounded trigger queue.
    pub trigger_queue_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            trigger_queue_capacity: 64,
        }
    }
}

/// Feature flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Route "check symptoms" to the multi-step self-diagnosis flow.
    pub new_self_diagnosis: bool,
}

/// HTTP host settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind_address: String,
    /// Whether the hosted device starts in onboarding.
    pub onboarding_required: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            onboarding_required: true,
        }
    }
}

impl ArbiterConfig {
    /// Load configuration from an optional TOML file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is given but missing, if a source cannot be
    /// parsed, or if the merged result fails validation.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.display().to_string()));
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let config: Self = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults plus
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file or the environment is invalid.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(Some(path))
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::load(None)
        }
    }

    /// Write the configuration as pretty TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::WriteError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the single failure, or `MultipleValidationErrors` when more
    /// than one field is invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.runtime.trigger_queue_capacity == 0 {
            errors.push(ConfigError::ValidationError {
                field: "runtime.trigger_queue_capacity".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        if self.server.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ConfigError::ValidationError {
                field: "server.bind_address".to_string(),
                message: format!("'{}' is not a socket address", self.server.bind_address),
            });
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address does not parse.
    pub fn bind_address(&self) -> ConfigResult<SocketAddr> {
        self.server
            .bind_address
            .parse()
            .map_err(|_| ConfigError::ValidationError {
                field: "server.bind_address".to_string(),
                message: format!("'{}' is not a socket address", self.server.bind_address),
            })
    }
}

/// Default configuration file location.
///
/// `~/.config/sonar/config.toml` on Linux, the platform equivalent elsewhere.
#[must_use]
pub fn default_config_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "sonar").map_or_else(
        || PathBuf::from("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ArbiterConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.remediation.resetting_is_off);
        assert_eq!(config.runtime.trigger_queue_capacity, 64);
        assert!(!config.features.new_self_diagnosis);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[remediation]
resetting_is_off = false

[features]
new_self_diagnosis = true
"#,
        )
        .unwrap();

        let config = ArbiterConfig::load(Some(&path)).unwrap();
        assert!(!config.remediation.resetting_is_off);
        assert!(config.features.new_self_diagnosis);
        // Untouched sections keep their defaults
        assert_eq!(config.runtime.trigger_queue_capacity, 64);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ArbiterConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));

        let config = ArbiterConfig::load_or_default(&path).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ArbiterConfig::default();
        config.server.bind_address = "127.0.0.1:8123".to_string();
        config.save(&path).unwrap();

        let loaded = ArbiterConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.bind_address().unwrap().port(), 8123);
    }

    #[test]
    fn test_validation_collects_errors() {
        let mut config = ArbiterConfig::default();
        config.runtime.trigger_queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { .. })
        ));

        config.server.bind_address = "not an address".to_string();
        match config.validate() {
            Err(ConfigError::MultipleValidationErrors(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_default_config_path_is_toml() {
        let path = default_config_path();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("toml"));
    }
}
