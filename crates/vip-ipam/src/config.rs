//! # Allocator Configuration
//!
//! Runtime parameters of the allocator. Pool definitions are *not* part of
//! this: they live in the configuration document read on every reconciliation.
//!
//! ## Sources
//!
//! Defaults, optionally overlaid by a TOML file, then by environment:
//!
//! | Variable                     | Field                         |
//! |------------------------------|-------------------------------|
//! | `VIP_IPAM_ALLOCATOR_ID`      | `allocator_id`                |
//! | `VIP_IPAM_CONFIG_NAME`       | `config_document.name`        |
//! | `VIP_IPAM_CONFIG_NAMESPACE`  | `config_document.namespace`   |
//! | `VIP_IPAM_RETRY_ATTEMPTS`    | `retry.max_attempts`          |
//! | `VIP_IPAM_LOG_LEVEL`         | `logging.level`               |
//! | `VIP_IPAM_JSON_LOGS`         | `logging.json`                |

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::service::RetryPolicy;

pub const DEFAULT_ALLOCATOR_ID: &str = "vip-ipam";
pub const DEFAULT_CONFIG_DOCUMENT: &str = "vip-ipam-config";
pub const DEFAULT_CONFIG_NAMESPACE: &str = "kube-system";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Where the pool configuration document lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigDocumentRef {
    pub name: String,
    pub namespace: String,
}

impl Default for ConfigDocumentRef {
    fn default() -> Self {
        Self {
            name: DEFAULT_CONFIG_DOCUMENT.to_string(),
            namespace: DEFAULT_CONFIG_NAMESPACE.to_string(),
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete allocator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpamConfig {
    /// Value of the `implementation` ownership label.
    pub allocator_id: String,
    pub config_document: ConfigDocumentRef,
    pub retry: RetryPolicy,
    pub logging: LoggingConfig,
}

impl Default for IpamConfig {
    fn default() -> Self {
        Self {
            allocator_id: DEFAULT_ALLOCATOR_ID.to_string(),
            config_document: ConfigDocumentRef::default(),
            retry: RetryPolicy::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl IpamConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; omitted fields keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: IpamConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(id) = lookup("VIP_IPAM_ALLOCATOR_ID") {
            self.allocator_id = id;
        }
        if let Some(name) = lookup("VIP_IPAM_CONFIG_NAME") {
            self.config_document.name = name;
        }
        if let Some(namespace) = lookup("VIP_IPAM_CONFIG_NAMESPACE") {
            self.config_document.namespace = namespace;
        }
        if let Some(attempts) = lookup("VIP_IPAM_RETRY_ATTEMPTS") {
            match attempts.parse() {
                Ok(n) => self.retry.max_attempts = n,
                Err(_) => warn!("VIP_IPAM_RETRY_ATTEMPTS must be a positive integer, got {:?}", attempts),
            }
        }
        if let Some(level) = lookup("VIP_IPAM_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("VIP_IPAM_JSON_LOGS") {
            self.logging.json = matches!(json.as_str(), "1" | "true" | "yes");
        }
    }

    /// Defaults overlaid with the process environment, validated.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::new();
        config.apply_env_overrides();
        config.validate()?;
        info!(
            allocator_id = %config.allocator_id,
            document = %format!("{}/{}", config.config_document.namespace, config.config_document.name),
            "Loaded allocator configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allocator_id.trim().is_empty() {
            return Err(ConfigError::Invalid("allocator_id cannot be empty".to_string()));
        }
        if self.allocator_id.contains(['=', ',']) {
            return Err(ConfigError::Invalid(format!(
                "allocator_id {:?} cannot contain '=' or ','",
                self.allocator_id
            )));
        }
        if self.config_document.name.is_empty() || self.config_document.namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "configuration document name and namespace are required".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.retry.jitter) {
            return Err(ConfigError::Invalid("retry.jitter must be between 0 and 1".to_string()));
        }
        Ok(())
    }

    /// Label selector matching requests owned by this allocator.
    pub fn ownership_selector(&self) -> String {
        format!("{}={}", crate::domain::LABEL_IMPLEMENTATION, self.allocator_id)
    }
}
