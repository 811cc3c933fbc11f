use crate::artifacts::{ConfigPrefix, KeyScheme, UnknownPrefix};
use crate::storage::CollectionKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid SCRAPEDESK_CONFIG_PREFIX: {0}")]
    Prefix(#[from] UnknownPrefix),

    #[error("invalid SCRAPEDESK_UNIQUE_KEYS value {0:?}")]
    UniqueKeys(String),
}

/// Where the artifact store keeps its collections and how it names new configs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub config_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prefix: ConfigPrefix,
    pub key_scheme: KeyScheme,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(CollectionKind::Configs.default_dir()),
            output_dir: PathBuf::from(CollectionKind::Outputs.default_dir()),
            prefix: ConfigPrefix::default(),
            key_scheme: KeyScheme::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_prefix(mut self, prefix: ConfigPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    pub fn with_key_scheme(mut self, key_scheme: KeyScheme) -> Self {
        self.key_scheme = key_scheme;
        self
    }

    /// Defaults overridden by `SCRAPEDESK_CONFIG_DIR`, `SCRAPEDESK_OUTPUT_DIR`,
    /// `SCRAPEDESK_CONFIG_PREFIX` and `SCRAPEDESK_UNIQUE_KEYS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(dir) = lookup("SCRAPEDESK_CONFIG_DIR") {
            config.config_dir = dir.into();
        }
        if let Some(dir) = lookup("SCRAPEDESK_OUTPUT_DIR") {
            config.output_dir = dir.into();
        }
        if let Some(prefix) = lookup("SCRAPEDESK_CONFIG_PREFIX") {
            config.prefix = prefix.parse()?;
        }
        if let Some(flag) = lookup("SCRAPEDESK_UNIQUE_KEYS") {
            config.key_scheme = match flag.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => KeyScheme::Unique,
                "0" | "false" | "no" | "" => KeyScheme::Seconds,
                _ => return Err(ConfigError::UniqueKeys(flag)),
            };
        }
        Ok(config)
    }
}
