//! Configuration management for blobsift
//!
//! Loads the TOML configuration, applies `BLOBSIFT_*` environment overrides and
//! validates the result. Parsing of CIDR ranges into lookup-ready networks happens
//! in [`crate::settings`], after validation has passed.

use crate::error::{Result, SiftError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod validator;

pub use validator::{parse_size, ConfigValidator};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub lookups: LookupsConfig,
    pub limits: LimitsConfig,
    pub whitelists: WhitelistsConfig,
    #[serde(default)]
    pub named_networks: Vec<NamedNetworkConfig>,
    #[serde(default)]
    pub patterns: PatternsConfig,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Locations of the lookup files produced by the updaters
///
/// Relative file paths are resolved against `data_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupsConfig {
    pub data_dir: PathBuf,
    pub geoip_db: PathBuf,
    pub blacklist_db: PathBuf,
    pub root_domains: PathBuf,
    /// Reuse the parsed blacklist until the file's modification time changes
    #[serde(default)]
    pub cache_blacklist: bool,
}

/// Input bounds enforced by the caller layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub max_blob_size: String,
}

/// Values whose matches are dropped from the output entirely
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhitelistsConfig {
    /// Substrings; any email, URL or hostname containing one is dropped.
    /// "apple.com" also suppresses "notapple.com.evil.tld", so keep entries specific.
    #[serde(default)]
    pub domains: Vec<String>,
    /// CIDR ranges or bare addresses
    #[serde(default)]
    pub networks: Vec<String>,
}

/// A labelled set of ranges, checked in configuration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedNetworkConfig {
    pub name: String,
    pub ranges: Vec<String>,
}

/// Optional regex overrides for the built-in extractors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SiftError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SiftError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;

        Self::from_toml(&content)
    }

    /// Parse, override and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| SiftError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: BLOBSIFT_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("BLOBSIFT_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "LOOKUPS__DATA_DIR" => self.lookups.data_dir = PathBuf::from(value),
            "LOOKUPS__GEOIP_DB" => self.lookups.geoip_db = PathBuf::from(value),
            "LOOKUPS__BLACKLIST_DB" => self.lookups.blacklist_db = PathBuf::from(value),
            "LOOKUPS__ROOT_DOMAINS" => self.lookups.root_domains = PathBuf::from(value),
            "LOOKUPS__CACHE_BLACKLIST" => {
                self.lookups.cache_blacklist =
                    value.parse().map_err(|_| SiftError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as boolean", value),
                    })?;
            }
            "LIMITS__MAX_BLOB_SIZE" => self.limits.max_blob_size = value.to_string(),
            _ => {
                tracing::debug!("Unknown env config key: {}", path);
            }
        }
        Ok(())
    }

    /// Maximum accepted input size in bytes
    pub fn max_blob_bytes(&self) -> Result<u64> {
        parse_size(&self.limits.max_blob_size).ok_or_else(|| SiftError::InvalidConfigValue {
            path: "limits.max_blob_size".to_string(),
            message: format!("Invalid size format: {}", self.limits.max_blob_size),
        })
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| SiftError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join("blobsift").join("config.toml"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            meta: MetaConfig {
                schema_version: "1.0.0".to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            lookups: LookupsConfig {
                data_dir: PathBuf::from("~/.blobsift"),
                geoip_db: PathBuf::from("GeoLite2-City.mmdb"),
                blacklist_db: PathBuf::from("blacklist_db.json"),
                root_domains: PathBuf::from("root_domains.txt"),
                cache_blacklist: false,
            },
            limits: LimitsConfig {
                max_blob_size: "500MB".to_string(),
            },
            whitelists: WhitelistsConfig {
                domains: vec![
                    "google.com".to_string(),
                    "microsoft.com".to_string(),
                    "outlook.com".to_string(),
                ],
                networks: vec!["127.0.0.1".to_string(), "10.0.0.0/8".to_string()],
            },
            named_networks: vec![
                NamedNetworkConfig {
                    name: "GOOG".to_string(),
                    ranges: vec![
                        "209.85.192.0/24".to_string(),
                        "74.125.82.0/24".to_string(),
                        "8.8.8.8".to_string(),
                    ],
                },
                NamedNetworkConfig {
                    name: "MSFT".to_string(),
                    ranges: vec!["131.107.0.0/16".to_string(), "207.46.0.0/16".to_string()],
                },
            ],
            patterns: PatternsConfig::default(),
        }
    }
}
