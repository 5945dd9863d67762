//! Immutable, lookup-ready settings compiled from a validated [`Config`]
//!
//! A `Settings` value is built once at startup and shared read-only by every
//! pipeline run, so concurrent runs never observe each other's state.

use crate::config::{Config, ConfigValidator};
use crate::error::{Result, SiftError};
use crate::lookups::LookupPaths;
use crate::patterns::PatternRegistry;
use ipnetwork::{IpNetwork, IpNetworkError};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parse a CIDR range or a bare address (treated as a host route)
pub fn parse_network(s: &str) -> std::result::Result<IpNetwork, IpNetworkError> {
    IpNetwork::from_str(s.trim())
}

/// A configured label and the ranges it covers
#[derive(Debug, Clone)]
pub struct NamedNetwork {
    pub name: String,
    pub ranges: Vec<IpNetwork>,
}

impl NamedNetwork {
    pub fn contains(&self, ip: IpAddr) -> bool {
        self.ranges.iter().any(|range| range.contains(ip))
    }
}

/// Whitelist rules applied before any enrichment
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    pub domains: Vec<String>,
    pub networks: Vec<IpNetwork>,
}

/// Everything a pipeline run needs besides the input text
#[derive(Debug, Clone)]
pub struct Settings {
    pub named_networks: Vec<NamedNetwork>,
    pub whitelist: Whitelist,
    pub lookups: LookupPaths,
    pub cache_blacklist: bool,
    pub patterns: PatternRegistry,
}

impl Settings {
    /// Validate and compile a configuration
    ///
    /// `~/` prefixes in lookup paths are expanded against the home directory, and
    /// relative lookup files are placed under `lookups.data_dir`.
    pub fn from_config(config: &Config) -> Result<Self> {
        ConfigValidator::validate(config)?;

        let named_networks = config
            .named_networks
            .iter()
            .map(|named| {
                let ranges = named
                    .ranges
                    .iter()
                    .map(|range| {
                        compile_network(range, &format!("named_networks.{}", named.name))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(NamedNetwork {
                    name: named.name.clone(),
                    ranges,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let networks = config
            .whitelists
            .networks
            .iter()
            .map(|network| compile_network(network, "whitelists.networks"))
            .collect::<Result<Vec<_>>>()?;

        let data_dir = expand_path(&config.lookups.data_dir)?;
        let lookups = LookupPaths {
            geoip_db: resolve_lookup_path(&data_dir, &config.lookups.geoip_db)?,
            blacklist_db: resolve_lookup_path(&data_dir, &config.lookups.blacklist_db)?,
            root_domains: resolve_lookup_path(&data_dir, &config.lookups.root_domains)?,
        };

        Ok(Self {
            named_networks,
            whitelist: Whitelist {
                domains: config.whitelists.domains.clone(),
                networks,
            },
            lookups,
            cache_blacklist: config.lookups.cache_blacklist,
            patterns: PatternRegistry::from_config(&config.patterns)?,
        })
    }
}

fn compile_network(value: &str, path: &str) -> Result<IpNetwork> {
    parse_network(value).map_err(|e| SiftError::InvalidConfigValue {
        path: path.to_string(),
        message: format!("Invalid network '{}': {}", value, e),
    })
}

fn resolve_lookup_path(data_dir: &Path, path: &Path) -> Result<PathBuf> {
    let path = expand_path(path)?;
    if path.is_relative() {
        Ok(data_dir.join(path))
    } else {
        Ok(path)
    }
}

/// Expand a leading `~/` against the user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| SiftError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| SiftError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
