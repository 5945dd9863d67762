//! Blacklist database: a JSON array of `{name, type, value}` records
//!
//! The whole file is validated before any of it is used. A single bad record
//! fails the load, so enrichment never runs against a partial list.

use crate::error::{LookupFile, Result, SiftError};
use crate::lookups::read_lookup;
use crate::settings::parse_network;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

/// Declared type of a blacklist record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlacklistKind {
    IpAddress,
    IpNetwork,
}

/// Parsed value of a blacklist record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlacklistValue {
    Address(IpAddr),
    Network(IpNetwork),
}

/// One validated blacklist record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistEntry {
    pub name: String,
    pub value: BlacklistValue,
}

impl BlacklistEntry {
    pub fn matches(&self, ip: IpAddr) -> bool {
        match self.value {
            BlacklistValue::Address(addr) => addr == ip,
            BlacklistValue::Network(network) => network.contains(ip),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(rename = "type")]
    kind: BlacklistKind,
    value: String,
}

/// Blacklist records in file order
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    entries: Vec<BlacklistEntry>,
}

impl Blacklist {
    pub fn new(entries: Vec<BlacklistEntry>) -> Self {
        Self { entries }
    }

    /// Load and validate the blacklist file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_lookup(LookupFile::Blacklist, path)?;
        Self::from_slice(&bytes)
    }

    /// Parse and validate blacklist JSON
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let raw: Vec<RawEntry> =
            serde_json::from_slice(bytes).map_err(|e| SiftError::DataFormat {
                file: LookupFile::Blacklist,
                message: e.to_string(),
            })?;

        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| {
                let value = parse_value(entry.kind, &entry.value).ok_or_else(|| {
                    SiftError::DataFormat {
                        file: LookupFile::Blacklist,
                        message: format!(
                            "entry {} ({}): '{}' is not a valid {:?}",
                            idx, entry.name, entry.value, entry.kind
                        ),
                    }
                })?;
                Ok(BlacklistEntry {
                    name: entry.name,
                    value,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Name of the first record covering the address
    pub fn lookup(&self, ip: IpAddr) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.matches(ip))
            .map(|entry| entry.name.as_str())
    }

    pub fn entries(&self) -> &[BlacklistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_value(kind: BlacklistKind, value: &str) -> Option<BlacklistValue> {
    match kind {
        BlacklistKind::IpAddress => value.trim().parse().ok().map(BlacklistValue::Address),
        BlacklistKind::IpNetwork => parse_network(value).ok().map(BlacklistValue::Network),
    }
}

struct CachedBlacklist {
    modified: SystemTime,
    blacklist: Arc<Blacklist>,
}

/// Loads the blacklist for each enrichment pass
///
/// Without caching every call re-reads the file. With caching the parsed list is
/// reused until the file's modification time changes; a failed reload clears the
/// cache instead of falling back to the previous list.
pub struct BlacklistStore {
    path: PathBuf,
    cache_enabled: bool,
    cached: RwLock<Option<CachedBlacklist>>,
}

impl BlacklistStore {
    pub fn new(path: PathBuf, cache_enabled: bool) -> Self {
        Self {
            path,
            cache_enabled,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Arc<Blacklist>> {
        if !self.cache_enabled {
            return Ok(Arc::new(Blacklist::load(&self.path)?));
        }

        let modified = std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .map_err(|e| SiftError::LookupDataUnavailable {
                file: LookupFile::Blacklist,
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        {
            let cached = self.cached.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = cached.as_ref().filter(|c| c.modified == modified) {
                return Ok(Arc::clone(&entry.blacklist));
            }
        }

        let mut cached = self.cached.write().unwrap_or_else(PoisonError::into_inner);
        match Blacklist::load(&self.path) {
            Ok(blacklist) => {
                let blacklist = Arc::new(blacklist);
                tracing::debug!(
                    "Cached {} blacklist entries from {:?}",
                    blacklist.len(),
                    self.path
                );
                *cached = Some(CachedBlacklist {
                    modified,
                    blacklist: Arc::clone(&blacklist),
                });
                Ok(blacklist)
            }
            Err(e) => {
                *cached = None;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tempfile::TempDir;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn test_first_match_wins_in_file_order() {
        let json = r#"[
            {"name": "dshield_7D", "type": "ip_network", "value": "87.236.0.0/16"},
            {"name": "alienvault", "type": "ip_address", "value": "87.236.220.167"},
            {"name": "tor_exit", "type": "ip_address", "value": "5.5.5.5"}
        ]"#;
        let blacklist = Blacklist::from_slice(json.as_bytes()).unwrap();

        assert_eq!(blacklist.len(), 3);
        assert_eq!(blacklist.lookup(ip(87, 236, 220, 167)), Some("dshield_7D"));
        assert_eq!(blacklist.lookup(ip(5, 5, 5, 5)), Some("tor_exit"));
        assert_eq!(blacklist.lookup(ip(5, 5, 5, 6)), None);
    }

    #[test]
    fn test_address_entries_use_equality() {
        let json = r#"[{"name": "bambenek_c2", "type": "ip_address", "value": "1.2.3.4"}]"#;
        let blacklist = Blacklist::from_slice(json.as_bytes()).unwrap();
        assert_eq!(blacklist.lookup(ip(1, 2, 3, 4)), Some("bambenek_c2"));
        assert_eq!(blacklist.lookup(ip(1, 2, 3, 5)), None);
    }

    #[test]
    fn test_invalid_value_for_type_rejects_whole_file() {
        // A CIDR is not a valid ip_address value
        let json = r#"[
            {"name": "ok", "type": "ip_address", "value": "1.2.3.4"},
            {"name": "bad", "type": "ip_address", "value": "1.2.3.0/24"}
        ]"#;
        let err = Blacklist::from_slice(json.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            SiftError::DataFormat {
                file: LookupFile::Blacklist,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_type_and_bad_json() {
        let unknown = r#"[{"name": "x", "type": "domain", "value": "evil.com"}]"#;
        assert!(Blacklist::from_slice(unknown.as_bytes()).is_err());
        assert!(Blacklist::from_slice(b"{not json").is_err());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = BlacklistStore::new(dir.path().join("blacklist_db.json"), false);
        assert!(matches!(
            store.load().unwrap_err(),
            SiftError::LookupDataUnavailable {
                file: LookupFile::Blacklist,
                ..
            }
        ));
    }

    #[test]
    fn test_cached_store_reuses_unchanged_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist_db.json");
        std::fs::write(
            &path,
            r#"[{"name": "tor_exit", "type": "ip_address", "value": "5.5.5.5"}]"#,
        )
        .unwrap();

        let store = BlacklistStore::new(path, true);
        let first = store.load().unwrap();
        let second = store.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_uncached_store_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blacklist_db.json");
        std::fs::write(&path, "[]").unwrap();

        let store = BlacklistStore::new(path.clone(), false);
        assert!(store.load().unwrap().is_empty());

        std::fs::write(&path, "[{\"broken\": ").unwrap();
        assert!(store.load().is_err());
    }
}
