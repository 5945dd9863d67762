//! Lookup files produced by the external updaters
//!
//! The pipeline only ever reads these files. Replacing them while runs are in
//! flight is unsupported: an updater must hold [`LookupGate::write`] for the
//! duration of a refresh, and every run holds [`LookupGate::read`].

mod blacklist;
mod geoip;
mod root_domains;

pub use blacklist::{Blacklist, BlacklistEntry, BlacklistKind, BlacklistStore, BlacklistValue};
pub use geoip::{GeoLocator, GeoRecord, MaxMindLocator, StaticLocator};
pub use root_domains::RootDomainSet;

use crate::error::{LookupFile, Result, SiftError};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Where each lookup file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPaths {
    pub geoip_db: PathBuf,
    pub blacklist_db: PathBuf,
    pub root_domains: PathBuf,
}

impl LookupPaths {
    pub fn path(&self, file: LookupFile) -> &Path {
        match file {
            LookupFile::GeoIp => &self.geoip_db,
            LookupFile::Blacklist => &self.blacklist_db,
            LookupFile::RootDomains => &self.root_domains,
        }
    }

    /// Lookup files that are not present on disk; empty when the pipeline is ready
    pub fn preflight(&self) -> Vec<(LookupFile, PathBuf)> {
        [LookupFile::Blacklist, LookupFile::GeoIp, LookupFile::RootDomains]
            .into_iter()
            .filter(|file| !self.path(*file).is_file())
            .map(|file| (file, self.path(file).to_path_buf()))
            .collect()
    }
}

/// Read a lookup file, mapping IO failures to `LookupDataUnavailable`
pub(crate) fn read_lookup(file: LookupFile, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| SiftError::LookupDataUnavailable {
        file,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read/write gate serializing lookup refreshes against pipeline runs
#[derive(Debug, Default)]
pub struct LookupGate {
    lock: RwLock<()>,
}

impl LookupGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Held by a pipeline run; any number may be held at once
    pub fn read(&self) -> RwLockReadGuard<'_, ()> {
        // The guarded value is (), so a poisoned lock carries no broken state
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Held by an updater while it replaces lookup files
    pub fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}
