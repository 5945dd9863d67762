//! Geolocation lookups
//!
//! A lookup miss is an expected outcome (`Ok(None)`), not an error; the
//! enrichment stage falls back to special-purpose tagging for those addresses.

use crate::error::{LookupFile, Result, SiftError};
use crate::lookups::read_lookup;
use maxminddb::{geoip2, MaxMindDBError, Reader};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;

/// The parts of a geolocation record the tagger uses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoRecord {
    /// English name of the registered country
    pub country: Option<String>,
    pub anonymous_proxy: bool,
}

impl GeoRecord {
    pub fn country(name: impl Into<String>) -> Self {
        Self {
            country: Some(name.into()),
            anonymous_proxy: false,
        }
    }
}

/// Source of geolocation records
pub trait GeoLocator: Send + Sync {
    /// `Ok(None)` when the address is not in the database
    fn locate(&self, ip: Ipv4Addr) -> Result<Option<GeoRecord>>;
}

/// MaxMind GeoIP2/GeoLite2 City database reader
pub struct MaxMindLocator {
    reader: Reader<Vec<u8>>,
}

impl MaxMindLocator {
    /// Open the database file, reading it fully into memory
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = read_lookup(LookupFile::GeoIp, path)?;
        let reader = Reader::from_source(bytes).map_err(|e| SiftError::DataFormat {
            file: LookupFile::GeoIp,
            message: e.to_string(),
        })?;

        tracing::debug!(
            "Opened GeoIP database {:?} ({})",
            path,
            reader.metadata.database_type
        );

        Ok(Self { reader })
    }
}

impl GeoLocator for MaxMindLocator {
    fn locate(&self, ip: Ipv4Addr) -> Result<Option<GeoRecord>> {
        match self.reader.lookup::<geoip2::City>(IpAddr::V4(ip)) {
            Ok(city) => {
                let country = city
                    .registered_country
                    .and_then(|c| c.names)
                    .and_then(|names| names.get("en").map(|name| name.to_string()));
                let anonymous_proxy = city
                    .traits
                    .and_then(|t| t.is_anonymous_proxy)
                    .unwrap_or(false);

                Ok(Some(GeoRecord {
                    country,
                    anonymous_proxy,
                }))
            }
            Err(MaxMindDBError::AddressNotFoundError(_)) => Ok(None),
            Err(e) => Err(SiftError::DataFormat {
                file: LookupFile::GeoIp,
                message: format!("lookup of {} failed: {}", ip, e),
            }),
        }
    }
}

/// In-memory locator, for embedding callers that resolve locations elsewhere
#[derive(Debug, Clone, Default)]
pub struct StaticLocator {
    records: HashMap<Ipv4Addr, GeoRecord>,
}

impl StaticLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ip: Ipv4Addr, record: GeoRecord) -> &mut Self {
        self.records.insert(ip, record);
        self
    }

    pub fn with(mut self, ip: Ipv4Addr, record: GeoRecord) -> Self {
        self.records.insert(ip, record);
        self
    }
}

impl GeoLocator for StaticLocator {
    fn locate(&self, ip: Ipv4Addr) -> Result<Option<GeoRecord>> {
        Ok(self.records.get(&ip).cloned())
    }
}
