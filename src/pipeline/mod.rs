// Indicator extraction pipeline
//
// extract -> dedup -> whitelist -> (root-domain check | enrichment) per artifact kind,
// concatenated as IPs, emails, URLs, hostnames.

mod types;

pub use types::{KindStats, SiftStats};

use crate::artifact::{Artifact, ArtifactKind};
use crate::enrich::Enricher;
use crate::error::Result;
use crate::filters::{dedup_sorted, filter_domains, is_whitelisted_ip, validate_root_domains};
use crate::lookups::{BlacklistStore, GeoLocator, LookupGate, MaxMindLocator, RootDomainSet};
use crate::settings::Settings;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Instant;

/// Pipeline orchestrator
///
/// Holds only read-only settings and lookup handles, so one `Sifter` can serve
/// many threads at once. Each call to [`Sifter::sift`] returns its own results.
pub struct Sifter {
    settings: Arc<Settings>,
    locator: Option<Arc<dyn GeoLocator>>,
    blacklist: BlacklistStore,
    gate: Arc<LookupGate>,
}

impl Sifter {
    /// Create a sifter that opens the configured GeoIP database on every run
    pub fn new(settings: Settings) -> Self {
        let blacklist = BlacklistStore::new(
            settings.lookups.blacklist_db.clone(),
            settings.cache_blacklist,
        );

        Self {
            settings: Arc::new(settings),
            locator: None,
            blacklist,
            gate: Arc::new(LookupGate::new()),
        }
    }

    /// Use a caller-supplied locator instead of the GeoIP database file
    pub fn with_locator(mut self, locator: Arc<dyn GeoLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    /// Share a gate with the component that refreshes lookup files
    pub fn with_gate(mut self, gate: Arc<LookupGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Gate an updater must hold for writing while it replaces lookup files
    pub fn gate(&self) -> Arc<LookupGate> {
        Arc::clone(&self.gate)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Extract, filter and enrich all indicators in a text blob
    pub fn sift(&self, text: &str) -> Result<Vec<Artifact>> {
        self.sift_with_stats(text).map(|(artifacts, _)| artifacts)
    }

    /// Same as [`Sifter::sift`], also returning per-stage counts
    pub fn sift_with_stats(&self, text: &str) -> Result<(Vec<Artifact>, SiftStats)> {
        let start = Instant::now();
        let _guard = self.gate.read();

        let mut stats = SiftStats {
            input_bytes: text.len(),
            ..SiftStats::default()
        };

        let mut artifacts = self.network_addresses(text, &mut stats)?;
        artifacts.extend(self.domain_artifacts(ArtifactKind::Email, text, &mut stats)?);
        artifacts.extend(self.domain_artifacts(ArtifactKind::Url, text, &mut stats)?);
        artifacts.extend(self.domain_artifacts(ArtifactKind::DnsName, text, &mut stats)?);

        stats.processing_time_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            "Sifted {} bytes: {} IPs, {} emails, {} URLs, {} hostnames in {}ms",
            stats.input_bytes,
            stats.ipv4_address.emitted,
            stats.email.emitted,
            stats.url.emitted,
            stats.dns_name.emitted,
            stats.processing_time_ms
        );

        Ok((artifacts, stats))
    }

    fn candidates(&self, kind: ArtifactKind, text: &str, stats: &mut SiftStats) -> Vec<String> {
        let raw = self.settings.patterns.extract(kind, text);
        let extracted = raw.len();
        let unique = dedup_sorted(raw);

        let counts = stats.kind_mut(kind);
        counts.extracted = extracted;
        counts.unique = unique.len();

        tracing::debug!(
            "{}: {} matches, {} unique",
            kind,
            counts.extracted,
            counts.unique
        );
        unique
    }

    fn network_addresses(&self, text: &str, stats: &mut SiftStats) -> Result<Vec<Artifact>> {
        let unique = self.candidates(ArtifactKind::Ipv4Address, text, stats);

        let parsed: Vec<(String, Ipv4Addr)> = unique
            .into_iter()
            .filter_map(|value| match value.parse::<Ipv4Addr>() {
                Ok(ip) => Some((value, ip)),
                Err(_) => {
                    tracing::debug!("Dropping non-address IPv4 candidate {:?}", value);
                    None
                }
            })
            .collect();

        let before = parsed.len();
        let whitelist = &self.settings.whitelist.networks;
        let survivors: Vec<(String, Ipv4Addr)> = parsed
            .into_iter()
            .filter(|(_, ip)| !is_whitelisted_ip(IpAddr::V4(*ip), whitelist))
            .collect();

        let counts = stats.kind_mut(ArtifactKind::Ipv4Address);
        counts.whitelisted = before - survivors.len();

        if survivors.is_empty() {
            return Ok(Vec::new());
        }

        // Lookups are loaded only when there is something to tag
        let opened;
        let locator: &dyn GeoLocator = match &self.locator {
            Some(locator) => locator.as_ref(),
            None => {
                opened = MaxMindLocator::open(&self.settings.lookups.geoip_db)?;
                &opened
            }
        };
        let blacklist = self.blacklist.load()?;
        let enricher = Enricher::new(locator, &self.settings.named_networks, &blacklist);

        let artifacts = survivors
            .into_iter()
            .map(|(value, ip)| {
                Ok(Artifact {
                    tags: enricher.tags_for(ip)?,
                    value,
                    data_type: ArtifactKind::Ipv4Address,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        stats.kind_mut(ArtifactKind::Ipv4Address).emitted = artifacts.len();
        Ok(artifacts)
    }

    fn domain_artifacts(
        &self,
        kind: ArtifactKind,
        text: &str,
        stats: &mut SiftStats,
    ) -> Result<Vec<Artifact>> {
        let unique = self.candidates(kind, text, stats);
        let before = unique.len();

        let mut survivors = filter_domains(unique, &self.settings.whitelist.domains);
        stats.kind_mut(kind).whitelisted = before - survivors.len();

        if kind == ArtifactKind::DnsName && !survivors.is_empty() {
            let roots = RootDomainSet::load(&self.settings.lookups.root_domains)?;
            let before = survivors.len();
            survivors = validate_root_domains(survivors, &roots);
            stats.kind_mut(kind).invalid_root = before - survivors.len();
        }

        stats.kind_mut(kind).emitted = survivors.len();

        Ok(survivors
            .into_iter()
            .map(|value| Artifact::new(value, kind))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lookups::{GeoRecord, LookupPaths, StaticLocator};
    use tempfile::TempDir;

    fn sifter(dir: &TempDir, locator: StaticLocator) -> Sifter {
        let mut settings = Settings::from_config(&Config::default()).unwrap();
        settings.lookups = LookupPaths {
            geoip_db: dir.path().join("GeoLite2-City.mmdb"),
            blacklist_db: dir.path().join("blacklist_db.json"),
            root_domains: dir.path().join("root_domains.txt"),
        };
        std::fs::write(&settings.lookups.blacklist_db, "[]").unwrap();
        std::fs::write(&settings.lookups.root_domains, "COM\nNET\n").unwrap();

        Sifter::new(settings).with_locator(Arc::new(locator))
    }

    #[test]
    fn test_output_order_and_stats() {
        let dir = TempDir::new().unwrap();
        let locator = StaticLocator::new().with(
            Ipv4Addr::new(72, 167, 218, 149),
            GeoRecord::country("United States"),
        );
        let sifter = sifter(&dir, locator);

        let text = "From bob@phish.net at 72.167.218.149 and 72.167.218.149, \
                    link http://phish.net/x via 10.1.2.3";
        let (artifacts, stats) = sifter.sift_with_stats(text).unwrap();

        let kinds: Vec<ArtifactKind> = artifacts.iter().map(|a| a.data_type).collect();
        assert_eq!(
            kinds,
            vec![
                ArtifactKind::Ipv4Address,
                ArtifactKind::Email,
                ArtifactKind::Url,
                ArtifactKind::DnsName,
            ]
        );
        assert_eq!(artifacts[0].tags, vec!["United States"]);
        assert_eq!(artifacts[3].value, "phish.net");

        assert_eq!(stats.ipv4_address.extracted, 3);
        assert_eq!(stats.ipv4_address.unique, 2);
        assert_eq!(stats.ipv4_address.whitelisted, 1);
        assert_eq!(stats.total_emitted(), 4);
    }

    #[test]
    fn test_no_candidates_needs_no_lookup_files() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::from_config(&Config::default()).unwrap();
        settings.lookups = LookupPaths {
            geoip_db: dir.path().join("missing.mmdb"),
            blacklist_db: dir.path().join("missing.json"),
            root_domains: dir.path().join("missing.txt"),
        };

        let artifacts = Sifter::new(settings).sift("nothing to see here").unwrap();
        assert!(artifacts.is_empty());
    }
}
