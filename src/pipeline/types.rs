// Statistics reported by a pipeline run
use crate::artifact::ArtifactKind;
use serde::{Deserialize, Serialize};

/// Candidate counts for one extractor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    /// Raw matches, duplicates included
    pub extracted: usize,
    /// Distinct matches after deduplication
    pub unique: usize,
    /// Dropped by the whitelist
    pub whitelisted: usize,
    /// Hostnames dropped for an unknown root domain
    pub invalid_root: usize,
    /// Artifacts in the output
    pub emitted: usize,
}

/// Per-run statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiftStats {
    pub input_bytes: usize,
    pub ipv4_address: KindStats,
    pub email: KindStats,
    pub url: KindStats,
    pub dns_name: KindStats,
    pub processing_time_ms: u64,
}

impl SiftStats {
    pub fn kind(&self, kind: ArtifactKind) -> &KindStats {
        match kind {
            ArtifactKind::Ipv4Address => &self.ipv4_address,
            ArtifactKind::Email => &self.email,
            ArtifactKind::Url => &self.url,
            ArtifactKind::DnsName => &self.dns_name,
        }
    }

    pub fn kind_mut(&mut self, kind: ArtifactKind) -> &mut KindStats {
        match kind {
            ArtifactKind::Ipv4Address => &mut self.ipv4_address,
            ArtifactKind::Email => &mut self.email,
            ArtifactKind::Url => &mut self.url,
            ArtifactKind::DnsName => &mut self.dns_name,
        }
    }

    pub fn total_emitted(&self) -> usize {
        ArtifactKind::ALL
            .iter()
            .map(|kind| self.kind(*kind).emitted)
            .sum()
    }
}
