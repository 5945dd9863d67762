//! Typed, tagged network indicators returned by the pipeline

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four indicator types the extractors produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Ipv4Address,
    Email,
    Url,
    DnsName,
}

impl ArtifactKind {
    /// Output order of the pipeline: IPs first, hostnames last
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Ipv4Address,
        ArtifactKind::Email,
        ArtifactKind::Url,
        ArtifactKind::DnsName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Ipv4Address => "ipv4_address",
            ArtifactKind::Email => "email",
            ArtifactKind::Url => "url",
            ArtifactKind::DnsName => "dns_name",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An extracted indicator with its context tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub value: String,
    pub data_type: ArtifactKind,
    pub tags: Vec<String>,
}

impl Artifact {
    /// Create an artifact with no tags
    pub fn new(value: impl Into<String>, data_type: ArtifactKind) -> Self {
        Self {
            value: value.into(),
            data_type,
            tags: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let artifact = Artifact {
            value: "8.8.8.8".to_string(),
            data_type: ArtifactKind::Ipv4Address,
            tags: vec!["United States".to_string(), "GOOG".to_string()],
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "value": "8.8.8.8",
                "data_type": "ipv4_address",
                "tags": ["United States", "GOOG"]
            })
        );
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in ArtifactKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}
