//! Pattern registry for the four indicator extractors
//!
//! Each extractor is a single pre-compiled regex scanned left to right over the
//! whole blob. Matches are non-overlapping and returned in order of appearance,
//! duplicates included; collapsing them is the deduplicator's job.
//! Any pattern can be replaced from the `[patterns]` configuration section.

use crate::artifact::ArtifactKind;
use crate::config::PatternsConfig;
use crate::error::{Result, SiftError};
use regex::Regex;

/// Dotted quad, each octet 0-255
pub const IPV4_PATTERN: &str = r"(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])\.(?:25[0-5]|2[0-4][0-9]|1[0-9][0-9]|[1-9]?[0-9])";

/// `local@domain` with a 2-6 letter final label
pub const EMAIL_PATTERN: &str =
    r"[a-zA-Z0-9.]+@[a-zA-Z0-9]+-?[a-zA-Z0-9]+\.?[a-zA-Z0-9]{2,6}?\.[a-zA-Z]{2,6}";

/// http, https, ftp and file URLs; the last character must be URL-safe, so
/// trailing `.` or `)` is left out
pub const URL_PATTERN: &str =
    r"\b(?:https?|ftp|file)://[-A-Za-z0-9+&@#/%?=~_|!:,.;]*[-A-Za-z0-9+&@#/%=~_]";

/// Permissive hostname with optional path and query suffixes. False positives
/// are expected and removed by root-domain validation.
pub const HOSTNAME_PATTERN: &str = r"(?:[a-z0-9_-]{1,5})?(?:[a-z0-9_-]+(?::[a-z0-9_-]+)?)?(?:www\.|(?:[a-z0-9_-]+\.)+)?[a-z0-9_-]{3,}\.[a-z]{2,4}(?:/(?:[a-z0-9_-]+/)+)?(?:[a-z0-9_-]+)?(?:\.[a-z]{2,})?\??(?:(?:&?[a-z0-9_-]+(?:=[a-z0-9_-]+)?)+)?";

/// Pre-compiled extractor regexes
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    ipv4: Regex,
    email: Regex,
    url: Regex,
    hostname: Regex,
}

impl PatternRegistry {
    /// Registry with the built-in patterns only
    pub fn builtin() -> Result<Self> {
        Self::from_config(&PatternsConfig::default())
    }

    /// Build the registry, preferring configured overrides over the built-ins
    pub fn from_config(config: &PatternsConfig) -> Result<Self> {
        Ok(Self {
            ipv4: compile("ipv4", config.ipv4.as_deref().unwrap_or(IPV4_PATTERN))?,
            email: compile("email", config.email.as_deref().unwrap_or(EMAIL_PATTERN))?,
            url: compile("url", config.url.as_deref().unwrap_or(URL_PATTERN))?,
            hostname: compile(
                "hostname",
                config.hostname.as_deref().unwrap_or(HOSTNAME_PATTERN),
            )?,
        })
    }

    /// Regex used for an artifact kind
    pub fn regex(&self, kind: ArtifactKind) -> &Regex {
        match kind {
            ArtifactKind::Ipv4Address => &self.ipv4,
            ArtifactKind::Email => &self.email,
            ArtifactKind::Url => &self.url,
            ArtifactKind::DnsName => &self.hostname,
        }
    }

    /// All raw candidates of one kind, in order of appearance
    pub fn extract(&self, kind: ArtifactKind, text: &str) -> Vec<String> {
        self.regex(kind)
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| SiftError::Config(format!("Invalid regex for '{}' extractor: {}", name, e)))
}
