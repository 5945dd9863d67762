use crate::error::{LookupFile, Result, SiftError};
use crate::lookups::read_lookup;
use ahash::AHashSet;
use std::path::Path;

/// Known top-level domains, stored lower-cased
#[derive(Debug, Clone, Default)]
pub struct RootDomainSet {
    roots: AHashSet<String>,
}

impl RootDomainSet {
    /// Load the root domain list, one TLD per line
    ///
    /// Blank lines and `#` comment lines (the IANA file starts with one) are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = read_lookup(LookupFile::RootDomains, path)?;
        let text = String::from_utf8(bytes).map_err(|e| SiftError::DataFormat {
            file: LookupFile::RootDomains,
            message: e.to_string(),
        })?;

        let set = Self::from_lines(&text);
        tracing::debug!("Loaded {} root domains from {:?}", set.len(), path);
        Ok(set)
    }

    pub fn from_lines(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect()
    }

    /// Case-insensitive membership test
    pub fn contains(&self, label: &str) -> bool {
        self.roots.contains(&label.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for RootDomainSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            roots: iter
                .into_iter()
                .map(|root| root.as_ref().to_lowercase())
                .collect(),
        }
    }
}
