use crate::config::Config;
use crate::error::{Result, SiftError, ValidationError};
use crate::settings::parse_network;
use ahash::AHashSet;
use regex::Regex;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, reporting every problem at once
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_lookups(config, &mut errors);
        Self::validate_limits(config, &mut errors);
        Self::validate_whitelists(config, &mut errors);
        Self::validate_named_networks(config, &mut errors);
        Self::validate_patterns(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(SiftError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != "1.0.0" {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_lookups(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked by the preflight, not here: the updaters may not have run yet.
        let paths = [
            ("lookups.geoip_db", &config.lookups.geoip_db),
            ("lookups.blacklist_db", &config.lookups.blacklist_db),
            ("lookups.root_domains", &config.lookups.root_domains),
        ];
        for (key, path) in paths {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::new(key, "Lookup file path cannot be empty"));
            }
        }
    }

    fn validate_limits(config: &Config, errors: &mut Vec<ValidationError>) {
        let size_str = &config.limits.max_blob_size;
        match parse_size(size_str) {
            Some(0) => errors.push(ValidationError::new(
                "limits.max_blob_size",
                "Maximum blob size must be greater than 0",
            )),
            Some(_) => {}
            None => errors.push(ValidationError::new(
                "limits.max_blob_size",
                format!("Invalid size format: {}", size_str),
            )),
        }
    }

    fn validate_whitelists(config: &Config, errors: &mut Vec<ValidationError>) {
        for (idx, domain) in config.whitelists.domains.iter().enumerate() {
            // An empty substring would match every candidate
            if domain.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("whitelists.domains[{}]", idx),
                    "Whitelist domain cannot be empty",
                ));
            }
        }

        for (idx, network) in config.whitelists.networks.iter().enumerate() {
            if let Err(e) = parse_network(network) {
                errors.push(ValidationError::new(
                    format!("whitelists.networks[{}]", idx),
                    format!("Invalid network '{}': {}", network, e),
                ));
            }
        }
    }

    fn validate_named_networks(config: &Config, errors: &mut Vec<ValidationError>) {
        let mut seen = AHashSet::new();

        for (idx, named) in config.named_networks.iter().enumerate() {
            let path = format!("named_networks[{}]", idx);

            if named.name.trim().is_empty() {
                errors.push(ValidationError::new(
                    format!("{}.name", path),
                    "Named network label cannot be empty",
                ));
            } else if !seen.insert(named.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("{}.name", path),
                    format!("Duplicate named network '{}'", named.name),
                ));
            }

            if named.ranges.is_empty() {
                errors.push(ValidationError::new(
                    format!("{}.ranges", path),
                    format!("Named network '{}' has no ranges", named.name),
                ));
            }

            for (range_idx, range) in named.ranges.iter().enumerate() {
                if let Err(e) = parse_network(range) {
                    errors.push(ValidationError::new(
                        format!("{}.ranges[{}]", path, range_idx),
                        format!("Invalid network '{}': {}", range, e),
                    ));
                }
            }
        }
    }

    fn validate_patterns(config: &Config, errors: &mut Vec<ValidationError>) {
        let overrides = [
            ("patterns.ipv4", &config.patterns.ipv4),
            ("patterns.email", &config.patterns.email),
            ("patterns.url", &config.patterns.url),
            ("patterns.hostname", &config.patterns.hostname),
        ];

        for (key, pattern) in overrides {
            if let Some(pattern) = pattern {
                if let Err(e) = Regex::new(pattern) {
                    errors.push(ValidationError::new(key, format!("Invalid regex: {}", e)));
                }
            }
        }
    }
}

/// Parse size strings like "500MB", "10KB", "1GB", "512B" or a bare byte count
pub fn parse_size(s: &str) -> Option<u64> {
    let upper = s.trim().to_uppercase();

    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let digits = digits.trim();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamedNetworkConfig;

    fn validation_paths(config: &Config) -> Vec<String> {
        match ConfigValidator::validate(config) {
            Err(SiftError::ConfigValidation { errors }) => {
                errors.into_iter().map(|e| e.path).collect()
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_whitelist_network() {
        let mut config = Config::default();
        config.whitelists.networks.push("10.0.0.0/33".to_string());
        assert_eq!(validation_paths(&config), vec!["whitelists.networks[2]"]);
    }

    #[test]
    fn test_invalid_named_range_and_duplicate_name() {
        let mut config = Config::default();
        config.named_networks.push(NamedNetworkConfig {
            name: "GOOG".to_string(),
            ranges: vec!["not-a-network".to_string()],
        });

        let paths = validation_paths(&config);
        assert!(paths.contains(&"named_networks[2].name".to_string()));
        assert!(paths.contains(&"named_networks[2].ranges[0]".to_string()));
    }

    #[test]
    fn test_empty_whitelist_domain() {
        let mut config = Config::default();
        config.whitelists.domains.push("  ".to_string());
        assert_eq!(validation_paths(&config), vec!["whitelists.domains[3]"]);
    }

    #[test]
    fn test_bad_pattern_override() {
        let mut config = Config::default();
        config.patterns.url = Some("(unclosed".to_string());
        assert_eq!(validation_paths(&config), vec!["patterns.url"]);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("500MB"), Some(500 * 1024 * 1024));
        assert_eq!(parse_size("10kb"), Some(10 * 1024));
        assert_eq!(parse_size("2GB"), Some(2 * 1024 * 1024 * 1024));
        assert_eq!(parse_size("512B"), Some(512));
        assert_eq!(parse_size("4096"), Some(4096));
        assert_eq!(parse_size("MB"), None);
        assert_eq!(parse_size("ten MB"), None);
    }
}
