use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for blobsift
#[derive(Error, Debug)]
pub enum SiftError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// A lookup file is missing or cannot be read
    #[error("{file} unavailable at {path}: {reason}")]
    LookupDataUnavailable {
        file: LookupFile,
        path: PathBuf,
        reason: String,
    },

    /// A lookup file exists but its contents are unusable
    #[error("Malformed {file}: {message}")]
    DataFormat { file: LookupFile, message: String },

    /// Input blob exceeds the configured size bound
    #[error("Input of {size} bytes exceeds the {limit} byte limit")]
    BlobTooLarge { size: u64, limit: u64 },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Ad-hoc failures carried with `anyhow` context, such as writes to stdout
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SiftError {
    /// True for errors that stem from configuration rather than lookup data or IO
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SiftError::Config(_)
                | SiftError::ConfigValidation { .. }
                | SiftError::ConfigNotFound { .. }
                | SiftError::InvalidConfigValue { .. }
        )
    }
}

/// Lookup files consumed by the enrichment and validation stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupFile {
    GeoIp,
    Blacklist,
    RootDomains,
}

impl fmt::Display for LookupFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LookupFile::GeoIp => "GeoIP database",
            LookupFile::Blacklist => "blacklist database",
            LookupFile::RootDomains => "root domain list",
        };
        f.write_str(name)
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for blobsift operations
pub type Result<T> = std::result::Result<T, SiftError>;
