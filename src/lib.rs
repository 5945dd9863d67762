//! blobsift - network artifact extraction
//!
//! Pulls IPv4 addresses, email addresses, URLs and hostnames out of unstructured
//! text, removes duplicates and whitelisted values, and tags IP addresses with
//! geolocation, named-network and blacklist context.

pub mod artifact;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod filters;
pub mod lookups;
pub mod patterns;
pub mod pipeline;
pub mod settings;
pub mod strings;

pub use artifact::{Artifact, ArtifactKind};
pub use error::{LookupFile, Result, SiftError};
pub use pipeline::{SiftStats, Sifter};
pub use settings::Settings;
