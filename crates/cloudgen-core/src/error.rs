//! Fatal generation errors raised by the context itself.
//!
//! Collaborator failures (capability `apply`, coordinate resolution,
//! template rendering) are never wrapped in these; they travel through
//! `anyhow::Error` unchanged. Callers can `downcast_ref::<GenerateError>()`
//! to tell the two apart.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    /// A versioned plugin has no published coordinate in the registry.
    #[error("Unexpected build plugin or version mismatch for '{key}'")]
    UnknownPluginCoordinate { key: String },

    /// The coordinate resolver has no entry for the artifact.
    #[error("Could not resolve coordinate for artifact '{artifact}'")]
    CoordinateNotFound { artifact: String },

    #[error("Unexpected language: {0}")]
    UnsupportedLanguage(String),

    /// Two capabilities claim a single-instance role under the `reject` policy.
    #[error("Capabilities '{existing}' and '{rejected}' both claim the {role} role")]
    ConflictingRole {
        role: &'static str,
        existing: String,
        rejected: String,
    },

    #[error("Unsupported plugin registry version: {0}")]
    UnsupportedRegistryVersion(u32),

    #[error("Unknown target: {0}. Use AWS, AZURE, GCP or OCI")]
    UnknownTarget(String),
}
