//! Hostpath provisioner error types.
//!
//! All hard failures in `libhostpath` are represented by the
//! [`HostPathError`] enum, which derives [`thiserror::Error`] for ergonomic
//! error handling and [`Serialize`]/[`Deserialize`] so errors survive being
//! relayed through the external controller.
//!
//! The soft "not mine" condition is intentionally *not* an error — it lives
//! on the outcome enums in [`crate::provisioner`] so callers pattern-match
//! instead of string-comparing error text.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;

/// Unified error type for provision and delete operations.
///
/// Every variant is locally fatal to the operation that raised it and
/// retryable by the caller; the core performs no internal retries.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum HostPathError {
    /// The filesystem-statistics query against the storage root failed.
    #[error("capacity probe failed at {path}: {reason}")]
    ProbeFailed {
        /// Path the statistics query was issued against.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// The filesystem's total byte size does not fit in a signed 64-bit
    /// integer. Surfaced instead of truncating or wrapping.
    #[error("total size of filesystem at {path} does not fit in a signed 64-bit byte count")]
    CapacityOverflow {
        /// Path of the oversized filesystem.
        path: String,
    },

    /// Creating the backing directory tree failed.
    #[error("failed to create backing directory {path}: {reason}")]
    DirectoryCreateFailed {
        /// Directory that could not be created.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Removing the backing directory tree failed.
    #[error("failed to remove backing directory {path}: {reason}")]
    DirectoryRemoveFailed {
        /// Directory that could not be removed.
        path: String,
        /// Human-readable failure reason.
        reason: String,
    },

    /// A volume handed to delete carries no ownership annotation at all.
    /// The object predates or bypasses this provisioner and must not be
    /// touched.
    #[error("identity annotation not found on volume {volume}")]
    IdentityAnnotationMissing {
        /// Name of the offending volume.
        volume: String,
    },

    /// Startup configuration was invalid or incomplete.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
