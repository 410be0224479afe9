//! Per-node provisioner configuration.
//!
//! Established once at process startup and immutable afterwards; every
//! provision and delete call reads it, none mutates it.
//!
//! Environment variables:
//! - `NODE_NAME`: identity of the node this instance runs on (required).
//! - `PV_DIR`: root directory under which backing directories are created
//!   (required). Must match the host path mounted into the provisioner's
//!   own deployment.
//! - `USE_NAMING_PREFIX`: set to `true` (case-insensitive) to prefix backing
//!   directory names with the claim name. Defaults to off.
//!
//! Missing required variables surface as a structured [`ConfigError`]; the
//! bootstrap layer decides whether that aborts the process.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the node this instance runs on.
pub const ENV_NODE_NAME: &str = "NODE_NAME";
/// Environment variable naming the backing-storage root directory.
pub const ENV_PV_DIR: &str = "PV_DIR";
/// Environment variable toggling claim-name prefixes on backing directories.
pub const ENV_USE_NAMING_PREFIX: &str = "USE_NAMING_PREFIX";

/// Identity string stamped onto every volume this provisioner kind creates.
///
/// Shared by every node's instance — per-node selectivity comes from the
/// node-affinity term and the provision-on-node annotation, not from this
/// string.
pub const DEFAULT_PROVISIONER_IDENTITY: &str = "rk8s.io/hostpath-provisioner";

/// Startup configuration failures.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("required environment variable {0} is not set")]
    MissingEnv(String),
}

/// Immutable per-node configuration for the hostpath provisioner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Identity of the node this instance runs on.
    pub node_name: String,
    /// Root directory for all backing directories.
    pub pv_root: PathBuf,
    /// Ownership identity stamped onto provisioned volumes.
    pub identity: String,
    /// Whether backing directory names are prefixed with the claim name.
    pub use_naming_prefix: bool,
}

impl ProvisionerConfig {
    /// Build a configuration with the default identity and no naming prefix.
    pub fn new(node_name: impl Into<String>, pv_root: impl Into<PathBuf>) -> Self {
        Self {
            node_name: node_name.into(),
            pv_root: pv_root.into(),
            identity: DEFAULT_PROVISIONER_IDENTITY.to_owned(),
            use_naming_prefix: false,
        }
    }

    /// Enable or disable the claim-name prefix on backing directories.
    pub fn with_naming_prefix(mut self, enabled: bool) -> Self {
        self.use_naming_prefix = enabled;
        self
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// `from_env` is a thin wrapper over this; tests supply their own lookup
    /// so they never mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let node_name = lookup(ENV_NODE_NAME)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(ENV_NODE_NAME.to_owned()))?;
        let pv_root = lookup(ENV_PV_DIR)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ConfigError::MissingEnv(ENV_PV_DIR.to_owned()))?;
        let use_naming_prefix = lookup(ENV_USE_NAMING_PREFIX)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            node_name,
            pv_root: PathBuf::from(pv_root),
            identity: DEFAULT_PROVISIONER_IDENTITY.to_owned(),
            use_naming_prefix,
        })
    }
}
