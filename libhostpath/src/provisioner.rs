//! Provisioner service trait and operation outcomes.
//!
//! The external provisioning controller drives these two operations; all
//! queueing, retry, and watch machinery lives there. Both operations are
//! stateless given their input — nothing is cached across calls.
//!
//! "Not mine" is modelled as an outcome variant rather than an error so the
//! controller can pattern-match the soft skip apart from real failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostPathError;
use crate::types::{ProvisionRequest, VolumeDescriptor};

/// Result of a provision call that did not hard-fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProvisionOutcome {
    /// A volume was created; the descriptor is ready to be persisted.
    Provisioned(VolumeDescriptor),
    /// The claim is legitimately some other instance's responsibility.
    /// Ignorable: not an error, never retried here, nothing was created.
    NotMine {
        /// Why this instance declined, for controller-side logging only.
        reason: String,
    },
}

impl ProvisionOutcome {
    /// `true` for the soft skip variant.
    pub fn is_not_mine(&self) -> bool {
        matches!(self, Self::NotMine { .. })
    }
}

/// Result of a delete call that did not hard-fail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeleteOutcome {
    /// The backing directory is gone.
    Deleted,
    /// The volume belongs to a different provisioner identity. Ignorable:
    /// no data was touched.
    NotMine {
        /// Why this instance declined, for controller-side logging only.
        reason: String,
    },
}

impl DeleteOutcome {
    /// `true` for the soft skip variant.
    pub fn is_not_mine(&self) -> bool {
        matches!(self, Self::NotMine { .. })
    }
}

/// A node-local volume provisioner.
///
/// The controller may invoke these concurrently for *different* volume
/// names; implementations hold no shared mutable state, so disjoint backing
/// paths need no in-process locking.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Decide whether this claim is ours and, if so, materialize a backing
    /// directory and return its descriptor.
    async fn provision(
        &self,
        req: ProvisionRequest,
    ) -> Result<ProvisionOutcome, HostPathError>;

    /// Verify ownership of a previously provisioned volume and reclaim its
    /// backing directory.
    async fn delete(
        &self,
        volume: &VolumeDescriptor,
    ) -> Result<DeleteOutcome, HostPathError>;
}
