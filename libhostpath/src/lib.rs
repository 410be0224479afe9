//! # libhostpath — node-local hostpath volume provisioning for RK8s
//!
//! `libhostpath` implements the decision logic of a node-local storage
//! provisioner: given a claim, decide whether this node should materialize a
//! backing directory for it, and later reclaim that directory safely. It
//! follows the RK8s architecture conventions (Tokio async runtime, `tracing`
//! for observability, `thiserror` for structured errors).
//!
//! The surrounding controller — claim watching, work queues, retries,
//! leader election — is an external collaborator; this crate is the pair of
//! stateless operations it calls into.
//!
//! Three safety invariants drive the design:
//!
//! 1. a provisioned volume carries a required node-affinity term naming
//!    exactly the node that owns the backing directory, so wrong-node mounts
//!    are impossible;
//! 2. deletion only acts on volumes stamped with this provisioner's own
//!    identity annotation;
//! 3. advertised capacity is probed from the real filesystem, never taken
//!    from input.
//!
//! ## Module overview
//!
//! | Module | Purpose |
//! |---|---|
//! | [`types`] | Data model: requests, [`VolumeDescriptor`], [`Quantity`], affinity. |
//! | [`error`] | [`HostPathError`] enum covering all hard failure modes. |
//! | [`config`] | [`ProvisionerConfig`] — per-node startup configuration. |
//! | [`affinity`] | Node-targeting guard over claim annotations. |
//! | [`capacity`] | [`CapacityProbe`] trait and the `statvfs` implementation. |
//! | [`paths`] | Backing-directory path derivation. |
//! | [`ownership`] | Identity stamping and pre-delete verification. |
//! | [`provisioner`] | [`Provisioner`] trait and soft-skip outcome types. |
//! | [`hostpath`] | [`HostPathProvisioner`] — the concrete backend. |

pub mod affinity;
pub mod capacity;
pub mod config;
pub mod error;
pub mod hostpath;
pub mod ownership;
pub mod paths;
pub mod provisioner;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use capacity::{CapacityProbe, StatvfsProbe};
pub use config::{ConfigError, ProvisionerConfig};
pub use error::HostPathError;
pub use hostpath::HostPathProvisioner;
pub use ownership::Ownership;
pub use provisioner::{DeleteOutcome, ProvisionOutcome, Provisioner};
pub use types::*;
