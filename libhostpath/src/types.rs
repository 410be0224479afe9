//! Core data model for hostpath provisioning: requests, volume descriptors,
//! capacity quantities, and node-affinity constraints.
//!
//! Every type here is [`Serialize`]/[`Deserialize`] — the external
//! provisioning controller persists [`VolumeDescriptor`]s and later hands
//! them back unchanged when a volume is reclaimed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Well-known keys
// ---------------------------------------------------------------------------

/// Claim annotation that pins provisioning to a single named node.
///
/// Every node runs its own instance of this provisioner; this annotation is
/// the only thing that stops all of them from racing to create the same
/// backing directory.
pub const ANN_PROVISION_ON_NODE: &str = "rk8s.io/provision-on-node";

/// Volume annotation recording which provisioner kind created the volume.
/// Checked before any destructive action.
pub const ANN_PROVISIONER_IDENTITY: &str = "rk8s.io/hostpath-provisioner-identity";

/// Standard node label whose value is the node's hostname. Used as the key
/// of the required node-affinity term on provisioned volumes.
pub const HOSTNAME_LABEL: &str = "kubernetes.io/hostname";

/// Resource name under which a volume's capacity is reported.
pub const RESOURCE_STORAGE: &str = "storage";

// ---------------------------------------------------------------------------
// Capacity quantity
// ---------------------------------------------------------------------------

/// One decimal giga-unit (1e9 bytes).
pub const GIGA: i64 = 1_000_000_000;

/// A scalar storage size in bytes.
///
/// Capacities reported by this provisioner are always rounded **up** to a
/// whole multiple of [`GIGA`], so consumers never observe fractional units
/// and the reported value is never smaller than the real filesystem size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(i64);

impl Quantity {
    /// Wrap a raw byte count.
    pub fn from_bytes(bytes: i64) -> Self {
        Self(bytes)
    }

    /// The raw byte count.
    pub fn as_bytes(self) -> i64 {
        self.0
    }

    /// Round up to the nearest whole multiple of `unit`.
    ///
    /// A value that is already a multiple of `unit` is returned unchanged,
    /// so rounding never shrinks a quantity.
    pub fn round_up(self, unit: i64) -> Self {
        let rem = self.0 % unit;
        if rem == 0 {
            self
        } else {
            Self(self.0 - rem + unit)
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 != 0 && self.0 % GIGA == 0 {
            write!(f, "{}G", self.0 / GIGA)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Access modes & reclaim policy
// ---------------------------------------------------------------------------

/// Describes how a volume may be accessed.
///
/// The provisioner passes these through unchanged from the claim to the
/// descriptor; it never interprets them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccessMode {
    /// Single-node read-write.
    ReadWriteOnce,
    /// Multi-node read-only.
    ReadOnlyMany,
    /// Multi-node read-write.
    ReadWriteMany,
}

/// What happens to the backing store once a volume is released.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReclaimPolicy {
    /// Remove the backing directory when the volume is released.
    Delete,
    /// Keep the backing directory; reclamation is manual.
    Retain,
}

// ---------------------------------------------------------------------------
// Node affinity
// ---------------------------------------------------------------------------

/// Required node-affinity constraint pinning a volume to one node.
///
/// The backing directory only exists on the node that created it, so a
/// descriptor must never be mountable anywhere else. This is the real
/// access-control boundary for hostpath volumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeAffinity {
    /// Node label key matched against, e.g. [`HOSTNAME_LABEL`].
    pub key: String,
    /// The only node identity allowed to mount the volume.
    pub node: String,
}

impl NodeAffinity {
    /// Build the required term binding [`HOSTNAME_LABEL`] to `node`.
    pub fn pin_to(node: &str) -> Self {
        Self {
            key: HOSTNAME_LABEL.to_owned(),
            node: node.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Claims & requests
// ---------------------------------------------------------------------------

/// The claim a provision request was raised for.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimRef {
    /// Claim name.
    pub name: String,
    /// Claim namespace.
    pub namespace: String,
    /// Arbitrary string-keyed annotations; [`ANN_PROVISION_ON_NODE`] is the
    /// one this provisioner acts on.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Requested access modes, copied verbatim onto the descriptor.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
}

/// Input to a provision call. Immutable for the duration of the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvisionRequest {
    /// Externally assigned, globally unique volume name.
    pub pv_name: String,
    /// The claim being satisfied.
    pub claim: ClaimRef,
}

// ---------------------------------------------------------------------------
// Volume descriptor
// ---------------------------------------------------------------------------

/// The persisted record of a provisioned hostpath volume.
///
/// Produced by a provision call, stored by the external controller, and
/// handed back unchanged to delete. The core holds no copy of it between
/// calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeDescriptor {
    /// Volume name, equal to the requested PV name.
    pub name: String,
    /// Annotations; always contains [`ANN_PROVISIONER_IDENTITY`].
    #[serde(default)]
    pub annotations: HashMap<String, String>,
    /// Always [`ReclaimPolicy::Delete`] for volumes this provisioner creates.
    pub reclaim_policy: ReclaimPolicy,
    /// Access modes copied from the claim.
    #[serde(default)]
    pub access_modes: Vec<AccessMode>,
    /// Capacity keyed by resource name; [`RESOURCE_STORAGE`] holds the
    /// giga-rounded filesystem size.
    #[serde(default)]
    pub capacity: HashMap<String, Quantity>,
    /// Absolute path of the backing directory on the owning node.
    pub path: PathBuf,
    /// Required affinity term naming exactly the node that owns `path`.
    pub node_affinity: NodeAffinity,
}

impl VolumeDescriptor {
    /// The storage capacity entry, if present.
    pub fn storage_capacity(&self) -> Option<Quantity> {
        self.capacity.get(RESOURCE_STORAGE).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_round_up_partial_unit() {
        let q = Quantity::from_bytes(GIGA + 1).round_up(GIGA);
        assert_eq!(q.as_bytes(), 2 * GIGA);
    }

    #[test]
    fn quantity_round_up_exact_multiple_unchanged() {
        let q = Quantity::from_bytes(3 * GIGA).round_up(GIGA);
        assert_eq!(q.as_bytes(), 3 * GIGA);
    }

    #[test]
    fn quantity_round_up_zero_unchanged() {
        let q = Quantity::from_bytes(0).round_up(GIGA);
        assert_eq!(q.as_bytes(), 0);
    }

    #[test]
    fn quantity_display_giga_aligned() {
        assert_eq!(Quantity::from_bytes(42 * GIGA).to_string(), "42G");
        assert_eq!(Quantity::from_bytes(1500).to_string(), "1500");
    }

    #[test]
    fn node_affinity_pin_to_uses_hostname_label() {
        let affinity = NodeAffinity::pin_to("node-01");
        assert_eq!(affinity.key, HOSTNAME_LABEL);
        assert_eq!(affinity.node, "node-01");
    }

    #[test]
    fn descriptor_serde_roundtrip() {
        let descriptor = VolumeDescriptor {
            name: "pv-1".into(),
            annotations: HashMap::from([(
                ANN_PROVISIONER_IDENTITY.to_owned(),
                "rk8s.io/hostpath-provisioner".to_owned(),
            )]),
            reclaim_policy: ReclaimPolicy::Delete,
            access_modes: vec![AccessMode::ReadWriteOnce],
            capacity: HashMap::from([(
                RESOURCE_STORAGE.to_owned(),
                Quantity::from_bytes(10 * GIGA),
            )]),
            path: PathBuf::from("/data/pv-1"),
            node_affinity: NodeAffinity::pin_to("node-01"),
        };

        let json = serde_json::to_string(&descriptor).expect("serialize");
        let de: VolumeDescriptor = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(de.name, descriptor.name);
        assert_eq!(de.path, descriptor.path);
        assert_eq!(de.node_affinity, descriptor.node_affinity);
        assert_eq!(de.storage_capacity(), Some(Quantity::from_bytes(10 * GIGA)));
    }
}
