//! Hostpath provisioner backend.
//!
//! [`HostPathProvisioner`] implements [`Provisioner`] on top of a plain
//! directory tree on the local node. Each volume is one sub-directory under
//! the configured storage root:
//!
//! ```text
//! <pv_root>/
//!   <pv-name>/                # backing directory, default naming
//!   <claim-name>-<pv-name>/   # backing directory with USE_NAMING_PREFIX
//! ```
//!
//! The provisioner is stateless: configuration is read-only after startup
//! and no descriptor is held in memory across calls, so the controller may
//! run provisions and deletes for different volumes concurrently.

use std::collections::HashMap;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::affinity::is_correct_node;
use crate::capacity::{CapacityProbe, StatvfsProbe};
use crate::config::ProvisionerConfig;
use crate::error::HostPathError;
use crate::ownership::{self, Ownership};
use crate::paths::volume_path;
use crate::provisioner::{DeleteOutcome, ProvisionOutcome, Provisioner};
use crate::types::{
    NodeAffinity, ProvisionRequest, RESOURCE_STORAGE, ReclaimPolicy, VolumeDescriptor,
};

/// Mode bits for freshly created backing directories.
///
/// Deliberately world-writable: the required node-affinity term, not
/// filesystem permissions, is the access-control boundary for hostpath
/// volumes. Flagged for review in DESIGN.md rather than silently tightened.
const BACKING_DIR_MODE: u32 = 0o777;

/// Node-local hostpath volume provisioner.
pub struct HostPathProvisioner {
    /// Immutable per-node configuration, established at startup.
    config: ProvisionerConfig,
    /// Capacity source for the storage root's filesystem.
    probe: Box<dyn CapacityProbe>,
}

impl HostPathProvisioner {
    /// Create a provisioner using the production [`StatvfsProbe`].
    pub fn new(config: ProvisionerConfig) -> Self {
        Self::with_probe(config, Box::new(StatvfsProbe))
    }

    /// Create a provisioner with a custom capacity probe.
    pub fn with_probe(config: ProvisionerConfig, probe: Box<dyn CapacityProbe>) -> Self {
        info!(
            node_name = %config.node_name,
            pv_root = %config.pv_root.display(),
            use_naming_prefix = config.use_naming_prefix,
            "initiating hostpath provisioner",
        );
        Self { config, probe }
    }

    /// The configuration this instance was built with.
    pub fn config(&self) -> &ProvisionerConfig {
        &self.config
    }
}

#[async_trait]
impl Provisioner for HostPathProvisioner {
    #[instrument(skip(self, req), fields(pv_name = %req.pv_name, claim = %req.claim.name))]
    async fn provision(
        &self,
        req: ProvisionRequest,
    ) -> Result<ProvisionOutcome, HostPathError> {
        // Cheapest check first, and the only one that keeps every other
        // node's instance from racing us: no I/O happens for foreign claims.
        if !is_correct_node(&req.claim.annotations, &self.config.node_name) {
            return Ok(ProvisionOutcome::NotMine {
                reason: format!(
                    "provision-on-node annotation on claim {} does not name node {}",
                    req.claim.name, self.config.node_name
                ),
            });
        }

        let path = volume_path(
            &self.config.pv_root,
            &req.pv_name,
            &req.claim.name,
            self.config.use_naming_prefix,
        );

        // Probe before touching the disk: a volume must never exist with a
        // guessed or zero capacity, so probe failure aborts with nothing
        // created.
        let capacity = self.probe.probe(&self.config.pv_root)?;

        info!(path = %path.display(), "creating backing directory");
        tokio::fs::create_dir_all(&path).await.map_err(|e| {
            HostPathError::DirectoryCreateFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        // create_dir_all modes are filtered by the process umask, so the
        // open mode is applied explicitly afterwards.
        tokio::fs::set_permissions(&path, Permissions::from_mode(BACKING_DIR_MODE))
            .await
            .map_err(|e| HostPathError::DirectoryCreateFailed {
                path: path.display().to_string(),
                reason: format!("set permissions: {e}"),
            })?;

        let descriptor = VolumeDescriptor {
            name: req.pv_name,
            annotations: ownership::stamp(&self.config.identity),
            reclaim_policy: ReclaimPolicy::Delete,
            access_modes: req.claim.access_modes,
            capacity: HashMap::from([(RESOURCE_STORAGE.to_owned(), capacity)]),
            path,
            node_affinity: NodeAffinity::pin_to(&self.config.node_name),
        };

        info!(volume = %descriptor.name, %capacity, "volume provisioned");
        Ok(ProvisionOutcome::Provisioned(descriptor))
    }

    #[instrument(skip(self, volume), fields(volume = %volume.name))]
    async fn delete(
        &self,
        volume: &VolumeDescriptor,
    ) -> Result<DeleteOutcome, HostPathError> {
        match ownership::verify(&volume.annotations, &self.config.identity) {
            Ownership::Missing => {
                return Err(HostPathError::IdentityAnnotationMissing {
                    volume: volume.name.clone(),
                });
            }
            Ownership::NotOwned => {
                return Ok(DeleteOutcome::NotMine {
                    reason: format!(
                        "identity annotation on volume {} does not match ours",
                        volume.name
                    ),
                });
            }
            Ownership::Owned => {}
        }

        // Delete is idempotent: an already-absent backing path means a
        // previous attempt (or an operator) finished the job, and retrying
        // must not fail.
        if volume.path.exists() {
            info!(path = %volume.path.display(), "removing backing directory");
            tokio::fs::remove_dir_all(&volume.path).await.map_err(|e| {
                HostPathError::DirectoryRemoveFailed {
                    path: volume.path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
        } else {
            debug!(path = %volume.path.display(), "backing directory already gone");
        }

        Ok(DeleteOutcome::Deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ANN_PROVISION_ON_NODE, ANN_PROVISIONER_IDENTITY, AccessMode, ClaimRef, GIGA,
        HOSTNAME_LABEL, Quantity,
    };
    use std::path::Path;

    const NODE: &str = "test-node";

    /// Probe returning a fixed quantity, for tests that must not depend on
    /// the host filesystem's size.
    struct FixedProbe(i64);

    impl CapacityProbe for FixedProbe {
        fn probe(&self, _root: &Path) -> Result<Quantity, HostPathError> {
            Ok(Quantity::from_bytes(self.0))
        }
    }

    /// Probe that always fails, to prove provisioning aborts before any
    /// directory is created.
    struct FailingProbe;

    impl CapacityProbe for FailingProbe {
        fn probe(&self, root: &Path) -> Result<Quantity, HostPathError> {
            Err(HostPathError::ProbeFailed {
                path: root.display().to_string(),
                reason: "synthetic failure".into(),
            })
        }
    }

    fn make_provisioner(root: &Path) -> HostPathProvisioner {
        HostPathProvisioner::new(ProvisionerConfig::new(NODE, root))
    }

    fn make_request(pv_name: &str, claim_name: &str, target_node: Option<&str>) -> ProvisionRequest {
        let mut annotations = HashMap::new();
        if let Some(node) = target_node {
            annotations.insert(ANN_PROVISION_ON_NODE.to_owned(), node.to_owned());
        }
        ProvisionRequest {
            pv_name: pv_name.to_owned(),
            claim: ClaimRef {
                name: claim_name.to_owned(),
                namespace: "default".to_owned(),
                annotations,
                access_modes: vec![AccessMode::ReadWriteOnce],
            },
        }
    }

    async fn provision_ok(
        provisioner: &HostPathProvisioner,
        req: ProvisionRequest,
    ) -> VolumeDescriptor {
        match provisioner.provision(req).await.unwrap() {
            ProvisionOutcome::Provisioned(descriptor) => descriptor,
            ProvisionOutcome::NotMine { reason } => {
                panic!("expected a provisioned volume, got NotMine: {reason}")
            }
        }
    }

    #[tokio::test]
    async fn provision_on_matching_node() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;

        // Backing path is a child of the root and exists on disk.
        assert!(descriptor.path.starts_with(tmp.path()));
        assert_eq!(descriptor.path, tmp.path().join("pv-1"));
        assert!(descriptor.path.is_dir());

        // Capacity is a positive whole multiple of a giga-unit.
        let capacity = descriptor.storage_capacity().unwrap();
        assert!(capacity.as_bytes() > 0);
        assert_eq!(capacity.as_bytes() % GIGA, 0);

        // Affinity names exactly this node.
        assert_eq!(descriptor.node_affinity.key, HOSTNAME_LABEL);
        assert_eq!(descriptor.node_affinity.node, NODE);

        // Ownership stamp, reclaim policy, and access modes.
        assert_eq!(
            descriptor.annotations.get(ANN_PROVISIONER_IDENTITY),
            Some(&provisioner.config().identity)
        );
        assert_eq!(descriptor.reclaim_policy, ReclaimPolicy::Delete);
        assert_eq!(descriptor.access_modes, vec![AccessMode::ReadWriteOnce]);
    }

    #[tokio::test]
    async fn backing_directory_is_world_writable() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;

        let mode = std::fs::metadata(&descriptor.path)
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o777);
    }

    #[tokio::test]
    async fn provision_for_other_node_is_not_mine() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let outcome = provisioner
            .provision(make_request("pv-1", "claim-a", Some("other-node")))
            .await
            .unwrap();
        assert!(outcome.is_not_mine());

        // Nothing may be created on disk for a foreign claim.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn provision_without_target_annotation_is_not_mine() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let outcome = provisioner
            .provision(make_request("pv-1", "claim-a", None))
            .await
            .unwrap();
        assert!(outcome.is_not_mine());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn naming_prefix_includes_claim_name() {
        let tmp = tempfile::tempdir().unwrap();
        let config = ProvisionerConfig::new(NODE, tmp.path()).with_naming_prefix(true);
        let provisioner = HostPathProvisioner::new(config);

        let descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;
        assert_eq!(descriptor.path, tmp.path().join("claim-a-pv-1"));
        assert!(descriptor.path.is_dir());
    }

    #[tokio::test]
    async fn probe_failure_aborts_before_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = HostPathProvisioner::with_probe(
            ProvisionerConfig::new(NODE, tmp.path()),
            Box::new(FailingProbe),
        );

        let result = provisioner
            .provision(make_request("pv-1", "claim-a", Some(NODE)))
            .await;
        assert!(matches!(result, Err(HostPathError::ProbeFailed { .. })));

        // The backing directory must not exist after an aborted provision.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn fixed_probe_capacity_lands_on_descriptor() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = HostPathProvisioner::with_probe(
            ProvisionerConfig::new(NODE, tmp.path()),
            Box::new(FixedProbe(5 * GIGA)),
        );

        let descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;
        assert_eq!(
            descriptor.storage_capacity(),
            Some(Quantity::from_bytes(5 * GIGA))
        );
    }

    #[tokio::test]
    async fn delete_owned_volume_removes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;
        std::fs::write(descriptor.path.join("data.bin"), b"payload").unwrap();

        let outcome = provisioner.delete(&descriptor).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted));
        assert!(!descriptor.path.exists());
    }

    #[tokio::test]
    async fn delete_is_idempotent_on_missing_path() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;
        provisioner.delete(&descriptor).await.unwrap();

        // Second delete of the same, now-missing path succeeds quietly.
        let outcome = provisioner.delete(&descriptor).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Deleted));
    }

    #[tokio::test]
    async fn delete_without_identity_annotation_is_a_hard_error() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let mut descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;
        descriptor.annotations.clear();

        let result = provisioner.delete(&descriptor).await;
        assert!(matches!(
            result,
            Err(HostPathError::IdentityAnnotationMissing { .. })
        ));

        // The backing directory must be left untouched.
        assert!(descriptor.path.is_dir());
    }

    #[tokio::test]
    async fn delete_of_foreign_volume_is_not_mine_and_keeps_data() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = make_provisioner(tmp.path());

        let mut descriptor =
            provision_ok(&provisioner, make_request("pv-1", "claim-a", Some(NODE))).await;
        descriptor.annotations.insert(
            ANN_PROVISIONER_IDENTITY.to_owned(),
            "someone-else/provisioner".to_owned(),
        );

        let outcome = provisioner.delete(&descriptor).await.unwrap();
        assert!(outcome.is_not_mine());
        assert!(descriptor.path.is_dir());
    }

    #[tokio::test]
    async fn concurrent_provisions_for_distinct_volumes() {
        let tmp = tempfile::tempdir().unwrap();
        let provisioner = std::sync::Arc::new(make_provisioner(tmp.path()));

        let mut handles = Vec::new();
        for i in 0..4 {
            let p = provisioner.clone();
            handles.push(tokio::spawn(async move {
                provision_ok(&p, make_request(&format!("pv-{i}"), "claim-a", Some(NODE))).await
            }));
        }
        for handle in handles {
            let descriptor = handle.await.unwrap();
            assert!(descriptor.path.is_dir());
        }
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 4);
    }
}
