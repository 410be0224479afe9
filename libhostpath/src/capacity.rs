//! Filesystem capacity probing.
//!
//! A provisioned volume advertises the *total* size of the filesystem
//! backing the storage root — block count times block size, rounded up to a
//! whole giga-unit. This is deliberately an upper bound, not a live
//! free-space gauge: hostpath volumes share one filesystem and no per-volume
//! quota is enforced.
//!
//! The platform call is hidden behind the [`CapacityProbe`] trait so a
//! different statistics source can be swapped in per target platform (and so
//! tests can inject deterministic or failing probes).

use std::path::Path;
use tracing::debug;

use crate::error::HostPathError;
use crate::types::{GIGA, Quantity};

/// Source of filesystem capacity figures for the storage root.
pub trait CapacityProbe: Send + Sync {
    /// Return the total capacity of the filesystem holding `root`, rounded
    /// up to a whole multiple of [`GIGA`].
    fn probe(&self, root: &Path) -> Result<Quantity, HostPathError>;
}

/// Production probe backed by `statvfs(3)`.
pub struct StatvfsProbe;

impl CapacityProbe for StatvfsProbe {
    fn probe(&self, root: &Path) -> Result<Quantity, HostPathError> {
        let stat =
            nix::sys::statvfs::statvfs(root).map_err(|e| HostPathError::ProbeFailed {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;
        let quantity = quantity_from_raw(
            stat.blocks().into(),
            stat.fragment_size().into(),
            root,
        )?;
        debug!(root = %root.display(), capacity = %quantity, "probed filesystem capacity");
        Ok(quantity)
    }
}

/// Turn raw statvfs figures into a giga-rounded [`Quantity`].
///
/// A total that does not fit in `i64` is a hard [`CapacityOverflow`] error,
/// never a truncated or wrapped value.
///
/// [`CapacityOverflow`]: HostPathError::CapacityOverflow
fn quantity_from_raw(
    blocks: u64,
    fragment_size: u64,
    root: &Path,
) -> Result<Quantity, HostPathError> {
    let total = u128::from(blocks) * u128::from(fragment_size);
    if total > i64::MAX as u128 {
        return Err(HostPathError::CapacityOverflow {
            path: root.display().to_string(),
        });
    }
    Ok(Quantity::from_bytes(total as i64).round_up(GIGA))
}
