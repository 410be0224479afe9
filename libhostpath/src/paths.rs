//! Backing-directory path derivation.
//!
//! Pure path joining — no existence checks, no I/O. Uniqueness of the
//! resulting path rests on the external controller's guarantee that PV names
//! are globally unique.

use std::path::{Path, PathBuf};

/// Derive the backing directory for a volume.
///
/// Without the naming prefix the path is `root/<pv_name>`; with it,
/// `root/<claim_name>-<pv_name>`. The prefixed form is more readable for
/// operators but accepts a small collision risk if two distinct claim/PV
/// pairs join to the same string.
pub fn volume_path(
    root: &Path,
    pv_name: &str,
    claim_name: &str,
    use_naming_prefix: bool,
) -> PathBuf {
    if use_naming_prefix {
        root.join(format!("{claim_name}-{pv_name}"))
    } else {
        root.join(pv_name)
    }
}
