//! Ownership stamping and verification.
//!
//! Every descriptor this provisioner creates carries an identity annotation.
//! Before any destructive action the annotation is re-checked, so a
//! descriptor created by a different provisioner kind (or by hand) is never
//! deleted here. The identity string is shared by every node's instance of
//! this provisioner; it distinguishes provisioner *kinds*, not nodes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::ANN_PROVISIONER_IDENTITY;

/// Result of checking a descriptor's ownership annotation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Ownership {
    /// The annotation matches this instance's identity.
    Owned,
    /// The annotation names a different identity. Soft condition: leave the
    /// object for its true owner.
    NotOwned,
    /// No ownership annotation at all. Hard condition: the object predates
    /// or bypasses this provisioner and must not be touched.
    Missing,
}

/// Produce the annotation map stamped onto a freshly provisioned volume.
pub fn stamp(identity: &str) -> HashMap<String, String> {
    HashMap::from([(ANN_PROVISIONER_IDENTITY.to_owned(), identity.to_owned())])
}

/// Check a descriptor's annotations against this instance's identity.
pub fn verify(annotations: &HashMap<String, String>, identity: &str) -> Ownership {
    match annotations.get(ANN_PROVISIONER_IDENTITY) {
        None => Ownership::Missing,
        Some(id) if id == identity => Ownership::Owned,
        Some(_) => Ownership::NotOwned,
    }
}
