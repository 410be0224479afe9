//! Node-targeting guard.
//!
//! Every node runs an instance of this provisioner and all of them see every
//! claim. This guard is the single gate that decides whether a claim is this
//! node's to act on, by inspecting the
//! [`ANN_PROVISION_ON_NODE`](crate::types::ANN_PROVISION_ON_NODE) annotation.

use std::collections::HashMap;
use tracing::debug;

use crate::types::ANN_PROVISION_ON_NODE;

/// Return `true` iff the claim's annotations target exactly `node_name`.
///
/// A claim without the targeting annotation matches *no* node: the
/// conservative default is to skip, never to assume ownership. Comparison is
/// exact and case-sensitive.
pub fn is_correct_node(annotations: &HashMap<String, String>, node_name: &str) -> bool {
    match annotations.get(ANN_PROVISION_ON_NODE) {
        Some(target) if target == node_name => {
            debug!(target, node_name, "claim targets this node");
            true
        }
        Some(target) => {
            debug!(target, node_name, "claim targets another node, skipping");
            false
        }
        None => {
            debug!(node_name, "claim has no provision-on-node annotation, skipping");
            false
        }
    }
}
