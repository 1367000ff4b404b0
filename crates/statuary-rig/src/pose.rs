// statuary-rig/src/pose.rs
//! Pose data and application onto a transform hierarchy

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use statuary_core::Quat;
use tracing::debug;

use crate::hierarchy::{Hierarchy, NodeId};

/// Target rotation of a pose entry
///
/// Pose documents carry either Euler angles in degrees (`{"x": .., "y": ..,
/// "z": ..}`) or a unit quaternion (`[x, y, z, w]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoseRotation {
    /// Euler angles in degrees, applied Z then X then Y
    Euler { x: f32, y: f32, z: f32 },
    /// Quaternion components in x, y, z, w order
    Quaternion([f32; 4]),
}

impl PoseRotation {
    /// Convert to a normalized quaternion
    pub fn to_quat(&self) -> Quat {
        match *self {
            PoseRotation::Euler { x, y, z } => Quat::from_euler_deg(x, y, z),
            PoseRotation::Quaternion([x, y, z, w]) => Quat::new(x, y, z, w).normalize(),
        }
    }
}

/// Named bone plus target rotation, the smallest unit of pose data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoseEntry {
    /// Name of the bone this entry targets
    pub bone_name: String,
    /// Rotation to write into the bone's local transform
    pub rotation: PoseRotation,
}

/// An ordered sequence of pose entries
///
/// Bone names need not be unique; entries are applied in document order, so
/// the last entry for a bone wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSet {
    pub bones: Vec<PoseEntry>,
}

impl PoseSet {
    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }
}

/// Apply a pose set onto the subtree rooted at `root`
///
/// Overwrites the local rotation of each node whose name matches a pose
/// entry; positions and scales are untouched, and rotations are replaced
/// rather than composed, so applying the same pose twice is a no-op. Entries
/// naming bones absent from the subtree are skipped silently (pose documents
/// routinely target a superset of skeletons). When the subtree contains two
/// nodes with the same name, the first one in preorder wins.
///
/// Returns the number of entries that matched a node.
pub fn apply_pose(hierarchy: &mut Hierarchy, root: NodeId, poses: &PoseSet) -> usize {
    let mut by_name: HashMap<String, NodeId> = HashMap::new();
    for id in hierarchy.descendants(root) {
        by_name
            .entry(hierarchy.node(id).name.clone())
            .or_insert(id);
    }

    let mut matched = 0;
    for entry in &poses.bones {
        match by_name.get(&entry.bone_name) {
            Some(&id) => {
                hierarchy.node_mut(id).local_rotation = entry.rotation.to_quat();
                matched += 1;
            }
            None => {
                debug!(bone = %entry.bone_name, "pose entry matched no node, skipping");
            }
        }
    }

    matched
}
