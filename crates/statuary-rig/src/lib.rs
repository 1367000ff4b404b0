//! Statuary Rig Library
//!
//! The live side of the bake pipeline: an arena-based transform hierarchy,
//! pose application onto named bones, and freezing of skinned meshes into
//! static geometry snapshots.

pub mod freeze;
pub mod hierarchy;
pub mod mesh;
pub mod pose;

pub use freeze::freeze;
pub use hierarchy::{Hierarchy, Node, NodeId};
pub use mesh::{BakedMesh, MeshSource, Renderer, Skin, SkinError, SubMesh, VertexInfluence};
pub use pose::{apply_pose, PoseEntry, PoseRotation, PoseSet};
