// statuary-rig/src/hierarchy.rs
//! Arena-based transform hierarchy
//!
//! Nodes live in a flat arena and address each other by index. A node is
//! created already attached to its parent, so the parent/child graph is a
//! tree by construction and cycles are unrepresentable.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use statuary_core::{Mat4, Quat, Vec3};

use crate::mesh::Renderer;

/// Index of a node within its [`Hierarchy`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Get the raw arena index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single node in the transform hierarchy
///
/// Transform fields are public and mutated in place by the pose applier;
/// the parent/child links are managed by [`Hierarchy`] only.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name, matched against pose entries
    pub name: String,
    /// Translation relative to the parent
    pub local_position: Vec3,
    /// Rotation relative to the parent
    pub local_rotation: Quat,
    /// Scale relative to the parent
    pub local_scale: Vec3,
    /// Inactive nodes are still traversed and baked
    pub active: bool,
    /// Mesh renderer attached to this node, if any
    pub renderer: Option<Renderer>,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

impl Node {
    fn new(name: impl Into<String>, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            local_scale: Vec3::ONE,
            active: true,
            renderer: None,
            parent,
            children: SmallVec::new(),
        }
    }

    /// Parent node index (None for root nodes)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child node indices in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Local TRS transform of this node
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_trs(self.local_position, self.local_rotation, self.local_scale)
    }
}

/// Arena of transform nodes
#[derive(Debug, Clone, Default)]
pub struct Hierarchy {
    nodes: Vec<Node>,
}

impl Hierarchy {
    /// Create a new empty hierarchy
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node, linked under `parent` (or as a root when `None`)
    pub fn add_node(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(name, parent));

        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }

        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of nodes in the arena
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node indices in insertion order
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Indices of nodes with no parent
    pub fn roots(&self) -> Vec<NodeId> {
        self.ids()
            .filter(|id| self.node(*id).parent.is_none())
            .collect()
    }

    /// Preorder traversal of `root`'s subtree, including `root` itself
    ///
    /// Inactive nodes are included; visit order is stable across calls.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            order.push(id);
            // Reverse so the first child is visited first
            for &child in self.node(id).children.iter().rev() {
                stack.push(child);
            }
        }

        order
    }

    /// Find the first node named `name` in preorder within `root`'s subtree
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(root)
            .into_iter()
            .find(|id| self.node(*id).name == name)
    }

    /// World-space transform of a node (product of local transforms from the
    /// root of its tree down to the node)
    pub fn world_transform(&self, id: NodeId) -> Mat4 {
        let mut chain = vec![id];
        let mut current = id;

        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }

        let mut result = Mat4::IDENTITY;
        for &ancestor in chain.iter().rev() {
            result = result.mul(&self.node(ancestor).local_transform());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statuary_core::Vec3;

    #[test]
    fn test_add_node_links_parent() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let child = h.add_node("child", Some(root));

        assert_eq!(h.len(), 2);
        assert_eq!(h.node(child).parent(), Some(root));
        assert_eq!(h.node(root).children(), &[child]);
        assert_eq!(h.roots(), vec![root]);
    }

    #[test]
    fn test_descendants_preorder() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let a = h.add_node("a", Some(root));
        let a1 = h.add_node("a1", Some(a));
        let b = h.add_node("b", Some(root));

        assert_eq!(h.descendants(root), vec![root, a, a1, b]);
        assert_eq!(h.descendants(a), vec![a, a1]);
    }

    #[test]
    fn test_find_by_name_first_match() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let first = h.add_node("twin", Some(root));
        let _second = h.add_node("twin", Some(root));

        // Duplicate names resolve to the first node in traversal order
        assert_eq!(h.find_by_name(root, "twin"), Some(first));
        assert_eq!(h.find_by_name(root, "missing"), None);
    }

    #[test]
    fn test_world_transform_chains_parents() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let child = h.add_node("child", Some(root));

        h.node_mut(root).local_position = Vec3::new(1.0, 0.0, 0.0);
        h.node_mut(root).local_rotation = Quat::from_axis_angle(Vec3::UP, 90.0);
        h.node_mut(child).local_position = Vec3::new(0.0, 0.0, 1.0);

        // Child sits 1 unit along the parent's rotated +Z, i.e. world +X
        let p = h.world_transform(child).translation();
        assert!((p.x - 2.0).abs() < 1e-4);
        assert!(p.y.abs() < 1e-4);
        assert!(p.z.abs() < 1e-4);
    }
}
