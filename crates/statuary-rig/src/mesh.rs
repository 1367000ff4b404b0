// statuary-rig/src/mesh.rs
//! Mesh, skin, and baked-snapshot data structures

use std::sync::Arc;

use statuary_core::{Mat4, Material, Vec2, Vec3};
use thiserror::Error;

use crate::hierarchy::NodeId;

/// Errors raised when a skin does not fit its mesh
#[derive(Error, Debug)]
pub enum SkinError {
    #[error("skin has {influences} influence entries for {vertices} vertices")]
    InfluenceCountMismatch { influences: usize, vertices: usize },

    #[error("skin has {matrices} inverse bind matrices for {joints} joints")]
    BindMatrixCountMismatch { matrices: usize, joints: usize },

    #[error("vertex {vertex} references joint {joint} but the skin has {joints} joints")]
    JointOutOfRange { vertex: usize, joint: usize, joints: usize },
}

/// Contiguous range of a mesh's index buffer sharing one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    /// First index in the index buffer
    pub start: usize,
    /// Number of indices (a multiple of 3 for triangle meshes)
    pub count: usize,
    /// Index into the mesh's material list
    pub material: usize,
}

/// One joint influence on a vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexInfluence {
    /// Index into [`Skin::joints`]
    pub joint: u16,
    /// Blend weight, expected to sum to 1 across a vertex's influences
    pub weight: f32,
}

/// Bind skeleton for a skinned mesh
///
/// Joints reference live hierarchy nodes and are not owned by the skin.
#[derive(Debug, Clone)]
pub struct Skin {
    /// Hierarchy nodes acting as skeleton joints
    pub joints: Vec<NodeId>,
    /// Inverse bind-pose transform per joint
    pub inverse_bind: Vec<Mat4>,
    /// Up to four joint influences per vertex, parallel to the vertex buffer
    pub influences: Vec<[VertexInfluence; 4]>,
}

impl Skin {
    /// Check that this skin is consistent with a mesh of `vertex_count` vertices
    pub fn validate(&self, vertex_count: usize) -> Result<(), SkinError> {
        if self.influences.len() != vertex_count {
            return Err(SkinError::InfluenceCountMismatch {
                influences: self.influences.len(),
                vertices: vertex_count,
            });
        }

        if self.inverse_bind.len() != self.joints.len() {
            return Err(SkinError::BindMatrixCountMismatch {
                matrices: self.inverse_bind.len(),
                joints: self.joints.len(),
            });
        }

        for (vertex, influences) in self.influences.iter().enumerate() {
            for influence in influences {
                if influence.weight > 0.0 && influence.joint as usize >= self.joints.len() {
                    return Err(SkinError::JointOutOfRange {
                        vertex,
                        joint: influence.joint as usize,
                        joints: self.joints.len(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Source geometry attached to a hierarchy node
///
/// Attribute buffers are parallel: `normals` and `uvs` are either empty or
/// the same length as `positions`.
#[derive(Debug, Clone)]
pub struct MeshSource {
    /// Mesh asset name
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Triangle list indices into the attribute buffers
    pub indices: Vec<u32>,
    /// Material groups; empty means the whole index buffer uses material 0
    pub submeshes: Vec<SubMesh>,
    /// Materials referenced by submeshes (shared, not owned)
    pub materials: Vec<Arc<Material>>,
}

impl MeshSource {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Submeshes as stored, or a single synthesized group covering the whole
    /// index buffer when none were provided
    pub fn effective_submeshes(&self) -> Vec<SubMesh> {
        if self.submeshes.is_empty() && !self.indices.is_empty() {
            vec![SubMesh { start: 0, count: self.indices.len(), material: 0 }]
        } else {
            self.submeshes.clone()
        }
    }
}

/// A renderer found on a hierarchy node
#[derive(Debug, Clone)]
pub enum Renderer {
    /// Static geometry, baked by copying
    Static(MeshSource),
    /// Skin-deformed geometry, baked by sampling the posed skeleton
    Skinned(MeshSource, Skin),
}

impl Renderer {
    pub fn source(&self) -> &MeshSource {
        match self {
            Renderer::Static(source) => source,
            Renderer::Skinned(source, _) => source,
        }
    }

    pub fn skin(&self) -> Option<&Skin> {
        match self {
            Renderer::Static(_) => None,
            Renderer::Skinned(_, skin) => Some(skin),
        }
    }
}

/// Immutable snapshot of a mesh at its current pose
///
/// Produced by [`crate::freeze`]; holds no references back to the live
/// hierarchy. Submesh material indices are always valid for `materials`.
#[derive(Debug, Clone)]
pub struct BakedMesh {
    /// Name of the node the snapshot was taken from
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<SubMesh>,
    /// Material list copied from the source at bake time
    pub materials: Vec<Arc<Material>>,
}

impl BakedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }
}
