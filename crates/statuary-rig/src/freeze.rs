// statuary-rig/src/freeze.rs
//! Pose freezing: sampling posed meshes into static snapshots
//!
//! Converts every renderer in a subtree into an immutable [`BakedMesh`].
//! Skinned meshes are sampled in world space under standard linear blend
//! skinning at the skeleton's current pose; static meshes are copied
//! unchanged. Baking never mutates the source hierarchy.

use statuary_core::Mat4;
use tracing::warn;

use crate::hierarchy::{Hierarchy, NodeId};
use crate::mesh::{BakedMesh, MeshSource, Renderer, Skin};

/// Freeze every renderer in the subtree rooted at `root`
///
/// Traversal is preorder and includes inactive nodes, so the result order is
/// stable for reproducible output. Renderers with no geometry, and skinned
/// renderers whose skin is inconsistent with their mesh, are skipped with a
/// warning rather than aborting the bake. An empty result signals the caller
/// that nothing was baked.
pub fn freeze(hierarchy: &Hierarchy, root: NodeId) -> Vec<BakedMesh> {
    let mut baked = Vec::new();

    for id in hierarchy.descendants(root) {
        let node = hierarchy.node(id);
        let Some(renderer) = &node.renderer else {
            continue;
        };

        let source = renderer.source();
        if source.positions.is_empty() {
            warn!(node = %node.name, mesh = %source.name, "renderer has no geometry, skipping");
            continue;
        }

        let mesh = match renderer {
            Renderer::Static(source) => bake_static(&node.name, source),
            Renderer::Skinned(source, skin) => {
                match skin.validate(source.vertex_count()) {
                    Ok(()) => bake_skinned(hierarchy, &node.name, source, skin),
                    Err(err) => {
                        warn!(node = %node.name, error = %err, "invalid skin, skipping renderer");
                        continue;
                    }
                }
            }
        };

        baked.push(mesh);
    }

    baked
}

/// Copy static geometry and materials unchanged
fn bake_static(name: &str, source: &MeshSource) -> BakedMesh {
    BakedMesh {
        name: name.to_string(),
        positions: source.positions.clone(),
        normals: source.normals.clone(),
        uvs: source.uvs.clone(),
        indices: source.indices.clone(),
        submeshes: source.effective_submeshes(),
        materials: source.materials.clone(),
    }
}

/// Sample a skinned mesh at the skeleton's current pose
fn bake_skinned(hierarchy: &Hierarchy, name: &str, source: &MeshSource, skin: &Skin) -> BakedMesh {
    // World transform relative to the bind pose, per joint
    let joint_matrices: Vec<Mat4> = skin
        .joints
        .iter()
        .zip(&skin.inverse_bind)
        .map(|(joint, inverse_bind)| hierarchy.world_transform(*joint).mul(inverse_bind))
        .collect();

    let has_normals = !source.normals.is_empty();
    let mut positions = Vec::with_capacity(source.positions.len());
    let mut normals = Vec::with_capacity(source.normals.len());

    for (i, position) in source.positions.iter().enumerate() {
        let influences = &skin.influences[i];
        let total: f32 = influences.iter().map(|influence| influence.weight).sum();

        let blended = if total > 0.0 {
            let mut blended = Mat4::ZERO;
            for influence in influences {
                if influence.weight > 0.0 {
                    blended.add_scaled(
                        &joint_matrices[influence.joint as usize],
                        influence.weight / total,
                    );
                }
            }
            blended
        } else {
            // A vertex with no influences stays at its bind position
            Mat4::IDENTITY
        };

        positions.push(blended.transform_point(*position));
        if has_normals {
            normals.push(blended.transform_direction(source.normals[i]).normalize());
        }
    }

    BakedMesh {
        name: name.to_string(),
        positions,
        normals,
        uvs: source.uvs.clone(),
        indices: source.indices.clone(),
        submeshes: source.effective_submeshes(),
        materials: source.materials.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{SubMesh, VertexInfluence};
    use statuary_core::{Material, Quat, Vec2, Vec3};
    use std::sync::Arc;

    const EPS: f32 = 1e-4;

    fn assert_vec3_eq(a: Vec3, b: Vec3) {
        assert!((a.x - b.x).abs() < EPS, "{:?} != {:?}", a, b);
        assert!((a.y - b.y).abs() < EPS, "{:?} != {:?}", a, b);
        assert!((a.z - b.z).abs() < EPS, "{:?} != {:?}", a, b);
    }

    fn triangle_source(name: &str) -> MeshSource {
        MeshSource {
            name: name.into(),
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            normals: vec![Vec3::FORWARD; 3],
            uvs: vec![Vec2::ZERO; 3],
            indices: vec![0, 1, 2],
            submeshes: vec![SubMesh { start: 0, count: 3, material: 0 }],
            materials: vec![Arc::new(Material::new("mat"))],
        }
    }

    fn full_weight(joint: u16) -> [VertexInfluence; 4] {
        let mut influences = [VertexInfluence::default(); 4];
        influences[0] = VertexInfluence { joint, weight: 1.0 };
        influences
    }

    #[test]
    fn test_static_mesh_copied_unchanged() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let node = h.add_node("body", Some(root));
        h.node_mut(node).renderer = Some(Renderer::Static(triangle_source("tri")));

        let baked = freeze(&h, root);

        assert_eq!(baked.len(), 1);
        assert_eq!(baked[0].name, "body");
        assert_eq!(baked[0].positions, triangle_source("tri").positions);
        assert!(Arc::ptr_eq(
            &baked[0].materials[0],
            &h.node(node).renderer.as_ref().unwrap().source().materials[0]
        ));
    }

    #[test]
    fn test_skinned_identity_pose_matches_bind() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let joint = h.add_node("joint", Some(root));
        let node = h.add_node("skin", Some(root));

        let source = triangle_source("tri");
        let skin = Skin {
            joints: vec![joint],
            inverse_bind: vec![Mat4::IDENTITY],
            influences: vec![full_weight(0); 3],
        };
        h.node_mut(node).renderer = Some(Renderer::Skinned(source.clone(), skin));

        let baked = freeze(&h, root);

        assert_eq!(baked.len(), 1);
        for (out, src) in baked[0].positions.iter().zip(&source.positions) {
            assert_vec3_eq(*out, *src);
        }
    }

    #[test]
    fn test_skinned_rotation_moves_vertices_and_normals() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let joint = h.add_node("joint", Some(root));
        let node = h.add_node("skin", Some(root));

        h.node_mut(joint).local_rotation = Quat::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), 90.0);

        let skin = Skin {
            joints: vec![joint],
            inverse_bind: vec![Mat4::IDENTITY],
            influences: vec![full_weight(0); 3],
        };
        h.node_mut(node).renderer = Some(Renderer::Skinned(triangle_source("tri"), skin));

        let baked = freeze(&h, root);

        // 90 degrees around Z takes +X to +Y; the +Z normal is unchanged
        assert_vec3_eq(baked[0].positions[1], Vec3::new(0.0, 1.0, 0.0));
        assert_vec3_eq(baked[0].normals[1], Vec3::FORWARD);
    }

    #[test]
    fn test_two_joint_blend() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let still = h.add_node("still", Some(root));
        let moved = h.add_node("moved", Some(root));
        let node = h.add_node("skin", Some(root));

        h.node_mut(moved).local_position = Vec3::new(2.0, 0.0, 0.0);

        let mut influences = [VertexInfluence::default(); 4];
        influences[0] = VertexInfluence { joint: 0, weight: 0.5 };
        influences[1] = VertexInfluence { joint: 1, weight: 0.5 };

        let mut source = triangle_source("tri");
        source.positions = vec![Vec3::ZERO];
        source.normals = vec![Vec3::UP];
        source.uvs = vec![Vec2::ZERO];
        source.indices = vec![];
        source.submeshes = vec![];

        let skin = Skin {
            joints: vec![still, moved],
            inverse_bind: vec![Mat4::IDENTITY, Mat4::IDENTITY],
            influences: vec![influences],
        };
        h.node_mut(node).renderer = Some(Renderer::Skinned(source, skin));

        let baked = freeze(&h, root);

        assert_vec3_eq(baked[0].positions[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_unnormalized_weights_are_normalized() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let joint = h.add_node("joint", Some(root));
        let node = h.add_node("skin", Some(root));

        h.node_mut(joint).local_position = Vec3::new(1.0, 0.0, 0.0);

        let mut influences = [VertexInfluence::default(); 4];
        influences[0] = VertexInfluence { joint: 0, weight: 4.0 };

        let mut source = triangle_source("tri");
        source.positions = vec![Vec3::ZERO];
        source.normals = vec![];
        source.uvs = vec![];
        source.indices = vec![];
        source.submeshes = vec![];

        let skin = Skin {
            joints: vec![joint],
            inverse_bind: vec![Mat4::IDENTITY],
            influences: vec![influences],
        };
        h.node_mut(node).renderer = Some(Renderer::Skinned(source, skin));

        let baked = freeze(&h, root);

        // Weight 4.0 normalizes to 1.0, not a 4x translation
        assert_vec3_eq(baked[0].positions[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_empty_mesh_skipped() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);

        let full = h.add_node("full", Some(root));
        h.node_mut(full).renderer = Some(Renderer::Static(triangle_source("tri")));

        let empty = h.add_node("empty", Some(root));
        let mut source = triangle_source("nothing");
        source.positions.clear();
        source.normals.clear();
        source.uvs.clear();
        source.indices.clear();
        h.node_mut(empty).renderer = Some(Renderer::Static(source));

        let baked = freeze(&h, root);

        assert_eq!(baked.len(), 1);
        assert_eq!(baked[0].name, "full");
    }

    #[test]
    fn test_invalid_skin_skipped() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let joint = h.add_node("joint", Some(root));
        let node = h.add_node("skin", Some(root));

        // One influence entry for a three-vertex mesh
        let skin = Skin {
            joints: vec![joint],
            inverse_bind: vec![Mat4::IDENTITY],
            influences: vec![full_weight(0)],
        };
        h.node_mut(node).renderer = Some(Renderer::Skinned(triangle_source("tri"), skin));

        assert!(freeze(&h, root).is_empty());
    }

    #[test]
    fn test_result_follows_traversal_order_and_includes_inactive() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let first = h.add_node("first", Some(root));
        let hidden = h.add_node("hidden", Some(first));
        let last = h.add_node("last", Some(root));

        h.node_mut(first).renderer = Some(Renderer::Static(triangle_source("a")));
        h.node_mut(hidden).renderer = Some(Renderer::Static(triangle_source("b")));
        h.node_mut(hidden).active = false;
        h.node_mut(last).renderer = Some(Renderer::Static(triangle_source("c")));

        let baked = freeze(&h, root);

        let names: Vec<&str> = baked.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["first", "hidden", "last"]);
    }

    #[test]
    fn test_source_not_mutated() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let joint = h.add_node("joint", Some(root));
        let node = h.add_node("skin", Some(root));

        h.node_mut(joint).local_rotation = Quat::from_axis_angle(Vec3::UP, 45.0);

        let skin = Skin {
            joints: vec![joint],
            inverse_bind: vec![Mat4::IDENTITY],
            influences: vec![full_weight(0); 3],
        };
        h.node_mut(node).renderer = Some(Renderer::Skinned(triangle_source("tri"), skin));

        let before = h.node(node).renderer.as_ref().unwrap().source().positions.clone();
        freeze(&h, root);
        let after = &h.node(node).renderer.as_ref().unwrap().source().positions;

        assert_eq!(&before, after);
    }

    #[test]
    fn test_material_indices_valid_after_bake() {
        let mut h = Hierarchy::new();
        let root = h.add_node("root", None);
        let node = h.add_node("body", Some(root));
        h.node_mut(node).renderer = Some(Renderer::Static(triangle_source("tri")));

        for mesh in freeze(&h, root) {
            for submesh in &mesh.submeshes {
                assert!(submesh.material < mesh.materials.len());
            }
        }
    }
}
