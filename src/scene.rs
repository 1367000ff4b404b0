//! Scene document loading
//!
//! Parses a JSON scene description into a live transform hierarchy. Nodes
//! are listed flat with parent indices; a parent must appear before its
//! children, which rejects cycles at load time. Textures are referenced by
//! path and decoded through the `image` crate; the same path always resolves
//! to the same `Image` instance so shared textures keep one identity.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use statuary_core::{Color, Image, Material, PixelFormat, Quat, Vec2, Vec3};
use statuary_rig::{Hierarchy, MeshSource, NodeId, Renderer, Skin, SubMesh, VertexInfluence};

/// A scene document resolved into live objects
pub struct LoadedScene {
    pub hierarchy: Hierarchy,
    pub materials: Vec<Arc<Material>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneDoc {
    #[serde(default)]
    materials: Vec<MaterialDoc>,
    nodes: Vec<NodeDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaterialDoc {
    name: String,
    #[serde(default)]
    diffuse: Option<[u8; 4]>,
    #[serde(default)]
    texture: Option<PathBuf>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeDoc {
    name: String,
    #[serde(default)]
    parent: Option<usize>,
    #[serde(default)]
    position: [f32; 3],
    /// Euler angles in degrees
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    renderer: Option<RendererDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RendererDoc {
    mesh: MeshDoc,
    #[serde(default)]
    skin: Option<SkinDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeshDoc {
    name: String,
    /// Flat xyz triples
    positions: Vec<f32>,
    #[serde(default)]
    normals: Vec<f32>,
    /// Flat uv pairs
    #[serde(default)]
    uvs: Vec<f32>,
    indices: Vec<u32>,
    #[serde(default)]
    submeshes: Vec<SubMeshDoc>,
    /// Indices into the scene material list
    materials: Vec<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubMeshDoc {
    start: usize,
    count: usize,
    material: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkinDoc {
    /// Node indices acting as skeleton joints
    joints: Vec<usize>,
    /// Per-vertex [jointSlot, weight] pairs, up to four per vertex
    influences: Vec<Vec<(u16, f32)>>,
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_true() -> bool {
    true
}

/// Load a scene document and resolve it into a transform hierarchy
///
/// The hierarchy is taken to be in bind pose: inverse bind matrices for
/// skinned meshes are computed from the joints' world transforms as loaded.
pub fn load_scene(path: &Path) -> Result<LoadedScene> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read scene document {:?}", path))?;
    let doc: SceneDoc = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse scene document {:?}", path))?;

    let base_dir = path.parent().unwrap_or(Path::new("."));
    let materials = load_materials(&doc.materials, base_dir)?;

    let (mut hierarchy, ids) = build_hierarchy(&doc.nodes)?;

    // Renderers attach in a second pass so skins can reference any node
    for (index, node_doc) in doc.nodes.iter().enumerate() {
        if let Some(renderer_doc) = &node_doc.renderer {
            let renderer = build_renderer(&hierarchy, &ids, renderer_doc, &materials)
                .with_context(|| format!("invalid renderer on node {:?}", node_doc.name))?;
            hierarchy.node_mut(ids[index]).renderer = Some(renderer);
        }
    }

    debug!(nodes = hierarchy.len(), materials = materials.len(), "scene loaded");

    Ok(LoadedScene { hierarchy, materials })
}

fn build_hierarchy(nodes: &[NodeDoc]) -> Result<(Hierarchy, Vec<NodeId>)> {
    let mut hierarchy = Hierarchy::new();
    let mut ids: Vec<NodeId> = Vec::with_capacity(nodes.len());

    for (index, node_doc) in nodes.iter().enumerate() {
        let parent = match node_doc.parent {
            None => None,
            Some(p) if p < index => Some(ids[p]),
            Some(p) => bail!(
                "node {} ({:?}) references parent {} which does not precede it",
                index,
                node_doc.name,
                p
            ),
        };

        let id = hierarchy.add_node(node_doc.name.clone(), parent);
        let node = hierarchy.node_mut(id);
        node.local_position = Vec3::new(node_doc.position[0], node_doc.position[1], node_doc.position[2]);
        node.local_rotation =
            Quat::from_euler_deg(node_doc.rotation[0], node_doc.rotation[1], node_doc.rotation[2]);
        node.local_scale = Vec3::new(node_doc.scale[0], node_doc.scale[1], node_doc.scale[2]);
        node.active = node_doc.active;
        ids.push(id);
    }

    Ok((hierarchy, ids))
}

fn load_materials(docs: &[MaterialDoc], base_dir: &Path) -> Result<Vec<Arc<Material>>> {
    // One Image instance per path, so materials sharing a texture share identity
    let mut textures: HashMap<PathBuf, Arc<Image>> = HashMap::new();
    let mut materials = Vec::with_capacity(docs.len());

    for doc in docs {
        let mut material = Material::new(doc.name.clone());

        if let Some([r, g, b, a]) = doc.diffuse {
            material.diffuse = Color::new(r, g, b, a);
        }

        if let Some(texture_path) = &doc.texture {
            let resolved = base_dir.join(texture_path);
            let image = match textures.get(&resolved) {
                Some(image) => Arc::clone(image),
                None => {
                    let image = Arc::new(load_image(&resolved)?);
                    textures.insert(resolved, Arc::clone(&image));
                    image
                }
            };
            material.main_texture = Some(image);
        }

        materials.push(Arc::new(material));
    }

    Ok(materials)
}

fn load_image(path: &Path) -> Result<Image> {
    let decoded = image::open(path).with_context(|| format!("failed to load texture {:?}", path))?;

    let image = match decoded {
        image::DynamicImage::ImageRgb8(buffer) => {
            let (width, height) = buffer.dimensions();
            Image::new(width, height, PixelFormat::Rgb8, buffer.into_raw())
        }
        other => {
            let buffer = other.to_rgba8();
            let (width, height) = buffer.dimensions();
            Image::new(width, height, PixelFormat::Rgba8, buffer.into_raw())
        }
    };

    Ok(image)
}

fn build_renderer(
    hierarchy: &Hierarchy,
    ids: &[NodeId],
    doc: &RendererDoc,
    scene_materials: &[Arc<Material>],
) -> Result<Renderer> {
    let source = build_mesh(&doc.mesh, scene_materials)?;

    match &doc.skin {
        None => Ok(Renderer::Static(source)),
        Some(skin_doc) => {
            let skin = build_skin(hierarchy, ids, skin_doc, source.vertex_count())?;
            Ok(Renderer::Skinned(source, skin))
        }
    }
}

fn build_mesh(doc: &MeshDoc, scene_materials: &[Arc<Material>]) -> Result<MeshSource> {
    let positions = group_vec3(&doc.positions, "positions")?;
    let normals = group_vec3(&doc.normals, "normals")?;
    let uvs = group_vec2(&doc.uvs, "uvs")?;

    if !normals.is_empty() && normals.len() != positions.len() {
        bail!("mesh {:?} has {} normals for {} vertices", doc.name, normals.len(), positions.len());
    }
    if !uvs.is_empty() && uvs.len() != positions.len() {
        bail!("mesh {:?} has {} uvs for {} vertices", doc.name, uvs.len(), positions.len());
    }
    if doc.indices.len() % 3 != 0 {
        bail!("mesh {:?} index count {} is not a multiple of 3", doc.name, doc.indices.len());
    }
    for &index in &doc.indices {
        if index as usize >= positions.len() {
            bail!("mesh {:?} index {} out of range ({} vertices)", doc.name, index, positions.len());
        }
    }

    let mut materials = Vec::with_capacity(doc.materials.len());
    for &material_index in &doc.materials {
        let material = scene_materials
            .get(material_index)
            .with_context(|| format!("mesh {:?} references unknown material {}", doc.name, material_index))?;
        materials.push(Arc::clone(material));
    }

    let mut submeshes = Vec::with_capacity(doc.submeshes.len());
    for submesh in &doc.submeshes {
        if submesh.start + submesh.count > doc.indices.len() {
            bail!(
                "mesh {:?} submesh range {}..{} exceeds {} indices",
                doc.name,
                submesh.start,
                submesh.start + submesh.count,
                doc.indices.len()
            );
        }
        if submesh.material >= materials.len() {
            bail!(
                "mesh {:?} submesh references material {} but the mesh has {}",
                doc.name,
                submesh.material,
                materials.len()
            );
        }
        submeshes.push(SubMesh {
            start: submesh.start,
            count: submesh.count,
            material: submesh.material,
        });
    }

    if submeshes.is_empty() && !doc.indices.is_empty() && materials.is_empty() {
        bail!("mesh {:?} has geometry but no materials", doc.name);
    }

    Ok(MeshSource {
        name: doc.name.clone(),
        positions,
        normals,
        uvs,
        indices: doc.indices.clone(),
        submeshes,
        materials,
    })
}

fn build_skin(
    hierarchy: &Hierarchy,
    ids: &[NodeId],
    doc: &SkinDoc,
    vertex_count: usize,
) -> Result<Skin> {
    let mut joints = Vec::with_capacity(doc.joints.len());
    let mut inverse_bind = Vec::with_capacity(doc.joints.len());

    for &joint_index in &doc.joints {
        let id = *ids
            .get(joint_index)
            .with_context(|| format!("skin references unknown node {}", joint_index))?;
        let inverse = hierarchy
            .world_transform(id)
            .inverse_affine()
            .with_context(|| {
                format!("joint {:?} has a non-invertible bind transform", hierarchy.node(id).name)
            })?;
        joints.push(id);
        inverse_bind.push(inverse);
    }

    if doc.influences.len() != vertex_count {
        bail!("skin has {} influence entries for {} vertices", doc.influences.len(), vertex_count);
    }

    let mut influences = Vec::with_capacity(doc.influences.len());
    for (vertex, pairs) in doc.influences.iter().enumerate() {
        if pairs.len() > 4 {
            bail!("vertex {} has {} influences, at most 4 are supported", vertex, pairs.len());
        }
        let mut slots = [VertexInfluence::default(); 4];
        for (slot, &(joint, weight)) in pairs.iter().enumerate() {
            slots[slot] = VertexInfluence { joint, weight };
        }
        influences.push(slots);
    }

    Ok(Skin { joints, inverse_bind, influences })
}

fn group_vec3(flat: &[f32], what: &str) -> Result<Vec<Vec3>> {
    if flat.len() % 3 != 0 {
        bail!("{} array length {} is not a multiple of 3", what, flat.len());
    }
    Ok(flat.chunks_exact(3).map(|c| Vec3::new(c[0], c[1], c[2])).collect())
}

fn group_vec2(flat: &[f32], what: &str) -> Result<Vec<Vec2>> {
    if flat.len() % 2 != 0 {
        bail!("{} array length {} is not a multiple of 2", what, flat.len());
    }
    Ok(flat.chunks_exact(2).map(|c| Vec2::new(c[0], c[1])).collect())
}
