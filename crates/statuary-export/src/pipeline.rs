//! Synchronous bake pipeline: pose, freeze, encode
//!
//! A single stage-sequencing function callable once by any host, replacing
//! the per-tick state machine of frame-stepped drivers. Each stage runs to
//! completion before the next begins, on the calling thread. The pipeline
//! returns in-memory artifacts; persisting them is the caller's concern.

use std::collections::HashMap;

use statuary_rig::{apply_pose, freeze, Hierarchy, NodeId, PoseSet};
use thiserror::Error;
use tracing::{info, warn};

use crate::texture::{encode_tga, TextureNamer};
use crate::wavefront::{encode_mtl, encode_obj};

/// Pipeline-fatal failures
///
/// Stage-local problems (unmatched bones, per-texture encode failures) are
/// absorbed and logged where they occur; only failures that leave nothing
/// worth exporting surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The pose set has no entries; nothing would be posed
    #[error("pose set is empty")]
    EmptyPose,

    /// No renderer under the target root produced a baked mesh
    #[error("no meshes were baked under the target root")]
    NothingBaked,
}

/// Options controlling artifact naming
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Prefix for artifact file names: `<prefix>_<node>.obj` and so on
    pub prefix: Option<String>,
}

/// Contents of a produced artifact
#[derive(Debug, Clone)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Raw bytes of the payload, whatever its kind
    pub fn bytes(&self) -> &[u8] {
        match self {
            Payload::Text(text) => text.as_bytes(),
            Payload::Binary(data) => data,
        }
    }
}

/// A file the caller should write, by name
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub payload: Payload,
}

/// Everything one pipeline run produced
#[derive(Debug, Default)]
pub struct ExportBundle {
    /// OBJ/MTL documents and TGA buffers, in production order
    pub artifacts: Vec<Artifact>,
    /// Pose entries that matched a node
    pub bones_matched: usize,
    /// Renderers baked into static snapshots
    pub meshes_baked: usize,
    /// Textures successfully encoded
    pub textures_written: usize,
    /// Textures skipped because encoding failed
    pub textures_failed: usize,
}

/// Run the full pipeline over the subtree rooted at `root`
///
/// Applies the pose, freezes every renderer in the subtree, and encodes one
/// OBJ/MTL pair per baked mesh plus one TGA per distinct texture
/// (deduplicated across meshes through a single [`TextureNamer`]). A texture
/// that fails to encode is reported and skipped; its MTL reference is kept
/// so a later run can supply the file. Meshes baked from same-named nodes
/// get distinct document names.
pub fn run(
    hierarchy: &mut Hierarchy,
    root: NodeId,
    poses: &PoseSet,
    options: &PipelineOptions,
) -> Result<ExportBundle, PipelineError> {
    if poses.is_empty() {
        return Err(PipelineError::EmptyPose);
    }

    let bones_matched = apply_pose(hierarchy, root, poses);
    info!(matched = bones_matched, entries = poses.len(), "pose applied");

    let baked = freeze(hierarchy, root);
    if baked.is_empty() {
        return Err(PipelineError::NothingBaked);
    }
    info!(meshes = baked.len(), "bake complete");

    let mut namer = TextureNamer::new();
    let mut artifacts = Vec::new();
    let mut doc_names: HashMap<String, usize> = HashMap::new();

    for mesh in &baked {
        let base = match &options.prefix {
            Some(prefix) => format!("{}_{}", prefix, mesh.name),
            None => mesh.name.clone(),
        };
        let count = doc_names.entry(base.clone()).or_insert(0);
        let doc_name = if *count == 0 { base.clone() } else { format!("{}_{}", base, count) };
        *count += 1;

        artifacts.push(Artifact {
            file_name: format!("{}.obj", doc_name),
            payload: Payload::Text(encode_obj(&doc_name, mesh)),
        });
        artifacts.push(Artifact {
            file_name: format!("{}.mtl", doc_name),
            payload: Payload::Text(encode_mtl(&doc_name, &mesh.materials, &mut namer)),
        });
    }

    let mut textures_written = 0;
    let mut textures_failed = 0;

    for (image, name) in namer.assigned() {
        match encode_tga(image) {
            Ok(buffer) => {
                artifacts.push(Artifact {
                    file_name: name.to_string(),
                    payload: Payload::Binary(buffer),
                });
                textures_written += 1;
            }
            Err(err) => {
                warn!(texture = %name, error = %err, "texture encode failed, skipping");
                textures_failed += 1;
            }
        }
    }

    Ok(ExportBundle {
        artifacts,
        bones_matched,
        meshes_baked: baked.len(),
        textures_written,
        textures_failed,
    })
}
