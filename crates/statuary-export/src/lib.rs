//! Statuary Export Pipeline
//!
//! Encoders that turn baked geometry into engine-independent interchange
//! documents, plus the synchronous pipeline sequencing the stages:
//! - Wavefront OBJ/MTL (mesh and material library documents)
//! - TGA (textures)
//!
//! Everything here produces in-memory documents and buffers; writing them
//! to disk is the caller's concern.

pub mod pipeline;
pub mod texture;
pub mod wavefront;

pub use pipeline::{run, Artifact, ExportBundle, Payload, PipelineError, PipelineOptions};
pub use texture::{encode_tga, TextureError, TextureNamer};
pub use wavefront::{encode_mtl, encode_obj};
