//! Wavefront OBJ/MTL interchange encoding
//!
//! Geometry is emitted in the coordinate frame it was baked in (right-handed,
//! Y-up, counter-clockwise front faces); no axis flip is performed. Face
//! records use 1-based global indices as the format requires.

mod mtl;
mod obj;

pub use mtl::encode_mtl;
pub use obj::encode_obj;

use std::collections::HashMap;
use std::sync::Arc;

use statuary_core::Material;

/// Unique material names for a material list, in list order
///
/// OBJ `usemtl` and MTL `newmtl` directives match by name, so duplicate
/// material names must be disambiguated the same way in both documents:
/// the first occurrence keeps its name, later ones get `_1`, `_2`, ...
/// appended. Both encoders resolve names through this function.
pub fn material_names(materials: &[Arc<Material>]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();

    materials
        .iter()
        .map(|material| {
            let count = seen.entry(material.name.as_str()).or_insert(0);
            let name = if *count == 0 {
                material.name.clone()
            } else {
                format!("{}_{}", material.name, count)
            };
            *count += 1;
            name
        })
        .collect()
}
