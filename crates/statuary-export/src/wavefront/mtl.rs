//! MTL material library document encoding

use std::sync::Arc;

use statuary_core::Material;

use crate::texture::TextureNamer;

use super::material_names;

/// Encode a material list as an MTL document
///
/// One `newmtl` block per material, in list order, under the same
/// disambiguated names the OBJ encoder uses for its `usemtl` directives.
/// Textured materials reference the file name assigned by the shared
/// [`TextureNamer`]; the encoder never invents texture names of its own.
pub fn encode_mtl(name: &str, materials: &[Arc<Material>], namer: &mut TextureNamer) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("# Material library for {}\n", name));

    let names = material_names(materials);
    for (material, material_name) in materials.iter().zip(&names) {
        let [r, g, b, _] = material.diffuse.to_float();

        doc.push('\n');
        doc.push_str(&format!("newmtl {}\n", material_name));
        doc.push_str(&format!("Kd {:.4} {:.4} {:.4}\n", r, g, b));
        doc.push_str("d 1.0000\n");
        doc.push_str("illum 2\n");

        if let Some(texture) = &material.main_texture {
            doc.push_str(&format!("map_Kd {}\n", namer.name_for(texture)));
        }
    }

    doc
}
