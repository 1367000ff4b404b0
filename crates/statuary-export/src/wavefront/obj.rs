//! OBJ geometry document encoding

use statuary_rig::BakedMesh;

use super::material_names;

/// Encode a baked mesh as an OBJ document
///
/// The header references the companion material library `<name>.mtl`. One
/// `v`/`vt`/`vn` record is emitted per vertex (the attribute streams are
/// parallel, so face records reuse one index for all three), then one
/// `usemtl` face block per submesh. A mesh with zero vertices produces a
/// header-only document.
pub fn encode_obj(name: &str, mesh: &BakedMesh) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("mtllib {}.mtl\n", name));
    doc.push_str(&format!("o {}\n", mesh.name));

    for p in &mesh.positions {
        doc.push_str(&format!("v {:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
    }
    for t in &mesh.uvs {
        doc.push_str(&format!("vt {:.6} {:.6}\n", t.x, t.y));
    }
    for n in &mesh.normals {
        doc.push_str(&format!("vn {:.6} {:.6} {:.6}\n", n.x, n.y, n.z));
    }

    let has_uvs = !mesh.uvs.is_empty();
    let has_normals = !mesh.normals.is_empty();
    let names = material_names(&mesh.materials);

    for submesh in &mesh.submeshes {
        if let Some(material) = names.get(submesh.material) {
            doc.push_str(&format!("usemtl {}\n", material));
        }

        let indices = &mesh.indices[submesh.start..submesh.start + submesh.count];
        for triangle in indices.chunks_exact(3) {
            doc.push('f');
            for &index in triangle {
                let i = index as usize + 1; // OBJ indices are 1-based
                match (has_uvs, has_normals) {
                    (true, true) => doc.push_str(&format!(" {}/{}/{}", i, i, i)),
                    (false, true) => doc.push_str(&format!(" {}//{}", i, i)),
                    (true, false) => doc.push_str(&format!(" {}/{}", i, i)),
                    (false, false) => doc.push_str(&format!(" {}", i)),
                }
            }
            doc.push('\n');
        }
    }

    doc
}
