// meshport-parsers/src/glb/mod.rs
//! glTF 2.0 / GLB importer
//!
//! Reads a binary (`.glb`) or text (`.gltf`) asset into a [`Scene`]:
//!
//! 1. Validate the GLB container header
//! 2. Load the JSON document and resolve buffers (embedded blob, data URIs,
//!    or files next to the asset)
//! 3. Convert textures, materials, meshes and the node hierarchy
//!
//! Geometry is kept in glTF space (Y up, metres, right handed).

mod header;
mod material;
mod mesh;

pub use header::{is_json, GlbHeader, CHUNK_BIN, CHUNK_JSON, GLB_MAGIC, GLB_VERSION};
pub use material::decode_data_uri;
pub use mesh::{fan_to_triangles, strip_to_triangles};

use std::collections::HashSet;

use gltf::buffer::Data;
use gltf::Document;
use meshport_core::{Mesh, Node, Scene};
use tracing::{debug, info};

use crate::traits::{ParseError, ParseOptions, ParseResult, Parser};

/// glTF/GLB parser producing a [`Scene`]
#[derive(Debug, Default, Clone, Copy)]
pub struct GlbParser;

impl GlbParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    fn build_scene(
        &self,
        document: &Document,
        buffers: &[Data],
        options: &ParseOptions,
    ) -> ParseResult<Scene> {
        let mut scene = Scene::new();

        for texture in document.textures() {
            let converted = material::load_texture(&texture, buffers, options.base_dir.as_deref())
                .map_err(|e| e.with_context(format!("texture {}", texture.index())))?;
            scene.textures.push(converted);
        }

        scene.materials = document.materials().map(|m| material::convert_material(&m)).collect();

        for gltf_mesh in document.meshes() {
            let name = gltf_mesh
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Mesh_{}", gltf_mesh.index()));
            let mut mesh = Mesh::new(name);

            for primitive in gltf_mesh.primitives() {
                let converted = mesh::convert_primitive(&primitive, buffers, options).map_err(|e| {
                    e.with_context(format!(
                        "mesh '{}' primitive {}",
                        mesh.name,
                        primitive.index()
                    ))
                })?;
                if let Some(converted) = converted {
                    mesh.primitives.push(converted);
                }
            }

            debug!(mesh = %mesh.name, primitives = mesh.primitives.len(), "Converted mesh");
            scene.meshes.push(mesh);
        }

        scene.nodes = document
            .nodes()
            .map(|node| Node {
                name: node
                    .name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Node_{}", node.index())),
                transform: node.transform().matrix(),
                mesh: node.mesh().map(|m| m.index()),
                children: node.children().map(|c| c.index()).collect(),
            })
            .collect();

        let selected = document
            .default_scene()
            .or_else(|| document.scenes().next());

        match selected {
            Some(gltf_scene) => {
                scene.name = gltf_scene.name().unwrap_or_default().to_string();
                scene.roots = gltf_scene.nodes().map(|n| n.index()).collect();
            }
            None => {
                // No scene list: every node nobody claims as a child is a root
                let children: HashSet<usize> = scene
                    .nodes
                    .iter()
                    .flat_map(|n| n.children.iter().copied())
                    .collect();
                scene.roots = (0..scene.nodes.len()).filter(|i| !children.contains(i)).collect();
            }
        }

        scene
            .validate()
            .map_err(ParseError::InvalidStructure)?;

        Ok(scene)
    }
}

impl Parser for GlbParser {
    type Output = Scene;

    fn extensions(&self) -> &[&str] {
        &["glb", "gltf"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(GLB_MAGIC)
    }

    fn name(&self) -> &str {
        "glTF/GLB Importer"
    }

    fn supported_versions(&self) -> &[u32] {
        &[GLB_VERSION]
    }

    fn parse_bytes(&self, data: &[u8], options: &ParseOptions) -> ParseResult<Scene> {
        if !is_json(data) {
            let header = GlbHeader::read(data)?;
            debug!(
                length = header.length,
                json = header.json_length,
                bin = ?header.bin_length,
                "GLB header"
            );
        }

        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(data).map_err(missing_position)?;
        let buffers = gltf::import_buffers(&document, options.base_dir.as_deref(), blob)?;

        let scene = self.build_scene(&document, &buffers, options)?;

        info!(
            nodes = scene.nodes.len(),
            meshes = scene.meshes.len(),
            materials = scene.materials.len(),
            textures = scene.textures.len(),
            vertices = scene.vertex_count(),
            triangles = scene.triangle_count(),
            "Imported glTF scene"
        );

        Ok(scene)
    }
}

/// Report a primitive without `POSITION` as a missing field
///
/// The `gltf` crate rejects such documents during validation, before any
/// primitive reaches the mesh converter.
fn missing_position(err: gltf::Error) -> ParseError {
    if let gltf::Error::Validation(errors) = &err {
        let missing = errors.iter().find(|(path, kind)| {
            matches!(kind, gltf::json::validation::Error::Missing)
                && path.as_str().ends_with("[\"POSITION\"]")
        });
        if let Some((path, _)) = missing {
            return ParseError::MissingField(format!("POSITION ({})", path.as_str()));
        }
    }
    ParseError::Gltf(err)
}
