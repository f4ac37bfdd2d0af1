//! USD stage exporter implementation

use super::material::{write_material, MaterialContext};
use super::naming::NameScope;
use super::writer::{float, int_array, matrix, quoted, tuple, tuple_array, UsdaWriter};
use super::*;
use crate::textures::TextureConverter;
use crate::usdz::{write_atomic, UsdzPackager};
use meshport_core::{Material, Primitive, Scene, WrapMode};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

const ROOT_PRIM: &str = "Root";
const MATERIALS_SCOPE: &str = "Materials";

/// USD stage exporter
pub struct UsdExporter {
    options: UsdExportOptions,
    converter: TextureConverter,
}

/// Step of the hierarchy walk
enum Walk {
    Enter(usize),
    Leave(usize),
}

/// Per-stage state shared while walking the hierarchy
struct StageContext<'a> {
    scene: &'a Scene,
    /// Material prim path per scene material
    material_paths: Vec<String>,
    default_material: Option<String>,
}

impl UsdExporter {
    /// Create a new USD exporter
    pub fn new(options: UsdExportOptions) -> Self {
        Self {
            options,
            converter: TextureConverter::new(),
        }
    }

    /// Export the scene to a USDZ archive at `output_path`
    ///
    /// Returns the archive size in bytes.
    pub fn export_usdz(&self, scene: &Scene, output_path: impl AsRef<Path>) -> UsdResult<u64> {
        let output_path = output_path.as_ref();
        let package = self.build(scene, &root_layer_name(output_path))?;
        let archive = UsdzPackager::new().package(&package)?;
        write_atomic(output_path, &archive)?;
        Ok(archive.len() as u64)
    }

    /// Build the root layer and collect the texture files it references
    pub fn build(&self, scene: &Scene, root_layer: &str) -> UsdResult<UsdPackage> {
        scene.validate().map_err(UsdExportError::InvalidMeshData)?;

        let mut texture_paths = vec![None; scene.textures.len()];
        let mut files = Vec::new();

        // Textures are sampled through primvars:st, so they need UVs
        if self.options.export_materials && self.options.export_uvs {
            let used: BTreeSet<usize> = scene
                .materials
                .iter()
                .flat_map(|m| m.texture_refs())
                .map(|t| t.texture)
                .collect();

            for index in used {
                let texture = &scene.textures[index];
                let (format, data) = self.converter.normalize(texture)?;
                let path = TextureConverter::archive_path(&texture.name, index, format);
                tracing::debug!(texture = %texture.name, path = %path, bytes = data.len(), "Packaging texture");
                texture_paths[index] = Some(path.clone());
                files.push(PackageFile { path, data });
            }
        }

        let stage = self.render(scene, &texture_paths)?;

        Ok(UsdPackage {
            root_layer: root_layer.to_string(),
            stage,
            files,
        })
    }

    /// Write the `.usda` root layer
    ///
    /// `texture_paths` holds the archive path of each scene texture, or `None`
    /// for textures that are not packaged.
    pub fn write_stage(&self, scene: &Scene, texture_paths: &[Option<String>]) -> UsdResult<String> {
        scene.validate().map_err(UsdExportError::InvalidMeshData)?;
        self.render(scene, texture_paths)
    }

    fn render(&self, scene: &Scene, texture_paths: &[Option<String>]) -> UsdResult<String> {
        let mut w = UsdaWriter::new();

        w.line("#usda 1.0");
        w.line("(");
        w.line(format!("    defaultPrim = {}", quoted(ROOT_PRIM)));
        w.line(format!("    metersPerUnit = {}", float(self.options.meters_per_unit)));
        w.line(format!("    upAxis = {}", quoted(&self.options.up_axis)));
        w.line(")");
        w.blank();

        let materials_path = format!("/{}/{}", ROOT_PRIM, MATERIALS_SCOPE);
        let mut ctx = StageContext {
            scene,
            material_paths: Vec::new(),
            default_material: None,
        };

        let mut material_names = Vec::new();
        if self.options.export_materials {
            let mut scope = NameScope::new();
            material_names = scene.materials.iter().map(|m| scope.claim(&m.name)).collect();
            ctx.material_paths = material_names
                .iter()
                .map(|n| format!("{}/{}", materials_path, n))
                .collect();

            let unbound = scene
                .meshes
                .iter()
                .flat_map(|m| &m.primitives)
                .any(|p| p.material.is_none());
            if unbound {
                let name = scope.claim("DefaultMaterial");
                ctx.default_material = Some(format!("{}/{}", materials_path, name));
                material_names.push(name);
            }
        }

        w.open_prim("Xform", ROOT_PRIM, &["kind = \"component\"".to_string()]);

        self.write_hierarchy(&mut w, &ctx)?;

        if !material_names.is_empty() {
            self.write_materials(&mut w, scene, &materials_path, &material_names, texture_paths);
        }

        w.close_prim();

        tracing::debug!(
            nodes = scene.nodes.len(),
            materials = material_names.len(),
            "Wrote USD stage"
        );

        Ok(w.finish())
    }

    /// Walk the node graph depth-first with an explicit stack
    ///
    /// Each node is opened on `Enter` and closed on the matching `Leave`, so
    /// chain depth is bounded by memory rather than the call stack.
    fn write_hierarchy(&self, w: &mut UsdaWriter, ctx: &StageContext<'_>) -> UsdResult<()> {
        let scene = ctx.scene;
        let mut stack: Vec<Walk> = scene.roots.iter().rev().map(|&r| Walk::Enter(r)).collect();
        // Sibling name scopes, one per open prim
        let mut scopes = vec![NameScope::with_reserved(&[MATERIALS_SCOPE])];
        let mut on_path = HashSet::new();

        while let Some(step) = stack.pop() {
            let index = match step {
                Walk::Enter(index) => index,
                Walk::Leave(index) => {
                    on_path.remove(&index);
                    scopes.pop();
                    w.close_prim();
                    continue;
                }
            };

            if !on_path.insert(index) {
                return Err(UsdExportError::InvalidMeshData(format!(
                    "node {} is its own ancestor",
                    index
                )));
            }

            let node = &scene.nodes[index];
            let name = scopes
                .last_mut()
                .map(|scope| scope.claim(&node.name))
                .ok_or_else(|| UsdExportError::InvalidMeshData("unbalanced node walk".to_string()))?;

            w.blank();
            w.open_prim("Xform", &name, &[]);

            if !node.is_identity() {
                w.line(format!("matrix4d xformOp:transform = {}", matrix(&node.transform)));
                w.line("uniform token[] xformOpOrder = [\"xformOp:transform\"]");
            }

            let mut children = NameScope::new();

            if let Some(mesh_index) = node.mesh {
                let mesh = &scene.meshes[mesh_index];
                let single = mesh.primitives.len() == 1;
                for (i, primitive) in mesh.primitives.iter().enumerate() {
                    let prim_name = if single {
                        children.claim(&mesh.name)
                    } else {
                        children.claim(&format!("{}_{}", mesh.name, i))
                    };
                    self.write_mesh(w, ctx, &prim_name, primitive);
                }
            }

            scopes.push(children);
            stack.push(Walk::Leave(index));
            stack.extend(node.children.iter().rev().map(|&c| Walk::Enter(c)));
        }

        Ok(())
    }

    fn write_mesh(&self, w: &mut UsdaWriter, ctx: &StageContext<'_>, name: &str, primitive: &Primitive) {
        let binding = if self.options.export_materials {
            match primitive.material {
                Some(m) => ctx.material_paths.get(m).cloned(),
                None => ctx.default_material.clone(),
            }
        } else {
            None
        };

        let metadata = if binding.is_some() {
            vec!["prepend apiSchemas = [\"MaterialBindingAPI\"]".to_string()]
        } else {
            Vec::new()
        };

        let double_sided = primitive
            .material
            .and_then(|m| ctx.scene.materials.get(m))
            .is_some_and(|m| m.double_sided);

        w.blank();
        w.open_prim("Mesh", name, &metadata);

        w.line(format!("uniform bool doubleSided = {}", u8::from(double_sided)));

        if let Some(bbox) = primitive.bounding_box() {
            w.line(format!("float3[] extent = [{}, {}]", tuple(&bbox.min), tuple(&bbox.max)));
        }

        let counts = vec![3u8; primitive.triangle_count()];
        w.line(format!("int[] faceVertexCounts = {}", int_array(&counts)));
        w.line(format!("int[] faceVertexIndices = {}", int_array(&primitive.indices)));

        if let Some(path) = &binding {
            w.line(format!("rel material:binding = <{}>", path));
        }

        if self.options.export_normals {
            let normals = match &primitive.normals {
                Some(normals) => tuple_array(normals),
                None => {
                    tracing::debug!(mesh = %name, "Computing missing normals");
                    tuple_array(&primitive.compute_normals())
                }
            };
            w.attribute_with_metadata(
                "normal3f[] normals",
                &normals,
                &["interpolation = \"vertex\"".to_string()],
            );
        }

        w.line(format!("point3f[] points = {}", tuple_array(&primitive.points)));

        if self.options.export_uvs {
            if let Some(uvs) = &primitive.uvs {
                // glTF puts v = 0 at the top of the image, USD at the bottom
                let st: Vec<[f32; 2]> = uvs.iter().map(|[u, v]| [*u, 1.0 - v]).collect();
                w.attribute_with_metadata(
                    "texCoord2f[] primvars:st",
                    &tuple_array(&st),
                    &["interpolation = \"vertex\"".to_string()],
                );
            }
        }

        w.line("uniform token subdivisionScheme = \"none\"");
        w.close_prim();

        tracing::debug!(
            mesh = %name,
            vertices = primitive.vertex_count(),
            triangles = primitive.triangle_count(),
            "Wrote mesh"
        );
    }

    fn write_materials(
        &self,
        w: &mut UsdaWriter,
        scene: &Scene,
        materials_path: &str,
        names: &[String],
        texture_paths: &[Option<String>],
    ) {
        let wrap_modes: Vec<(WrapMode, WrapMode)> =
            scene.textures.iter().map(|t| (t.wrap_s, t.wrap_t)).collect();
        let ctx = MaterialContext {
            texture_paths,
            wrap_modes: &wrap_modes,
        };

        w.blank();
        w.open_prim("Scope", MATERIALS_SCOPE, &[]);

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            match scene.materials.get(i) {
                Some(material) => write_material(w, materials_path, name, material, &ctx),
                None => write_material(w, materials_path, name, &default_material(), &ctx),
            }
        }

        w.close_prim();
    }
}

impl Default for UsdExporter {
    fn default() -> Self {
        Self::new(UsdExportOptions::default())
    }
}

/// Bound to primitives that have no material of their own
fn default_material() -> Material {
    Material {
        metallic_factor: 0.0,
        roughness_factor: 0.5,
        ..Material::default()
    }
}

/// `<output stem>.usda`
pub(crate) fn root_layer_name(output_path: &Path) -> String {
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("scene");
    format!("{}.usda", stem)
}
