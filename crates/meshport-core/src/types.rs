//! Scene types shared by the importer and the exporter
//!
//! A [`Scene`] is the session-owned stand-in for a content-creation tool's
//! scene: it starts empty, an import fills it, an export reads it.
//! Cross references (node -> mesh, primitive -> material, material -> texture)
//! are plain indices into the owning vectors.

use serde::{Deserialize, Serialize};

/// Column-major 4x4 matrix, same layout as glTF `node.matrix`
pub type Matrix4 = [[f32; 4]; 4];

/// Identity transform
pub const IDENTITY: Matrix4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Box containing a single point
    pub fn from_point(point: [f32; 3]) -> Self {
        Self { min: point, max: point }
    }

    pub fn expand(&mut self, point: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    pub fn size(&self) -> [f32; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Local transform relative to the parent node
    pub transform: Matrix4,
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.transform == IDENTITY
    }
}

/// A named mesh made of one or more primitives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primitives: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.primitives.iter().map(|p| p.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.primitives.iter().map(|p| p.triangle_count()).sum()
    }
}

/// Triangulated geometry with a single material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub points: Vec<[f32; 3]>,
    /// Per-vertex normals, same length as `points`
    pub normals: Option<Vec<[f32; 3]>>,
    /// First UV set, glTF orientation (v grows downwards)
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Triangle list
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl Primitive {
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Bounding box of all points, `None` for an empty primitive
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (first, rest) = self.points.split_first()?;
        let mut bbox = BoundingBox::from_point(*first);
        for point in rest {
            bbox.expand(*point);
        }
        Some(bbox)
    }

    /// Area-weighted smooth vertex normals
    ///
    /// Vertices that touch no (non-degenerate) triangle get +Y.
    pub fn compute_normals(&self) -> Vec<[f32; 3]> {
        let mut normals = vec![[0.0f32; 3]; self.points.len()];

        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (Some(pa), Some(pb), Some(pc)) =
                (self.points.get(a), self.points.get(b), self.points.get(c))
            else {
                continue;
            };
            let e1 = sub(*pb, *pa);
            let e2 = sub(*pc, *pa);
            // Unnormalised cross product is proportional to triangle area
            let n = cross(e1, e2);
            for idx in [a, b, c] {
                for i in 0..3 {
                    normals[idx][i] += n[i];
                }
            }
        }

        normals.into_iter().map(normalize_or_up).collect()
    }

    /// Check the index and attribute invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.indices.len() % 3 != 0 {
            return Err(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            ));
        }
        let count = self.points.len();
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= count) {
            return Err(format!("index {} out of range for {} points", bad, count));
        }
        if let Some(normals) = &self.normals {
            if normals.len() != count {
                return Err(format!("{} normals for {} points", normals.len(), count));
            }
        }
        if let Some(uvs) = &self.uvs {
            if uvs.len() != count {
                return Err(format!("{} uvs for {} points", uvs.len(), count));
            }
        }
        Ok(())
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize_or_up(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if len > f32::EPSILON && len.is_finite() {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0, 1.0, 0.0]
    }
}

/// How a material treats the alpha channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlphaMode {
    #[default]
    Opaque,
    Mask,
    Blend,
}

/// Reference from a material slot to a scene texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    pub texture: usize,
    /// UV set the slot samples from
    pub tex_coord: u32,
}

impl TextureRef {
    pub fn new(texture: usize) -> Self {
        Self { texture, tex_coord: 0 }
    }
}

/// Metallic-roughness PBR material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color_factor: [f32; 4],
    pub base_color_texture: Option<TextureRef>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    /// Roughness in G, metallic in B
    pub metallic_roughness_texture: Option<TextureRef>,
    pub normal_texture: Option<TextureRef>,
    pub normal_scale: f32,
    pub occlusion_texture: Option<TextureRef>,
    pub occlusion_strength: f32,
    pub emissive_factor: [f32; 3],
    pub emissive_texture: Option<TextureRef>,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// All texture references in slot order
    pub fn texture_refs(&self) -> impl Iterator<Item = TextureRef> + '_ {
        [
            self.base_color_texture,
            self.metallic_roughness_texture,
            self.normal_texture,
            self.occlusion_texture,
            self.emissive_texture,
        ]
        .into_iter()
        .flatten()
    }
}

impl Default for Material {
    /// glTF 2.0 defaults for an unspecified material
    fn default() -> Self {
        Self {
            name: "DefaultMaterial".to_string(),
            base_color_factor: [1.0, 1.0, 1.0, 1.0],
            base_color_texture: None,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            normal_texture: None,
            normal_scale: 1.0,
            occlusion_texture: None,
            occlusion_strength: 1.0,
            emissive_factor: [0.0, 0.0, 0.0],
            emissive_texture: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

/// Encoded image type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageMime {
    Png,
    Jpeg,
    Other(String),
}

impl ImageMime {
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => ImageMime::Png,
            "image/jpeg" | "image/jpg" => ImageMime::Jpeg,
            other => ImageMime::Other(other.to_string()),
        }
    }

    /// Sniff the type from the first bytes of an encoded image
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageMime::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageMime::Jpeg)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImageMime::Png => "image/png",
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Other(s) => s,
        }
    }
}

/// Sampler wrap mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WrapMode {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

/// An encoded image plus its sampler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub name: String,
    pub mime: ImageMime,
    #[serde(skip)]
    pub data: Vec<u8>,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
}

/// The scene populated by an import and read by an export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub nodes: Vec<Node>,
    /// Top-level nodes, in order
    pub roots: Vec<usize>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
}

impl Scene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear everything, leaving an empty scene
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.meshes.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertex_count()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }

    /// Check every cross reference and primitive invariant
    pub fn validate(&self) -> Result<(), String> {
        let node_count = self.nodes.len();
        for &root in &self.roots {
            if root >= node_count {
                return Err(format!("root node {} does not exist", root));
            }
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(mesh) = node.mesh {
                if mesh >= self.meshes.len() {
                    return Err(format!("node {} references missing mesh {}", i, mesh));
                }
            }
            if let Some(child) = node.children.iter().find(|&&c| c >= node_count) {
                return Err(format!("node {} references missing child {}", i, child));
            }
        }
        for mesh in &self.meshes {
            for (i, primitive) in mesh.primitives.iter().enumerate() {
                primitive
                    .validate()
                    .map_err(|e| format!("mesh '{}' primitive {}: {}", mesh.name, i, e))?;
                if let Some(material) = primitive.material {
                    if material >= self.materials.len() {
                        return Err(format!(
                            "mesh '{}' primitive {} references missing material {}",
                            mesh.name, i, material
                        ));
                    }
                }
            }
        }
        for material in &self.materials {
            if let Some(tex) = material.texture_refs().find(|t| t.texture >= self.textures.len()) {
                return Err(format!(
                    "material '{}' references missing texture {}",
                    material.name, tex.texture
                ));
            }
        }
        Ok(())
    }

    /// Summary counts
    pub fn stats(&self) -> SceneStats {
        SceneStats {
            node_count: self.nodes.len(),
            mesh_count: self.meshes.len(),
            primitive_count: self.meshes.iter().map(|m| m.primitives.len()).sum(),
            vertex_count: self.vertex_count(),
            triangle_count: self.triangle_count(),
            material_count: self.materials.len(),
            texture_count: self.textures.len(),
            has_normals: self
                .meshes
                .iter()
                .flat_map(|m| &m.primitives)
                .any(|p| p.has_normals()),
            has_uvs: self
                .meshes
                .iter()
                .flat_map(|m| &m.primitives)
                .any(|p| p.has_uvs()),
        }
    }
}

/// Scene summary used for logging and CLI output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneStats {
    pub node_count: usize,
    pub mesh_count: usize,
    pub primitive_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub material_count: usize,
    pub texture_count: usize,
    pub has_normals: bool,
    pub has_uvs: bool,
}
