//! GLB fixtures built in memory
//!
//! Shared with the export crate's tests through a `#[path]` module.

#![allow(dead_code)]

use serde_json::{json, Value};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Pack a glTF JSON document and binary chunk into a GLB container
pub fn pack_glb(json: &Value, bin: &[u8]) -> Vec<u8> {
    let json = serde_json::to_vec(json).expect("fixture JSON serializes");
    let json_pad = (4 - json.len() % 4) % 4;
    let bin_pad = (4 - bin.len() % 4) % 4;
    let has_bin = !bin.is_empty();

    let mut total = 12 + 8 + json.len() + json_pad;
    if has_bin {
        total += 8 + bin.len() + bin_pad;
    }

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&((json.len() + json_pad) as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend(std::iter::repeat(b' ').take(json_pad));

    if has_bin {
        out.extend_from_slice(&((bin.len() + bin_pad) as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(bin);
        out.extend(std::iter::repeat(0u8).take(bin_pad));
    }

    out
}

fn push_f32s(bin: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        bin.extend_from_slice(&v.to_le_bytes());
    }
}

pub const QUAD_POSITIONS: [[f32; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

pub const QUAD_UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Options for the textured quad fixture
pub struct QuadFixture {
    pub with_normals: bool,
    pub with_uvs: bool,
    pub with_material: bool,
    /// Encoded image stored in a buffer view, referenced as base color
    pub image: Option<(Vec<u8>, &'static str)>,
}

impl Default for QuadFixture {
    fn default() -> Self {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"not really a png body");
        Self {
            with_normals: true,
            with_uvs: true,
            with_material: true,
            image: Some((png, "image/png")),
        }
    }
}

impl QuadFixture {
    pub fn plain() -> Self {
        Self {
            with_normals: false,
            with_uvs: false,
            with_material: false,
            image: None,
        }
    }

    /// A "Root" node (translated +1 Y) holding a "Hull" node with the quad mesh
    pub fn build(&self) -> Vec<u8> {
        let mut bin = Vec::new();
        let mut views = Vec::new();
        let mut accessors = Vec::new();
        let mut attributes = serde_json::Map::new();

        let offset = bin.len();
        push_f32s(&mut bin, &QUAD_POSITIONS.concat());
        views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": bin.len() - offset, "target": 34962}));
        accessors.push(json!({
            "bufferView": views.len() - 1, "componentType": 5126, "count": 4, "type": "VEC3",
            "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
        }));
        attributes.insert("POSITION".into(), json!(accessors.len() - 1));

        if self.with_normals {
            let offset = bin.len();
            push_f32s(&mut bin, &[0.0, 0.0, 1.0].repeat(4));
            views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": bin.len() - offset, "target": 34962}));
            accessors.push(json!({"bufferView": views.len() - 1, "componentType": 5126, "count": 4, "type": "VEC3"}));
            attributes.insert("NORMAL".into(), json!(accessors.len() - 1));
        }

        if self.with_uvs {
            let offset = bin.len();
            push_f32s(&mut bin, &QUAD_UVS.concat());
            views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": bin.len() - offset, "target": 34962}));
            accessors.push(json!({"bufferView": views.len() - 1, "componentType": 5126, "count": 4, "type": "VEC2"}));
            attributes.insert("TEXCOORD_0".into(), json!(accessors.len() - 1));
        }

        let offset = bin.len();
        for i in QUAD_INDICES {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": bin.len() - offset, "target": 34963}));
        accessors.push(json!({"bufferView": views.len() - 1, "componentType": 5123, "count": 6, "type": "SCALAR"}));
        let indices_accessor = accessors.len() - 1;

        let mut primitive = json!({"attributes": attributes, "indices": indices_accessor});

        let mut doc = json!({
            "asset": {"version": "2.0", "generator": "meshport tests"},
            "scene": 0,
            "scenes": [{"name": "Shuttle", "nodes": [0]}],
            "nodes": [
                {"name": "Root", "children": [1], "translation": [0.0, 1.0, 0.0]},
                {"name": "Hull", "mesh": 0}
            ],
        });

        if self.with_material {
            primitive["material"] = json!(0);
            let mut material = json!({
                "name": "Hull Paint",
                "pbrMetallicRoughness": {
                    "baseColorFactor": [1.0, 0.5, 0.5, 1.0],
                    "metallicFactor": 0.25,
                    "roughnessFactor": 0.75
                },
                "emissiveFactor": [1.0, 0.5, 0.0],
                "extensions": {
                    "KHR_materials_emissive_strength": {"emissiveStrength": 2.0}
                }
            });
            doc["extensionsUsed"] = json!(["KHR_materials_emissive_strength"]);

            if let Some((image, mime)) = &self.image {
                // Image data must start on a 4-byte boundary like any other view
                while bin.len() % 4 != 0 {
                    bin.push(0);
                }
                let offset = bin.len();
                bin.extend_from_slice(image);
                views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": image.len()}));
                doc["images"] = json!([{"name": "hull_albedo", "bufferView": views.len() - 1, "mimeType": mime}]);
                doc["samplers"] = json!([{"wrapS": 33071, "wrapT": 10497}]);
                doc["textures"] = json!([{"source": 0, "sampler": 0}]);
                material["pbrMetallicRoughness"]["baseColorTexture"] = json!({"index": 0});
            }

            doc["materials"] = json!([material]);
        }

        doc["meshes"] = json!([{"name": "HullMesh", "primitives": [primitive]}]);
        doc["accessors"] = json!(accessors);
        doc["bufferViews"] = json!(views);
        doc["buffers"] = json!([{"byteLength": bin.len()}]);

        pack_glb(&doc, &bin)
    }
}

/// One mesh with a single primitive over `QUAD_POSITIONS`
///
/// `mode` is the raw glTF primitive mode, `None` leaves the default
/// (triangles). Every one of the `instances` root nodes references the mesh.
pub fn single_primitive_glb(indices: Option<&[u16]>, mode: Option<u32>, instances: usize) -> Vec<u8> {
    let mut bin = Vec::new();
    push_f32s(&mut bin, &QUAD_POSITIONS.concat());
    let mut views = vec![json!({"buffer": 0, "byteLength": bin.len()})];
    let mut accessors = vec![json!({
        "bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
        "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
    })];

    let mut primitive = json!({"attributes": {"POSITION": 0}});
    if let Some(indices) = indices {
        let offset = bin.len();
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        views.push(json!({"buffer": 0, "byteOffset": offset, "byteLength": bin.len() - offset}));
        accessors.push(json!({"bufferView": 1, "componentType": 5123, "count": indices.len(), "type": "SCALAR"}));
        primitive["indices"] = json!(1);
    }
    if let Some(mode) = mode {
        primitive["mode"] = json!(mode);
    }

    let nodes: Vec<Value> = (0..instances)
        .map(|i| json!({"name": format!("Instance {}", i), "mesh": 0}))
        .collect();

    let doc = json!({
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"nodes": (0..instances).collect::<Vec<_>>()}],
        "nodes": nodes,
        "meshes": [{"name": "Panel", "primitives": [primitive]}],
        "accessors": accessors,
        "bufferViews": views,
        "buffers": [{"byteLength": bin.len()}],
    });

    pack_glb(&doc, &bin)
}
