//! Integration tests for the glTF/GLB importer
//!
//! These tests cover:
//! - Geometry, hierarchy and material import from an in-memory GLB
//! - Container and document validation failures
//! - File based parsing and format detection
//! - Index conversion properties

mod common;

use std::path::Path;

use common::{pack_glb, single_primitive_glb, QuadFixture, PNG_SIGNATURE, QUAD_POSITIONS};
use meshport_core::{AlphaMode, ImageMime, WrapMode};
use meshport_parsers::glb::{fan_to_triangles, strip_to_triangles};
use meshport_parsers::{GlbParser, ParseError, ParseOptions, Parser};
use serde_json::json;

fn parse(data: &[u8]) -> Result<meshport_core::Scene, ParseError> {
    GlbParser::new().parse_bytes(data, &ParseOptions::default())
}

fn parse_strict(data: &[u8]) -> Result<meshport_core::Scene, ParseError> {
    let options = ParseOptions {
        strict_validation: true,
        ..ParseOptions::default()
    };
    GlbParser::new().parse_bytes(data, &options)
}

/// Strip the mesh/primitive context added by the importer
fn innermost(err: &ParseError) -> &ParseError {
    let mut err = err;
    while let ParseError::Nested { source, .. } = err {
        err = source;
    }
    err
}

mod import_tests {
    use super::*;

    #[test]
    fn test_quad_geometry() {
        let scene = parse(&QuadFixture::default().build()).unwrap();

        assert_eq!(scene.meshes.len(), 1);
        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "HullMesh");
        assert_eq!(mesh.primitives.len(), 1);

        let prim = &mesh.primitives[0];
        assert_eq!(prim.points, QUAD_POSITIONS.to_vec());
        assert_eq!(prim.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(prim.normals.as_ref().map(Vec::len), Some(4));
        assert_eq!(prim.uvs.as_ref().unwrap()[0], [0.0, 1.0]);
        assert_eq!(prim.material, Some(0));

        assert_eq!(scene.vertex_count(), 4);
        assert_eq!(scene.triangle_count(), 2);
    }

    #[test]
    fn test_hierarchy() {
        let scene = parse(&QuadFixture::default().build()).unwrap();

        assert_eq!(scene.name, "Shuttle");
        assert_eq!(scene.roots, vec![0]);
        assert_eq!(scene.nodes[0].name, "Root");
        assert_eq!(scene.nodes[0].children, vec![1]);
        assert_eq!(scene.nodes[0].transform[3], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(scene.nodes[1].mesh, Some(0));
        assert!(scene.nodes[1].is_identity());
    }

    #[test]
    fn test_material_and_texture() {
        let scene = parse(&QuadFixture::default().build()).unwrap();

        let material = &scene.materials[0];
        assert_eq!(material.name, "Hull Paint");
        assert_eq!(material.base_color_factor, [1.0, 0.5, 0.5, 1.0]);
        assert_eq!(material.metallic_factor, 0.25);
        assert_eq!(material.roughness_factor, 0.75);
        assert_eq!(material.emissive_factor, [2.0, 1.0, 0.0]);
        assert_eq!(material.alpha_mode, AlphaMode::Opaque);
        assert_eq!(material.base_color_texture.map(|t| t.texture), Some(0));

        assert_eq!(scene.textures.len(), 1);
        let texture = &scene.textures[0];
        assert_eq!(texture.name, "hull_albedo");
        assert_eq!(texture.mime, ImageMime::Png);
        assert!(texture.data.starts_with(&PNG_SIGNATURE));
        assert_eq!(texture.wrap_s, WrapMode::ClampToEdge);
        assert_eq!(texture.wrap_t, WrapMode::Repeat);
    }

    #[test]
    fn test_without_optional_attributes() {
        let scene = parse(&QuadFixture::plain().build()).unwrap();
        let prim = &scene.meshes[0].primitives[0];

        assert!(prim.normals.is_none());
        assert!(prim.uvs.is_none());
        assert!(prim.material.is_none());
        assert!(scene.materials.is_empty());
        assert!(scene.textures.is_empty());
    }

    #[test]
    fn test_text_gltf_with_data_uri() {
        let mut bin = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
        use base64::Engine;
        let uri = format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&bin)
        );
        let doc = json!({
            "asset": {"version": "2.0"},
            "buffers": [{"byteLength": bin.len(), "uri": uri}],
            "bufferViews": [{"buffer": 0, "byteLength": bin.len()}],
            "accessors": [{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                           "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}],
            "nodes": [{"mesh": 0}]
        });

        let scene = parse(&serde_json::to_vec(&doc).unwrap()).unwrap();

        // No scenes: parentless nodes become roots, missing names are generated
        assert_eq!(scene.roots, vec![0]);
        assert_eq!(scene.nodes[0].name, "Node_0");
        assert_eq!(scene.meshes[0].name, "Mesh_0");
        // Non-indexed primitive gets sequential indices
        assert_eq!(scene.meshes[0].primitives[0].indices, vec![0, 1, 2]);
    }
}

mod topology_tests {
    use super::*;

    const TRIANGLE_STRIP: u32 = 5;
    const TRIANGLE_FAN: u32 = 6;
    const POINTS: u32 = 0;
    const LINES: u32 = 1;

    #[test]
    fn test_triangle_strip() {
        let data = single_primitive_glb(Some(&[0, 1, 2, 3]), Some(TRIANGLE_STRIP), 1);
        let scene = parse(&data).unwrap();
        assert_eq!(scene.meshes[0].primitives[0].indices, vec![0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn test_triangle_fan() {
        let data = single_primitive_glb(Some(&[0, 1, 2, 3]), Some(TRIANGLE_FAN), 1);
        let scene = parse(&data).unwrap();
        assert_eq!(scene.meshes[0].primitives[0].indices, vec![0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn test_points_are_skipped() {
        let scene = parse(&single_primitive_glb(None, Some(POINTS), 1)).unwrap();
        assert_eq!(scene.meshes.len(), 1);
        assert!(scene.meshes[0].primitives.is_empty());
    }

    #[test]
    fn test_lines_are_skipped() {
        let data = single_primitive_glb(Some(&[0, 1, 2, 3]), Some(LINES), 1);
        let scene = parse(&data).unwrap();
        assert!(scene.meshes[0].primitives.is_empty());
        assert_eq!(scene.triangle_count(), 0);
    }

    #[test]
    fn test_strict_rejects_points() {
        let err = parse_strict(&single_primitive_glb(None, Some(POINTS), 1)).unwrap_err();
        match innermost(&err) {
            ParseError::UnsupportedFeature(feature) => assert_eq!(feature, "primitive mode Points"),
            other => panic!("expected unsupported feature, got {}", other),
        }
    }

    #[test]
    fn test_strict_accepts_triangles() {
        let data = single_primitive_glb(Some(&[0, 1, 2, 0, 2, 3]), None, 1);
        let scene = parse_strict(&data).unwrap();
        assert_eq!(scene.triangle_count(), 2);
    }

    #[test]
    fn test_shared_mesh_instances() {
        let data = single_primitive_glb(Some(&[0, 1, 2, 0, 2, 3]), None, 2);
        let scene = parse(&data).unwrap();

        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.roots, vec![0, 1]);
        assert_eq!(scene.nodes[0].mesh, Some(0));
        assert_eq!(scene.nodes[1].mesh, Some(0));
        assert_eq!(scene.nodes[1].name, "Instance 1");
    }
}

mod external_file_tests {
    use super::*;

    /// Write `quad.gltf` with its buffer and image as sibling files
    fn write_split_gltf(dir: &Path, image: &[u8]) -> std::path::PathBuf {
        let mut bin = Vec::new();
        for v in QUAD_POSITIONS.concat() {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2, 0, 2, 3] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        std::fs::write(dir.join("quad.bin"), &bin).unwrap();
        std::fs::write(dir.join("albedo.png"), image).unwrap();

        let doc = json!({
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"name": "Panel", "mesh": 0}],
            "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1, "material": 0}]}],
            "materials": [{"pbrMetallicRoughness": {"baseColorTexture": {"index": 0}}}],
            "textures": [{"source": 0}],
            "images": [{"uri": "albedo.png"}],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
                {"bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR"}
            ],
            "bufferViews": [
                {"buffer": 0, "byteLength": 48},
                {"buffer": 0, "byteOffset": 48, "byteLength": 12}
            ],
            "buffers": [{"byteLength": bin.len(), "uri": "quad.bin"}]
        });

        let path = dir.join("quad.gltf");
        std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
        path
    }

    fn albedo() -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(b"external image body");
        png
    }

    #[test]
    fn test_external_buffer_and_image() {
        let dir = tempfile::tempdir().unwrap();
        let image = albedo();
        let path = write_split_gltf(dir.path(), &image);

        let scene = GlbParser::new().parse_file(&path).unwrap();

        assert_eq!(scene.meshes[0].primitives[0].points, QUAD_POSITIONS.to_vec());
        assert_eq!(scene.triangle_count(), 2);
        assert_eq!(scene.textures.len(), 1);
        assert_eq!(scene.textures[0].data, image);
        assert_eq!(scene.textures[0].mime, ImageMime::Png);
        assert_eq!(scene.materials[0].base_color_texture.map(|t| t.texture), Some(0));
    }

    #[test]
    fn test_external_buffer_needs_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_split_gltf(dir.path(), &albedo());

        let data = std::fs::read(&path).unwrap();
        assert!(matches!(parse(&data), Err(ParseError::Gltf(_))));
    }

    #[test]
    fn test_missing_external_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_split_gltf(dir.path(), &albedo());
        std::fs::remove_file(dir.path().join("albedo.png")).unwrap();

        assert!(GlbParser::new().parse_file(&path).is_err());
    }
}

mod error_tests {
    use super::*;

    #[test]
    fn test_rejects_wrong_magic() {
        let mut data = QuadFixture::plain().build();
        data[0..4].copy_from_slice(b"GLTF");
        assert!(matches!(parse(&data), Err(ParseError::InvalidMagic { .. })));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let data = QuadFixture::default().build();
        let result = parse(&data[..data.len() / 2]);
        assert!(matches!(result, Err(ParseError::CorruptedData { .. })));
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(parse(&[]).is_err());
    }

    #[test]
    fn test_rejects_invalid_document() {
        let data = pack_glb(&json!({"asset": {"version": "2.0"}, "scene": 3}), &[]);
        assert!(matches!(parse(&data), Err(ParseError::Gltf(_))));
    }

    #[test]
    fn test_rejects_out_of_range_index() {
        let err = parse(&single_primitive_glb(Some(&[0, 1, 9]), None, 1)).unwrap_err();
        match innermost(&err) {
            ParseError::CorruptedData { offset, message } => {
                assert_eq!(*offset, 2);
                assert!(message.contains("index 9"));
            }
            other => panic!("expected corrupted data, got {}", other),
        }
    }

    #[test]
    fn test_rejects_primitive_without_position() {
        let doc = json!({
            "asset": {"version": "2.0"},
            "meshes": [{"primitives": [{"attributes": {}}]}],
            "nodes": [{"mesh": 0}]
        });
        match parse(&pack_glb(&doc, &[])) {
            Err(ParseError::MissingField(field)) => assert!(field.starts_with("POSITION")),
            other => panic!("expected missing POSITION, got {:?}", other.map(|s| s.name)),
        }
    }

    #[test]
    fn test_error_converts_to_core_parse_error() {
        let mut data = QuadFixture::plain().build();
        data[0] = b'X';
        let err: meshport_core::Error = parse(&data).unwrap_err().into();
        assert!(err.is_parse_error());
    }
}

mod file_tests {
    use super::*;

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.glb");
        std::fs::write(&path, QuadFixture::default().build()).unwrap();

        let scene = GlbParser::new().parse_file(&path).unwrap();
        assert_eq!(scene.triangle_count(), 2);
    }

    #[test]
    fn test_parse_file_memory_mapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quad.glb");
        std::fs::write(&path, QuadFixture::default().build()).unwrap();

        let options = ParseOptions {
            memory_mapping_threshold: 0,
            ..ParseOptions::for_file(&path)
        };
        let scene = GlbParser::new().parse_file_with_options(&path, &options).unwrap();
        assert_eq!(scene.vertex_count(), 4);
    }

    #[test]
    fn test_missing_file_is_io_not_found() {
        let result = GlbParser::new().parse_file(Path::new("/definitely/not/here.glb"));
        match result {
            Err(ParseError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected I/O error, got {:?}", other.map(|s| s.name)),
        }
    }

    #[test]
    fn test_can_parse() {
        let parser = GlbParser::new();
        assert!(parser.can_parse(Path::new("ship.GLB")));
        assert!(parser.can_parse(Path::new("ship.gltf")));

        let dir = tempfile::tempdir().unwrap();
        let renamed = dir.path().join("ship.bin");
        std::fs::write(&renamed, QuadFixture::plain().build()).unwrap();
        assert!(parser.can_parse(&renamed));

        let other = dir.path().join("notes.txt");
        std::fs::write(&other, b"hello").unwrap();
        assert!(!parser.can_parse(&other));
    }

    #[test]
    fn test_parser_magic_bytes() {
        let parser = GlbParser::new();
        assert_eq!(parser.magic_bytes(), Some(&b"glTF"[..]));
        assert_eq!(parser.supported_versions(), &[2]);
    }
}

// Property-based tests using proptest
#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_strip_triangle_count(strip in prop::collection::vec(0u32..1000, 3..64)) {
            let tris = strip_to_triangles(&strip);
            prop_assert_eq!(tris.len(), (strip.len() - 2) * 3);
            prop_assert!(tris.iter().all(|i| strip.contains(i)));
        }

        #[test]
        fn test_fan_keeps_hub(fan in prop::collection::vec(0u32..1000, 3..64)) {
            let tris = fan_to_triangles(&fan);
            prop_assert_eq!(tris.len(), (fan.len() - 2) * 3);
            for tri in tris.chunks_exact(3) {
                prop_assert_eq!(tri[0], fan[0]);
            }
        }

        #[test]
        fn test_garbage_never_panics(data in prop::collection::vec(any::<u8>(), 0..256)) {
            let _ = parse(&data);
        }
    }
}

// Integration-style tests (need the real asset)
#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    #[ignore = "requires the shuttle asset in Sources/MusicalWallpaper/Resources"]
    fn test_parse_real_asset() {
        let config = meshport_core::ConvertConfig::default();
        let scene = GlbParser::new().parse_file(&config.input).unwrap();
        assert!(scene.triangle_count() > 0);
    }
}
