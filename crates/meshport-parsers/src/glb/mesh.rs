//! glTF primitive -> triangle list conversion

use gltf::buffer::Data;
use gltf::mesh::Mode;
use meshport_core::Primitive;
use tracing::{debug, warn};

use crate::traits::{ParseError, ParseOptions, ParseResult};

/// Convert one glTF primitive, `None` when it has no triangles to offer
pub(crate) fn convert_primitive(
    primitive: &gltf::Primitive,
    buffers: &[Data],
    options: &ParseOptions,
) -> ParseResult<Option<Primitive>> {
    let mode = primitive.mode();
    if matches!(mode, Mode::Points | Mode::Lines | Mode::LineLoop | Mode::LineStrip) {
        if options.strict_validation {
            return Err(ParseError::UnsupportedFeature(format!(
                "primitive mode {:?}",
                mode
            )));
        }
        warn!(primitive = primitive.index(), ?mode, "Skipping non-triangle primitive");
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let points: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| ParseError::MissingField("POSITION".to_string()))?
        .collect();

    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(|it| it.collect());
    if let Some(normals) = &normals {
        check_attribute_len("NORMAL", normals.len(), points.len())?;
    }

    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|it| it.into_f32().collect());
    if let Some(uvs) = &uvs {
        check_attribute_len("TEXCOORD_0", uvs.len(), points.len())?;
    }

    let raw_indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..points.len() as u32).collect(),
    };

    if let Some(pos) = raw_indices.iter().position(|&i| i as usize >= points.len()) {
        return Err(ParseError::CorruptedData {
            offset: pos as u64,
            message: format!(
                "index {} out of range for {} vertices",
                raw_indices[pos],
                points.len()
            ),
        });
    }

    let indices = match mode {
        Mode::TriangleStrip => strip_to_triangles(&raw_indices),
        Mode::TriangleFan => fan_to_triangles(&raw_indices),
        _ => {
            let mut indices = raw_indices;
            let extra = indices.len() % 3;
            if extra != 0 {
                warn!(primitive = primitive.index(), extra, "Dropping trailing indices");
                indices.truncate(indices.len() - extra);
            }
            indices
        }
    };

    debug!(
        primitive = primitive.index(),
        vertices = points.len(),
        triangles = indices.len() / 3,
        normals = normals.is_some(),
        uvs = uvs.is_some(),
        "Converted primitive"
    );

    Ok(Some(Primitive {
        points,
        normals,
        uvs,
        indices,
        material: primitive.material().index(),
    }))
}

fn check_attribute_len(name: &str, len: usize, expected: usize) -> ParseResult<()> {
    if len != expected {
        return Err(ParseError::InvalidStructure(format!(
            "{} has {} elements, POSITION has {}",
            name, len, expected
        )));
    }
    Ok(())
}

/// Triangle strip to triangle list, keeping a consistent winding
pub fn strip_to_triangles(strip: &[u32]) -> Vec<u32> {
    if strip.len() < 3 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity((strip.len() - 2) * 3);
    for i in 0..strip.len() - 2 {
        if i % 2 == 0 {
            out.extend_from_slice(&[strip[i], strip[i + 1], strip[i + 2]]);
        } else {
            out.extend_from_slice(&[strip[i], strip[i + 2], strip[i + 1]]);
        }
    }
    out
}

/// Triangle fan to triangle list
pub fn fan_to_triangles(fan: &[u32]) -> Vec<u32> {
    if fan.len() < 3 {
        return Vec::new();
    }

    let mut out = Vec::with_capacity((fan.len() - 2) * 3);
    for i in 1..fan.len() - 1 {
        out.extend_from_slice(&[fan[0], fan[i], fan[i + 1]]);
    }
    out
}
