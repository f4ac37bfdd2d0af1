//! glTF material and texture conversion

use std::path::Path;

use base64::Engine;
use gltf::buffer::Data;
use gltf::image::Source;
use gltf::texture::WrappingMode;
use meshport_core::{AlphaMode, ImageMime, Material, Texture, TextureRef, WrapMode};
use tracing::debug;

use crate::traits::{ParseError, ParseResult};

pub(crate) fn convert_material(gltf_mat: &gltf::Material) -> Material {
    let name = gltf_mat
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Material_{}", gltf_mat.index().unwrap_or(0)));

    let pbr = gltf_mat.pbr_metallic_roughness();
    let strength = gltf_mat.emissive_strength().unwrap_or(1.0);
    let emissive = gltf_mat.emissive_factor().map(|c| c * strength);

    let alpha_mode = match gltf_mat.alpha_mode() {
        gltf::material::AlphaMode::Opaque => AlphaMode::Opaque,
        gltf::material::AlphaMode::Mask => AlphaMode::Mask,
        gltf::material::AlphaMode::Blend => AlphaMode::Blend,
    };

    let normal = gltf_mat.normal_texture();
    let occlusion = gltf_mat.occlusion_texture();

    Material {
        name,
        base_color_factor: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|info| info_ref(&info)),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().map(|info| info_ref(&info)),
        normal_texture: normal.as_ref().map(|t| TextureRef {
            texture: t.texture().index(),
            tex_coord: t.tex_coord(),
        }),
        normal_scale: normal.as_ref().map(|t| t.scale()).unwrap_or(1.0),
        occlusion_texture: occlusion.as_ref().map(|t| TextureRef {
            texture: t.texture().index(),
            tex_coord: t.tex_coord(),
        }),
        occlusion_strength: occlusion.as_ref().map(|t| t.strength()).unwrap_or(1.0),
        emissive_factor: emissive,
        emissive_texture: gltf_mat.emissive_texture().map(|info| info_ref(&info)),
        alpha_mode,
        alpha_cutoff: gltf_mat.alpha_cutoff().unwrap_or(0.5),
        double_sided: gltf_mat.double_sided(),
    }
}

fn info_ref(info: &gltf::texture::Info) -> TextureRef {
    TextureRef {
        texture: info.texture().index(),
        tex_coord: info.tex_coord(),
    }
}

/// Load the encoded image behind a texture, keeping the original bytes
pub(crate) fn load_texture(
    texture: &gltf::Texture,
    buffers: &[Data],
    base_dir: Option<&Path>,
) -> ParseResult<Texture> {
    let image = texture.source();

    let (data, declared) = match image.source() {
        Source::View { view, mime_type } => {
            let buffer = buffers.get(view.buffer().index()).ok_or_else(|| {
                ParseError::InvalidStructure(format!(
                    "image {} references missing buffer {}",
                    image.index(),
                    view.buffer().index()
                ))
            })?;
            let start = view.offset();
            let end = start + view.length();
            let bytes = buffer.0.get(start..end).ok_or_else(|| ParseError::CorruptedData {
                offset: start as u64,
                message: format!("image {} view runs past end of buffer", image.index()),
            })?;
            (bytes.to_vec(), Some(mime_type.to_string()))
        }
        Source::Uri { uri, mime_type } => {
            let (data, uri_mime) = read_uri(uri, base_dir)?;
            (data, mime_type.map(str::to_string).or(uri_mime))
        }
    };

    let mime = declared
        .map(|m| ImageMime::from_mime(&m))
        .or_else(|| ImageMime::sniff(&data))
        .unwrap_or_else(|| ImageMime::Other("application/octet-stream".to_string()));

    let name = texture
        .name()
        .or_else(|| image.name())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Texture_{}", texture.index()));

    let sampler = texture.sampler();

    debug!(texture = texture.index(), %name, mime = mime.as_str(), bytes = data.len(), "Loaded texture");

    Ok(Texture {
        name,
        mime,
        data,
        wrap_s: wrap_mode(sampler.wrap_s()),
        wrap_t: wrap_mode(sampler.wrap_t()),
    })
}

fn wrap_mode(mode: WrappingMode) -> WrapMode {
    match mode {
        WrappingMode::Repeat => WrapMode::Repeat,
        WrappingMode::MirroredRepeat => WrapMode::MirroredRepeat,
        WrappingMode::ClampToEdge => WrapMode::ClampToEdge,
    }
}

/// Resolve an image URI: embedded data URI or a file next to the asset
fn read_uri(uri: &str, base_dir: Option<&Path>) -> ParseResult<(Vec<u8>, Option<String>)> {
    if let Some(rest) = uri.strip_prefix("data:") {
        return decode_data_uri(rest);
    }

    let base = base_dir.ok_or_else(|| {
        ParseError::UnsupportedFeature(format!(
            "external image '{}' without a base directory",
            uri
        ))
    })?;
    let data = std::fs::read(base.join(uri))
        .map_err(|e| ParseError::Io(e).with_context(format!("reading image '{}'", uri)))?;
    Ok((data, None))
}

/// Decode the part of a data URI after `data:`
pub fn decode_data_uri(rest: &str) -> ParseResult<(Vec<u8>, Option<String>)> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ParseError::InvalidStructure("data URI without payload".to_string()))?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let mime = (!mime.is_empty()).then(|| mime.to_string());

    let data = if is_base64 {
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ParseError::InvalidStructure(format!("invalid base64 data URI: {}", e)))?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok((data, mime))
}
