//! `UsdPreviewSurface` material networks
//!
//! glTF metallic-roughness maps onto the preview surface almost one to one.
//! Factors become `inputs:scale` on a texture reader, or constant inputs when
//! the slot has no texture.

use super::writer::{float, quoted, tuple, UsdaWriter};
use meshport_core::{AlphaMode, Material, TextureRef, WrapMode};

const PREVIEW_SURFACE: &str = "PreviewSurface";
const ST_READER: &str = "PrimvarReader_st";

/// One `UsdUVTexture` reader
struct TextureSlot<'a> {
    shader: &'static str,
    file: &'a str,
    texture: TextureRef,
    srgb: bool,
    scale: [f32; 4],
    bias: Option<[f32; 4]>,
    outputs: &'static [(&'static str, &'static str)],
}

/// Resolves texture references to archive paths
pub(crate) struct MaterialContext<'a> {
    /// Archive path per scene texture, `None` when not packaged
    pub texture_paths: &'a [Option<String>],
    pub wrap_modes: &'a [(WrapMode, WrapMode)],
}

impl MaterialContext<'_> {
    fn file(&self, texture: Option<TextureRef>) -> Option<(TextureRef, &str)> {
        let texture = texture?;
        let path = self.texture_paths.get(texture.texture)?.as_deref()?;
        if texture.tex_coord != 0 {
            tracing::warn!(
                texture = texture.texture,
                tex_coord = texture.tex_coord,
                "Only UV set 0 is exported, texture will use it instead"
            );
        }
        Some((texture, path))
    }

    fn wrap(&self, texture: usize) -> (WrapMode, WrapMode) {
        self.wrap_modes.get(texture).copied().unwrap_or_default()
    }
}

fn wrap_token(mode: WrapMode) -> &'static str {
    match mode {
        WrapMode::Repeat => "repeat",
        WrapMode::MirroredRepeat => "mirror",
        WrapMode::ClampToEdge => "clamp",
    }
}

/// Write `def Material "<name>"` under `scope_path`
pub(crate) fn write_material(
    w: &mut UsdaWriter,
    scope_path: &str,
    name: &str,
    material: &Material,
    ctx: &MaterialContext<'_>,
) {
    let path = format!("{}/{}", scope_path, name);
    let connect = |shader: &str, output: &str| format!("<{}/{}.outputs:{}>", path, shader, output);

    let mut slots = Vec::new();
    let mut inputs = Vec::new();

    let [r, g, b, a] = material.base_color_factor;
    match ctx.file(material.base_color_texture) {
        Some((texture, file)) => {
            inputs.push(format!("color3f inputs:diffuseColor.connect = {}", connect("BaseColorTexture", "rgb")));
            let mut outputs: &'static [(&str, &str)] = &[("float3", "rgb")];
            if material.alpha_mode != AlphaMode::Opaque {
                inputs.push(format!("float inputs:opacity.connect = {}", connect("BaseColorTexture", "a")));
                outputs = &[("float3", "rgb"), ("float", "a")];
            }
            slots.push(TextureSlot {
                shader: "BaseColorTexture",
                file,
                texture,
                srgb: true,
                scale: [r, g, b, a],
                bias: None,
                outputs,
            });
        }
        None => {
            inputs.push(format!("color3f inputs:diffuseColor = {}", tuple(&[r, g, b])));
            if material.alpha_mode != AlphaMode::Opaque {
                inputs.push(format!("float inputs:opacity = {}", float(a)));
            }
        }
    }

    if material.alpha_mode == AlphaMode::Mask {
        inputs.push(format!("float inputs:opacityThreshold = {}", float(material.alpha_cutoff)));
    }

    match ctx.file(material.metallic_roughness_texture) {
        Some((texture, file)) => {
            inputs.push(format!("float inputs:metallic.connect = {}", connect("MetallicRoughnessTexture", "b")));
            inputs.push(format!("float inputs:roughness.connect = {}", connect("MetallicRoughnessTexture", "g")));
            slots.push(TextureSlot {
                shader: "MetallicRoughnessTexture",
                file,
                texture,
                srgb: false,
                scale: [1.0, material.roughness_factor, material.metallic_factor, 1.0],
                bias: None,
                outputs: &[("float", "g"), ("float", "b")],
            });
        }
        None => {
            inputs.push(format!("float inputs:metallic = {}", float(material.metallic_factor)));
            inputs.push(format!("float inputs:roughness = {}", float(material.roughness_factor)));
        }
    }

    if let Some((texture, file)) = ctx.file(material.normal_texture) {
        let s = material.normal_scale;
        inputs.push(format!("normal3f inputs:normal.connect = {}", connect("NormalTexture", "rgb")));
        slots.push(TextureSlot {
            shader: "NormalTexture",
            file,
            texture,
            srgb: false,
            scale: [2.0 * s, 2.0 * s, 2.0, 1.0],
            bias: Some([-s, -s, -1.0, 0.0]),
            outputs: &[("float3", "rgb")],
        });
    }

    if let Some((texture, file)) = ctx.file(material.occlusion_texture) {
        let s = material.occlusion_strength;
        inputs.push(format!("float inputs:occlusion.connect = {}", connect("OcclusionTexture", "r")));
        slots.push(TextureSlot {
            shader: "OcclusionTexture",
            file,
            texture,
            srgb: false,
            scale: [s, s, s, 1.0],
            bias: Some([1.0 - s, 1.0 - s, 1.0 - s, 0.0]),
            outputs: &[("float", "r")],
        });
    }

    let [er, eg, eb] = material.emissive_factor;
    match ctx.file(material.emissive_texture) {
        Some((texture, file)) => {
            inputs.push(format!("color3f inputs:emissiveColor.connect = {}", connect("EmissiveTexture", "rgb")));
            slots.push(TextureSlot {
                shader: "EmissiveTexture",
                file,
                texture,
                srgb: true,
                scale: [er, eg, eb, 1.0],
                bias: None,
                outputs: &[("float3", "rgb")],
            });
        }
        None if material.emissive_factor != [0.0; 3] => {
            inputs.push(format!("color3f inputs:emissiveColor = {}", tuple(&[er, eg, eb])));
        }
        None => {}
    }

    inputs.push("int inputs:useSpecularWorkflow = 0".to_string());

    w.open_prim("Material", name, &[]);
    w.line(format!("token outputs:surface.connect = {}", connect(PREVIEW_SURFACE, "surface")));

    w.blank();
    w.open_prim("Shader", PREVIEW_SURFACE, &[]);
    w.line("uniform token info:id = \"UsdPreviewSurface\"");
    for input in &inputs {
        w.line(input);
    }
    w.line("token outputs:surface");
    w.close_prim();

    if !slots.is_empty() {
        w.blank();
        w.open_prim("Shader", ST_READER, &[]);
        w.line("uniform token info:id = \"UsdPrimvarReader_float2\"");
        w.line("string inputs:varname = \"st\"");
        w.line("float2 outputs:result");
        w.close_prim();
    }

    for slot in &slots {
        let (wrap_s, wrap_t) = ctx.wrap(slot.texture.texture);
        w.blank();
        w.open_prim("Shader", slot.shader, &[]);
        w.line("uniform token info:id = \"UsdUVTexture\"");
        if let Some(bias) = slot.bias {
            w.line(format!("float4 inputs:bias = {}", tuple(&bias)));
        }
        w.line(format!("asset inputs:file = @{}@", slot.file));
        w.line(format!("float4 inputs:scale = {}", tuple(&slot.scale)));
        w.line(format!(
            "token inputs:sourceColorSpace = {}",
            quoted(if slot.srgb { "sRGB" } else { "raw" })
        ));
        w.line(format!("float2 inputs:st.connect = {}", connect(ST_READER, "result")));
        w.line(format!("token inputs:wrapS = {}", quoted(wrap_token(wrap_s))));
        w.line(format!("token inputs:wrapT = {}", quoted(wrap_token(wrap_t))));
        for (ty, output) in slot.outputs {
            w.line(format!("{} outputs:{}", ty, output));
        }
        w.close_prim();
    }

    w.close_prim();
}
