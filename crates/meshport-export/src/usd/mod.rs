//! USD stage export
//!
//! Serialises a [`meshport_core::Scene`] as a text (`.usda`) root layer with
//! `UsdPreviewSurface` materials, and collects the texture files it references.

mod exporter;
mod material;
pub mod naming;
pub mod writer;

pub use exporter::UsdExporter;
pub(crate) use exporter::root_layer_name;

use crate::textures::TextureError;

/// USD export options
#[derive(Debug, Clone)]
pub struct UsdExportOptions {
    /// Write `normals` on every mesh (computed when the source has none)
    pub export_normals: bool,
    /// Write materials and bind them to meshes
    pub export_materials: bool,
    /// Write `primvars:st` texture coordinates
    pub export_uvs: bool,
    /// Stage up axis token
    pub up_axis: String,
    pub meters_per_unit: f32,
}

impl Default for UsdExportOptions {
    fn default() -> Self {
        Self {
            export_normals: true,
            export_materials: true,
            export_uvs: true,
            up_axis: "Y".to_string(),
            meters_per_unit: 1.0,
        }
    }
}

impl From<&meshport_core::ConvertConfig> for UsdExportOptions {
    fn from(config: &meshport_core::ConvertConfig) -> Self {
        Self {
            export_normals: config.export_normals,
            export_materials: config.export_materials,
            export_uvs: config.export_uvs,
            ..Self::default()
        }
    }
}

/// USD export errors
#[derive(Debug, thiserror::Error)]
pub enum UsdExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),

    #[error("Invalid mesh data: {0}")]
    InvalidMeshData(String),
}

pub type UsdResult<T> = Result<T, UsdExportError>;

impl From<UsdExportError> for meshport_core::Error {
    fn from(err: UsdExportError) -> Self {
        match err {
            UsdExportError::Io(e) => meshport_core::Error::Io(e),
            UsdExportError::InvalidMeshData(message) => meshport_core::Error::invalid_data(message),
            other => meshport_core::Error::export_failed(other.to_string()),
        }
    }
}

/// A file stored next to the root layer
#[derive(Debug, Clone, PartialEq)]
pub struct PackageFile {
    /// Path inside the archive
    pub path: String,
    pub data: Vec<u8>,
}

/// Everything that goes into one USDZ archive
#[derive(Debug, Clone, PartialEq)]
pub struct UsdPackage {
    /// Archive path of the root layer, e.g. `shuttle.usda`
    pub root_layer: String,
    pub stage: String,
    pub files: Vec<PackageFile>,
}
