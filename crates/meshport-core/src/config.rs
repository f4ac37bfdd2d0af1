//! Conversion configuration
//!
//! There is no configuration file: the defaults name the one asset this
//! tool exists to convert, and the CLI may override individual fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Directory holding both the source asset and the converted archive
pub const RESOURCE_DIR: &str = "Sources/MusicalWallpaper/Resources";

/// Source asset file name
pub const DEFAULT_INPUT_NAME: &str = "Meshy_AI_shuttle_0227101350_texture.glb";

/// Converted archive file name
pub const DEFAULT_OUTPUT_NAME: &str = "Meshy_AI_shuttle_0227101350_texture.usdz";

/// Settings for a single GLB -> USDZ conversion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// GLB (or glTF) file to import
    pub input: PathBuf,
    /// USDZ archive to write
    pub output: PathBuf,
    /// Write per-vertex normals
    pub export_normals: bool,
    /// Write UsdPreviewSurface materials and package their textures
    pub export_materials: bool,
    /// Write the first UV set as `primvars:st`
    pub export_uvs: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            input: Path::new(RESOURCE_DIR).join(DEFAULT_INPUT_NAME),
            output: Path::new(RESOURCE_DIR).join(DEFAULT_OUTPUT_NAME),
            export_normals: true,
            export_materials: true,
            export_uvs: true,
        }
    }
}

impl ConvertConfig {
    /// Config with explicit paths and default export flags
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    /// Reject configurations that could never produce a valid archive
    pub fn validate(&self) -> Result<()> {
        if self.input == self.output {
            return Err(Error::invalid_config(format!(
                "input and output are the same file: {}",
                self.input.display()
            )));
        }

        let is_usdz = self
            .output
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("usdz"))
            .unwrap_or(false);
        if !is_usdz {
            return Err(Error::invalid_config(format!(
                "output must have a .usdz extension: {}",
                self.output.display()
            )));
        }

        Ok(())
    }
}
