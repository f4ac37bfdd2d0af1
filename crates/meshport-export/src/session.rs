//! The conversion driver
//!
//! A [`Session`] owns one scene for its whole lifetime and exposes the three
//! steps of a conversion: reset, import and export.

use crate::usd::{root_layer_name, UsdExportOptions, UsdExporter};
use crate::usdz::{write_atomic, UsdzPackager};
use meshport_core::{ConvertConfig, Error, Result, ResultExt, Scene, SceneStats};
use meshport_parsers::logging::instrument_parse;
use meshport_parsers::{log_parse_complete, log_parse_error, log_parse_start};
use meshport_parsers::{GlbParser, Parser};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What an export wrote
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output: PathBuf,
    /// Archive path of the root layer
    pub root_layer: String,
    pub stage_bytes: usize,
    pub texture_count: usize,
    pub archive_bytes: u64,
    pub stats: SceneStats,
}

/// Owns the scene that import fills and export reads
#[derive(Default)]
pub struct Session {
    scene: Scene,
    parser: GlbParser,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Clear the scene
    pub fn reset(&mut self) {
        self.scene.reset();
        tracing::debug!("Scene reset");
    }

    /// Load a GLB/glTF file, replacing the scene's contents
    ///
    /// A missing file fails before the scene is touched.
    pub fn import(&mut self, path: &Path) -> Result<SceneStats> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        if !self.scene.is_empty() {
            tracing::warn!(
                path = %path.display(),
                "Importing into a scene that was not reset, previous contents are replaced"
            );
        }

        let start = Instant::now();
        log_parse_start!(self.parser.name(), path);

        let mut scene = self
            .parser
            .parse_file(path)
            .map_err(|e| {
                log_parse_error!(self.parser.name(), e);
                Error::from(e)
            })
            .with_context(|| format!("Failed to import {}", path.display()))?;

        if scene.name.is_empty() {
            scene.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }

        self.scene = scene;
        let stats = self.scene.stats();
        log_parse_complete!(self.parser.name(), start.elapsed(), stats.mesh_count);

        tracing::info!(
            scene = %self.scene.name,
            nodes = stats.node_count,
            vertices = stats.vertex_count,
            triangles = stats.triangle_count,
            materials = stats.material_count,
            textures = stats.texture_count,
            "Imported scene"
        );

        Ok(stats)
    }

    /// Write the scene to a USDZ archive at `path`
    ///
    /// An empty scene is allowed and yields a stage holding only the root prim.
    pub fn export(&self, path: &Path, options: &UsdExportOptions) -> Result<ExportReport> {
        if self.scene.is_empty() {
            tracing::warn!(path = %path.display(), "Exporting an empty scene");
        }

        let exporter = UsdExporter::new(options.clone());
        let root_layer = root_layer_name(path);

        let package = exporter
            .build(&self.scene, &root_layer)
            .map_err(Error::from)
            .with_context(|| format!("Failed to build USD stage for {}", path.display()))?;

        let archive = UsdzPackager::new()
            .package(&package)
            .map_err(Error::from)
            .with_context(|| format!("Failed to package {}", path.display()))?;

        write_atomic(path, &archive)
            .map_err(Error::from)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let report = ExportReport {
            output: path.to_path_buf(),
            root_layer,
            stage_bytes: package.stage.len(),
            texture_count: package.files.len(),
            archive_bytes: archive.len() as u64,
            stats: self.scene.stats(),
        };

        tracing::info!(
            output = %path.display(),
            archive_bytes = report.archive_bytes,
            textures = report.texture_count,
            normals = options.export_normals,
            materials = options.export_materials,
            "Exported USDZ"
        );

        Ok(report)
    }

    /// Reset, import `config.input`, export to `config.output`
    ///
    /// No retries. The first failing step ends the conversion.
    pub fn convert(&mut self, config: &ConvertConfig) -> Result<ExportReport> {
        config.validate()?;

        self.reset();

        instrument_parse("import", || self.import(&config.input))
            .context("Import step failed")?;

        let options = UsdExportOptions::from(config);
        instrument_parse("export", || self.export(&config.output, &options))
            .context("Export step failed")
    }
}
