//! meshport CLI
//!
//! Converts one glTF/GLB asset into a USDZ archive. With no arguments it
//! converts the bundled shuttle asset in the app's resource directory.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use meshport_core::ConvertConfig;
use meshport_export::{ExportReport, Session};
use meshport_parsers::logging::{init_with_config, TracingConfig};

/// Convert a glTF/GLB asset to USDZ with normals and materials
#[derive(Parser)]
#[command(name = "meshport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input .glb or .gltf file [default: bundled shuttle asset]
    input: Option<PathBuf>,

    /// Output .usdz file [default: next to the bundled asset]
    output: Option<PathBuf>,

    /// Do not write vertex normals
    #[arg(long)]
    no_normals: bool,

    /// Do not write materials or textures
    #[arg(long)]
    no_materials: bool,

    /// Do not write texture coordinates
    #[arg(long)]
    no_uvs: bool,

    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for the summary
    #[arg(long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl Cli {
    fn config(&self) -> ConvertConfig {
        let defaults = ConvertConfig::default();
        ConvertConfig {
            input: self.input.clone().unwrap_or(defaults.input),
            output: self.output.clone().unwrap_or(defaults.output),
            export_normals: !self.no_normals,
            export_materials: !self.no_materials,
            export_uvs: !self.no_uvs,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_config(TracingConfig::from_verbosity(cli.verbose));

    let config = cli.config();
    let report = Session::new()
        .convert(&config)
        .map_err(|e| {
            error!(error = %e, "Conversion failed");
            e
        })
        .with_context(|| {
            format!(
                "Failed to convert {} to {}",
                config.input.display(),
                config.output.display()
            )
        })?;

    print_report(&report, cli.format)
}

fn print_report(report: &ExportReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputFormat::Text => {
            let stats = &report.stats;
            println!("Wrote {}", report.output.display());
            println!("  Root layer:   {}", report.root_layer);
            println!("  Archive size: {}", format_size(report.archive_bytes));
            println!("  Stage size:   {}", format_size(report.stage_bytes as u64));
            println!("  Nodes:        {}", stats.node_count);
            println!("  Meshes:       {} ({} primitives)", stats.mesh_count, stats.primitive_count);
            println!("  Vertices:     {}", stats.vertex_count);
            println!("  Triangles:    {}", stats.triangle_count);
            println!("  Materials:    {}", stats.material_count);
            println!("  Textures:     {}", report.texture_count);
        }
    }
    Ok(())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
