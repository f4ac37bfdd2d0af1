//! meshport export pipeline
//!
//! Turns an imported [`meshport_core::Scene`] into a USDZ archive:
//! - USD stage text with meshes, normals and `UsdPreviewSurface` materials
//! - PNG/JPEG texture normalisation
//! - Stored, 64-byte aligned ZIP packaging
//!
//! [`Session`] drives a whole conversion (reset, import, export).

pub mod session;
pub mod textures;
pub mod usd;
pub mod usdz;

pub use session::{ExportReport, Session};
pub use textures::{ImageFormat, TextureConverter, TextureError};
pub use usd::{PackageFile, UsdExportError, UsdExportOptions, UsdExporter, UsdPackage};
pub use usdz::{write_atomic, UsdzPackager, USDZ_ALIGNMENT};
