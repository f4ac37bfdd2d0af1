//! meshport-parsers
//!
//! Importers that read asset files into a [`meshport_core::Scene`].
//!
//! # Supported Formats
//!
//! | Format | Extension | Description |
//! |--------|-----------|-------------|
//! | GLB    | `.glb`    | Binary glTF 2.0 container |
//! | glTF   | `.gltf`   | Text glTF 2.0 with embedded or external buffers |
//!
//! # Example
//!
//! ```rust,ignore
//! use meshport_parsers::{GlbParser, Parser};
//!
//! let parser = GlbParser::new();
//! let scene = parser.parse_file("shuttle.glb".as_ref())?;
//!
//! println!("Imported {} triangles", scene.triangle_count());
//! ```

pub mod glb;
pub mod logging;
pub mod traits;

// Used by the logging macros
#[doc(hidden)]
pub use tracing;

// Re-export main types
pub use traits::{ParseError, ParseOptions, ParseResult, Parser};

pub use glb::{GlbHeader, GlbParser};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
