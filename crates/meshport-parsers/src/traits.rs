// meshport-parsers/src/traits.rs
//! Core traits defining the parser interface for asset formats.
//!
//! This module establishes a unified parsing interface that enables:
//! - Consistent error handling across formats
//! - Memory-mapped reading of large files
//! - Format detection by extension or magic bytes

use std::io::Read;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during parsing operations
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid magic bytes: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: Vec<u8>, found: Vec<u8> },

    #[error("Unsupported version: {version} (supported: {supported})")]
    UnsupportedVersion { version: u32, supported: u32 },

    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData { offset: u64, message: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),

    #[error("Nested error in {context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Wrap this error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ParseError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<ParseError> for meshport_core::Error {
    fn from(err: ParseError) -> Self {
        use meshport_core::Error;

        match err {
            ParseError::Io(e) => Error::Io(e),
            ParseError::Gltf(gltf::Error::Io(e)) => Error::Io(e),
            ParseError::InvalidMagic { expected, found } => Error::InvalidMagic { expected, found },
            ParseError::UnsupportedVersion { version, supported } => Error::UnsupportedVersion {
                version: version.to_string(),
                supported: supported.to_string(),
            },
            ParseError::CorruptedData { offset, message } => {
                Error::invalid_data(format!("{} (offset {})", message, offset))
            }
            ParseError::InvalidStructure(message) => Error::invalid_data(message),
            ParseError::MissingField(field) => Error::missing_field(field),
            ParseError::UnsupportedFeature(format) => Error::UnsupportedFormat { format },
            ParseError::Gltf(e) => Error::invalid_data(e.to_string()),
            ParseError::Nested { context, source } => Error::from(*source).with_context(context),
        }
    }
}

/// Result type alias for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Configuration options for parsing
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Fail on content that would otherwise be skipped with a warning
    pub strict_validation: bool,
    /// Whether large files go through `Parser::parse_memory_mapped`
    pub use_memory_mapping: bool,
    /// Minimum file size for `Parser::parse_memory_mapped`
    pub memory_mapping_threshold: u64,
    /// Directory external buffer and image URIs are resolved against
    pub base_dir: Option<PathBuf>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_validation: false,
            use_memory_mapping: true,
            memory_mapping_threshold: 10 * 1024 * 1024, // 10 MB
            base_dir: None,
        }
    }
}

impl ParseOptions {
    /// Default options with external references resolved next to `path`
    pub fn for_file(path: &Path) -> Self {
        Self {
            base_dir: path.parent().map(Path::to_path_buf),
            ..Default::default()
        }
    }
}

/// Core trait for all file format parsers
///
/// Implementors parse one asset format into their `Output` type.
pub trait Parser: Send + Sync {
    /// The parsed output type
    type Output: Send + Sync;

    /// Returns the file extensions this parser handles (e.g., ["glb"])
    fn extensions(&self) -> &[&str];

    /// Returns the magic bytes that identify this file type (if applicable)
    fn magic_bytes(&self) -> Option<&[u8]> {
        None
    }

    /// Returns a human-readable name for this parser
    fn name(&self) -> &str;

    /// Returns the format version(s) supported by this parser
    fn supported_versions(&self) -> &[u32] {
        &[]
    }

    /// Parse an in-memory file
    fn parse_bytes(&self, data: &[u8], options: &ParseOptions) -> ParseResult<Self::Output>;

    /// Parse from a reader with default options
    fn parse<R: Read>(&self, mut reader: R) -> ParseResult<Self::Output>
    where
        Self: Sized,
    {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.parse_bytes(&data, &ParseOptions::default())
    }

    /// Parse from a file path
    fn parse_file(&self, path: &Path) -> ParseResult<Self::Output> {
        self.parse_file_with_options(path, &ParseOptions::for_file(path))
    }

    /// Parse from a file path with options
    fn parse_file_with_options(
        &self,
        path: &Path,
        options: &ParseOptions,
    ) -> ParseResult<Self::Output> {
        let file = std::fs::File::open(path)?;

        // Large files take the mapped path when enabled
        if options.use_memory_mapping {
            let metadata = file.metadata()?;
            if metadata.len() >= options.memory_mapping_threshold {
                return self.parse_memory_mapped(path, options);
            }
        }

        let mut reader = std::io::BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.parse_bytes(&data, options)
    }

    /// Parse a file above the mapping threshold
    ///
    /// Implementors may override this with memory-mapped I/O.
    fn parse_memory_mapped(
        &self,
        path: &Path,
        options: &ParseOptions,
    ) -> ParseResult<Self::Output> {
        let data = std::fs::read(path)?;
        self.parse_bytes(&data, options)
    }

    /// Check if this parser can handle the given file
    fn can_parse(&self, path: &Path) -> bool {
        // Check extension
        if let Some(ext) = path.extension() {
            let ext_str = ext.to_string_lossy().to_lowercase();
            if self.extensions().iter().any(|e| e.to_lowercase() == ext_str) {
                return true;
            }
        }

        // Try to check magic bytes if available
        if let Some(magic) = self.magic_bytes() {
            if let Ok(file) = std::fs::File::open(path) {
                let mut reader = std::io::BufReader::new(file);
                let mut buffer = vec![0u8; magic.len()];
                if reader.read_exact(&mut buffer).is_ok() {
                    return buffer == magic;
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_context() {
        let error = ParseError::InvalidMagic {
            expected: b"glTF".to_vec(),
            found: vec![0x00, 0x00, 0x00, 0x00],
        };

        let contextualized = error.with_context("reading header");

        match contextualized {
            ParseError::Nested { context, .. } => {
                assert_eq!(context, "reading header");
            }
            _ => panic!("Expected Nested error"),
        }
    }

    #[test]
    fn test_into_core_error() {
        let err: meshport_core::Error = ParseError::MissingField("POSITION".into())
            .with_context("mesh 0")
            .into();

        assert!(err.is_parse_error());
        assert!(err.to_string().contains("mesh 0"));
        assert!(err.to_string().contains("POSITION"));
    }

    #[test]
    fn test_io_not_found_stays_not_found() {
        let io = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err: meshport_core::Error = ParseError::Io(io).into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_options_for_file() {
        let options = ParseOptions::for_file(Path::new("assets/ship.glb"));
        assert_eq!(options.base_dir, Some(PathBuf::from("assets")));
        assert!(!options.strict_validation);
    }
}
