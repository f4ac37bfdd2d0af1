//! Texture normalisation for USDZ packaging
//!
//! USDZ readers only accept PNG and JPEG payloads, so anything else found in
//! the source asset is decoded and re-encoded as PNG before packaging.

mod converter;

pub use converter::{ImageFormat, TextureConverter};

use thiserror::Error;

/// Texture conversion errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Empty image data for texture '{0}'")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;
