//! Texture format converter
//!
//! Passes PNG/JPEG payloads through and re-encodes everything else as PNG.

use crate::textures::{TextureError, TextureResult};
use crate::usd::naming::sanitize_identifier;
use image::ImageFormat as ImgFormat;
use meshport_core::{ImageMime, Texture};
use std::io::Cursor;

/// Image format stored in the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format (lossless)
    Png,
    /// JPEG format, kept as-is from the source
    Jpeg,
}

impl ImageFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Texture converter
#[derive(Debug, Default)]
pub struct TextureConverter;

impl TextureConverter {
    pub fn new() -> Self {
        Self
    }

    /// Bring a scene texture into a format USDZ accepts
    ///
    /// Returns the stored format and the encoded bytes.
    pub fn normalize(&self, texture: &Texture) -> TextureResult<(ImageFormat, Vec<u8>)> {
        if texture.data.is_empty() {
            return Err(TextureError::Empty(texture.name.clone()));
        }

        // Trust the bytes over the declared type
        let mime = ImageMime::sniff(&texture.data).unwrap_or_else(|| texture.mime.clone());

        match mime {
            ImageMime::Png => Ok((ImageFormat::Png, texture.data.clone())),
            ImageMime::Jpeg => Ok((ImageFormat::Jpeg, texture.data.clone())),
            ImageMime::Other(declared) => {
                let format = image::guess_format(&texture.data)
                    .map_err(|_| TextureError::UnsupportedFormat(declared))?;
                self.reencode(texture, format)
            }
        }
    }

    fn reencode(&self, texture: &Texture, format: ImgFormat) -> TextureResult<(ImageFormat, Vec<u8>)> {
        let img = image::load_from_memory_with_format(&texture.data, format)?;

        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImgFormat::Png)?;

        tracing::debug!(
            texture = %texture.name,
            from = ?format,
            width = img.width(),
            height = img.height(),
            "Re-encoded texture as PNG"
        );

        Ok((ImageFormat::Png, out.into_inner()))
    }

    /// Archive path for the texture at `index`
    pub fn archive_path(name: &str, index: usize, format: ImageFormat) -> String {
        format!(
            "textures/{}_{}.{}",
            sanitize_identifier(name),
            index,
            format.extension()
        )
    }
}
