//! USDZ packaging
//!
//! A USDZ file is a ZIP archive with two extra constraints: entries are
//! stored uncompressed, and each entry's data starts on a 64-byte boundary
//! so readers can map layers and images in place. The first entry is the
//! root layer.

use crate::usd::{UsdPackage, UsdResult};
use std::fs::{self, File};
use std::io::{self, Cursor, Write};
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, DateTime};

/// Required data alignment for USDZ entries
pub const USDZ_ALIGNMENT: u16 = 64;

/// Writes [`UsdPackage`]s as USDZ archives
#[derive(Debug, Default)]
pub struct UsdzPackager;

impl UsdzPackager {
    pub fn new() -> Self {
        Self
    }

    /// Pack the root layer and its files into an in-memory archive
    ///
    /// Timestamps are pinned to the ZIP epoch, so equal packages produce
    /// byte-identical archives.
    pub fn package(&self, package: &UsdPackage) -> UsdResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let file_options: FileOptions<'_, ()> = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .last_modified_time(DateTime::default())
            .with_alignment(USDZ_ALIGNMENT);

        zip.start_file(package.root_layer.as_str(), file_options.clone())?;
        zip.write_all(package.stage.as_bytes())?;

        for file in &package.files {
            zip.start_file(file.path.as_str(), file_options.clone())?;
            zip.write_all(&file.data)?;
        }

        let archive = zip.finish()?.into_inner();

        tracing::debug!(
            entries = package.files.len() + 1,
            bytes = archive.len(),
            "Packaged USDZ archive"
        );

        Ok(archive)
    }
}

/// Write `data` to `path` without ever leaving a partial file behind
///
/// The bytes go to a hidden sibling first and are renamed into place once
/// synced. Missing parent directories are created.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("output path has no file name: {}", path.display()),
        )
    })?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    let result = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(data)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }

    result
}
