//! GLB container header

use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::traits::{ParseError, ParseResult};

/// "glTF"
pub const GLB_MAGIC: &[u8; 4] = b"glTF";
/// Only binary container version 2 exists for glTF 2.0
pub const GLB_VERSION: u32 = 2;
/// "JSON"
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// "BIN\0"
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Parsed 12-byte header plus the chunk layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    pub version: u32,
    /// Total length declared by the header
    pub length: u32,
    pub json_length: u32,
    /// Length of the binary chunk, if present
    pub bin_length: Option<u32>,
}

impl GlbHeader {
    /// Validate the container framing of a GLB file
    pub fn read(data: &[u8]) -> ParseResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(ParseError::CorruptedData {
                offset: 0,
                message: format!("file is {} bytes, shorter than the GLB header", data.len()),
            });
        }

        let magic = &data[0..4];
        if magic != GLB_MAGIC {
            return Err(ParseError::InvalidMagic {
                expected: GLB_MAGIC.to_vec(),
                found: magic.to_vec(),
            });
        }

        let mut cursor = Cursor::new(&data[4..]);
        let version = cursor.read_u32::<LittleEndian>()?;
        if version != GLB_VERSION {
            return Err(ParseError::UnsupportedVersion {
                version,
                supported: GLB_VERSION,
            });
        }

        let length = cursor.read_u32::<LittleEndian>()?;
        if length as usize > data.len() {
            return Err(ParseError::CorruptedData {
                offset: 8,
                message: format!(
                    "header declares {} bytes but file has {}",
                    length,
                    data.len()
                ),
            });
        }

        let (json_type, json_length) = read_chunk_header(data, HEADER_LEN)?;
        if json_type != CHUNK_JSON {
            return Err(ParseError::InvalidStructure(format!(
                "first chunk must be JSON, found 0x{:08X}",
                json_type
            )));
        }

        let bin_offset = HEADER_LEN + CHUNK_HEADER_LEN + json_length as usize;
        let bin_length = if bin_offset + CHUNK_HEADER_LEN <= length as usize {
            let (bin_type, bin_length) = read_chunk_header(data, bin_offset)?;
            (bin_type == CHUNK_BIN).then_some(bin_length)
        } else {
            None
        };

        Ok(Self {
            version,
            length,
            json_length,
            bin_length,
        })
    }
}

fn read_chunk_header(data: &[u8], offset: usize) -> ParseResult<(u32, u32)> {
    let bytes = data
        .get(offset..offset + CHUNK_HEADER_LEN)
        .ok_or_else(|| ParseError::CorruptedData {
            offset: offset as u64,
            message: "truncated chunk header".to_string(),
        })?;

    let mut cursor = Cursor::new(bytes);
    let chunk_length = cursor.read_u32::<LittleEndian>()?;
    let chunk_type = cursor.read_u32::<LittleEndian>()?;

    if offset + CHUNK_HEADER_LEN + chunk_length as usize > data.len() {
        return Err(ParseError::CorruptedData {
            offset: offset as u64,
            message: format!("chunk of {} bytes runs past end of file", chunk_length),
        });
    }

    Ok((chunk_type, chunk_length))
}

/// True when the data looks like a plain-text `.gltf` document
pub fn is_json(data: &[u8]) -> bool {
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|&b| b == b'{')
        .unwrap_or(false)
}
