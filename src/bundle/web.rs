//! `UnityWebData1.0` archives produced for WebGL builds.

use std::io::Cursor;
use std::sync::Arc;

use crate::bundle::StreamFile;
use crate::endian::{Endian, EndianReader};
use crate::error::{Error, Result};

pub const WEB_SIGNATURES: &[&str] = &["UnityWebData1.0", "TuanjieWebData1.0"];

#[derive(Debug, Clone)]
pub struct WebFile {
    pub signature: String,
    pub files:     Vec<StreamFile>,
}

impl WebFile {
    /// Parse an uncompressed web archive.  The directory is little-endian:
    /// after the signature comes the directory length, then
    /// `(offset, length, name_length, name)` entries up to that length.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = EndianReader::new(Cursor::new(data), Endian::Little)?;
        let signature = reader.read_cstring(Some(20))?;
        if !WEB_SIGNATURES.contains(&signature.as_str()) {
            return Err(Error::InvalidSignature(signature));
        }
        let head_length = reader.read_count()? as u64;

        let mut files = Vec::new();
        while reader.position()? < head_length {
            let offset = reader.read_count()?;
            let length = reader.read_count()?;
            let name_length = reader.read_count()?;
            let name_bytes = reader.read_bytes(name_length as u64)?;
            let name = String::from_utf8_lossy(&name_bytes).into_owned();

            let end = offset
                .checked_add(length)
                .filter(|&e| e <= data.len())
                .ok_or_else(|| Error::malformed(format!("web entry {name:?} lies outside the archive")))?;
            files.push(StreamFile::new(name, Arc::from(&data[offset..end])));
        }
        Ok(Self { signature, files })
    }
}
