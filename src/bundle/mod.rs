//! Bundle archives: `UnityFS` and the legacy `UnityWeb` / `UnityRaw` layouts.
//!
//! Unpacking yields an ordered list of [`StreamFile`] members, each holding
//! its bytes in memory.  Everything a member needs is copied out of the
//! block stream, so members outlive the archive they came from.

pub mod web;

use std::io::{Cursor, Read, Seek};
use std::sync::Arc;

use log::{debug, trace};

use crate::codec::{decompress_lzma_stream, get_codec, CompressionType};
use crate::endian::{Endian, EndianReader};
use crate::error::{Error, Result};
use crate::serialized::file_name_of;

/// Blocks-info table stored at the end of the file.
pub const FLAG_BLOCKS_INFO_AT_END: u32 = 0x80;
/// Block data starts on a 16-byte boundary after the blocks-info table.
pub const FLAG_BLOCK_INFO_NEEDS_PADDING: u32 = 0x200;

/// Member extracted from an archive.
#[derive(Debug, Clone)]
pub struct StreamFile {
    pub path:      String,
    pub file_name: String,
    pub data:      Arc<[u8]>,
}

impl StreamFile {
    pub fn new(path: String, data: Arc<[u8]>) -> Self {
        let file_name = file_name_of(&path).to_owned();
        Self { path, file_name, data }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleHeader {
    pub signature:      String,
    pub version:        u32,
    pub unity_version:  String,
    pub unity_revision: String,
    pub size:           i64,
    pub compressed_blocks_info_size:   u32,
    pub uncompressed_blocks_info_size: u32,
    pub flags:          u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageBlock {
    pub uncompressed_size: u32,
    pub compressed_size:   u32,
    pub flags:             u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub offset: i64,
    pub size:   i64,
    pub flags:  u32,
    pub path:   String,
}

#[derive(Debug, Clone)]
pub struct BundleFile {
    pub header: BundleHeader,
    pub blocks: Vec<StorageBlock>,
    pub nodes:  Vec<Node>,
    pub files:  Vec<StreamFile>,
}

impl BundleFile {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = EndianReader::new(Cursor::new(data), Endian::Big)?;
        let signature = reader.read_cstring(Some(20))?;
        let mut header = BundleHeader {
            version: reader.read_u32()?,
            unity_version: reader.read_cstring(None)?,
            unity_revision: reader.read_cstring(None)?,
            signature,
            ..Default::default()
        };

        match header.signature.as_str() {
            "UnityFS" => read_unity_fs(&mut reader, header),
            "UnityWeb" | "UnityRaw" => {
                if header.version == 6 {
                    // Version 6 legacy archives use the UnityFS body.
                    return read_unity_fs(&mut reader, header);
                }
                read_legacy(&mut reader, data, &mut header)
            }
            other => Err(Error::InvalidSignature(other.to_owned())),
        }
    }

    /// Engine version usable as a hint for old containers: the revision
    /// string, falling back to the nominal version.
    pub fn version_hint(&self) -> &str {
        if self.header.unity_revision.is_empty() {
            &self.header.unity_version
        } else {
            &self.header.unity_revision
        }
    }
}

// ── UnityFS ──────────────────────────────────────────────────────────────────

fn read_unity_fs(reader: &mut EndianReader<Cursor<&[u8]>>, mut header: BundleHeader) -> Result<BundleFile> {
    header.size = reader.read_i64()?;
    header.compressed_blocks_info_size = reader.read_u32()?;
    header.uncompressed_blocks_info_size = reader.read_u32()?;
    header.flags = reader.read_u32()?;
    if header.signature != "UnityFS" {
        reader.read_u8()?;
    }
    if header.version >= 7 {
        reader.align(16)?;
    }

    let compressed_info = if header.flags & FLAG_BLOCKS_INFO_AT_END != 0 {
        let back = reader.position()?;
        let len = reader.len()?;
        let at = len
            .checked_sub(header.compressed_blocks_info_size as u64)
            .ok_or_else(|| Error::malformed("blocks info larger than archive"))?;
        reader.set_position(at)?;
        let bytes = reader.read_bytes(header.compressed_blocks_info_size as u64)?;
        reader.set_position(back)?;
        bytes
    } else {
        reader.read_bytes(header.compressed_blocks_info_size as u64)?
    };

    let info_codec = get_codec(CompressionType::from_flags(header.flags)?)?;
    debug!("bundle blocks info: {} ({} bytes)", info_codec.compression().name(), compressed_info.len());
    let info = info_codec.decompress(&compressed_info, header.uncompressed_blocks_info_size as usize)?;

    let mut info_reader = EndianReader::new(Cursor::new(info.as_slice()), Endian::Big)?;
    info_reader.read_hash128()?;
    let block_count = info_reader.read_count()?;
    let mut blocks = Vec::with_capacity(block_count.min(4096));
    for _ in 0..block_count {
        blocks.push(StorageBlock {
            uncompressed_size: info_reader.read_u32()?,
            compressed_size:   info_reader.read_u32()?,
            flags:             info_reader.read_u16()?,
        });
    }
    let node_count = info_reader.read_count()?;
    let mut nodes = Vec::with_capacity(node_count.min(4096));
    for _ in 0..node_count {
        nodes.push(Node {
            offset: info_reader.read_i64()?,
            size:   info_reader.read_i64()?,
            flags:  info_reader.read_u32()?,
            path:   info_reader.read_cstring(None)?,
        });
    }

    if header.flags & FLAG_BLOCK_INFO_NEEDS_PADDING != 0 {
        reader.align(16)?;
    }

    let total: u64 = blocks.iter().map(|b| b.uncompressed_size as u64).sum();
    let mut stream = Vec::with_capacity(total.min(1 << 30) as usize);
    for block in &blocks {
        let compressed = reader.read_bytes(block.compressed_size as u64)?;
        let block_codec = get_codec(CompressionType::from_flags(block.flags as u32)?)?;
        trace!(
            "block {} -> {} bytes ({})",
            block.compressed_size,
            block.uncompressed_size,
            block_codec.compression().name()
        );
        let out = block_codec.decompress(&compressed, block.uncompressed_size as usize)?;
        stream.extend_from_slice(&out);
    }

    let files = slice_members(&stream, &nodes)?;
    Ok(BundleFile { header, blocks, nodes, files })
}

// ── UnityWeb / UnityRaw ──────────────────────────────────────────────────────

fn read_legacy(reader: &mut EndianReader<Cursor<&[u8]>>, data: &[u8], header: &mut BundleHeader) -> Result<BundleFile> {
    if header.version >= 4 {
        reader.read_hash128()?;
        reader.read_u32()?; // crc
    }
    reader.read_u32()?; // minimum streamed bytes
    let header_size = reader.read_u32()?;
    reader.read_u32()?; // levels before streaming
    let level_count = reader.read_count()?;
    let mut blocks = Vec::with_capacity(level_count.min(256));
    for _ in 0..level_count {
        let compressed_size = reader.read_u32()?;
        let uncompressed_size = reader.read_u32()?;
        blocks.push(StorageBlock { uncompressed_size, compressed_size, flags: 0 });
    }
    if header.version >= 2 {
        header.size = reader.read_u32()? as i64;
    }
    if header.version >= 3 {
        reader.read_u32()?; // file info header size
    }

    let last = blocks.last().copied().ok_or_else(|| Error::malformed("legacy bundle without levels"))?;
    let start = header_size as usize;
    let end = start
        .checked_add(last.compressed_size as usize)
        .filter(|&e| e <= data.len())
        .ok_or_else(|| Error::malformed("legacy bundle payload past end of file"))?;
    let payload = &data[start..end];

    let stream = if header.signature == "UnityWeb" {
        decompress_lzma_stream(payload)?
    } else {
        payload.to_vec()
    };

    let mut dir = EndianReader::new(Cursor::new(stream.as_slice()), Endian::Big)?;
    let node_count = dir.read_count()?;
    let mut nodes = Vec::with_capacity(node_count.min(4096));
    for _ in 0..node_count {
        let path = dir.read_cstring(None)?;
        let offset = dir.read_u32()? as i64;
        let size = dir.read_u32()? as i64;
        nodes.push(Node { offset, size, flags: 0, path });
    }

    let files = slice_members(&stream, &nodes)?;
    Ok(BundleFile { header: header.clone(), blocks, nodes, files })
}

fn slice_members(stream: &[u8], nodes: &[Node]) -> Result<Vec<StreamFile>> {
    nodes
        .iter()
        .map(|node| {
            let start = usize::try_from(node.offset).ok();
            let end = start.zip(usize::try_from(node.size).ok()).and_then(|(s, n)| s.checked_add(n));
            match (start, end) {
                (Some(s), Some(e)) if e <= stream.len() => {
                    Ok(StreamFile::new(node.path.clone(), Arc::from(&stream[s..e])))
                }
                _ => Err(Error::malformed(format!("member {:?} lies outside the archive", node.path))),
            }
        })
        .collect()
}

/// Read a bundle header signature without consuming the reader.
pub(crate) fn peek_signature<R: Read + Seek>(reader: &mut EndianReader<R>) -> Result<String> {
    let back = reader.position()?;
    let sig = reader.read_cstring(Some(20));
    reader.set_position(back)?;
    sig
}
