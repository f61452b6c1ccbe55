//! Decompression codecs for archive payloads.
//!
//! # Identity rules
//! Bundle archives tag every block (and the block-info table) with a
//! compression type in the low six bits of a flags word.  That tag is the
//! only codec identity on disk; [`CompressionType::from_flags`] maps it to a
//! runtime discriminant.  Web archives are wrapped whole in gzip or brotli
//! and are not tagged at all: the sniffer recognises the envelope.
//!
//! # Sizes
//! Block codecs are always handed the expected uncompressed size.  LZ4
//! blocks carry no size of their own, and bundle LZMA streams store the
//! 5-byte properties header without the 8-byte length field.

use std::io::{self, Read};
use thiserror::Error;

/// Mask selecting the compression type from a bundle flags word.
pub const COMPRESSION_TYPE_MASK: u32 = 0x3F;

// ── CompressionType enum ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Lzma,
    Lz4,
    Lz4HC,
    Lzham,
}

impl CompressionType {
    /// Extract the compression type from a bundle or block flags word.
    pub fn from_flags(flags: u32) -> Result<Self, CodecError> {
        match flags & COMPRESSION_TYPE_MASK {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lzma),
            2 => Ok(CompressionType::Lz4),
            3 => Ok(CompressionType::Lz4HC),
            4 => Ok(CompressionType::Lzham),
            other => Err(CodecError::UnknownCompression(other)),
        }
    }

    /// Human-readable name, for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            CompressionType::None  => "none",
            CompressionType::Lzma  => "lzma",
            CompressionType::Lz4   => "lz4",
            CompressionType::Lz4HC => "lz4hc",
            CompressionType::Lzham => "lzham",
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("Unknown compression type {0}")]
    UnknownCompression(u32),
    /// The tag is recognised but this build has no decoder for it.
    #[error("Compression {0} is not supported")]
    Unsupported(&'static str),
    #[error("Decompressed size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Codec trait ──────────────────────────────────────────────────────────────

pub trait Codec: Send + Sync {
    fn compression(&self) -> CompressionType;
    fn decompress(&self, data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>, CodecError>;
}

// ── Block codec implementations ──────────────────────────────────────────────

pub struct NoneCodec;
impl Codec for NoneCodec {
    fn compression(&self) -> CompressionType { CompressionType::None }
    fn decompress(&self, data: &[u8], _: usize) -> Result<Vec<u8>, CodecError> { Ok(data.to_vec()) }
}

pub struct Lz4Codec;
impl Codec for Lz4Codec {
    fn compression(&self) -> CompressionType { CompressionType::Lz4 }
    fn decompress(&self, data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>, CodecError> {
        let out = lz4_flex::block::decompress(data, uncompressed_size)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;
        check_size(out, uncompressed_size)
    }
}

/// LZMA with a 5-byte properties header and no stored length.
pub struct LzmaCodec;
impl Codec for LzmaCodec {
    fn compression(&self) -> CompressionType { CompressionType::Lzma }
    fn decompress(&self, data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>, CodecError> {
        let options = lzma_rs::decompress::Options {
            unpacked_size: lzma_rs::decompress::UnpackedSize::UseProvided(Some(uncompressed_size as u64)),
            ..Default::default()
        };
        let mut out = Vec::with_capacity(uncompressed_size);
        lzma_rs::lzma_decompress_with_options(&mut io::Cursor::new(data), &mut out, &options)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;
        check_size(out, uncompressed_size)
    }
}

fn check_size(out: Vec<u8>, expected: usize) -> Result<Vec<u8>, CodecError> {
    if out.len() != expected {
        return Err(CodecError::SizeMismatch { expected, actual: out.len() });
    }
    Ok(out)
}

// ── Stream decoders (no size known up front) ─────────────────────────────────

/// Standard `.lzma` stream: properties plus an 8-byte length header.
pub fn decompress_lzma_stream(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    lzma_rs::lzma_decompress(&mut io::Cursor::new(data), &mut out)
        .map_err(|e| CodecError::Decompression(e.to_string()))?;
    Ok(out)
}

pub fn decompress_gzip(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    flate2::read::GzDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::Decompression(e.to_string()))?;
    Ok(out)
}

pub fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    brotli::Decompressor::new(data, 4096)
        .read_to_end(&mut out)
        .map_err(|e| CodecError::Decompression(e.to_string()))?;
    Ok(out)
}

// ── Factory ──────────────────────────────────────────────────────────────────

/// Resolve a compression type to a block codec.
///
/// LZHAM is recognised but has no decoder; the caller must treat the
/// archive as unreadable rather than guess.
pub fn get_codec(kind: CompressionType) -> Result<Box<dyn Codec>, CodecError> {
    match kind {
        CompressionType::None  => Ok(Box::new(NoneCodec)),
        CompressionType::Lzma  => Ok(Box::new(LzmaCodec)),
        CompressionType::Lz4 |
        CompressionType::Lz4HC => Ok(Box::new(Lz4Codec)),
        CompressionType::Lzham => Err(CodecError::Unsupported(kind.name())),
    }
}
