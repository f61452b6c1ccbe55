//! Crate-wide error type.
//!
//! Only conditions that abort the current unit of work are errors.  Schema
//! size drift is reported as a [`SchemaMismatch`](crate::typetree::SchemaMismatch)
//! value, unknown class ids resolve to `ClassId::UnknownType`, and failed
//! pointer lookups are plain `None`.

use std::io;
use thiserror::Error;

use crate::codec::CodecError;

#[derive(Error, Debug)]
pub enum Error {
    /// A primitive read ran past the available bytes.  Nothing was consumed.
    #[error("Unexpected end of data: {needed} byte(s) requested at offset {offset}")]
    EndOfData { offset: u64, needed: u64 },
    #[error("Invalid signature: {0:?}")]
    InvalidSignature(String),
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),
    /// Header or directory content that cannot describe a valid file.
    #[error("Malformed data: {0}")]
    Malformed(String),
    #[error("No schema available for object {path_id}")]
    NoSchema { path_id: i64 },
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
