use std::io::{Read, Seek};

use serde::Serialize;

use crate::endian::EndianReader;
use crate::error::Result;
use crate::typetree::Value;

/// Cross-reference to an object: `file_id` 0 is the referring container,
/// `n > 0` is entry `n - 1` of its external file table.  Not an owning
/// handle; resolution may fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PPtr {
    pub file_id: i32,
    pub path_id: i64,
}

impl PPtr {
    pub fn new(file_id: i32, path_id: i64) -> Self {
        Self { file_id, path_id }
    }

    /// Path ids are 32-bit before container format 14.
    pub fn read<R: Read + Seek>(reader: &mut EndianReader<R>, format_version: u32) -> Result<Self> {
        let file_id = reader.read_i32()?;
        let path_id = if format_version < 14 {
            reader.read_i32()? as i64
        } else {
            reader.read_i64()?
        };
        Ok(Self { file_id, path_id })
    }

    pub fn read_array<R: Read + Seek>(reader: &mut EndianReader<R>, format_version: u32) -> Result<Vec<Self>> {
        let count = reader.read_count()?;
        let mut out = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            out.push(Self::read(reader, format_version)?);
        }
        Ok(out)
    }

    /// A record with `m_FileID` and `m_PathID` fields, as decoded from a
    /// type tree.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            file_id: i32::try_from(value.get("m_FileID")?.as_i64()?).ok()?,
            path_id: value.get("m_PathID")?.as_i64()?,
        })
    }

    pub fn is_null(&self) -> bool {
        self.path_id == 0 || self.file_id < 0
    }
}
