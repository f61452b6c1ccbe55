use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::typetree::Value;

/// A named byte blob that is not a container: archive members such as
/// `.resS` streams, or loose files found during discovery.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name:   String,
    pub data:   Arc<[u8]>,
    /// File the bytes came from (the archive, for members).
    pub origin: PathBuf,
}

impl Resource {
    /// `size` bytes at `offset`, if they lie within the blob.
    pub fn slice(&self, offset: u64, size: u64) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(size).ok()?)?;
        self.data.get(start..end)
    }
}

/// Location of data stored outside its object, as found in `m_StreamData`
/// and similar fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingInfo {
    pub offset: u64,
    pub size:   u64,
    pub path:   String,
}

impl StreamingInfo {
    /// Read from a decoded `StreamingInfo` record.
    pub fn from_value(value: &Value) -> Option<Self> {
        Some(Self {
            offset: value.get("offset")?.as_u64()?,
            size:   value.get("size")?.as_u64()?,
            path:   value.get("path")?.as_str()?.to_owned(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty() || self.size == 0
    }
}
