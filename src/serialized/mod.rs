//! Container (serialized file) parsing.
//!
//! A [`SerializedFile`] owns its bytes as a shared `Arc<[u8]>` arena.  The
//! header and metadata are parsed once; objects are later read through
//! independent cursors over the same arena, so handles never contend for a
//! shared position.

mod header;
mod types;

pub use header::{is_serialized_file, SerializedFileHeader, MAX_FORMAT_VERSION};
pub use types::{FileIdentifier, LocalSerializedObjectIdentifier, ObjectInfo, SerializedType};
pub(crate) use types::file_name_of;

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use crate::endian::{Endian, EndianReader};
use crate::error::{Error, Result};
use crate::version::{BuildTarget, UnityVersion};

pub struct SerializedFile {
    pub path:             PathBuf,
    pub file_name:        String,
    /// The archive this container was unpacked from, if any.
    pub original_path:    Option<PathBuf>,
    pub header:           SerializedFileHeader,
    pub unity_version:    UnityVersion,
    pub target_platform:  BuildTarget,
    pub enable_type_tree: bool,
    pub types:            Vec<SerializedType>,
    pub big_id_enabled:   bool,
    pub objects:          Vec<ObjectInfo>,
    pub script_types:     Vec<LocalSerializedObjectIdentifier>,
    pub externals:        Vec<FileIdentifier>,
    pub ref_types:        Vec<SerializedType>,
    pub user_information: String,
    object_index:         HashMap<i64, usize>,
    data:                 Arc<[u8]>,
}

impl SerializedFile {
    /// Parse a container from its complete bytes.  `path` names it for
    /// registration and external-file lookup; nothing is read from disk.
    pub fn parse(path: impl Into<PathBuf>, data: Arc<[u8]>) -> Result<Self> {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut reader = EndianReader::new(Cursor::new(Arc::clone(&data)), Endian::Big)?;
        let header = SerializedFileHeader::read(&mut reader)?;
        if header.file_size > data.len() as u64 {
            return Err(Error::malformed(format!(
                "header declares {} bytes, file has {}",
                header.file_size,
                data.len()
            )));
        }
        reader.set_endian(header.endian);
        let version = header.version;

        let unity_version = if version >= 7 {
            UnityVersion::parse(&reader.read_cstring(None)?)
        } else {
            UnityVersion::default()
        };
        let target_platform = if version >= 8 {
            BuildTarget(reader.read_i32()?)
        } else {
            BuildTarget::UNKNOWN
        };
        let enable_type_tree = if version >= 13 { reader.read_bool()? } else { true };

        let type_count = reader.read_count()?;
        let mut types = Vec::with_capacity(type_count.min(1024));
        for _ in 0..type_count {
            types.push(SerializedType::read(&mut reader, version, enable_type_tree, false)?);
        }

        let big_id_enabled = (7..14).contains(&version) && reader.read_i32()? != 0;

        let object_count = reader.read_count()?;
        let mut objects = Vec::with_capacity(object_count.min(65_536));
        let mut object_index = HashMap::with_capacity(object_count.min(65_536));
        for _ in 0..object_count {
            let info = read_object_info(&mut reader, &header, big_id_enabled, &types)?;
            if object_index.insert(info.path_id, objects.len()).is_some() {
                return Err(Error::malformed(format!("duplicate path id {}", info.path_id)));
            }
            objects.push(info);
        }

        let mut script_types = Vec::new();
        if version >= 11 {
            let count = reader.read_count()?;
            for _ in 0..count {
                let local_serialized_file_index = reader.read_i32()?;
                let local_identifier_in_file = if version < 14 {
                    reader.read_i32()? as i64
                } else {
                    reader.align(4)?;
                    reader.read_i64()?
                };
                script_types.push(LocalSerializedObjectIdentifier {
                    local_serialized_file_index,
                    local_identifier_in_file,
                });
            }
        }

        let external_count = reader.read_count()?;
        let mut externals = Vec::with_capacity(external_count.min(1024));
        for _ in 0..external_count {
            externals.push(read_external(&mut reader, version)?);
        }

        let mut ref_types = Vec::new();
        if version >= 20 {
            let count = reader.read_count()?;
            for _ in 0..count {
                ref_types.push(SerializedType::read(&mut reader, version, enable_type_tree, true)?);
            }
        }

        let user_information = if version >= 5 { reader.read_cstring(None)? } else { String::new() };

        debug!(
            "parsed {} (format {}, engine {}, {} objects, {} externals)",
            file_name, version, unity_version, objects.len(), externals.len()
        );

        Ok(Self {
            path,
            file_name,
            original_path: None,
            header,
            unity_version,
            target_platform,
            enable_type_tree,
            types,
            big_id_enabled,
            objects,
            script_types,
            externals,
            ref_types,
            user_information,
            object_index,
            data,
        })
    }

    /// Apply an engine version hint.  Ignored when empty or a stripped
    /// placeholder.
    pub fn set_version(&mut self, version: &str) {
        let parsed = UnityVersion::parse(version);
        if !version.is_empty() && !parsed.is_stripped() {
            self.unity_version = parsed;
        }
    }

    pub fn format_version(&self) -> u32 { self.header.version }

    pub fn endian(&self) -> Endian { self.header.endian }

    pub fn data(&self) -> &Arc<[u8]> { &self.data }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn object_info(&self, path_id: i64) -> Option<&ObjectInfo> {
        self.object_index.get(&path_id).map(|&i| &self.objects[i])
    }

    pub fn contains(&self, path_id: i64) -> bool {
        self.object_index.contains_key(&path_id)
    }

    pub fn serialized_type(&self, info: &ObjectInfo) -> Option<&SerializedType> {
        info.serialized_type.and_then(|i| self.types.get(i))
    }
}

impl std::fmt::Debug for SerializedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedFile")
            .field("path", &self.path)
            .field("version", &self.header.version)
            .field("unity_version", &self.unity_version.as_str())
            .field("objects", &self.objects.len())
            .field("externals", &self.externals.len())
            .finish()
    }
}

fn read_object_info<R: Read + Seek>(
    reader: &mut EndianReader<R>,
    header: &SerializedFileHeader,
    big_id_enabled: bool,
    types: &[SerializedType],
) -> Result<ObjectInfo> {
    let version = header.version;

    let path_id = if big_id_enabled {
        reader.read_i64()?
    } else if version < 14 {
        reader.read_i32()? as i64
    } else {
        reader.align(4)?;
        reader.read_i64()?
    };

    let byte_start = if version >= 22 {
        u64::try_from(reader.read_i64()?).map_err(|_| Error::malformed("negative object offset"))?
    } else {
        reader.read_u32()? as u64
    };
    let byte_start = byte_start
        .checked_add(header.data_offset)
        .ok_or_else(|| Error::malformed("object offset overflows"))?;
    let byte_size = reader.read_u32()?;
    let type_id = reader.read_i32()?;

    let (class_id, serialized_type) = if version < 16 {
        let class_id = reader.read_u16()? as i32;
        (class_id, types.iter().position(|t| t.class_id == type_id))
    } else {
        let index = usize::try_from(type_id)
            .ok()
            .filter(|&i| i < types.len())
            .ok_or_else(|| Error::malformed(format!("object {path_id} has type index {type_id} out of range")))?;
        (types[index].class_id, Some(index))
    };

    let mut info = ObjectInfo {
        path_id,
        byte_start,
        byte_size,
        type_id,
        class_id,
        is_destroyed: 0,
        stripped: 0,
        script_type_index: -1,
        serialized_type,
    };
    if version < 11 {
        info.is_destroyed = reader.read_u16()?;
    }
    if (11..17).contains(&version) {
        info.script_type_index = reader.read_i16()?;
    } else if let Some(ty) = info.serialized_type.and_then(|i| types.get(i)) {
        info.script_type_index = ty.script_type_index;
    }
    if version == 15 || version == 16 {
        info.stripped = reader.read_u8()?;
    }
    Ok(info)
}

fn read_external<R: Read + Seek>(reader: &mut EndianReader<R>, version: u32) -> Result<FileIdentifier> {
    if version >= 6 {
        reader.read_cstring(None)?; // temp empty
    }
    let (guid, kind) = if version >= 5 {
        (reader.read_guid()?, reader.read_i32()?)
    } else {
        (uuid::Uuid::nil(), 0)
    };
    let path_name = reader.read_cstring(None)?;
    let file_name = file_name_of(&path_name).to_owned();
    Ok(FileIdentifier { guid, kind, path_name, file_name })
}
