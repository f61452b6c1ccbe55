//! Metadata records of a container: embedded type descriptions, the object
//! directory and external file references.

use std::io::{Read, Seek};
use std::sync::Arc;

use uuid::Uuid;

use crate::endian::EndianReader;
use crate::error::{Error, Result};
use crate::typetree::{common_string, TypeTree, TypeTreeNode};

/// Deepest nesting accepted from the legacy recursive type tree layout.
const MAX_TREE_DEPTH: i32 = 255;

/// Class id of script-backed objects.
pub(crate) const MONO_BEHAVIOUR_CLASS: i32 = 114;

// ── SerializedType ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SerializedType {
    pub class_id:          i32,
    pub is_stripped_type:  bool,
    pub script_type_index: i16,
    pub type_tree:         Option<Arc<TypeTree>>,
    pub script_id:         Option<[u8; 16]>,
    pub old_type_hash:     Option<[u8; 16]>,
    pub type_dependencies: Vec<i32>,
    pub class_name:        String,
    pub namespace:         String,
    pub asm_name:          String,
}

impl SerializedType {
    pub(crate) fn read<R: Read + Seek>(
        reader: &mut EndianReader<R>,
        version: u32,
        enable_type_tree: bool,
        is_ref_type: bool,
    ) -> Result<Self> {
        let mut ty = SerializedType { class_id: reader.read_i32()?, script_type_index: -1, ..Default::default() };

        if version >= 16 {
            ty.is_stripped_type = reader.read_bool()?;
        }
        if version >= 17 {
            ty.script_type_index = reader.read_i16()?;
        }
        if version >= 13 {
            let has_script_id = (is_ref_type && ty.script_type_index >= 0)
                || (version < 16 && ty.class_id < 0)
                || (version >= 16 && ty.class_id == MONO_BEHAVIOUR_CLASS);
            if has_script_id {
                ty.script_id = Some(reader.read_hash128()?);
            }
            ty.old_type_hash = Some(reader.read_hash128()?);
        }

        if enable_type_tree {
            let nodes = if version >= 12 || version == 10 {
                read_blob_tree(reader, version)?
            } else {
                let mut nodes = Vec::new();
                read_legacy_tree(reader, version, 0, &mut nodes)?;
                nodes
            };
            ty.type_tree = Some(Arc::new(TypeTree::from_nodes(nodes)));

            if version >= 21 {
                if is_ref_type {
                    ty.class_name = reader.read_cstring(None)?;
                    ty.namespace = reader.read_cstring(None)?;
                    ty.asm_name = reader.read_cstring(None)?;
                } else {
                    let count = reader.read_count()?;
                    ty.type_dependencies = (0..count).map(|_| reader.read_i32()).collect::<Result<_>>()?;
                }
            }
        }
        Ok(ty)
    }
}

/// Blob layout: a fixed-size node table followed by a string buffer.
fn read_blob_tree<R: Read + Seek>(reader: &mut EndianReader<R>, version: u32) -> Result<Vec<TypeTreeNode>> {
    let node_count = reader.read_count()?;
    let string_buffer_size = reader.read_count()?;
    let node_size: u64 = if version >= 19 { 32 } else { 24 };
    if node_count as u64 * node_size > reader.remaining()? {
        return Err(Error::malformed(format!("type tree declares {node_count} nodes past end of data")));
    }

    let mut nodes = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let mut node = TypeTreeNode {
            version:         reader.read_u16()? as i32,
            level:           reader.read_u8()? as i32,
            type_flags:      reader.read_u8()? as i32,
            type_str_offset: reader.read_u32()?,
            name_str_offset: reader.read_u32()?,
            byte_size:       reader.read_i32()?,
            index:           reader.read_i32()?,
            meta_flag:       reader.read_i32()?,
            ..Default::default()
        };
        if version >= 19 {
            node.ref_type_hash = reader.read_u64()?;
        }
        nodes.push(node);
    }

    let strings = reader.read_bytes(string_buffer_size as u64)?;
    for node in &mut nodes {
        node.type_name = blob_string(&strings, node.type_str_offset);
        node.name = blob_string(&strings, node.name_str_offset);
    }
    Ok(nodes)
}

/// High bit set: offset into the shared table.  Otherwise a zero-terminated
/// string inside the local buffer.  Unresolvable offsets render as numbers.
fn blob_string(buffer: &[u8], offset: u32) -> String {
    if offset & 0x8000_0000 != 0 {
        let shared = offset & 0x7FFF_FFFF;
        return common_string(shared).map_or_else(|| shared.to_string(), str::to_owned);
    }
    match buffer.get(offset as usize..) {
        Some(rest) => {
            let end = rest.iter().position(|&b| b == 0).unwrap_or(rest.len());
            String::from_utf8_lossy(&rest[..end]).into_owned()
        }
        None => offset.to_string(),
    }
}

fn read_legacy_tree<R: Read + Seek>(
    reader: &mut EndianReader<R>,
    version: u32,
    level: i32,
    nodes: &mut Vec<TypeTreeNode>,
) -> Result<()> {
    if level > MAX_TREE_DEPTH {
        return Err(Error::malformed("type tree nested too deeply"));
    }
    let mut node = TypeTreeNode {
        level,
        type_name: reader.read_cstring(None)?,
        name:      reader.read_cstring(None)?,
        byte_size: reader.read_i32()?,
        ..Default::default()
    };
    if version == 2 {
        reader.read_i32()?; // variable count
    }
    if version != 3 {
        node.index = reader.read_i32()?;
    }
    node.type_flags = reader.read_i32()?;
    node.version = reader.read_i32()?;
    if version != 3 {
        node.meta_flag = reader.read_i32()?;
    }
    nodes.push(node);

    let children = reader.read_count()?;
    if children as u64 > reader.remaining()? {
        return Err(Error::malformed(format!("type tree node declares {children} children")));
    }
    for _ in 0..children {
        read_legacy_tree(reader, version, level + 1, nodes)?;
    }
    Ok(())
}

// ── Object directory ─────────────────────────────────────────────────────────

/// One entry of a container's object directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub path_id:           i64,
    /// Absolute offset in the container (data offset already applied).
    pub byte_start:        u64,
    pub byte_size:         u32,
    pub type_id:           i32,
    pub class_id:          i32,
    pub is_destroyed:      u16,
    pub stripped:          u8,
    pub script_type_index: i16,
    /// Index into the container's type list.
    pub serialized_type:   Option<usize>,
}

/// Entry of the script type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSerializedObjectIdentifier {
    pub local_serialized_file_index: i32,
    pub local_identifier_in_file:    i64,
}

/// A referenced external file.  `file_name` is the last path component and
/// is what pointer resolution matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentifier {
    pub guid:      Uuid,
    pub kind:      i32,
    pub path_name: String,
    pub file_name: String,
}

/// Last component of a path written with either separator.
pub(crate) fn file_name_of(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
