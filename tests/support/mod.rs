//! Fixture writers for containers, bundles and web archives.
#![allow(dead_code)]

use std::io::Write;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use assetgraph::{Endian, TypeTreeNode};

// ── Byte writer ──────────────────────────────────────────────────────────────

/// Endian-aware byte sink.  `base` is the absolute file offset of the first
/// byte, so alignment matches what a reader sees.
pub struct Bytes {
    pub buf:    Vec<u8>,
    pub endian: Endian,
    pub base:   usize,
}

macro_rules! put {
    ($name:ident, $ty:ty, $method:ident) => {
        pub fn $name(&mut self, v: $ty) -> &mut Self {
            match self.endian {
                Endian::Big    => self.buf.$method::<BigEndian>(v).unwrap(),
                Endian::Little => self.buf.$method::<LittleEndian>(v).unwrap(),
            }
            self
        }
    };
}

impl Bytes {
    pub fn new(endian: Endian) -> Self {
        Self { buf: Vec::new(), endian, base: 0 }
    }

    pub fn at(endian: Endian, base: usize) -> Self {
        Self { buf: Vec::new(), endian, base }
    }

    put!(i16, i16, write_i16);
    put!(u16, u16, write_u16);
    put!(i32, i32, write_i32);
    put!(u32, u32, write_u32);
    put!(i64, i64, write_i64);
    put!(u64, u64, write_u64);
    put!(f32, f32, write_f32);

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.write_all(data).unwrap();
        self
    }

    pub fn cstr(&mut self, s: &str) -> &mut Self {
        self.raw(s.as_bytes()).u8(0)
    }

    pub fn align(&mut self, n: usize) -> &mut Self {
        while (self.base + self.buf.len()) % n != 0 {
            self.buf.push(0);
        }
        self
    }

    /// Length-prefixed string padded to 4 bytes.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.i32(s.len() as i32).raw(s.as_bytes()).align(4)
    }

    pub fn pptr(&mut self, file_id: i32, path_id: i64) -> &mut Self {
        self.i32(file_id).i64(path_id)
    }

    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

// ── Schemas ──────────────────────────────────────────────────────────────────

pub fn node(level: i32, ty: &str, name: &str) -> TypeTreeNode {
    TypeTreeNode::new(level, ty, name)
}

/// `string name` with its `Array`/`size`/`data` children.
pub fn string_nodes(level: i32, name: &str) -> Vec<TypeTreeNode> {
    vec![
        node(level, "string", name),
        node(level + 1, "Array", "Array").aligned(),
        node(level + 2, "int", "size"),
        node(level + 2, "char", "data"),
    ]
}

/// `vector name` of `item_ty` items.
pub fn vector_nodes(level: i32, name: &str, item_ty: &str) -> Vec<TypeTreeNode> {
    vec![
        node(level, "vector", name),
        node(level + 1, "Array", "Array"),
        node(level + 2, "int", "size"),
        node(level + 2, item_ty, "data"),
    ]
}

/// `map name` from `key_ty` to `value_ty`.
pub fn map_nodes(level: i32, name: &str, key_ty: &str, value_ty: &str) -> Vec<TypeTreeNode> {
    vec![
        node(level, "map", name),
        node(level + 1, "Array", "Array"),
        node(level + 2, "int", "size"),
        node(level + 2, "pair", "data"),
        node(level + 3, key_ty, "first"),
        node(level + 3, value_ty, "second"),
    ]
}

// ── Containers ───────────────────────────────────────────────────────────────

struct TypeEntry {
    class_id:          i32,
    script_type_index: i16,
    nodes:             Vec<TypeTreeNode>,
}

struct ObjectEntry {
    path_id:    i64,
    type_index: i32,
    data:       Vec<u8>,
}

/// Writes a container of format 17 or 22.
pub struct ContainerBuilder {
    version:       u32,
    endian:        Endian,
    unity_version: String,
    platform:      i32,
    types:         Vec<TypeEntry>,
    objects:       Vec<ObjectEntry>,
    externals:     Vec<String>,
}

impl ContainerBuilder {
    pub fn new(version: u32) -> Self {
        Self {
            version,
            endian:        Endian::Little,
            unity_version: "2019.4.0f1".to_owned(),
            platform:      19,
            types:         Vec::new(),
            objects:       Vec::new(),
            externals:     Vec::new(),
        }
    }

    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn unity_version(mut self, v: &str) -> Self {
        self.unity_version = v.to_owned();
        self
    }

    pub fn data_endian(&self) -> Endian {
        self.endian
    }

    /// Add a type; returns its index for [`object`](Self::object).
    pub fn add_type(&mut self, class_id: i32, nodes: Vec<TypeTreeNode>) -> i32 {
        self.add_script_type(class_id, -1, nodes)
    }

    pub fn add_script_type(&mut self, class_id: i32, script_type_index: i16, nodes: Vec<TypeTreeNode>) -> i32 {
        self.types.push(TypeEntry { class_id, script_type_index, nodes });
        self.types.len() as i32 - 1
    }

    pub fn object(&mut self, path_id: i64, type_index: i32, data: Vec<u8>) -> &mut Self {
        self.objects.push(ObjectEntry { path_id, type_index, data });
        self
    }

    pub fn external(&mut self, path: &str) -> &mut Self {
        self.externals.push(path.to_owned());
        self
    }

    /// A writer for object payloads in this container's byte order.
    pub fn payload(&self) -> Bytes {
        Bytes::new(self.endian)
    }

    fn header_len(&self) -> usize {
        if self.version >= 22 { 48 } else { 20 }
    }

    pub fn build(&self) -> Vec<u8> {
        let v = self.version;
        let header_len = self.header_len();
        let mut m = Bytes::at(self.endian, header_len);

        m.cstr(&self.unity_version).i32(self.platform).u8(1);
        m.i32(self.types.len() as i32);
        for ty in &self.types {
            m.i32(ty.class_id).u8(0).i16(ty.script_type_index);
            if ty.class_id == 114 {
                m.raw(&[0u8; 16]);
            }
            m.raw(&[0u8; 16]);
            write_blob(&mut m, v, &ty.nodes);
            if v >= 21 {
                m.i32(0);
            }
        }

        // Object payloads are laid out 8-aligned after the data offset.
        let mut offsets = Vec::new();
        let mut cursor = 0usize;
        for obj in &self.objects {
            offsets.push(cursor);
            cursor += obj.data.len();
            cursor = (cursor + 7) & !7;
        }

        m.i32(self.objects.len() as i32);
        for (obj, &offset) in self.objects.iter().zip(&offsets) {
            m.align(4).i64(obj.path_id);
            if v >= 22 {
                m.i64(offset as i64);
            } else {
                m.u32(offset as u32);
            }
            m.u32(obj.data.len() as u32).i32(obj.type_index);
        }

        m.i32(0); // script types
        m.i32(self.externals.len() as i32);
        for path in &self.externals {
            m.cstr("").raw(&[0u8; 16]).i32(0).cstr(path);
        }
        if v >= 20 {
            m.i32(0); // ref types
        }
        m.cstr("");
        let metadata = m.finish();

        let data_offset = (header_len + metadata.len() + 15) & !15;
        let file_size = data_offset + cursor.max(1);

        let mut out = Bytes::new(Endian::Big);
        if v >= 22 {
            out.u32(0).u32(0).u32(v).u32(0);
            out.u8(endian_flag(self.endian)).raw(&[0; 3]);
            out.u32(metadata.len() as u32).i64(file_size as i64).i64(data_offset as i64).i64(0);
        } else {
            out.u32(metadata.len() as u32).u32(file_size as u32).u32(v).u32(data_offset as u32);
            out.u8(endian_flag(self.endian)).raw(&[0; 3]);
        }
        let mut bytes = out.finish();
        bytes.extend_from_slice(&metadata);
        bytes.resize(data_offset, 0);
        for (obj, &offset) in self.objects.iter().zip(&offsets) {
            bytes.resize(data_offset + offset, 0);
            bytes.extend_from_slice(&obj.data);
        }
        bytes.resize(file_size, 0);
        bytes
    }
}

fn endian_flag(endian: Endian) -> u8 {
    match endian {
        Endian::Little => 0,
        Endian::Big    => 1,
    }
}

fn write_blob(m: &mut Bytes, version: u32, nodes: &[TypeTreeNode]) {
    let mut strings: Vec<u8> = Vec::new();

    let mut table = Bytes::new(m.endian);
    for n in nodes {
        let type_off = intern(&mut strings, &n.type_name);
        let name_off = intern(&mut strings, &n.name);
        table
            .u16(n.version as u16)
            .u8(n.level as u8)
            .u8(n.type_flags as u8)
            .u32(type_off)
            .u32(name_off)
            .i32(n.byte_size)
            .i32(n.index)
            .i32(n.meta_flag);
        if version >= 19 {
            table.u64(0);
        }
    }
    m.i32(nodes.len() as i32).i32(strings.len() as i32);
    m.raw(&table.finish()).raw(&strings);
}

/// Append `s` to the local string buffer unless already present.
fn intern(strings: &mut Vec<u8>, s: &str) -> u32 {
    let mut at = 0;
    for piece in strings.split(|&b| b == 0) {
        if piece == s.as_bytes() && at < strings.len() {
            return at as u32;
        }
        at += piece.len() + 1;
    }
    let pos = strings.len() as u32;
    strings.extend_from_slice(s.as_bytes());
    strings.push(0);
    pos
}

// ── Archives ─────────────────────────────────────────────────────────────────

/// A `UnityFS` bundle with one block holding every member.  `lz4` selects
/// LZ4 for both the block and the blocks-info table.
pub fn build_bundle(members: &[(&str, &[u8])], lz4: bool) -> Vec<u8> {
    build_bundle_with(members, lz4, false)
}

/// As [`build_bundle`]; `info_at_end` stores the blocks-info table after
/// the block data.
pub fn build_bundle_with(members: &[(&str, &[u8])], lz4: bool, info_at_end: bool) -> Vec<u8> {
    let mut stream = Vec::new();
    let mut nodes = Vec::new();
    for (name, data) in members {
        nodes.push((stream.len() as i64, data.len() as i64, *name));
        stream.extend_from_slice(data);
    }
    let flag: u16 = if lz4 { 2 } else { 0 };
    let block = if lz4 { lz4_flex::block::compress(&stream) } else { stream.clone() };

    let mut info = Bytes::new(Endian::Big);
    info.raw(&[0u8; 16]).i32(1);
    info.u32(stream.len() as u32).u32(block.len() as u32).u16(flag);
    info.i32(nodes.len() as i32);
    for (offset, size, name) in &nodes {
        info.i64(*offset).i64(*size).u32(4).cstr(name);
    }
    let info = info.finish();
    let packed_info = if lz4 { lz4_flex::block::compress(&info) } else { info.clone() };
    let flags = flag as u32 | if info_at_end { 0x80 } else { 0 };

    let mut out = Bytes::new(Endian::Big);
    out.cstr("UnityFS").u32(6).cstr("5.x.x").cstr("2019.4.0f1");
    out.i64(0).u32(packed_info.len() as u32).u32(info.len() as u32).u32(flags);
    if info_at_end {
        out.raw(&block).raw(&packed_info);
    } else {
        out.raw(&packed_info).raw(&block);
    }
    let mut bytes = out.finish();
    let total = bytes.len() as i64;
    let size_at = b"UnityFS\0".len() + 4 + b"5.x.x\0".len() + b"2019.4.0f1\0".len();
    bytes[size_at..size_at + 8].copy_from_slice(&total.to_be_bytes());
    bytes
}

/// A `UnityWebData1.0` archive.
pub fn build_web(members: &[(&str, &[u8])]) -> Vec<u8> {
    let signature = b"UnityWebData1.0\0";
    let head_length = signature.len() + 4 + members.iter().map(|(n, _)| 12 + n.len()).sum::<usize>();

    let mut out = Bytes::new(Endian::Little);
    out.raw(signature).i32(head_length as i32);
    let mut offset = head_length;
    for (name, data) in members {
        out.i32(offset as i32).i32(data.len() as i32).i32(name.len() as i32).raw(name.as_bytes());
        offset += data.len();
    }
    for (_, data) in members {
        out.raw(data);
    }
    out.finish()
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
