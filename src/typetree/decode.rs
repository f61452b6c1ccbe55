//! Schema-driven decoding.
//!
//! One traversal, [`decode_node`], walks a [`SchemaNode`] against an
//! [`EndianReader`] and reports what it reads to a [`Visitor`].  The value
//! tree and the indented text dump are two visitors over that same walk,
//! so both always consume exactly the same bytes.

use std::fmt::Write as _;
use std::io::{Read, Seek};

use log::warn;

use crate::endian::EndianReader;
use crate::error::{Error, Result};
use crate::typetree::{PrimitiveKind, SchemaNode, Shape, TypeTree, TypeTreeNode, Value};

/// Bytes consumed by a top-level decode differ from the declared size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub expected: u64,
    pub consumed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value:    T,
    pub consumed: u64,
    pub mismatch: Option<SchemaMismatch>,
}

// ── Visitor ──────────────────────────────────────────────────────────────────

pub(crate) trait Visitor {
    type Out;

    fn scalar(&mut self, node: &TypeTreeNode, value: Value) -> Self::Out;
    fn bytes(&mut self, node: &TypeTreeNode, data: Vec<u8>) -> Self::Out;

    fn begin_array(&mut self, _node: &TypeTreeNode, _count: usize) {}
    fn element(&mut self, _node: &TypeTreeNode, _index: usize) {}
    fn end_array(&mut self, node: &TypeTreeNode, items: Vec<Self::Out>) -> Self::Out;

    fn begin_map(&mut self, _node: &TypeTreeNode, _count: usize) {}
    fn pair(&mut self, _node: &TypeTreeNode, _index: usize) {}
    fn end_map(&mut self, node: &TypeTreeNode, pairs: Vec<(Self::Out, Self::Out)>) -> Self::Out;

    fn begin_record(&mut self, _node: &TypeTreeNode) {}
    fn end_record(&mut self, node: &TypeTreeNode, fields: Vec<(&str, Self::Out)>) -> Self::Out;
}

pub(crate) fn decode_node<R, V>(node: &SchemaNode, reader: &mut EndianReader<R>, v: &mut V) -> Result<V::Out>
where
    R: Read + Seek,
    V: Visitor,
{
    let info = &node.node;
    let out = match &node.shape {
        Shape::Primitive(kind) => {
            let value = read_primitive(*kind, reader)?;
            v.scalar(info, value)
        }
        Shape::String => {
            let len = reader.read_count()?;
            let raw = reader.read_bytes(len as u64)?;
            reader.align(4)?;
            // Invalid UTF-8 stays as the original bytes.
            match String::from_utf8(raw) {
                Ok(s)  => v.scalar(info, Value::String(s)),
                Err(e) => v.scalar(info, Value::Bytes(e.into_bytes())),
            }
        }
        Shape::TypelessData => {
            let len = reader.read_count()?;
            let data = reader.read_bytes(len as u64)?;
            v.bytes(info, data)
        }
        Shape::Map { first, second } => {
            let count = read_element_count(reader, first.min_size() + second.min_size())?;
            v.begin_map(info, count);
            let mut pairs = Vec::with_capacity(count.min(4096));
            for i in 0..count {
                v.pair(info, i);
                let key = decode_node(first, reader, v)?;
                let val = decode_node(second, reader, v)?;
                pairs.push((key, val));
            }
            v.end_map(info, pairs)
        }
        Shape::Array { item } => {
            let count = read_element_count(reader, item.min_size())?;
            v.begin_array(info, count);
            let mut items = Vec::with_capacity(count.min(4096));
            for i in 0..count {
                v.element(info, i);
                items.push(decode_node(item, reader, v)?);
            }
            v.end_array(info, items)
        }
        Shape::Record(children) => {
            v.begin_record(info);
            let mut fields = Vec::with_capacity(children.len());
            for child in children {
                let out = decode_node(child, reader, v)?;
                fields.push((child.name(), out));
            }
            v.end_record(info, fields)
        }
    };
    if node.align {
        reader.align(4)?;
    }
    Ok(out)
}

/// Rejects counts whose items cannot fit in the remaining input.  Items of
/// zero minimum size (empty records) are never rejected.
fn read_element_count<R: Read + Seek>(reader: &mut EndianReader<R>, item_size: u64) -> Result<usize> {
    let offset = reader.position()?;
    let count = reader.read_count()?;
    let needed = (count as u64).saturating_mul(item_size);
    if needed > reader.remaining()? {
        return Err(Error::EndOfData { offset, needed });
    }
    Ok(count)
}

fn read_primitive<R: Read + Seek>(kind: PrimitiveKind, reader: &mut EndianReader<R>) -> Result<Value> {
    Ok(match kind {
        PrimitiveKind::I8   => Value::I8(reader.read_i8()?),
        PrimitiveKind::U8   => Value::U8(reader.read_u8()?),
        PrimitiveKind::I16  => Value::I16(reader.read_i16()?),
        PrimitiveKind::U16  => Value::U16(reader.read_u16()?),
        PrimitiveKind::I32  => Value::I32(reader.read_i32()?),
        PrimitiveKind::U32  => Value::U32(reader.read_u32()?),
        PrimitiveKind::I64  => Value::I64(reader.read_i64()?),
        PrimitiveKind::U64  => Value::U64(reader.read_u64()?),
        PrimitiveKind::F32  => Value::F32(reader.read_f32()?),
        PrimitiveKind::F64  => Value::F64(reader.read_f64()?),
        PrimitiveKind::Bool => Value::Bool(reader.read_bool()?),
    })
}

// ── Value tree visitor ───────────────────────────────────────────────────────

struct ValueBuilder;

impl Visitor for ValueBuilder {
    type Out = Value;

    fn scalar(&mut self, _: &TypeTreeNode, value: Value) -> Value { value }

    fn bytes(&mut self, _: &TypeTreeNode, data: Vec<u8>) -> Value { Value::Bytes(data) }

    fn end_array(&mut self, _: &TypeTreeNode, items: Vec<Value>) -> Value { Value::Array(items) }

    fn end_map(&mut self, _: &TypeTreeNode, pairs: Vec<(Value, Value)>) -> Value { Value::Map(pairs) }

    fn end_record(&mut self, _: &TypeTreeNode, fields: Vec<(&str, Value)>) -> Value {
        Value::Record(fields.into_iter().collect())
    }
}

// ── Text dump visitor ────────────────────────────────────────────────────────

struct TextDump {
    out: String,
}

impl TextDump {
    fn line(&mut self, level: i32, text: std::fmt::Arguments<'_>) {
        for _ in 0..level.max(0) {
            self.out.push('\t');
        }
        let _ = self.out.write_fmt(text);
        self.out.push_str("\r\n");
    }
}

impl Visitor for TextDump {
    type Out = ();

    fn scalar(&mut self, node: &TypeTreeNode, value: Value) {
        let level = node.level;
        match value {
            Value::String(s) => self.line(level, format_args!("{} {} = \"{}\"", node.type_name, node.name, s)),
            Value::Bytes(b)  => self.line(level, format_args!("{} {} = \"{}\"", node.type_name, node.name, String::from_utf8_lossy(&b))),
            Value::Bool(b)   => self.line(level, format_args!("{} {} = {}", node.type_name, node.name, if b { "True" } else { "False" })),
            other            => self.line(level, format_args!("{} {} = {}", node.type_name, node.name, DisplayScalar(&other))),
        }
    }

    fn bytes(&mut self, node: &TypeTreeNode, data: Vec<u8>) {
        self.line(node.level, format_args!("{} {}", node.type_name, node.name));
        self.line(node.level, format_args!("int size = {}", data.len()));
    }

    fn begin_array(&mut self, node: &TypeTreeNode, count: usize) {
        self.line(node.level, format_args!("{} {}", node.type_name, node.name));
        self.line(node.level + 1, format_args!("Array Array"));
        self.line(node.level + 1, format_args!("int size = {count}"));
    }

    fn element(&mut self, node: &TypeTreeNode, index: usize) {
        self.line(node.level + 2, format_args!("[{index}]"));
    }

    fn end_array(&mut self, _: &TypeTreeNode, _: Vec<()>) {}

    fn begin_map(&mut self, node: &TypeTreeNode, count: usize) {
        self.begin_array(node, count);
    }

    fn pair(&mut self, node: &TypeTreeNode, index: usize) {
        self.line(node.level + 2, format_args!("[{index}]"));
        self.line(node.level + 2, format_args!("pair data"));
    }

    fn end_map(&mut self, _: &TypeTreeNode, _: Vec<((), ())>) {}

    fn begin_record(&mut self, node: &TypeTreeNode) {
        self.line(node.level, format_args!("{} {}", node.type_name, node.name));
    }

    fn end_record(&mut self, _: &TypeTreeNode, _: Vec<(&str, ())>) {}
}

struct DisplayScalar<'a>(&'a Value);

impl std::fmt::Display for DisplayScalar<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Value::I8(v)  => write!(f, "{v}"),
            Value::U8(v)  => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            other         => write!(f, "{other:?}"),
        }
    }
}

// ── Entry points ─────────────────────────────────────────────────────────────

fn run<R, V>(tree: &TypeTree, reader: &mut EndianReader<R>, expected_size: Option<u64>, v: &mut V) -> Result<(Vec<V::Out>, u64, Option<SchemaMismatch>)>
where
    R: Read + Seek,
    V: Visitor,
{
    let start = reader.position()?;
    let mut outs = Vec::with_capacity(tree.roots().len());
    for root in tree.roots() {
        outs.push(decode_node(root, reader, v)?);
    }
    let consumed = reader.position()? - start;

    let mismatch = expected_size
        .filter(|&expected| expected != consumed)
        .map(|expected| SchemaMismatch { expected, consumed });
    if let Some(m) = mismatch {
        warn!("type tree read {} bytes but {} were expected", m.consumed, m.expected);
    }
    Ok((outs, consumed, mismatch))
}

/// Decode a value starting at the reader's position.
///
/// A single-root schema yields the root's value directly; several roots are
/// gathered into a record keyed by root name.  When `expected_size` is given
/// and differs from the bytes consumed, the result carries a
/// [`SchemaMismatch`] but is still returned.
pub fn read_value<R: Read + Seek>(tree: &TypeTree, reader: &mut EndianReader<R>, expected_size: Option<u64>) -> Result<Decoded<Value>> {
    let (mut outs, consumed, mismatch) = run(tree, reader, expected_size, &mut ValueBuilder)?;
    let value = if outs.len() == 1 {
        outs.remove(0)
    } else {
        Value::Record(tree.roots().iter().map(|r| r.name().to_owned()).zip(outs).collect())
    };
    Ok(Decoded { value, consumed, mismatch })
}

/// Render the tab-indented `Type Name = value` dump.
pub fn read_dump<R: Read + Seek>(tree: &TypeTree, reader: &mut EndianReader<R>, expected_size: Option<u64>) -> Result<Decoded<String>> {
    let mut dump = TextDump { out: String::new() };
    let (_, consumed, mismatch) = run(tree, reader, expected_size, &mut dump)?;
    Ok(Decoded { value: dump.out, consumed, mismatch })
}
