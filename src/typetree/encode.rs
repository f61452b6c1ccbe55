//! Value tree encoder: the inverse of [`read_value`](super::read_value).
//!
//! Alignment padding is computed relative to the start of the output
//! buffer, so the bytes decode back identically when placed at any 4-byte
//! aligned offset.

use std::io::Write;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::endian::Endian;
use crate::error::{Error, Result};
use crate::typetree::{PrimitiveKind, SchemaNode, Shape, TypeTree, Value};

/// Encode `value` against `tree` in the given byte order.
///
/// `value` must have the shape [`read_value`](super::read_value) produces
/// for the same schema: the root's own value for a single-root schema, a
/// record keyed by root name otherwise.
pub fn write_value(tree: &TypeTree, value: &Value, endian: Endian) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match tree.roots() {
        [root] => encode(root, value, endian, &mut out)?,
        roots => {
            for root in roots {
                let field = value
                    .get(root.name())
                    .ok_or_else(|| Error::malformed(format!("missing root field {:?}", root.name())))?;
                encode(root, field, endian, &mut out)?;
            }
        }
    }
    Ok(out)
}

fn encode(node: &SchemaNode, value: &Value, endian: Endian, out: &mut Vec<u8>) -> Result<()> {
    match (&node.shape, value) {
        (Shape::Primitive(kind), v) => write_primitive(*kind, v, endian, out)
            .ok_or_else(|| mismatch(node, value))??,
        (Shape::String, Value::String(s)) => {
            write_len(s.len(), endian, out)?;
            out.write_all(s.as_bytes())?;
            pad(out);
        }
        (Shape::String, Value::Bytes(b)) => {
            write_len(b.len(), endian, out)?;
            out.write_all(b)?;
            pad(out);
        }
        (Shape::TypelessData, Value::Bytes(b)) => {
            write_len(b.len(), endian, out)?;
            out.write_all(b)?;
        }
        (Shape::Map { first, second }, Value::Map(pairs)) => {
            write_len(pairs.len(), endian, out)?;
            for (k, v) in pairs {
                encode(first, k, endian, out)?;
                encode(second, v, endian, out)?;
            }
        }
        (Shape::Array { item }, Value::Array(items)) => {
            write_len(items.len(), endian, out)?;
            for v in items {
                encode(item, v, endian, out)?;
            }
        }
        (Shape::Record(children), Value::Record(fields)) => {
            for child in children {
                let v = fields
                    .get(child.name())
                    .ok_or_else(|| Error::malformed(format!("missing field {:?}", child.name())))?;
                encode(child, v, endian, out)?;
            }
        }
        _ => return Err(mismatch(node, value)),
    }
    if node.align {
        pad(out);
    }
    Ok(())
}

fn mismatch(node: &SchemaNode, value: &Value) -> Error {
    Error::malformed(format!(
        "value {:?} does not fit {} {}",
        std::mem::discriminant(value),
        node.type_name(),
        node.name()
    ))
}

fn pad(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn write_len(len: usize, endian: Endian, out: &mut Vec<u8>) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| Error::malformed(format!("length {len} exceeds i32")))?;
    Ok(match endian {
        Endian::Big    => out.write_i32::<BigEndian>(len)?,
        Endian::Little => out.write_i32::<LittleEndian>(len)?,
    })
}

macro_rules! put {
    ($out:expr, $endian:expr, $method:ident, $v:expr) => {
        match $endian {
            Endian::Big    => $out.$method::<BigEndian>($v),
            Endian::Little => $out.$method::<LittleEndian>($v),
        }
    };
}

/// `None` when the value variant does not match the primitive kind.
fn write_primitive(kind: PrimitiveKind, value: &Value, endian: Endian, out: &mut Vec<u8>) -> Option<Result<()>> {
    let res = match (kind, value) {
        (PrimitiveKind::I8, Value::I8(v))     => out.write_i8(*v),
        (PrimitiveKind::U8, Value::U8(v))     => out.write_u8(*v),
        (PrimitiveKind::Bool, Value::Bool(v)) => out.write_u8(u8::from(*v)),
        (PrimitiveKind::I16, Value::I16(v))   => put!(out, endian, write_i16, *v),
        (PrimitiveKind::U16, Value::U16(v))   => put!(out, endian, write_u16, *v),
        (PrimitiveKind::I32, Value::I32(v))   => put!(out, endian, write_i32, *v),
        (PrimitiveKind::U32, Value::U32(v))   => put!(out, endian, write_u32, *v),
        (PrimitiveKind::I64, Value::I64(v))   => put!(out, endian, write_i64, *v),
        (PrimitiveKind::U64, Value::U64(v))   => put!(out, endian, write_u64, *v),
        (PrimitiveKind::F32, Value::F32(v))   => put!(out, endian, write_f32, *v),
        (PrimitiveKind::F64, Value::F64(v))   => put!(out, endian, write_f64, *v),
        _ => return None,
    };
    Some(res.map_err(Error::from))
}
