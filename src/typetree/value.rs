//! Generic value tree produced by the schema decoder.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A decoded value.  `Map` keeps every pair in on-disk order; duplicate keys
/// are preserved because consumers may rely on later pairs shadowing
/// earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    /// `TypelessData`, or a `string` field that is not valid UTF-8.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Record(Fields),
}

impl Value {
    /// Field of a record by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Any integer variant widened to `i64`.  `U64` values above `i64::MAX`
    /// do not fit and yield `None`.
    pub fn as_i64(&self) -> Option<i64> {
        Some(match *self {
            Value::I8(v)  => v as i64,
            Value::U8(v)  => v as i64,
            Value::I16(v) => v as i64,
            Value::U16(v) => v as i64,
            Value::I32(v) => v as i64,
            Value::U32(v) => v as i64,
            Value::I64(v) => v,
            Value::U64(v) => return i64::try_from(v).ok(),
            _ => return None,
        })
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U64(v) => Some(v),
            _ => self.as_i64().and_then(|v| u64::try_from(v).ok()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v as f64),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_pairs(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Fields> {
        match self {
            Value::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ── Fields ───────────────────────────────────────────────────────────────────

/// Order-preserving name → value mapping.  Re-inserting an existing name
/// replaces the value in its original position.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, Value)>,
    index:   HashMap<String, usize>,
}

impl Fields {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(n: usize) -> Self {
        Self { entries: Vec::with_capacity(n), index: HashMap::with_capacity(n) }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

// The index is derived from the entries.
impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool { self.entries == other.entries }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Fields {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut fields = Fields::with_capacity(iter.size_hint().0);
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

// ── Serialization ────────────────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v)   => serializer.serialize_bool(*v),
            Value::I8(v)     => serializer.serialize_i8(*v),
            Value::U8(v)     => serializer.serialize_u8(*v),
            Value::I16(v)    => serializer.serialize_i16(*v),
            Value::U16(v)    => serializer.serialize_u16(*v),
            Value::I32(v)    => serializer.serialize_i32(*v),
            Value::U32(v)    => serializer.serialize_u32(*v),
            Value::I64(v)    => serializer.serialize_i64(*v),
            Value::U64(v)    => serializer.serialize_u64(*v),
            Value::F32(v)    => serializer.serialize_f32(*v),
            Value::F64(v)    => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b)  => {
                let mut seq = serializer.serialize_seq(Some(b.len()))?;
                for byte in b {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            // Keys may repeat or be records, so pairs stay a sequence.
            Value::Map(pairs) => {
                let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                for (k, v) in pairs {
                    seq.serialize_element(&(k, v))?;
                }
                seq.end()
            }
            Value::Record(fields) => fields.serialize(serializer),
        }
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reinsert_replaces_in_place() {
        let mut fields: Fields = [("a", Value::I32(1)), ("b", Value::I32(2))].into_iter().collect();
        fields.insert("a", Value::I32(3));
        fields.insert("c", Value::I32(4));

        assert_eq!(fields.names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert_eq!(fields.get("a"), Some(&Value::I32(3)));
        assert_eq!(fields.get("missing"), None);
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn many_fields_keep_order() {
        let fields: Fields = (0..5_000).map(|i| (format!("f{i}"), Value::I32(i))).collect();
        assert_eq!(fields.len(), 5_000);
        assert_eq!(fields.get("f4999"), Some(&Value::I32(4999)));
        assert_eq!(fields.iter().nth(17).map(|(k, _)| k), Some("f17"));
    }
}
