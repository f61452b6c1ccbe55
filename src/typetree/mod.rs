//! Type trees: flattened schemas describing an object's on-disk layout.
//!
//! A schema arrives as an ordered list of [`TypeTreeNode`]s where nesting is
//! encoded by `level`: the descendants of a node are the run of following
//! nodes with a strictly greater level.  [`TypeTree::from_nodes`] turns that
//! list into an explicit tree once, classifying every node into a [`Shape`]
//! so the decoder is a plain structural recursion.
//!
//! Classification is by shape, not by name allow-list: any node whose first
//! child is named `Array` is a dynamic sequence, anything else that is not a
//! primitive, `string`, `TypelessData` or `map` is a record.  User-defined
//! script types therefore decode without being known in advance.

mod decode;
mod encode;
mod strings;
mod value;

pub use decode::{read_dump, read_value, Decoded, SchemaMismatch};
pub use encode::write_value;
pub use strings::{common_offset, common_string};
pub use value::{Fields, Value};

/// Meta-flag bit requesting 4-byte alignment after the value.
pub const ALIGN_FLAG: i32 = 0x4000;

// ── Flat nodes ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTreeNode {
    pub type_name:       String,
    pub name:            String,
    pub byte_size:       i32,
    pub index:           i32,
    pub type_flags:      i32,
    pub version:         i32,
    pub meta_flag:       i32,
    pub level:           i32,
    pub type_str_offset: u32,
    pub name_str_offset: u32,
    pub ref_type_hash:   u64,
}

impl TypeTreeNode {
    pub fn new(level: i32, type_name: &str, name: &str) -> Self {
        Self {
            type_name: type_name.to_owned(),
            name:      name.to_owned(),
            level,
            ..Default::default()
        }
    }

    pub fn aligned(mut self) -> Self {
        self.meta_flag |= ALIGN_FLAG;
        self
    }

    pub fn is_aligned(&self) -> bool {
        self.meta_flag & ALIGN_FLAG != 0
    }
}

// ── Shapes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Bool,
}

impl PrimitiveKind {
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "SInt8"                                        => PrimitiveKind::I8,
            "UInt8" | "char"                               => PrimitiveKind::U8,
            "SInt16" | "short"                             => PrimitiveKind::I16,
            "UInt16" | "unsigned short"                    => PrimitiveKind::U16,
            "SInt32" | "int"                               => PrimitiveKind::I32,
            "UInt32" | "unsigned int" | "Type*"            => PrimitiveKind::U32,
            "SInt64" | "long long"                         => PrimitiveKind::I64,
            "UInt64" | "unsigned long long" | "FileSize"   => PrimitiveKind::U64,
            "float"                                        => PrimitiveKind::F32,
            "double"                                       => PrimitiveKind::F64,
            "bool"                                         => PrimitiveKind::Bool,
            _ => return None,
        })
    }

    /// Encoded width in bytes.
    pub fn width(self) -> u64 {
        match self {
            PrimitiveKind::I8 | PrimitiveKind::U8 | PrimitiveKind::Bool => 1,
            PrimitiveKind::I16 | PrimitiveKind::U16                     => 2,
            PrimitiveKind::I32 | PrimitiveKind::U32 | PrimitiveKind::F32 => 4,
            PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::F64 => 8,
        }
    }
}

/// Syntactic shape of a schema node, fixed when the tree is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Primitive(PrimitiveKind),
    String,
    TypelessData,
    Map { first: Box<SchemaNode>, second: Box<SchemaNode> },
    Array { item: Box<SchemaNode> },
    Record(Vec<SchemaNode>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub node:  TypeTreeNode,
    pub shape: Shape,
    /// Align the cursor to 4 bytes after this value.  For strings, maps and
    /// arrays the flag on the inner `Array` node counts as well.
    pub align: bool,
}

impl SchemaNode {
    pub fn name(&self) -> &str { &self.node.name }
    pub fn type_name(&self) -> &str { &self.node.type_name }
    pub fn level(&self) -> i32 { self.node.level }

    /// Fewest bytes one value of this node can occupy, ignoring alignment.
    /// Zero for records with no fields.
    pub fn min_size(&self) -> u64 {
        match &self.shape {
            Shape::Primitive(kind) => kind.width(),
            Shape::String | Shape::TypelessData | Shape::Map { .. } | Shape::Array { .. } => 4,
            Shape::Record(children) => children.iter().map(SchemaNode::min_size).sum(),
        }
    }
}

// ── TypeTree ─────────────────────────────────────────────────────────────────

/// A schema in both forms: the flat node list as read from disk and the
/// tree built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTree {
    nodes: Vec<TypeTreeNode>,
    roots: Vec<SchemaNode>,
}

impl TypeTree {
    pub fn from_nodes(nodes: Vec<TypeTreeNode>) -> Self {
        let mut roots = Vec::new();
        let mut i = 0;
        while i < nodes.len() {
            let end = subtree_end(&nodes, i);
            roots.push(build(&nodes, i, end));
            i = end;
        }
        Self { nodes, roots }
    }

    /// The flat node list, in on-disk order.
    pub fn nodes(&self) -> &[TypeTreeNode] { &self.nodes }

    pub fn roots(&self) -> &[SchemaNode] { &self.roots }

    pub fn root(&self) -> Option<&SchemaNode> { self.roots.first() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// `true` if any node in the schema carries `name`.
    pub fn has_member(&self, name: &str) -> bool {
        self.nodes.iter().any(|n| n.name == name)
    }
}

/// Index one past the last descendant of `nodes[start]`.
fn subtree_end(nodes: &[TypeTreeNode], start: usize) -> usize {
    let level = nodes[start].level;
    nodes[start + 1..]
        .iter()
        .position(|n| n.level <= level)
        .map_or(nodes.len(), |p| start + 1 + p)
}

/// Start indices of the direct children of `nodes[start]` within `..end`.
fn child_ranges(nodes: &[TypeTreeNode], start: usize, end: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut i = start + 1;
    while i < end {
        let e = subtree_end(nodes, i).min(end);
        out.push((i, e));
        i = e;
    }
    out
}

fn build(nodes: &[TypeTreeNode], start: usize, end: usize) -> SchemaNode {
    let node = nodes[start].clone();
    let children = child_ranges(nodes, start, end);
    let own_align = node.is_aligned();

    if let Some(kind) = PrimitiveKind::from_type_name(&node.type_name) {
        return SchemaNode { node, shape: Shape::Primitive(kind), align: own_align };
    }

    let array_child = children
        .first()
        .filter(|&&(s, _)| nodes[s].type_name == "Array")
        .copied();
    let array_align = array_child.is_some_and(|(s, _)| nodes[s].is_aligned());

    match node.type_name.as_str() {
        "string" => {
            return SchemaNode { node, shape: Shape::String, align: own_align || array_align };
        }
        "TypelessData" => {
            return SchemaNode { node, shape: Shape::TypelessData, align: own_align };
        }
        "map" => {
            if let Some((first, second)) = array_child.and_then(|(s, e)| map_entries(nodes, s, e)) {
                return SchemaNode {
                    node,
                    shape: Shape::Map { first: Box::new(first), second: Box::new(second) },
                    align: own_align || array_align,
                };
            }
        }
        _ => {}
    }

    // Dynamic sequence: [outer, Array, size, item].
    if let Some((s, e)) = array_child {
        let inner = child_ranges(nodes, s, e);
        if let Some(&(is, ie)) = inner.get(1) {
            return SchemaNode {
                node,
                shape: Shape::Array { item: Box::new(build(nodes, is, ie)) },
                align: own_align || array_align,
            };
        }
    }

    let fields = children.into_iter().map(|(s, e)| build(nodes, s, e)).collect();
    SchemaNode { node, shape: Shape::Record(fields), align: own_align }
}

/// For a map's `Array` node: [Array, size, pair[first, second]].
fn map_entries(nodes: &[TypeTreeNode], start: usize, end: usize) -> Option<(SchemaNode, SchemaNode)> {
    let inner = child_ranges(nodes, start, end);
    let &(ps, pe) = inner.get(1)?;
    let pair = child_ranges(nodes, ps, pe);
    let (&(fs, fe), &(ss, se)) = (pair.first()?, pair.get(1)?);
    Some((build(nodes, fs, fe), build(nodes, ss, se)))
}
