//! Externally supplied schemas.
//!
//! Script-backed objects often ship without an embedded type tree.  A
//! [`SchemaSource`] fills that gap, typically from reflection over the
//! game's assemblies; the decoder only needs the node list it returns.

use std::collections::HashMap;
use std::sync::Arc;

use crate::object::{MonoScript, Object};
use crate::typetree::TypeTree;

pub trait SchemaSource: Send + Sync {
    /// Schema for `object`.  `script` is the resolved `m_Script` of a
    /// script-backed object, when it could be found.
    fn schema_for(&self, object: &Object, script: Option<&MonoScript>) -> Option<Arc<TypeTree>>;
}

/// Schemas registered by script class name (`Namespace.Class`).
#[derive(Debug, Clone, Default)]
pub struct ScriptSchemas {
    by_class: HashMap<String, Arc<TypeTree>>,
}

impl ScriptSchemas {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, full_class_name: impl Into<String>, tree: TypeTree) {
        self.by_class.insert(full_class_name.into(), Arc::new(tree));
    }

    pub fn len(&self) -> usize { self.by_class.len() }

    pub fn is_empty(&self) -> bool { self.by_class.is_empty() }
}

impl SchemaSource for ScriptSchemas {
    fn schema_for(&self, _object: &Object, script: Option<&MonoScript>) -> Option<Arc<TypeTree>> {
        self.by_class.get(&script?.full_name()).cloned()
    }
}
