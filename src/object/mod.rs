//! Object handles and typed objects.
//!
//! An [`ObjectReader`] binds one directory entry to a cursor over its
//! container's byte arena.  Each handle owns its cursor, so decoding two
//! handles of the same container never interferes; [`ObjectReader::duplicate`]
//! produces a further independent cursor at the current position.

mod class_id;
mod classes;
mod pptr;

pub use class_id::ClassId;
pub use classes::{
    AssetBundle, AssetInfo, Behaviour, Component, GameObject, MeshFilter, MonoBehaviour, MonoScript,
    NamedObject, ResourceManager, Sprite, SpriteAtlas, TextAsset, Transform,
};
pub use pptr::PPtr;

use std::io::Cursor;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::Serialize;

use crate::endian::EndianReader;
use crate::error::{Error, Result};
use crate::serialized::{ObjectInfo, SerializedFile};
use crate::typetree::{self, Decoded, TypeTree, Value};
use crate::version::{BuildTarget, UnityVersion};

/// Stable address of an object inside a session: the container's
/// registration index plus the path id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ObjectRef {
    pub file:    usize,
    pub path_id: i64,
}

// ── ObjectReader ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ObjectReader {
    reader:             EndianReader<Cursor<Arc<[u8]>>>,
    pub path_id:        i64,
    pub byte_start:     u64,
    pub byte_size:      u32,
    pub class_id:       ClassId,
    pub raw_class_id:   i32,
    pub script_type_index: i16,
    pub schema:         Option<Arc<TypeTree>>,
    pub version:        UnityVersion,
    pub format_version: u32,
    pub platform:       BuildTarget,
    /// File name of the owning container, for diagnostics.
    pub container:      String,
}

impl ObjectReader {
    pub fn new(file: &SerializedFile, info: &ObjectInfo) -> Result<Self> {
        let mut reader = EndianReader::new(Cursor::new(Arc::clone(file.data())), file.endian())?;
        reader.set_position(info.byte_start)?;
        let schema = file
            .serialized_type(info)
            .and_then(|t| t.type_tree.clone())
            .filter(|t| !t.is_empty());
        Ok(Self {
            reader,
            path_id:           info.path_id,
            byte_start:        info.byte_start,
            byte_size:         info.byte_size,
            class_id:          ClassId::from_raw(info.class_id),
            raw_class_id:      info.class_id,
            script_type_index: info.script_type_index,
            schema,
            version:           file.unity_version.clone(),
            format_version:    file.format_version(),
            platform:          file.target_platform,
            container:         file.file_name.clone(),
        })
    }

    /// Seek to the start of this object's bytes.
    pub fn reset(&mut self) -> Result<()> {
        self.reader.set_position(self.byte_start)
    }

    pub fn raw_bytes(&mut self) -> Result<Vec<u8>> {
        self.reset()?;
        self.reader.read_bytes(self.byte_size as u64)
    }

    /// An independent handle with its own cursor at the current position.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// `true` if the embedded schema has a member called `name`.
    pub fn has_member(&self, name: &str) -> bool {
        self.schema.as_ref().is_some_and(|t| t.has_member(name))
    }

    pub fn read_pptr(&mut self) -> Result<PPtr> {
        PPtr::read(&mut self.reader, self.format_version)
    }

    pub fn read_pptr_array(&mut self) -> Result<Vec<PPtr>> {
        PPtr::read_array(&mut self.reader, self.format_version)
    }

    // ── Schema-driven views ──────────────────────────────────────────────────

    /// Text dump against the embedded schema, `None` without one.
    pub fn dump(&mut self) -> Result<Option<String>> {
        match self.schema.clone() {
            Some(tree) => self.dump_with(&tree).map(Some),
            None => Ok(None),
        }
    }

    /// Value tree against the embedded schema, `None` without one.
    pub fn to_value_tree(&mut self) -> Result<Option<Value>> {
        match self.schema.clone() {
            Some(tree) => self.to_value_tree_with(&tree).map(Some),
            None => Ok(None),
        }
    }

    pub fn dump_with(&mut self, tree: &TypeTree) -> Result<String> {
        self.reset()?;
        Ok(typetree::read_dump(tree, &mut self.reader, Some(self.byte_size as u64))?.value)
    }

    /// The root's fields.  A root that is not itself a record is wrapped as
    /// a one-field record under its own name.
    pub fn to_value_tree_with(&mut self, tree: &TypeTree) -> Result<Value> {
        let decoded = self.decode_with(tree)?;
        Ok(match decoded.value {
            Value::Record(_) => decoded.value,
            other => {
                let name = tree.root().map(|r| r.name().to_owned()).unwrap_or_default();
                Value::Record([(name, other)].into_iter().collect())
            }
        })
    }

    /// Decode against `tree`, keeping the byte accounting.
    pub fn decode_with(&mut self, tree: &TypeTree) -> Result<Decoded<Value>> {
        if tree.is_empty() {
            return Err(Error::NoSchema { path_id: self.path_id });
        }
        self.reset()?;
        typetree::read_value(tree, &mut self.reader, Some(self.byte_size as u64))
    }
}

impl Deref for ObjectReader {
    type Target = EndianReader<Cursor<Arc<[u8]>>>;
    fn deref(&self) -> &Self::Target { &self.reader }
}

impl DerefMut for ObjectReader {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.reader }
}

// ── Object ───────────────────────────────────────────────────────────────────

/// Typed view over a handle.  Built-in classes read their leading fields
/// eagerly; everything else is [`ObjectKind::Generic`].
#[derive(Debug, Clone)]
pub enum ObjectKind {
    GameObject(GameObject),
    Transform(Transform),
    RectTransform(Transform),
    MeshFilter(MeshFilter),
    MeshRenderer(Component),
    SkinnedMeshRenderer(Component),
    Animator(Behaviour),
    Animation(Behaviour),
    MonoBehaviour(MonoBehaviour),
    MonoScript(MonoScript),
    TextAsset(TextAsset),
    Sprite(Sprite),
    SpriteAtlas(SpriteAtlas),
    AssetBundle(AssetBundle),
    ResourceManager(ResourceManager),
    Named(NamedObject),
    Generic,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub reader: ObjectReader,
    pub kind:   ObjectKind,
}

impl Object {
    /// Dispatch on class id and read the typed fields.
    pub fn read(mut reader: ObjectReader) -> Result<Self> {
        let kind = match reader.class_id {
            ClassId::GameObject          => ObjectKind::GameObject(GameObject::read(&mut reader)?),
            ClassId::Transform           => ObjectKind::Transform(Transform::read(&mut reader)?),
            ClassId::RectTransform       => ObjectKind::RectTransform(Transform::read(&mut reader)?),
            ClassId::MeshFilter          => ObjectKind::MeshFilter(MeshFilter::read(&mut reader)?),
            ClassId::MeshRenderer        => ObjectKind::MeshRenderer(Component::read(&mut reader)?),
            ClassId::SkinnedMeshRenderer => ObjectKind::SkinnedMeshRenderer(Component::read(&mut reader)?),
            ClassId::Animator            => ObjectKind::Animator(Behaviour::read(&mut reader)?),
            ClassId::Animation           => ObjectKind::Animation(Behaviour::read(&mut reader)?),
            ClassId::MonoBehaviour       => ObjectKind::MonoBehaviour(MonoBehaviour::read(&mut reader)?),
            ClassId::MonoScript          => ObjectKind::MonoScript(MonoScript::read(&mut reader)?),
            ClassId::TextAsset           => ObjectKind::TextAsset(TextAsset::read(&mut reader)?),
            ClassId::Sprite              => ObjectKind::Sprite(Sprite::read(&mut reader)?),
            ClassId::SpriteAtlas         => ObjectKind::SpriteAtlas(SpriteAtlas::read(&mut reader)?),
            ClassId::AssetBundle         => ObjectKind::AssetBundle(AssetBundle::read(&mut reader)?),
            ClassId::ResourceManager     => ObjectKind::ResourceManager(ResourceManager::read(&mut reader)?),
            ClassId::Texture2D
            | ClassId::Mesh
            | ClassId::Material
            | ClassId::Shader
            | ClassId::AudioClip
            | ClassId::Font
            | ClassId::AnimationClip
            | ClassId::AnimatorController
            | ClassId::AnimatorOverrideController
            | ClassId::Avatar
            | ClassId::MovieTexture
            | ClassId::VideoClip         => ObjectKind::Named(NamedObject::read(&mut reader)?),
            _ => {
                reader.reset()?;
                ObjectKind::Generic
            }
        };
        Ok(Self { reader, kind })
    }

    pub fn path_id(&self) -> i64 { self.reader.path_id }

    pub fn class_id(&self) -> ClassId { self.reader.class_id }

    /// `m_Name` for classes that carry one.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ObjectKind::GameObject(o)    => Some(&o.name),
            ObjectKind::MonoBehaviour(o) => Some(&o.name),
            ObjectKind::MonoScript(o)    => Some(&o.named.name),
            ObjectKind::TextAsset(o)     => Some(&o.named.name),
            ObjectKind::Sprite(o)        => Some(&o.named.name),
            ObjectKind::SpriteAtlas(o)   => Some(&o.named.name),
            ObjectKind::AssetBundle(o)   => Some(&o.named.name),
            ObjectKind::Named(o)         => Some(&o.name),
            _ => None,
        }
    }

    pub fn as_game_object(&self) -> Option<&GameObject> {
        match &self.kind {
            ObjectKind::GameObject(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_sprite(&self) -> Option<&Sprite> {
        match &self.kind {
            ObjectKind::Sprite(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_sprite_atlas(&self) -> Option<&SpriteAtlas> {
        match &self.kind {
            ObjectKind::SpriteAtlas(o) => Some(o),
            _ => None,
        }
    }

    /// The owning game object pointer, for component classes.
    pub fn game_object(&self) -> Option<PPtr> {
        match &self.kind {
            ObjectKind::Transform(t) | ObjectKind::RectTransform(t) => Some(t.component.game_object),
            ObjectKind::MeshFilter(m) => Some(m.component.game_object),
            ObjectKind::MeshRenderer(c) | ObjectKind::SkinnedMeshRenderer(c) => Some(c.game_object),
            ObjectKind::Animator(b) | ObjectKind::Animation(b) => Some(b.component.game_object),
            ObjectKind::MonoBehaviour(m) => Some(m.behaviour.component.game_object),
            _ => None,
        }
    }
}
