//! Eagerly read built-in classes.  Each reader starts from the object's
//! first byte and stops after the fields it exposes; the rest of the object
//! stays available through the schema-driven views.

use serde::Serialize;

use crate::error::Result;
use crate::object::{ObjectRef, ObjectReader, PPtr};
use crate::version::BuildTarget;

/// Common prefix of every object: editor builds store hide flags first.
fn read_object_header(r: &mut ObjectReader) -> Result<()> {
    r.reset()?;
    if r.platform == BuildTarget::NO_TARGET {
        r.read_u32()?; // m_ObjectHideFlags
    }
    Ok(())
}

// ── Scene graph ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct GameObject {
    pub name:       String,
    pub layer:      i32,
    pub components: Vec<PPtr>,
    /// Filled by the linking pass: first component of each kind found.
    pub transform:             Option<ObjectRef>,
    pub mesh_renderer:         Option<ObjectRef>,
    pub mesh_filter:           Option<ObjectRef>,
    pub skinned_mesh_renderer: Option<ObjectRef>,
    pub animator:              Option<ObjectRef>,
    pub animation:             Option<ObjectRef>,
}

impl GameObject {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        read_object_header(r)?;
        let count = r.read_count()?;
        let mut components = Vec::with_capacity(count.min(256));
        let old_layout = !r.version.at_least(5, 5, 0);
        for _ in 0..count {
            if old_layout {
                r.read_i32()?; // class id
            }
            components.push(r.read_pptr()?);
        }
        let layer = r.read_i32()?;
        let name = r.read_aligned_string()?;
        Ok(Self { name, layer, components, ..Default::default() })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Component {
    pub game_object: PPtr,
}

impl Component {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        read_object_header(r)?;
        Ok(Self { game_object: r.read_pptr()? })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Behaviour {
    pub component: Component,
    pub enabled:   bool,
}

impl Behaviour {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let component = Component::read(r)?;
        let enabled = r.read_bool()?;
        r.align(4)?;
        Ok(Self { component, enabled })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Transform {
    pub component:      Component,
    pub local_rotation: [f32; 4],
    pub local_position: [f32; 3],
    pub local_scale:    [f32; 3],
    pub children:       Vec<PPtr>,
    pub father:         PPtr,
}

impl Transform {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let component = Component::read(r)?;
        let local_rotation = r.read_f32_array::<4>()?;
        let local_position = r.read_f32_array::<3>()?;
        let local_scale = r.read_f32_array::<3>()?;
        let children = r.read_pptr_array()?;
        let father = r.read_pptr()?;
        Ok(Self { component, local_rotation, local_position, local_scale, children, father })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MeshFilter {
    pub component: Component,
    pub mesh:      PPtr,
}

impl MeshFilter {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let component = Component::read(r)?;
        Ok(Self { component, mesh: r.read_pptr()? })
    }
}

// ── Scripts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonoBehaviour {
    pub behaviour: Behaviour,
    pub script:    PPtr,
    pub name:      String,
}

impl MonoBehaviour {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let behaviour = Behaviour::read(r)?;
        let script = r.read_pptr()?;
        let name = r.read_aligned_string()?;
        Ok(Self { behaviour, script, name })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NamedObject {
    pub name: String,
}

impl NamedObject {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        read_object_header(r)?;
        Ok(Self { name: r.read_aligned_string()? })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MonoScript {
    pub named:           NamedObject,
    pub execution_order: i32,
    /// Hex of the properties hash (4 bytes before 5.0, 16 after).
    pub properties_hash: String,
    pub path_name:       String,
    pub class_name:      String,
    pub namespace:       String,
    pub assembly_name:   String,
    pub is_editor_script: bool,
}

impl MonoScript {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let named = NamedObject::read(r)?;
        let mut script = MonoScript { named, ..Default::default() };
        let v = r.version.clone();

        if v.at_least(3, 4, 0) {
            script.execution_order = r.read_i32()?;
        }
        script.properties_hash = if v.major() < 5 {
            hex::encode(r.read_u32()?.to_le_bytes())
        } else {
            hex::encode(r.read_hash128()?)
        };
        if v.major() < 3 {
            script.path_name = r.read_aligned_string()?;
        }
        script.class_name = r.read_aligned_string()?;
        if v.major() >= 3 {
            script.namespace = r.read_aligned_string()?;
        }
        script.assembly_name = r.read_aligned_string()?;
        if !v.at_least(2018, 2, 0) {
            script.is_editor_script = r.read_bool()?;
        }
        Ok(script)
    }

    /// `Namespace.ClassName`, or just the class name without a namespace.
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.namespace, self.class_name)
        }
    }
}

// ── Assets ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TextAsset {
    pub named:  NamedObject,
    pub script: Vec<u8>,
}

impl TextAsset {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let named = NamedObject::read(r)?;
        let len = r.read_count()?;
        let script = r.read_bytes(len as u64)?;
        r.align(4)?;
        Ok(Self { named, script })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Sprite {
    pub named:           NamedObject,
    pub rect:            [f32; 4],
    pub offset:          [f32; 2],
    pub border:          [f32; 4],
    pub pixels_to_units: f32,
    pub pivot:           [f32; 2],
    pub extrude:         u32,
    pub is_polygon:      bool,
    pub render_data_key: Option<(uuid::Uuid, i64)>,
    pub atlas_tags:      Vec<String>,
    /// Atlas pointer stored in the file (2017.1 and later).
    pub sprite_atlas:    PPtr,
    /// Atlas back-filled by the linking pass when the stored pointer is null.
    pub linked_atlas:    Option<ObjectRef>,
}

impl Sprite {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let named = NamedObject::read(r)?;
        let mut sprite = Sprite { named, pivot: [0.5, 0.5], ..Default::default() };
        let v = r.version.clone();

        sprite.rect = r.read_f32_array::<4>()?;
        sprite.offset = r.read_f32_array::<2>()?;
        if v.at_least(4, 5, 0) {
            sprite.border = r.read_f32_array::<4>()?;
        }
        sprite.pixels_to_units = r.read_f32()?;
        if v.at_least(5, 4, 2) {
            sprite.pivot = r.read_f32_array::<2>()?;
        }
        sprite.extrude = r.read_u32()?;
        if v.at_least(5, 3, 0) {
            sprite.is_polygon = r.read_bool()?;
            r.align(4)?;
        }
        if v.at_least(2017, 0, 0) {
            let guid = r.read_guid()?;
            let second = r.read_i64()?;
            sprite.render_data_key = Some((guid, second));
            sprite.atlas_tags = r.read_string_array()?;
            sprite.sprite_atlas = r.read_pptr()?;
        }
        Ok(sprite)
    }

    /// Whether the linking pass may assign an atlas.
    pub fn atlas_unset(&self) -> bool {
        self.sprite_atlas.is_null() && self.linked_atlas.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SpriteAtlas {
    pub named:               NamedObject,
    pub packed_sprites:      Vec<PPtr>,
    pub packed_sprite_names: Vec<String>,
}

impl SpriteAtlas {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let named = NamedObject::read(r)?;
        let packed_sprites = r.read_pptr_array()?;
        let packed_sprite_names = r.read_string_array()?;
        Ok(Self { named, packed_sprites, packed_sprite_names })
    }
}

// ── Asset tables ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AssetInfo {
    pub preload_index: i32,
    pub preload_size:  i32,
    pub asset:         PPtr,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetBundle {
    pub named:         NamedObject,
    pub preload_table: Vec<PPtr>,
    /// Container path → asset, in file order.  Paths may repeat.
    pub container:     Vec<(String, AssetInfo)>,
}

impl AssetBundle {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        let named = NamedObject::read(r)?;
        let preload_table = r.read_pptr_array()?;
        let count = r.read_count()?;
        let mut container = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let path = r.read_aligned_string()?;
            let info = AssetInfo {
                preload_index: r.read_i32()?,
                preload_size:  r.read_i32()?,
                asset:         r.read_pptr()?,
            };
            container.push((path, info));
        }
        Ok(Self { named, preload_table, container })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceManager {
    pub container: Vec<(String, PPtr)>,
}

impl ResourceManager {
    pub(crate) fn read(r: &mut ObjectReader) -> Result<Self> {
        read_object_header(r)?;
        let count = r.read_count()?;
        let mut container = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let path = r.read_aligned_string()?;
            container.push((path, r.read_pptr()?));
        }
        Ok(Self { container })
    }
}
