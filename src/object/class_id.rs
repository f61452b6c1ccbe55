//! Built-in class ids.

macro_rules! class_ids {
    ($($name:ident = $id:expr,)*) => {
        /// Closed set of engine class ids.  Ids outside the table resolve to
        /// [`ClassId::UnknownType`]; the raw id stays on the object handle.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ClassId {
            UnknownType,
            $($name,)*
        }

        impl ClassId {
            pub fn from_raw(id: i32) -> ClassId {
                match id {
                    $($id => ClassId::$name,)*
                    _ => ClassId::UnknownType,
                }
            }

            /// Raw id, `-1` for [`ClassId::UnknownType`].
            pub fn raw(self) -> i32 {
                match self {
                    ClassId::UnknownType => -1,
                    $(ClassId::$name => $id,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    ClassId::UnknownType => "UnknownType",
                    $(ClassId::$name => stringify!($name),)*
                }
            }
        }
    };
}

class_ids! {
    Object = 0,
    GameObject = 1,
    Component = 2,
    Transform = 4,
    Material = 21,
    MeshRenderer = 23,
    Texture2D = 28,
    MeshFilter = 33,
    Mesh = 43,
    Shader = 48,
    TextAsset = 49,
    Texture = 27,
    AnimationClip = 74,
    AudioClip = 83,
    RenderTexture = 84,
    Cubemap = 89,
    Avatar = 90,
    AnimatorController = 91,
    RuntimeAnimatorController = 93,
    Animator = 95,
    RenderSettings = 104,
    Light = 108,
    Animation = 111,
    MonoBehaviour = 114,
    MonoScript = 115,
    Font = 128,
    PlayerSettings = 129,
    SkinnedMeshRenderer = 137,
    AssetBundle = 142,
    ResourceManager = 147,
    MovieTexture = 152,
    TerrainData = 156,
    AudioMixer = 240,
    Sprite = 213,
    AnimatorOverrideController = 221,
    RectTransform = 224,
    Canvas = 223,
    SpriteAtlas = 687078895,
    VideoClip = 329,
    ShaderVariantCollection = 200,
    PreloadData = 150,
}

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
