//! Multi-file loading and cross-reference resolution.
//!
//! A [`Session`] owns every registry: the ordered list of loaded
//! containers, the case-insensitive container-name index and the raw
//! resource map.  There is no process-wide state; independent sessions can
//! coexist.
//!
//! Loading runs three passes on the caller's thread:
//!
//! 1. **Discovery**: a FIFO work queue seeded with the caller's paths.
//!    Each file is sniffed; containers are registered and their external
//!    files enqueued, archives are unpacked and their members registered
//!    from memory, anything else becomes a [`Resource`].  A file name is
//!    enqueued at most once, so reference cycles terminate.
//! 2. **Decoding**: every directory entry of every new container is built
//!    into a typed [`Object`].  Failures skip the single object.
//! 3. **Linking**: game objects cache their well-known components and
//!    sprite atlases back-fill their sprites, in registration order then
//!    directory order.
//!
//! Per-file and per-object failures never abort a load; they are returned
//! in the [`LoadReport`].

mod options;
mod report;
mod resource;
mod schema_source;
mod split;

pub use options::LoadOptions;
pub use report::{LoadFailure, LoadReport};
pub use resource::{Resource, StreamingInfo};
pub use schema_source::{SchemaSource, ScriptSchemas};
pub use split::{collapse_split_names, merge_split_assets};

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::bundle::{web::WebFile, BundleFile};
use crate::codec::{decompress_brotli, decompress_gzip};
use crate::error::{Error, Result};
use crate::object::{ClassId, Object, ObjectKind, ObjectReader, ObjectRef, PPtr};
use crate::parallel;
use crate::serialized::{file_name_of, is_serialized_file, SerializedFile};
use crate::sniff::FileType;
use crate::typetree::{TypeTree, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Discovering,
    Decoding,
    Linking,
    Ready,
}

/// A registered container together with its decoded objects.
pub struct LoadedFile {
    pub file:   SerializedFile,
    objects:    Vec<Object>,
    by_path_id: HashMap<i64, usize>,
}

impl LoadedFile {
    fn new(file: SerializedFile) -> Self {
        Self { file, objects: Vec::new(), by_path_id: HashMap::new() }
    }

    /// Successfully decoded objects, in directory order.
    pub fn objects(&self) -> &[Object] { &self.objects }

    pub fn object(&self, path_id: i64) -> Option<&Object> {
        self.by_path_id.get(&path_id).map(|&i| &self.objects[i])
    }

    fn object_mut(&mut self, path_id: i64) -> Option<&mut Object> {
        self.by_path_id.get(&path_id).map(|&i| &mut self.objects[i])
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── Session ──────────────────────────────────────────────────────────────────

pub struct Session {
    options:        LoadOptions,
    state:          LoadState,
    files:          Vec<LoadedFile>,
    file_index:     HashMap<String, usize>,
    /// Archive file name → first container unpacked from it.
    archive_index:  HashMap<String, usize>,
    resources:      HashMap<String, Resource>,
    schema_source:  Option<Box<dyn SchemaSource>>,
    report:         LoadReport,
    /// Index of the first container registered by the current load.
    first_new:      usize,
    // Discovery-only state, emptied after each load.
    queue:          VecDeque<PathBuf>,
    seen:           HashSet<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl Session {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            state:         LoadState::Idle,
            files:         Vec::new(),
            file_index:    HashMap::new(),
            archive_index: HashMap::new(),
            resources:     HashMap::new(),
            schema_source: None,
            report:        LoadReport::default(),
            first_new:     0,
            queue:         VecDeque::new(),
            seen:          HashSet::new(),
        }
    }

    pub fn options(&self) -> &LoadOptions { &self.options }

    pub fn state(&self) -> LoadState { self.state }

    /// Report of the most recent load.
    pub fn report(&self) -> &LoadReport { &self.report }

    pub fn set_schema_source(&mut self, source: impl SchemaSource + 'static) {
        self.schema_source = Some(Box::new(source));
    }

    // ── Entry points ─────────────────────────────────────────────────────────

    /// Load explicit files and everything they reference.
    pub fn load_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<LoadReport> {
        let mut paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        if self.options.merge_split_files {
            if let Some(dir) = paths.first().and_then(|p| p.parent()) {
                let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
                merge_split_assets(dir, false)?;
            }
            paths = collapse_split_names(paths);
        }
        self.run(paths)
    }

    /// Load every file under `dir`, recursively.
    pub fn load_folder(&mut self, dir: impl AsRef<Path>) -> Result<LoadReport> {
        let dir = dir.as_ref();
        if self.options.merge_split_files {
            merge_split_assets(dir, true)?;
        }
        let mut paths = split::list_files(dir, true)?;
        if self.options.merge_split_files {
            paths = collapse_split_names(paths);
        }
        self.run(paths)
    }

    /// Load a file that is already in memory.  `path` names it; externals
    /// of an in-memory container are not followed.
    pub fn load_memory(&mut self, path: impl Into<PathBuf>, data: impl Into<Arc<[u8]>>) -> LoadReport {
        let path = path.into();
        self.begin();
        self.seen.insert(key(&display_name(&path)));
        self.load_data(path, data.into(), None, None, false);
        self.finish()
    }

    fn run(&mut self, paths: Vec<PathBuf>) -> Result<LoadReport> {
        self.begin();
        // Every seed is loaded; names only gate dependency discovery.
        let mut seeded = HashSet::new();
        for path in paths {
            if seeded.insert(path.clone()) {
                self.seen.insert(key(&display_name(&path)));
                self.queue.push_back(path);
            }
        }
        while let Some(path) = self.queue.pop_front() {
            self.load_path(path);
        }
        Ok(self.finish())
    }

    fn begin(&mut self) {
        self.report = LoadReport::default();
        self.state = LoadState::Discovering;
        self.first_new = self.files.len();
    }

    fn finish(&mut self) -> LoadReport {
        self.queue.clear();
        self.seen.clear();

        self.state = LoadState::Decoding;
        self.decode_new();

        self.state = LoadState::Linking;
        self.link();

        self.report.containers = self.files.len() - self.first_new;
        self.state = LoadState::Ready;
        info!(
            "loaded {} container(s), {} object(s), {} resource(s); {} failure(s)",
            self.report.containers,
            self.report.objects,
            self.report.resources,
            self.report.failure_count()
        );
        self.report.clone()
    }

    /// Release every container and resource and return to `Idle`.
    pub fn clear(&mut self) {
        self.files.clear();
        self.file_index.clear();
        self.archive_index.clear();
        self.resources.clear();
        self.queue.clear();
        self.seen.clear();
        self.report = LoadReport::default();
        self.first_new = 0;
        self.state = LoadState::Idle;
    }

    // ── Discovery ────────────────────────────────────────────────────────────

    fn fail_file(&mut self, path: &Path, reason: impl ToString) {
        let reason = reason.to_string();
        debug!("skipping {}: {}", path.display(), reason);
        self.report.failures.push(LoadFailure::File { path: path.display().to_string(), reason });
    }

    fn load_path(&mut self, path: PathBuf) {
        match fs::read(&path) {
            Ok(data) => self.load_data(path, Arc::from(data), None, None, true),
            Err(e) => self.fail_file(&path, e),
        }
    }

    /// Sniff `data` and dispatch.  `parent` is the archive the bytes came
    /// from, `version_hint` that archive's engine version.
    fn load_data(
        &mut self,
        path: PathBuf,
        data: Arc<[u8]>,
        parent: Option<PathBuf>,
        version_hint: Option<String>,
        on_disk: bool,
    ) {
        match FileType::detect(&data) {
            FileType::Container if on_disk => self.load_container_file(path, data),
            FileType::Container => self.load_container_memory(path, data, parent, version_hint),
            FileType::Bundle => self.load_bundle(path, data, parent),
            FileType::Web => self.load_web(path, data, parent),
            FileType::Gzip => match decompress_gzip(&data) {
                Ok(inner) => self.load_data(path, Arc::from(inner), parent, version_hint, on_disk),
                Err(e) => self.fail_file(&path, e),
            },
            FileType::Brotli => match decompress_brotli(&data) {
                Ok(inner) => self.load_data(path, Arc::from(inner), parent, version_hint, on_disk),
                Err(e) => self.fail_file(&path, e),
            },
            FileType::Raw => {
                let origin = parent.unwrap_or_else(|| path.clone());
                self.add_resource(display_name(&path), data, origin);
            }
        }
    }

    fn is_registered(&self, name: &str) -> bool {
        self.file_index.contains_key(&key(name))
    }

    fn register(&mut self, mut file: SerializedFile) -> usize {
        if file.unity_version.is_stripped() {
            if let Some(v) = self.options.fallback_unity_version.clone() {
                file.set_version(&v);
            }
        }
        let idx = self.files.len();
        self.file_index.insert(key(&file.file_name), idx);
        self.files.push(LoadedFile::new(file));
        idx
    }

    fn load_container_file(&mut self, path: PathBuf, data: Arc<[u8]>) {
        let name = display_name(&path);
        if self.is_registered(&name) {
            return;
        }
        info!("Loading {name}");
        match SerializedFile::parse(path.clone(), data) {
            Ok(file) => {
                if self.options.resolve_dependencies {
                    let dir = file.directory().to_path_buf();
                    let externals: Vec<String> = file.externals.iter().map(|e| e.file_name.clone()).collect();
                    for ext in externals {
                        self.enqueue_dependency(&dir, &ext);
                    }
                }
                self.register(file);
            }
            Err(e) => self.fail_file(&path, e),
        }
    }

    /// Look beside the referencing file first, then (optionally) anywhere
    /// below its directory.  Names not found on disk are not marked seen.
    fn enqueue_dependency(&mut self, dir: &Path, name: &str) {
        if name.is_empty() || self.seen.contains(&key(name)) {
            return;
        }
        let beside = dir.join(name);
        let found = if beside.is_file() {
            Some(beside)
        } else if self.options.search_subdirectories {
            split::list_files(dir, true)
                .ok()
                .and_then(|files| files.into_iter().find(|p| display_name(p).eq_ignore_ascii_case(name)))
        } else {
            None
        };
        if let Some(path) = found {
            debug!("queued dependency {}", path.display());
            self.seen.insert(key(name));
            self.queue.push_back(path);
        }
    }

    /// Containers unpacked from archives.  A member that does not parse is
    /// kept as a resource instead.
    fn load_container_memory(&mut self, path: PathBuf, data: Arc<[u8]>, parent: Option<PathBuf>, version_hint: Option<String>) {
        let name = display_name(&path);
        if self.is_registered(&name) {
            return;
        }
        match SerializedFile::parse(path.clone(), Arc::clone(&data)) {
            Ok(mut file) => {
                file.original_path = parent;
                if file.format_version() < 7 {
                    if let Some(hint) = version_hint {
                        file.set_version(&hint);
                    }
                }
                self.register(file);
            }
            Err(e) => {
                debug!("member {name} is not a readable container ({e}); keeping as resource");
                let origin = parent.unwrap_or_else(|| path.clone());
                self.add_resource(name, data, origin);
            }
        }
    }

    fn load_bundle(&mut self, path: PathBuf, data: Arc<[u8]>, parent: Option<PathBuf>) {
        let name = display_name(&path);
        info!("Loading {name}");
        let bundle = match BundleFile::parse(&data) {
            Ok(b) => b,
            Err(e) => return self.fail_file(&path, e),
        };
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let origin = parent.unwrap_or_else(|| path.clone());
        let hint = bundle.version_hint().to_owned();
        let first = self.files.len();

        for member in bundle.files {
            if is_serialized_file(&member.data) {
                let dummy = dir.join(&member.file_name);
                self.load_container_memory(dummy, member.data, Some(origin.clone()), Some(hint.clone()));
            } else {
                self.add_resource(member.file_name, member.data, origin.clone());
            }
        }
        if self.files.len() > first {
            self.archive_index.entry(key(&name)).or_insert(first);
        }
    }

    fn load_web(&mut self, path: PathBuf, data: Arc<[u8]>, parent: Option<PathBuf>) {
        let name = display_name(&path);
        info!("Loading {name}");
        let web = match WebFile::parse(&data) {
            Ok(w) => w,
            Err(e) => return self.fail_file(&path, e),
        };
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let origin = parent.unwrap_or_else(|| path.clone());
        for member in web.files {
            let dummy = dir.join(&member.file_name);
            self.load_data(dummy, member.data, Some(origin.clone()), None, false);
        }
    }

    /// First registration of a name wins.
    fn add_resource(&mut self, name: String, data: Arc<[u8]>, origin: PathBuf) {
        let k = key(&name);
        if self.resources.contains_key(&k) {
            debug!("resource {name} already registered");
            return;
        }
        self.report.resources += 1;
        self.resources.insert(k, Resource { name, data, origin });
    }

    // ── Decoding ─────────────────────────────────────────────────────────────

    fn decode_new(&mut self) {
        let new = &self.files[self.first_new..];
        let decoded = parallel::map_containers(new, |loaded| Ok::<_, Error>(decode_container(&loaded.file)));
        let decoded = match decoded {
            Ok(d) => d,
            Err(e) => {
                error!("decoding pass failed: {e}");
                return;
            }
        };
        for (loaded, (objects, failures)) in self.files[self.first_new..].iter_mut().zip(decoded) {
            self.report.objects += objects.len();
            self.report.failures.extend(failures);
            loaded.by_path_id = objects.iter().enumerate().map(|(i, o)| (o.path_id(), i)).collect();
            loaded.objects = objects;
        }
    }

    // ── Linking ──────────────────────────────────────────────────────────────

    fn link(&mut self) {
        enum Slot {
            Transform,
            MeshRenderer,
            MeshFilter,
            SkinnedMeshRenderer,
            Animator,
            Animation,
        }
        let mut components: Vec<(ObjectRef, Slot, ObjectRef)> = Vec::new();
        let mut atlases: Vec<(ObjectRef, ObjectRef)> = Vec::new();

        for (file, loaded) in self.files.iter().enumerate() {
            for obj in &loaded.objects {
                let owner = ObjectRef { file, path_id: obj.path_id() };
                match &obj.kind {
                    ObjectKind::GameObject(go) => {
                        for pptr in &go.components {
                            let Some(target) = self.resolve(file, pptr) else { continue };
                            let Some(component) = self.object(target) else { continue };
                            let slot = match component.kind {
                                ObjectKind::Transform(_) | ObjectKind::RectTransform(_) => Slot::Transform,
                                ObjectKind::MeshRenderer(_)        => Slot::MeshRenderer,
                                ObjectKind::MeshFilter(_)          => Slot::MeshFilter,
                                ObjectKind::SkinnedMeshRenderer(_) => Slot::SkinnedMeshRenderer,
                                ObjectKind::Animator(_)            => Slot::Animator,
                                ObjectKind::Animation(_)           => Slot::Animation,
                                _ => continue,
                            };
                            components.push((owner, slot, target));
                        }
                    }
                    ObjectKind::SpriteAtlas(atlas) => {
                        for pptr in &atlas.packed_sprites {
                            let Some(target) = self.resolve(file, pptr) else { continue };
                            if self.object(target).and_then(Object::as_sprite).is_some() {
                                atlases.push((target, owner));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        for (owner, slot, target) in components {
            let Some(ObjectKind::GameObject(go)) = self.object_mut(owner).map(|o| &mut o.kind) else { continue };
            let cache = match slot {
                Slot::Transform           => &mut go.transform,
                Slot::MeshRenderer        => &mut go.mesh_renderer,
                Slot::MeshFilter          => &mut go.mesh_filter,
                Slot::SkinnedMeshRenderer => &mut go.skinned_mesh_renderer,
                Slot::Animator            => &mut go.animator,
                Slot::Animation           => &mut go.animation,
            };
            cache.get_or_insert(target);
        }
        for (sprite, atlas) in atlases {
            if let Some(ObjectKind::Sprite(s)) = self.object_mut(sprite).map(|o| &mut o.kind) {
                if s.atlas_unset() {
                    s.linked_atlas = Some(atlas);
                }
            }
        }
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    pub fn files(&self) -> &[LoadedFile] { &self.files }

    pub fn file(&self, index: usize) -> Option<&LoadedFile> { self.files.get(index) }

    /// Registered container by file name, case-insensitively.  An archive's
    /// own file name maps to the first container unpacked from it.
    pub fn find_file(&self, name: &str) -> Option<usize> {
        let k = key(name);
        self.file_index.get(&k).or_else(|| self.archive_index.get(&k)).copied()
    }

    pub fn object(&self, r: ObjectRef) -> Option<&Object> {
        self.files.get(r.file)?.object(r.path_id)
    }

    fn object_mut(&mut self, r: ObjectRef) -> Option<&mut Object> {
        self.files.get_mut(r.file)?.object_mut(r.path_id)
    }

    /// All decoded objects, in registration then directory order.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectRef, &Object)> {
        self.files.iter().enumerate().flat_map(|(file, loaded)| {
            loaded.objects.iter().map(move |o| (ObjectRef { file, path_id: o.path_id() }, o))
        })
    }

    /// Resolve `pptr` as seen from container `file`.  File id 0 is that
    /// container; `n > 0` names entry `n - 1` of its external table.  The
    /// path id must be in the target's directory.
    pub fn resolve(&self, file: usize, pptr: &PPtr) -> Option<ObjectRef> {
        let source = &self.files.get(file)?.file;
        let target = match pptr.file_id {
            0 => file,
            n if n > 0 => {
                let ext = source.externals.get(usize::try_from(n - 1).ok()?)?;
                self.find_file(&ext.file_name)?
            }
            _ => return None,
        };
        self.files[target]
            .file
            .contains(pptr.path_id)
            .then_some(ObjectRef { file: target, path_id: pptr.path_id })
    }

    /// Resolve and fetch the decoded object.
    pub fn deref(&self, file: usize, pptr: &PPtr) -> Option<&Object> {
        self.object(self.resolve(file, pptr)?)
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(&key(name))
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    // ── Schema-driven views ──────────────────────────────────────────────────

    /// Schema for an object: embedded first, then the injected source.
    pub fn schema_for(&self, r: ObjectRef) -> Option<Arc<TypeTree>> {
        let obj = self.object(r)?;
        if let Some(tree) = &obj.reader.schema {
            return Some(Arc::clone(tree));
        }
        let source = self.schema_source.as_ref()?;
        let script = match &obj.kind {
            ObjectKind::MonoBehaviour(mb) => match self.deref(r.file, &mb.script).map(|o| &o.kind) {
                Some(ObjectKind::MonoScript(s)) => Some(s),
                _ => None,
            },
            _ => None,
        };
        source.schema_for(obj, script)
    }

    pub fn value_tree(&self, r: ObjectRef) -> Result<Option<Value>> {
        let Some(obj) = self.object(r) else { return Ok(None) };
        match self.schema_for(r) {
            Some(tree) => obj.reader.duplicate().to_value_tree_with(&tree).map(Some),
            None => Ok(None),
        }
    }

    pub fn dump(&self, r: ObjectRef) -> Result<Option<String>> {
        let Some(obj) = self.object(r) else { return Ok(None) };
        match self.schema_for(r) {
            Some(tree) => obj.reader.duplicate().dump_with(&tree).map(Some),
            None => Ok(None),
        }
    }

    /// Bytes of streamed data.  The payload is looked up among resources by
    /// file name, then beside the container (or its archive) on disk.
    pub fn read_streamed(&self, file: usize, info: &StreamingInfo) -> Result<Vec<u8>> {
        let name = file_name_of(&info.path);
        if let Some(res) = self.resource(name) {
            return res
                .slice(info.offset, info.size)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| Error::malformed(format!("streamed range past end of {name}")));
        }

        let loaded = self.files.get(file).ok_or_else(|| Error::ResourceNotFound(name.to_owned()))?;
        let base = loaded.file.original_path.as_deref().unwrap_or(&loaded.file.path);
        let candidate = base.parent().unwrap_or_else(|| Path::new("")).join(name);
        if !candidate.is_file() {
            return Err(Error::ResourceNotFound(name.to_owned()));
        }
        let data = fs::read(&candidate)?;
        let start = usize::try_from(info.offset).ok();
        let end = start.and_then(|s| s.checked_add(usize::try_from(info.size).ok()?));
        match (start, end) {
            (Some(s), Some(e)) if e <= data.len() => Ok(data[s..e].to_vec()),
            _ => Err(Error::malformed(format!("streamed range past end of {}", candidate.display()))),
        }
    }

    // ── Listings ─────────────────────────────────────────────────────────────

    /// Non-empty embedded schemas grouped by engine version, keyed by class
    /// id or, for script types, `-1 - script_type_index`.  First occurrence
    /// wins.
    pub fn type_trees(&self) -> BTreeMap<String, BTreeMap<i32, Arc<TypeTree>>> {
        let mut out: BTreeMap<String, BTreeMap<i32, Arc<TypeTree>>> = BTreeMap::new();
        for loaded in &self.files {
            let by_key = out.entry(loaded.file.unity_version.to_string()).or_default();
            for ty in &loaded.file.types {
                let Some(tree) = ty.type_tree.as_ref().filter(|t| !t.is_empty()) else { continue };
                let k = if ty.script_type_index >= 0 { -1 - ty.script_type_index as i32 } else { ty.class_id };
                by_key.entry(k).or_insert_with(|| Arc::clone(tree));
            }
        }
        out
    }

    /// Asset paths declared by AssetBundle and ResourceManager tables.  An
    /// object listed under several paths keeps the first.
    pub fn asset_paths(&self) -> HashMap<ObjectRef, String> {
        let mut out = HashMap::new();
        for (r, obj) in self.objects() {
            match &obj.kind {
                ObjectKind::AssetBundle(bundle) => {
                    for (path, info) in &bundle.container {
                        let start = usize::try_from(info.preload_index).unwrap_or(0);
                        let len = usize::try_from(info.preload_size).unwrap_or(0);
                        let preload = bundle.preload_table.iter().skip(start).take(len);
                        for pptr in preload.chain(std::iter::once(&info.asset)) {
                            if let Some(target) = self.resolve(r.file, pptr) {
                                out.entry(target).or_insert_with(|| path.clone());
                            }
                        }
                    }
                }
                ObjectKind::ResourceManager(rm) => {
                    for (path, pptr) in &rm.container {
                        if let Some(target) = self.resolve(r.file, pptr) {
                            out.entry(target).or_insert_with(|| path.clone());
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }
}

/// Build every object of one container.  Objects that fail are reported and
/// left out.
fn decode_container(file: &SerializedFile) -> (Vec<Object>, Vec<LoadFailure>) {
    let mut objects = Vec::with_capacity(file.objects.len());
    let mut failures = Vec::new();
    for info in &file.objects {
        let built = ObjectReader::new(file, info).and_then(Object::read);
        match built {
            Ok(obj) => objects.push(obj),
            Err(e) => {
                let class = ClassId::from_raw(info.class_id);
                error!(
                    "Unable to load object: assets {}, type {} ({}), path id {}: {}",
                    file.file_name, class, info.class_id, info.path_id, e
                );
                failures.push(LoadFailure::Object {
                    container:  file.file_name.clone(),
                    class_id:   info.class_id,
                    class_name: class.name().to_owned(),
                    path_id:    info.path_id,
                    reason:     e.to_string(),
                });
            }
        }
    }
    if !failures.is_empty() {
        warn!("{}: {} object(s) skipped", file.file_name, failures.len());
    }
    (objects, failures)
}
