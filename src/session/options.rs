/// Knobs for [`Session`](super::Session) loading.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Enqueue external files referenced by on-disk containers.
    pub resolve_dependencies:   bool,
    /// Search the referencing file's directory tree when a dependency is
    /// not found beside it.
    pub search_subdirectories:  bool,
    /// Merge `name.split0..N` parts into `name` before discovery.
    pub merge_split_files:      bool,
    /// Engine version applied to containers whose own version string is
    /// stripped.
    pub fallback_unity_version: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            resolve_dependencies:   true,
            search_subdirectories:  true,
            merge_split_files:      true,
            fallback_unity_version: None,
        }
    }
}
