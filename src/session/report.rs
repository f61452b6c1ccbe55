use serde::Serialize;

/// One item that could not be loaded.  Failures never abort a load; they
/// are collected here next to the counts of what succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadFailure {
    /// A file or archive member that could not be read or parsed.
    File { path: String, reason: String },
    /// A typed object whose construction failed; the object is skipped.
    Object {
        container:  String,
        class_id:   i32,
        class_name: String,
        path_id:    i64,
        reason:     String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub containers: usize,
    pub objects:    usize,
    pub resources:  usize,
    pub failures:   Vec<LoadFailure>,
}

impl LoadReport {
    pub fn failure_count(&self) -> usize { self.failures.len() }

    pub fn is_clean(&self) -> bool { self.failures.is_empty() }

    pub fn file_failures(&self) -> impl Iterator<Item = &LoadFailure> {
        self.failures.iter().filter(|f| matches!(f, LoadFailure::File { .. }))
    }

    pub fn object_failures(&self) -> impl Iterator<Item = &LoadFailure> {
        self.failures.iter().filter(|f| matches!(f, LoadFailure::Object { .. }))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
