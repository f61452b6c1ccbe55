//! Multi-part files: `name.split0`, `name.split1`, ... are concatenated into
//! `name` before discovery.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

/// Part number of a `*.splitN` path.
fn split_index(path: &Path) -> Option<u32> {
    path.extension()?.to_str()?.strip_prefix("split")?.parse().ok()
}

/// `name.splitN` → `name`; other paths unchanged.
pub(crate) fn strip_split_suffix(path: &Path) -> PathBuf {
    match split_index(path) {
        Some(_) => path.with_extension(""),
        None => path.to_path_buf(),
    }
}

/// Every regular file under `dir`, sorted for a stable load order.
pub(crate) fn list_files(dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(d) = pending.pop() {
        let mut entries: Vec<_> = fs::read_dir(&d)?.collect::<io::Result<_>>()?;
        entries.sort_by_key(|e| e.path());
        for entry in entries {
            let path = entry.path();
            let kind = entry.file_type()?;
            if kind.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if kind.is_file() {
                out.push(path);
            }
        }
    }
    out.sort();
    Ok(out)
}

/// Concatenate every `*.split0` group under `dir` whose merged file does
/// not exist yet.  Returns the merged paths.
pub fn merge_split_assets(dir: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    let mut merged = Vec::new();
    for first in list_files(dir, recursive)?.into_iter().filter(|p| split_index(p) == Some(0)) {
        let dest = first.with_extension("");
        if dest.exists() {
            continue;
        }
        let mut out = File::create(&dest)?;
        let mut part = 0u32;
        loop {
            let piece = first.with_extension(format!("split{part}"));
            if !piece.is_file() {
                break;
            }
            out.write_all(&fs::read(&piece)?)?;
            part += 1;
        }
        info!("merged {} split parts into {}", part, dest.display());
        merged.push(dest);
    }
    Ok(merged)
}

/// Replace split parts by their merged name, keeping first-seen order and
/// dropping duplicates.
pub fn collapse_split_names(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = strip_split_suffix(&path);
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}
