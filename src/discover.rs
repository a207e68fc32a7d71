//! Page source discovery.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Suffix of augmented temp modules left behind by an interrupted build.
const TEMP_MARKER: &str = "__hydrate__";

/// Collect all page module sources under a directory.
///
/// Keeps files with the given extension, skipping leftover temp modules.
/// Results are sorted so discovery order (and thus manifest ordering) is
/// stable across rebuilds.
pub fn collect_page_sources(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name) && !name.contains(TEMP_MARKER)
        })
        .map(walkdir::DirEntry::into_path)
        .filter(|p| p.extension().is_some_and(|ext| ext == extension))
        .collect();

    sources.sort();
    sources
}

// ============================================================================
// Tests
// ============================================================================
