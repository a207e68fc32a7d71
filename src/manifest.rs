//! Build manifest: the sole contract between the build and serve phases.
//!
//! One entry per compiled page, accumulated in discovery order and written
//! wholesale to `ssr_manifest.json` at the end of a successful build. The
//! serve phase reads only this file for routing decisions; it never
//! consults page sources except to re-run middleware.

use crate::page::PageHead;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Metadata for one compiled page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Artifact token naming the page's script files
    pub id: String,
    /// Raw (unminified) script path within the distribution directory
    pub compiled: PathBuf,
    /// Page output directory holding `index.html`
    pub path: PathBuf,
    /// Route URL ("/" for the pages-root page)
    pub url: String,
    /// Whether the page registered a middleware
    pub middleware: bool,
    /// Head metadata captured at build time
    pub head: PageHead,
}

/// Ordered collection of manifest entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; build order is manifest order.
    pub fn push(&mut self, entry: ManifestEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize the full ordered list, overwriting any prior manifest.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(())
    }

    /// Load a manifest written by a previous build.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", path.display()))
    }
}

/// Route URL for a page output directory.
///
/// "/" iff the directory is the pages-root output directory itself;
/// otherwise the directory with the pages-root prefix stripped.
pub fn page_url(page_dir: &Path, pages_root: &Path) -> String {
    match page_dir.strip_prefix(pages_root) {
        Ok(rel) if rel.as_os_str().is_empty() => "/".to_string(),
        Ok(rel) => format!("/{}", rel.to_string_lossy().replace('\\', "/")),
        Err(_) => "/".to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
