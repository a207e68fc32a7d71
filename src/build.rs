//! Build orchestration.
//!
//! Runs the whole build phase: reads the shared template, resets the
//! distribution directory, compiles every discovered page sequentially,
//! and writes the manifest. Any failure aborts the build; the HTTP
//! listener is only ever started after this function returns Ok, so no
//! request is served against a partially built distribution.

use crate::compiler::{AssetMinifier, ScriptBundler, compile_page, page::STATIC_NODE};
use crate::config::AppConfig;
use crate::discover::collect_page_sources;
use crate::log;
use crate::manifest::Manifest;
use crate::page::PageRegistry;
use anyhow::{Context, Result, bail};
use std::fs;

/// Build the entire site.
///
/// Pages compile strictly one at a time: augmented temp-module names are
/// derived from source paths, so concurrent compilation could collide.
pub fn build_site(
    config: &AppConfig,
    registry: &PageRegistry,
    bundler: &dyn ScriptBundler,
    minifier: &dyn AssetMinifier,
) -> Result<Manifest> {
    let template_path = config.template_path();
    let template = fs::read_to_string(&template_path)
        .with_context(|| format!("Failed to read template: {}", template_path.display()))?;
    if !template.contains(STATIC_NODE) {
        bail!(
            "Template {} is missing the `{STATIC_NODE}` placeholder",
            template_path.display()
        );
    }

    reset_output_dir(config)?;

    let sources = collect_page_sources(&config.pages_root(), &config.build.page_extension);
    log!("build"; "compiling {} pages", sources.len());

    let mut manifest = Manifest::new();
    for source in &sources {
        let (compiled, entry) =
            compile_page(source, config, registry, &template, bundler, minifier)?;
        log!("build"; "{} -> {}", entry.url, compiled.html_path.display());
        manifest.push(entry);
    }

    manifest.write(&config.manifest_path())?;
    log!("build"; "done, manifest has {} entries", manifest.len());

    Ok(manifest)
}

/// Delete and recreate the distribution directory.
///
/// Runs before the first page compiles so a build never mixes artifacts
/// from two generations.
fn reset_output_dir(config: &AppConfig) -> Result<()> {
    let output = config.output_root();
    if output.exists() {
        fs::remove_dir_all(&output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(&output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
