//! Per-page compilation.
//!
//! For each discovered source: look up its registration, synthesize an
//! augmented module with the hydration bootstrap appended, bundle it to a
//! token-named script, render the component with no request context,
//! compose the shared template, write `index.html`, and minify the script.
//! Any failure aborts the whole build.

use crate::compiler::{AssetMinifier, ScriptBundler};
use crate::config::AppConfig;
use crate::manifest::{ManifestEntry, page_url};
use crate::page::{PageHead, PageRegistry};
use crate::utils::{minify::minify_html, token::artifact_token};
use anyhow::{Context, Result, bail};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Placeholder node replaced with rendered component markup.
pub const STATIC_NODE: &str = r#"<div id="__marea"></div>"#;

/// Hydration bootstrap appended to each augmented module;
/// `%COMPONENT%` is replaced with the component's exported name.
const HYDRATE_TEMPLATE: &str = include_str!("../embed/hydrate.js");

/// Suffix marking augmented temp modules, derived from the source path.
/// Build is sequential, so one temp per source never collides.
const TEMP_MARKER: &str = "__hydrate__";

/// Artifacts produced for one page.
#[derive(Debug, Clone)]
pub struct CompiledPage {
    pub source: PathBuf,
    pub html_path: PathBuf,
    pub raw_script_path: PathBuf,
    pub minified_script_path: PathBuf,
    pub artifact_id: String,
}

/// Compile one page source into its output directory.
///
/// Returns the compiled artifacts plus the manifest entry to append.
pub fn compile_page(
    source: &Path,
    config: &AppConfig,
    registry: &PageRegistry,
    template: &str,
    bundler: &dyn ScriptBundler,
    minifier: &dyn AssetMinifier,
) -> Result<(CompiledPage, ManifestEntry)> {
    let pages_root = config.pages_root();
    let rel = source
        .strip_prefix(&pages_root)
        .with_context(|| format!("Page source outside pages root: {}", source.display()))?;
    let rel_key = rel.to_string_lossy().replace('\\', "/");

    let module = registry
        .get(&rel_key)
        .with_context(|| format!("No page registration for `{rel_key}`"))?;

    // Output directory mirrors the source directory under <output>/pages
    let pages_out_rel = config.build.output.join("pages");
    let page_dir_rel = match rel.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => pages_out_rel.join(parent),
        _ => pages_out_rel.clone(),
    };
    let page_dir = config.get_root().join(&page_dir_rel);
    fs::create_dir_all(&page_dir)
        .with_context(|| format!("Failed to create {}", page_dir.display()))?;

    // Synthesize the augmented module: source + hydration bootstrap
    let bootstrap = HYDRATE_TEMPLATE.replace("%COMPONENT%", module.component.name());
    let source_content = fs::read_to_string(source)
        .with_context(|| format!("Failed to read page module: {}", source.display()))?;
    let temp = temp_module_path(source);
    fs::write(&temp, format!("{source_content}\n{bootstrap}"))
        .with_context(|| format!("Failed to write temp module: {}", temp.display()))?;

    // Bundle to a token-named script; token is random, never path-derived
    let token = artifact_token();
    let raw_rel = page_dir_rel.join(format!("{token}.js"));
    let min_rel = page_dir_rel.join(format!("{token}.min.js"));
    let raw = config.get_root().join(&raw_rel);
    let min = config.get_root().join(&min_rel);

    let bundled = bundler.bundle(&temp, &raw);
    fs::remove_file(&temp).ok();
    bundled?;

    // Render with no request context; props arrive per request
    let rendered = module.component.render();

    let composed = compose_html(
        template,
        &rendered,
        &script_src(&min_rel),
        module.head.as_ref(),
    )?;
    let html_path = page_dir.join("index.html");
    fs::write(&html_path, minify_html(&composed, config).as_bytes())
        .with_context(|| format!("Failed to write {}", html_path.display()))?;

    // Fatal on failure: no page continues, no partial manifest survives
    minifier.minify(&raw, &min)?;

    let url = page_url(&page_dir_rel, &pages_out_rel);
    let entry = ManifestEntry {
        id: token.clone(),
        compiled: raw_rel,
        path: page_dir_rel,
        url,
        middleware: module.middleware.is_some(),
        head: module.head.clone().unwrap_or_default(),
    };

    Ok((
        CompiledPage {
            source: source.to_path_buf(),
            html_path,
            raw_script_path: raw,
            minified_script_path: min,
            artifact_id: token,
        },
        entry,
    ))
}

// ============================================================================
// Template composition
// ============================================================================

/// Compose the final page HTML from the shared template.
pub fn compose_html(
    template: &str,
    rendered: &str,
    script_src: &str,
    head: Option<&PageHead>,
) -> Result<String> {
    if !template.contains(STATIC_NODE) {
        bail!("Template is missing the `{STATIC_NODE}` placeholder");
    }

    let html = template.replacen(
        STATIC_NODE,
        &format!(r#"<div id="__marea">{rendered}</div>"#),
        1,
    );
    let html = inject_script(&html, script_src);

    Ok(match head {
        Some(head) => inject_head(&html, head),
        None => html,
    })
}

/// Root-absolute URL for a distribution-relative script path.
fn script_src(rel: &Path) -> String {
    format!("/{}", rel.to_string_lossy().replace('\\', "/"))
}

/// Insert the module script tag before the closing body tag.
fn inject_script(html: &str, src: &str) -> String {
    let tag = format!(r#"<script src="{src}" type="module" defer></script>"#);
    match html.rfind("</body>") {
        Some(pos) => format!("{}{tag}{}", &html[..pos], &html[pos..]),
        None => format!("{html}{tag}"),
    }
}

/// Insert title and description into the template's head region.
fn inject_head(html: &str, head: &PageHead) -> String {
    let meta = format!(
        r#"<title>{}</title><meta name="description" content="{}">"#,
        head.title, head.description,
    );
    match html.find("</head>") {
        Some(pos) => format!("{}{meta}{}", &html[..pos], &html[pos..]),
        None => format!("{meta}{html}"),
    }
}

/// Temp module path derived from the source path.
fn temp_module_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = source
        .extension()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{TEMP_MARKER}.{ext}"))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Component, PageModule};
    use std::sync::Arc;
    use tempfile::TempDir;

    const TEMPLATE: &str = concat!(
        "<html><head></head><body>",
        r#"<div id="__marea"></div>"#,
        "</body></html>",
    );

    struct Hello;

    impl Component for Hello {
        fn name(&self) -> &str {
            "Hello"
        }
        fn render(&self) -> String {
            "<p>hello world</p>".into()
        }
    }

    /// Bundler/minifier stand-in that just copies the input file.
    struct CopyTool;

    impl ScriptBundler for CopyTool {
        fn bundle(&self, entry: &Path, out: &Path) -> Result<()> {
            fs::copy(entry, out)?;
            Ok(())
        }
    }

    impl AssetMinifier for CopyTool {
        fn minify(&self, src: &Path, out: &Path) -> Result<()> {
            fs::copy(src, out)?;
            Ok(())
        }
    }

    struct FailingMinifier;

    impl AssetMinifier for FailingMinifier {
        fn minify(&self, _src: &Path, _out: &Path) -> Result<()> {
            bail!("minifier exploded")
        }
    }

    fn test_setup(dir: &TempDir) -> (AppConfig, PageRegistry) {
        let mut config = AppConfig::default();
        config.set_root(dir.path());
        config.build.minify = false;

        fs::create_dir_all(config.pages_root().join("home")).unwrap();
        fs::write(config.pages_root().join("home/index.tsx"), "// home page").unwrap();

        let mut registry = PageRegistry::new();
        registry.register("home/index.tsx", PageModule::new(Arc::new(Hello)));

        (config, registry)
    }

    #[test]
    fn test_compile_page_artifacts() {
        let dir = TempDir::new().unwrap();
        let (config, registry) = test_setup(&dir);
        let source = config.pages_root().join("home/index.tsx");

        let (compiled, entry) =
            compile_page(&source, &config, &registry, TEMPLATE, &CopyTool, &CopyTool).unwrap();

        assert!(compiled.html_path.is_file());
        assert!(compiled.raw_script_path.is_file());
        assert!(compiled.minified_script_path.is_file());
        assert_eq!(compiled.source, source);
        assert_eq!(entry.id, compiled.artifact_id);
        assert_eq!(entry.url, "/home");
        assert!(!entry.middleware);

        let html = fs::read_to_string(&compiled.html_path).unwrap();
        assert!(html.contains(r#"<div id="__marea"><p>hello world</p></div>"#));
        assert!(html.contains(&format!("{}.min.js", entry.id)));
    }

    #[test]
    fn test_compile_page_bundle_input_has_bootstrap() {
        let dir = TempDir::new().unwrap();
        let (config, registry) = test_setup(&dir);
        let source = config.pages_root().join("home/index.tsx");

        let (compiled, _) =
            compile_page(&source, &config, &registry, TEMPLATE, &CopyTool, &CopyTool).unwrap();

        // CopyTool copies the augmented module verbatim
        let script = fs::read_to_string(&compiled.raw_script_path).unwrap();
        assert!(script.contains("// home page"));
        assert!(script.contains("Hello"));
        assert!(!script.contains("%COMPONENT%"));
    }

    #[test]
    fn test_compile_page_removes_temp_module() {
        let dir = TempDir::new().unwrap();
        let (config, registry) = test_setup(&dir);
        let source = config.pages_root().join("home/index.tsx");

        compile_page(&source, &config, &registry, TEMPLATE, &CopyTool, &CopyTool).unwrap();

        assert!(!config.pages_root().join("home/index__hydrate__.tsx").exists());
    }

    #[test]
    fn test_compile_page_unregistered_source_fails() {
        let dir = TempDir::new().unwrap();
        let (config, registry) = test_setup(&dir);

        fs::write(config.pages_root().join("stray.tsx"), "").unwrap();
        let result = compile_page(
            &config.pages_root().join("stray.tsx"),
            &config,
            &registry,
            TEMPLATE,
            &CopyTool,
            &CopyTool,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_compile_page_minifier_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let (config, registry) = test_setup(&dir);
        let source = config.pages_root().join("home/index.tsx");

        let result = compile_page(
            &source,
            &config,
            &registry,
            TEMPLATE,
            &CopyTool,
            &FailingMinifier,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_pages_root_source_maps_to_slash() {
        let dir = TempDir::new().unwrap();
        let (config, mut registry) = test_setup(&dir);

        fs::write(config.pages_root().join("index.tsx"), "// root").unwrap();
        registry.register("index.tsx", PageModule::new(Arc::new(Hello)));

        let (_, entry) = compile_page(
            &config.pages_root().join("index.tsx"),
            &config,
            &registry,
            TEMPLATE,
            &CopyTool,
            &CopyTool,
        )
        .unwrap();
        assert_eq!(entry.url, "/");
        assert_eq!(entry.path, config.build.output.join("pages"));
    }

    #[test]
    fn test_compose_html_requires_placeholder() {
        assert!(compose_html("<html></html>", "x", "/a.js", None).is_err());
    }

    #[test]
    fn test_compose_html_injects_head() {
        let head = PageHead {
            title: "HOME".into(),
            description: "d".into(),
        };
        let html = compose_html(TEMPLATE, "<b>x</b>", "/a.min.js", Some(&head)).unwrap();

        assert!(html.contains("<title>HOME</title>"));
        // Closing head tag survives injection
        assert!(html.contains("</head>"));
        let script_pos = html.find("<script").unwrap();
        assert!(script_pos < html.rfind("</body>").unwrap());
    }

    #[test]
    fn test_temp_module_path_is_source_derived() {
        let temp = temp_module_path(Path::new("pages/home/index.tsx"));
        assert_eq!(temp, PathBuf::from("pages/home/index__hydrate__.tsx"));
    }
}
