//! Project configuration management for `marea.toml`.
//!
//! # Sections
//!
//! | Section   | Purpose                                           |
//! |-----------|---------------------------------------------------|
//! | `[build]` | Page sources, output layout, bundler, minifier    |
//! | `[serve]` | Development server (port, interface)              |
//!
//! # Example
//!
//! ```toml
//! [build]
//! pages = "src/client/pages"
//! output = "_marea/build"
//! template = "public/index.html"
//! minify = true
//!
//! [build.bundler]
//! command = ["esbuild", "--bundle", "--format=esm"]
//!
//! [serve]
//! port = 8080
//! ```

use crate::cli::Cli;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Defaults
// ============================================================================

/// Default values for configuration fields, used by serde.
pub mod defaults {
    use std::path::PathBuf;

    pub fn r#true() -> bool {
        true
    }

    pub mod build {
        use std::path::PathBuf;

        pub fn pages() -> PathBuf {
            "src/client/pages".into()
        }

        pub fn page_extension() -> String {
            "tsx".into()
        }

        pub fn output() -> PathBuf {
            "_marea/build".into()
        }

        pub fn statics() -> PathBuf {
            "public".into()
        }

        pub fn template() -> PathBuf {
            "public/index.html".into()
        }

        pub mod bundler {
            pub fn command() -> Vec<String> {
                vec!["esbuild".into(), "--bundle".into(), "--format=esm".into()]
            }
        }

        pub mod minifier {
            pub fn command() -> Vec<String> {
                vec!["esbuild".into(), "--minify".into()]
            }
        }
    }

    pub mod serve {
        pub fn interface() -> String {
            "127.0.0.1".into()
        }

        pub fn port() -> u16 {
            8080
        }
    }

    pub fn root() -> Option<PathBuf> {
        None
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing marea.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory (set after loading)
    #[serde(skip, default = "defaults::root")]
    root: Option<PathBuf>,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: None,
            build: BuildConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

/// `[build]` section: page sources, output layout, external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory containing page module sources
    #[serde(default = "defaults::build::pages")]
    pub pages: PathBuf,

    /// Extension of page module sources (without the dot)
    #[serde(default = "defaults::build::page_extension")]
    pub page_extension: String,

    /// Distribution directory, deleted and recreated on every build
    #[serde(default = "defaults::build::output")]
    pub output: PathBuf,

    /// Static asset directory, served under its leading path component
    #[serde(default = "defaults::build::statics")]
    pub statics: PathBuf,

    /// Shared HTML template with the `<div id="__marea"></div>` placeholder
    #[serde(default = "defaults::build::template")]
    pub template: PathBuf,

    /// Minify composed page HTML
    #[serde(default = "defaults::r#true")]
    pub minify: bool,

    /// Script bundler command
    #[serde(default)]
    pub bundler: BundlerConfig,

    /// Script minifier command
    #[serde(default)]
    pub minifier: MinifierConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            pages: defaults::build::pages(),
            page_extension: defaults::build::page_extension(),
            output: defaults::build::output(),
            statics: defaults::build::statics(),
            template: defaults::build::template(),
            minify: true,
            bundler: BundlerConfig::default(),
            minifier: MinifierConfig::default(),
        }
    }
}

/// `[build.bundler]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundlerConfig {
    /// Command vector: program plus fixed leading arguments.
    /// The entry path and `--outfile=<path>` are appended per invocation.
    #[serde(default = "defaults::build::bundler::command")]
    pub command: Vec<String>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: defaults::build::bundler::command(),
        }
    }
}

/// `[build.minifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MinifierConfig {
    /// Command vector: program plus fixed leading arguments.
    /// The input path and `--outfile=<path>` are appended per invocation.
    #[serde(default = "defaults::build::minifier::command")]
    pub command: Vec<String>,
}

impl Default for MinifierConfig {
    fn default() -> Self {
        Self {
            command: defaults::build::minifier::command(),
        }
    }
}

/// `[serve]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServeConfig {
    /// Interface to bind on
    #[serde(default = "defaults::serve::interface")]
    pub interface: String,

    /// Port to listen on
    #[serde(default = "defaults::serve::port")]
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: defaults::serve::interface(),
            port: defaults::serve::port(),
        }
    }
}

// ============================================================================
// Loading and Validation
// ============================================================================

impl AppConfig {
    /// Load configuration from a toml file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.config_path = path.to_path_buf();

        Ok(config)
    }

    /// Apply CLI overrides on top of file values.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        use crate::cli::Commands;

        self.set_root(cli.root.as_deref().unwrap_or(Path::new("./")));

        match &cli.command {
            Commands::Build { minify } | Commands::Serve { minify, .. } => {
                if let Some(minify) = minify {
                    self.build.minify = *minify;
                }
            }
            Commands::Init { .. } => {}
        }

        if let Commands::Serve {
            interface, port, ..
        } = &cli.command
        {
            if let Some(interface) = interface {
                self.serve.interface = interface.clone();
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
        }
    }

    /// Validate config invariants.
    pub fn validate(&self) -> Result<()> {
        if self.build.page_extension.is_empty() {
            bail!("build.page_extension must not be empty");
        }
        if self.build.bundler.command.is_empty() {
            bail!("build.bundler.command must not be empty");
        }
        if self.build.minifier.command.is_empty() {
            bail!("build.minifier.command must not be empty");
        }
        if self.build.output.as_os_str().is_empty() || self.build.output == Path::new("/") {
            bail!("build.output must be a project-relative directory");
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Derived paths
    // ------------------------------------------------------------------------

    pub fn set_root(&mut self, root: &Path) {
        self.root = Some(root.to_path_buf());
    }

    /// Project root directory.
    pub fn get_root(&self) -> &Path {
        self.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Directory containing page module sources.
    pub fn pages_root(&self) -> PathBuf {
        self.get_root().join(&self.build.pages)
    }

    /// Distribution directory.
    pub fn output_root(&self) -> PathBuf {
        self.get_root().join(&self.build.output)
    }

    /// Root of compiled page output directories.
    pub fn pages_output(&self) -> PathBuf {
        self.output_root().join("pages")
    }

    /// Manifest file location, fixed within the distribution directory.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_root().join("ssr_manifest.json")
    }

    /// Shared HTML template location.
    pub fn template_path(&self) -> PathBuf {
        self.get_root().join(&self.build.template)
    }

    /// URL prefix under which the distribution directory is served,
    /// derived from the first component of `build.output`.
    pub fn dist_prefix(&self) -> String {
        prefix_of(&self.build.output)
    }

    /// URL prefix under which static assets are served,
    /// derived from the first component of `build.statics`.
    pub fn statics_prefix(&self) -> String {
        prefix_of(&self.build.statics)
    }
}

/// Leading path component as a root-relative URL prefix.
fn prefix_of(path: &Path) -> String {
    let first = path
        .components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("/{first}")
}

// ============================================================================
// Tests
// ============================================================================
