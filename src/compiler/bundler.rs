//! Opaque script-tooling collaborators.
//!
//! Bundling and minification are external capabilities: the compiler only
//! needs "compile this module to a standalone script" and "minify this
//! script to a sibling path". The default implementations shell out to the
//! configured commands (esbuild by default).

use crate::config::{BundlerConfig, MinifierConfig};
use crate::utils::exec;
use anyhow::{Context, Result};
use std::{ffi::OsString, path::Path};

/// Compiles a module graph to a standalone client script.
pub trait ScriptBundler {
    fn bundle(&self, entry: &Path, out: &Path) -> Result<()>;
}

/// Minifies a script file to an output path.
pub trait AssetMinifier {
    fn minify(&self, src: &Path, out: &Path) -> Result<()>;
}

/// Bundler invoking the configured external command.
pub struct CommandBundler {
    command: Vec<String>,
}

impl CommandBundler {
    pub fn new(config: &BundlerConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }
}

impl ScriptBundler for CommandBundler {
    fn bundle(&self, entry: &Path, out: &Path) -> Result<()> {
        let args = io_args(entry, out);
        exec::run(&self.command, &args)
            .with_context(|| format!("Bundling failed for {}", entry.display()))?;
        Ok(())
    }
}

/// Minifier invoking the configured external command.
pub struct CommandMinifier {
    command: Vec<String>,
}

impl CommandMinifier {
    pub fn new(config: &MinifierConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }
}

impl AssetMinifier for CommandMinifier {
    fn minify(&self, src: &Path, out: &Path) -> Result<()> {
        let args = io_args(src, out);
        exec::run(&self.command, &args)
            .with_context(|| format!("Minification failed for {}", src.display()))?;
        Ok(())
    }
}

/// esbuild-style input/output arguments: `<input> --outfile=<output>`.
fn io_args(input: &Path, out: &Path) -> [OsString; 2] {
    let mut outfile = OsString::from("--outfile=");
    outfile.push(out.as_os_str());
    [input.as_os_str().to_owned(), outfile]
}

// ============================================================================
// Tests
// ============================================================================
