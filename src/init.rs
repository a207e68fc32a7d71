//! Project initialization.
//!
//! Creates a starter project: default config, shared HTML template, and
//! the page sources matching the built-in registrations in `site`.

use crate::config::AppConfig;
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Default config filename
const CONFIG_FILE: &str = "marea.toml";

/// Scaffolded files: (relative path, embedded content)
const SITE_FILES: &[(&str, &str)] = &[
    ("public/index.html", include_str!("embed/site/index.html")),
    ("src/client/pages/index.tsx", include_str!("embed/site/index.tsx")),
    ("src/client/pages/home/index.tsx", include_str!("embed/site/home.tsx")),
    ("src/client/pages/about/index.tsx", include_str!("embed/site/about.tsx")),
];

/// Create a new starter project.
pub fn new_project(config: &AppConfig, has_name: bool) -> Result<()> {
    let root = config.get_root();

    // Without a name the current directory must be completely empty
    if !has_name && !is_dir_empty(root)? {
        bail!(
            "Current directory is not empty. Use `marea init <NAME>` to create in a subdirectory."
        );
    }

    for (rel, content) in SITE_FILES {
        let path = root.join(rel);
        if path.exists() {
            bail!("Path `{}` already exists.", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    init_default_config(root)?;
    init_ignore_file(root, &config.build.output)?;

    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)?.next().is_none())
}

/// Write default configuration file
fn init_default_config(root: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&AppConfig::default())?;
    fs::write(root.join(CONFIG_FILE), content)?;
    Ok(())
}

/// Ignore the distribution directory
fn init_ignore_file(root: &Path, output: &Path) -> Result<()> {
    let path = root.join(".gitignore");
    if !path.exists() {
        fs::write(&path, format!("{}\n", output.display()))?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_rooted(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig::default();
        config.set_root(dir.path());
        config
    }

    #[test]
    fn test_new_project_scaffolds_files() {
        let dir = TempDir::new().unwrap();
        let config = config_rooted(&dir);

        new_project(&config, false).unwrap();

        assert!(dir.path().join("marea.toml").is_file());
        assert!(dir.path().join("public/index.html").is_file());
        assert!(dir.path().join("src/client/pages/index.tsx").is_file());
        assert!(dir.path().join("src/client/pages/home/index.tsx").is_file());
        assert!(dir.path().join("src/client/pages/about/index.tsx").is_file());
        assert!(dir.path().join(".gitignore").is_file());
    }

    #[test]
    fn test_scaffolded_config_parses() {
        let dir = TempDir::new().unwrap();
        let config = config_rooted(&dir);

        new_project(&config, false).unwrap();

        let loaded = AppConfig::from_path(&dir.path().join("marea.toml")).unwrap();
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_scaffolded_template_has_placeholder() {
        let dir = TempDir::new().unwrap();
        let config = config_rooted(&dir);

        new_project(&config, false).unwrap();

        let template = fs::read_to_string(dir.path().join("public/index.html")).unwrap();
        assert!(template.contains(crate::compiler::page::STATIC_NODE));
    }

    #[test]
    fn test_init_refuses_nonempty_dir_without_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("something.txt"), "x").unwrap();
        let config = config_rooted(&dir);

        assert!(new_project(&config, false).is_err());
    }

    #[test]
    fn test_init_with_name_allows_nonempty_parent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("something.txt"), "x").unwrap();

        let mut config = AppConfig::default();
        config.set_root(&dir.path().join("my-site"));

        new_project(&config, true).unwrap();
        assert!(dir.path().join("my-site/marea.toml").is_file());
    }
}
