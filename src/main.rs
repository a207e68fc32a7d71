//! Marea - a two-phase static-site compiler and hydrating dev server.

mod build;
mod cli;
mod compiler;
mod config;
mod discover;
mod error;
mod hydrate;
mod init;
mod manifest;
mod page;
mod serve;
mod site;
mod utils;

use anyhow::{Result, bail};
use build::build_site;
use clap::Parser;
use cli::{Cli, Commands};
use compiler::{CommandBundler, CommandMinifier};
use config::AppConfig;
use manifest::Manifest;
use serve::serve_site;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Init { name } => init::new_project(
            &scoped_to(config, name.as_deref()),
            name.is_some(),
        ),
        Commands::Build { .. } => build_all(&config).map(|_| ()),
        Commands::Serve { .. } => {
            // The listener must never start against a partial build
            build_all(&config)?;
            serve_site(&config, &site::starter_registry())
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        AppConfig::from_path(&config_path)?
    } else {
        AppConfig::default()
    };
    config.update_with_cli(cli);

    // Validate config state based on command
    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different path.")
        }
        (false, false) => bail!("Config file not found."),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}

/// Re-root a config for `init <NAME>`.
fn scoped_to(mut config: AppConfig, name: Option<&Path>) -> AppConfig {
    if let Some(name) = name {
        let root = config.get_root().join(name);
        config.set_root(&root);
    }
    config
}

/// Run the full build with the configured external tools.
fn build_all(config: &AppConfig) -> Result<Manifest> {
    let registry = site::starter_registry();
    let bundler = CommandBundler::new(&config.build.bundler);
    let minifier = CommandMinifier::new(&config.build.minifier);
    build_site(config, &registry, &bundler, &minifier)
}
