//! Page compilation pipeline.
//!
//! - **bundler**: opaque bundler/minifier collaborators
//! - **page**: per-page compilation (augment, bundle, render, compose)
//!
//! # Build Flow
//!
//! ```text
//! collect_page_sources() ──► compile_page() per source ──► Manifest
//!         │                        │
//!         ▼                        ▼
//!     source paths        index.html + <token>.js + <token>.min.js
//! ```

pub mod bundler;
pub mod page;

pub use bundler::{AssetMinifier, CommandBundler, CommandMinifier, ScriptBundler};
pub use page::{CompiledPage, compile_page};
