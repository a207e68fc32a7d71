//! Built-in starter pages.
//!
//! Server-side registrations for the page sources that `marea init`
//! scaffolds: a root index page, `/home` with a middleware echoing the
//! request url, and `/about`. Rendering matches the client components'
//! context-free output; the hydrated client re-renders with props.

use crate::page::{Component, PageHead, PageModule, PageRegistry};
use serde_json::json;
use std::sync::Arc;

struct IndexPage;

impl Component for IndexPage {
    fn name(&self) -> &str {
        "IndexPage"
    }

    fn render(&self) -> String {
        concat!(
            r#"<div class="box">"#,
            "<h2>Index</h2>",
            "<button>See console</button>",
            "</div>",
        )
        .into()
    }
}

struct HomePage;

impl Component for HomePage {
    fn name(&self) -> &str {
        "HomePage"
    }

    // No request context at build time: the `url` prop is absent, so the
    // server-only branch renders.
    fn render(&self) -> String {
        let items: String = (1..=7).map(|k| format!("<li>{k}</li>")).collect();
        format!(
            r#"<div class="box"><b>SERVER ONLY</b><ul>{items}</ul><button>Go!</button></div>"#
        )
    }
}

struct AboutPage;

impl Component for AboutPage {
    fn name(&self) -> &str {
        "AboutPage"
    }

    fn render(&self) -> String {
        "<div><h3>Counter</h3><p>0</p><button>++</button></div>".into()
    }
}

/// Registry for the starter site.
pub fn starter_registry() -> PageRegistry {
    let mut registry = PageRegistry::new();

    registry.register(
        "index.tsx",
        PageModule::new(Arc::new(IndexPage)).with_head(PageHead {
            title: "INDEX".into(),
            description: "Marea starter page".into(),
        }),
    );

    registry.register(
        "home/index.tsx",
        PageModule::new(Arc::new(HomePage))
            .with_middleware(Arc::new(|request| {
                Ok(json!({ "url": request.url }))
            }))
            .with_head(PageHead {
                title: "HOME".into(),
                description: "Marea starter page".into(),
            }),
    );

    registry.register(
        "about/index.tsx",
        PageModule::new(Arc::new(AboutPage)).with_head(PageHead {
            title: "ABOUT".into(),
            description: "Marea starter page".into(),
        }),
    );

    registry
}

// ============================================================================
// Tests
// ============================================================================
