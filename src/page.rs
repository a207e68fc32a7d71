//! Page module contract.
//!
//! A page module pairs a client source file (bundled for the browser) with
//! its server-side registration: a component that renders to an HTML
//! string, an optional per-request middleware producing context props, and
//! optional head metadata. Registrations are keyed by the source path
//! relative to the pages root.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};

// ============================================================================
// Component and middleware seams
// ============================================================================

/// Server-side view of a page component.
///
/// Rendering takes no request context: props are unknown at build time and
/// only arrive per request via middleware, carried to the client through
/// the hydration payload.
pub trait Component: Send + Sync {
    /// Exported symbol name, referenced by the hydration bootstrap.
    fn name(&self) -> &str;

    /// Render the component to an HTML string with no request context.
    fn render(&self) -> String;
}

/// Per-page, per-request context producer. Not a pipeline: at most one per
/// page, returning the props object embedded in the served HTML.
pub type Middleware = Arc<dyn Fn(&RequestInfo) -> Result<Value> + Send + Sync>;

/// Head metadata injected into the template and recorded in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHead {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// One page's registration.
#[derive(Clone)]
pub struct PageModule {
    pub component: Arc<dyn Component>,
    pub middleware: Option<Middleware>,
    pub head: Option<PageHead>,
}

impl PageModule {
    pub fn new(component: Arc<dyn Component>) -> Self {
        Self {
            component,
            middleware: None,
            head: None,
        }
    }

    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware = Some(middleware);
        self
    }

    pub fn with_head(mut self, head: PageHead) -> Self {
        self.head = Some(head);
        self
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Registrations keyed by pages-root-relative source path
/// (e.g. `home/index.tsx`).
#[derive(Clone, Default)]
pub struct PageRegistry {
    modules: HashMap<String, PageModule>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, relative_path: impl Into<String>, module: PageModule) {
        self.modules.insert(relative_path.into(), module);
    }

    pub fn get(&self, relative_path: &str) -> Option<&PageModule> {
        self.modules.get(relative_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PageModule)> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ============================================================================
// Request-side values
// ============================================================================

/// The request view handed to middleware.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
    pub path: String,
}

/// Per-request context embedded into served HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub props: Value,
}

impl RequestContext {
    /// Placeholder context for pages without middleware.
    pub fn placeholder() -> Self {
        Self {
            props: Value::Object(serde_json::Map::new()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
