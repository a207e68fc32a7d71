//! HTTP server over build artifacts.
//!
//! Starts only after a completed build. Requests are classified by path
//! prefix in fixed priority order (static assets win over everything,
//! the page fallback only matches manifest-known routes) and dispatched to
//! a handler. Page routes re-run the page's middleware per request and
//! embed the resulting context for client hydration.
//!
//! All routing state lives in an explicit [`ServeContext`] built once at
//! startup: the manifest is loaded a single time, and middleware callables
//! are resolved from the registry into a route table up front rather than
//! per request. Page HTML itself is still read from disk on every request.

use crate::config::AppConfig;
use crate::error::RouteError;
use crate::hydrate::inject_context;
use crate::log;
use crate::manifest::{Manifest, ManifestEntry};
use crate::page::{Middleware, PageRegistry, RequestContext, RequestInfo};
use anyhow::{Context, Result, anyhow};
use std::{
    collections::HashMap,
    fs,
    net::SocketAddr,
    path::Path,
    sync::Arc,
};
use tiny_http::{Header, Request, Response, Server};

/// Worker threads pulling from the shared listener.
const WORKERS: usize = 4;

/// Fixed content types per route class.
const CONTENT_TYPE_HTML: &str = "text/html; charset=utf-8";
const CONTENT_TYPE_JS: &str = "application/javascript; charset=utf-8";
const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

// ============================================================================
// Serve Context
// ============================================================================

/// One route with its middleware resolved at startup.
pub struct RouteEntry {
    pub entry: ManifestEntry,
    pub middleware: Option<Middleware>,
}

/// Immutable routing state shared by all workers for the process lifetime.
pub struct ServeContext {
    config: AppConfig,
    routes: HashMap<String, RouteEntry>,
}

impl ServeContext {
    /// Resolve the manifest against the registry into a route table.
    ///
    /// Middleware is bound here, once; the registry is not consulted again
    /// at request time.
    pub fn new(config: AppConfig, manifest: Manifest, registry: &PageRegistry) -> Self {
        let pages_out_rel = config.build.output.join("pages");

        let routes = manifest
            .entries()
            .iter()
            .map(|entry| {
                let middleware = if entry.middleware {
                    resolve_middleware(entry, &pages_out_rel, registry)
                } else {
                    None
                };
                (
                    entry.url.clone(),
                    RouteEntry {
                        entry: entry.clone(),
                        middleware,
                    },
                )
            })
            .collect();

        Self { config, routes }
    }

    fn root(&self) -> &Path {
        self.config.get_root()
    }

    pub fn route(&self, url: &str) -> Option<&RouteEntry> {
        self.routes.get(url)
    }
}

/// Find the registration backing a manifest entry.
///
/// Entries record their output directory; the matching registration is the
/// one whose source lives in the mirrored directory under the pages root.
fn resolve_middleware(
    entry: &ManifestEntry,
    pages_out_rel: &Path,
    registry: &PageRegistry,
) -> Option<Middleware> {
    let rel_dir = entry
        .path
        .strip_prefix(pages_out_rel)
        .unwrap_or(Path::new(""))
        .to_string_lossy()
        .replace('\\', "/");

    registry
        .iter()
        .find(|(key, _)| {
            let parent = Path::new(key)
                .parent()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            parent == rel_dir
        })
        .and_then(|(_, module)| module.middleware.clone())
}

// ============================================================================
// Classification
// ============================================================================

/// Route classes in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    StaticAsset,
    Api,
    CompiledAsset,
    Page,
    NotFound,
}

/// Classify a request path. First match wins; asset prefixes always beat
/// the page fallback, and the fallback only matches manifest-known routes
/// so unknown paths reach the not-found handler.
pub fn classify(path: &str, ctx: &ServeContext) -> RouteClass {
    if path.starts_with(&ctx.config.statics_prefix()) {
        RouteClass::StaticAsset
    } else if path.starts_with("/api") {
        RouteClass::Api
    } else if path.starts_with(&ctx.config.dist_prefix()) {
        RouteClass::CompiledAsset
    } else if ctx.route(path).is_some() {
        RouteClass::Page
    } else {
        RouteClass::NotFound
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// A fully materialized response.
pub struct RouteResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Dispatch a classified request to its handler.
pub fn dispatch(
    ctx: &ServeContext,
    class: RouteClass,
    req: &RequestInfo,
) -> Result<RouteResponse, RouteError> {
    match class {
        RouteClass::StaticAsset => handle_asset(ctx, &req.path, CONTENT_TYPE_HTML),
        RouteClass::Api => Ok(handle_api()),
        RouteClass::CompiledAsset => handle_asset(ctx, &req.path, CONTENT_TYPE_JS),
        RouteClass::Page => handle_page(ctx, req),
        RouteClass::NotFound => Ok(handle_not_found()),
    }
}

/// Classify, dispatch, and collapse errors into their mapped status codes.
pub fn route(ctx: &ServeContext, req: &RequestInfo) -> RouteResponse {
    let class = classify(&req.path, ctx);
    match dispatch(ctx, class, req) {
        Ok(response) => response,
        Err(err) => RouteResponse {
            status: err.status(),
            content_type: CONTENT_TYPE_TEXT,
            body: err.to_string().into_bytes(),
        },
    }
}

/// Serve a file under the project root with a fixed content type.
///
/// The content type is per route class, never inferred from the extension;
/// read failures surface as 500, there is no 404 path for assets.
fn handle_asset(
    ctx: &ServeContext,
    path: &str,
    content_type: &'static str,
) -> Result<RouteResponse, RouteError> {
    let local = ctx.root().join(path.trim_start_matches('/'));
    let body = fs::read(&local)?;
    Ok(RouteResponse {
        status: 200,
        content_type,
        body,
    })
}

/// Reserved extension point: fixed placeholder for any `/api` request.
fn handle_api() -> RouteResponse {
    RouteResponse {
        status: 200,
        content_type: CONTENT_TYPE_TEXT,
        body: b"API".to_vec(),
    }
}

/// Serve a compiled page with fresh per-request context embedded.
///
/// Every failure here collapses to a 404-class kind: a missing page and a
/// page that failed to render are deliberately indistinguishable.
fn handle_page(ctx: &ServeContext, req: &RequestInfo) -> Result<RouteResponse, RouteError> {
    let route = ctx
        .route(&req.path)
        .ok_or_else(|| RouteError::NotFound(req.path.clone()))?;

    let context = match &route.middleware {
        Some(middleware) => RequestContext {
            props: middleware(req).map_err(|e| RouteError::Middleware(format!("{e:#}")))?,
        },
        None => RequestContext::placeholder(),
    };

    let html_path = ctx.root().join(&route.entry.path).join("index.html");
    let html = fs::read_to_string(&html_path)
        .map_err(|_| RouteError::NotFound(req.path.clone()))?;

    let body = inject_context(&html, &context.props, &req.path);
    Ok(RouteResponse {
        status: 200,
        content_type: CONTENT_TYPE_HTML,
        body: body.into_bytes(),
    })
}

/// Fixed plain-text 404 for paths no classification claimed.
fn handle_not_found() -> RouteResponse {
    RouteResponse {
        status: 404,
        content_type: CONTENT_TYPE_TEXT,
        body: b"NOT FOUND".to_vec(),
    }
}

// ============================================================================
// Server Entry Point
// ============================================================================

/// Start the server over a completed build.
///
/// Binds the configured interface/port, installs a Ctrl+C handler, and
/// runs a fixed pool of worker threads over the shared listener. Blocks
/// until shutdown.
pub fn serve_site(config: &AppConfig, registry: &PageRegistry) -> Result<()> {
    let manifest = Manifest::load(&config.manifest_path())?;
    let ctx = Arc::new(ServeContext::new(config.clone(), manifest, registry));

    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let addr = SocketAddr::new(interface, config.serve.port);
    let server =
        Arc::new(Server::http(addr).map_err(|e| anyhow!("Failed to bind {addr}: {e}"))?);

    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        server_for_signal.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr}");

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let server = Arc::clone(&server);
            let ctx = Arc::clone(&ctx);
            std::thread::spawn(move || {
                // recv errors once the listener is unblocked on shutdown
                while let Ok(request) = server.recv() {
                    if let Err(e) = handle_request(request, &ctx) {
                        log!("error"; "request failed: {e:#}");
                    }
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().ok();
    }

    Ok(())
}

/// Handle one incoming request end to end.
fn handle_request(request: Request, ctx: &ServeContext) -> Result<()> {
    let info = request_info(&request);
    let response = route(ctx, &info);

    let header = Header::from_bytes("Content-Type", response.content_type)
        .map_err(|_| anyhow!("Invalid content-type header"))?;
    request.respond(
        Response::from_data(response.body)
            .with_status_code(response.status)
            .with_header(header),
    )?;
    Ok(())
}

/// Build the middleware-facing request view.
fn request_info(request: &Request) -> RequestInfo {
    let raw_url = request.url();

    // Decode URL-encoded characters and strip any query string
    let decoded = urlencoding::decode(raw_url)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| raw_url.to_string());
    let path = decoded.split('?').next().unwrap_or(&decoded).to_string();

    let host = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Host"))
        .map(|h| h.value.to_string())
        .unwrap_or_else(|| "localhost".to_string());

    RequestInfo {
        method: request.method().as_str().to_string(),
        url: format!("http://{host}{raw_url}"),
        path,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::build_site;
    use crate::compiler::{AssetMinifier, ScriptBundler};
    use crate::hydrate::decode_context;
    use crate::page::{Component, PageModule};
    use serde_json::json;
    use tempfile::TempDir;

    const TEMPLATE: &str = concat!(
        "<html><head></head><body>",
        r#"<div id="__marea"></div>"#,
        "</body></html>",
    );

    struct Named(&'static str);

    impl Component for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn render(&self) -> String {
            format!("<p>rendered by {}</p>", self.0)
        }
    }

    struct CopyTool;

    impl ScriptBundler for CopyTool {
        fn bundle(&self, entry: &Path, out: &Path) -> anyhow::Result<()> {
            fs::copy(entry, out)?;
            Ok(())
        }
    }

    impl AssetMinifier for CopyTool {
        fn minify(&self, src: &Path, out: &Path) -> anyhow::Result<()> {
            fs::copy(src, out)?;
            Ok(())
        }
    }

    fn get(path: &str) -> RequestInfo {
        RequestInfo {
            method: "GET".into(),
            url: format!("http://localhost:8080{path}"),
            path: path.into(),
        }
    }

    /// Build a project with a root page (no middleware) and `/home`
    /// (middleware echoing the request url), then assemble a ServeContext.
    fn built_context(dir: &TempDir) -> ServeContext {
        let mut config = AppConfig::default();
        config.set_root(dir.path());
        config.build.minify = false;

        fs::create_dir_all(config.template_path().parent().unwrap()).unwrap();
        fs::write(config.template_path(), TEMPLATE).unwrap();

        let pages = config.pages_root();
        fs::create_dir_all(pages.join("home")).unwrap();
        fs::write(pages.join("index.tsx"), "// root").unwrap();
        fs::write(pages.join("home/index.tsx"), "// home").unwrap();

        let mut registry = PageRegistry::new();
        registry.register("index.tsx", PageModule::new(Arc::new(Named("IndexPage"))));
        registry.register(
            "home/index.tsx",
            PageModule::new(Arc::new(Named("HomePage")))
                .with_middleware(Arc::new(|req| Ok(json!({ "url": req.url })))),
        );

        let manifest = build_site(&config, &registry, &CopyTool, &CopyTool).unwrap();
        ServeContext::new(config, manifest, &registry)
    }

    // ------------------------------------------------------------------------
    // Classification
    // ------------------------------------------------------------------------

    #[test]
    fn test_classify_priority_order() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        assert_eq!(classify("/public/foo.png", &ctx), RouteClass::StaticAsset);
        assert_eq!(classify("/api/users", &ctx), RouteClass::Api);
        assert_eq!(
            classify("/_marea/build/pages/x.js", &ctx),
            RouteClass::CompiledAsset
        );
        assert_eq!(classify("/home", &ctx), RouteClass::Page);
        assert_eq!(classify("/", &ctx), RouteClass::Page);
        assert_eq!(classify("/unknown", &ctx), RouteClass::NotFound);
    }

    #[test]
    fn test_classify_static_wins_over_fallback() {
        // Even a manifest-looking path under /public is a static asset
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);
        assert_eq!(classify("/public/home", &ctx), RouteClass::StaticAsset);
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    #[test]
    fn test_root_page_placeholder_context() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        let resp = route(&ctx, &get("/"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, CONTENT_TYPE_HTML);

        let body = String::from_utf8(resp.body).unwrap();
        assert!(body.contains("rendered by IndexPage"));

        let start = body.find("marea-data=\"").unwrap() + "marea-data=\"".len();
        let end = start + body[start..].find('"').unwrap();
        assert_eq!(decode_context(&body[start..end]).unwrap(), json!({}));
    }

    #[test]
    fn test_middleware_props_embedded_exactly() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        let req = get("/home");
        let resp = route(&ctx, &req);
        assert_eq!(resp.status, 200);

        let body = String::from_utf8(resp.body).unwrap();
        let start = body.find("marea-data=\"").unwrap() + "marea-data=\"".len();
        let end = start + body[start..].find('"').unwrap();
        let decoded = decode_context(&body[start..end]).unwrap();
        assert_eq!(decoded, json!({ "url": "http://localhost:8080/home" }));
        assert!(body.contains(r#"marea-route="/home""#));
    }

    #[test]
    fn test_page_dir_missing_yields_404() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        // Manifest knows the page, but its artifacts are gone
        fs::remove_dir_all(ctx.root().join(&ctx.route("/home").unwrap().entry.path)).unwrap();

        let resp = route(&ctx, &get("/home"));
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_middleware_failure_yields_404() {
        let dir = TempDir::new().unwrap();
        let mut ctx = built_context(&dir);

        let broken: Middleware = Arc::new(|_| anyhow::bail!("no props today"));
        ctx.routes.get_mut("/home").unwrap().middleware = Some(broken);

        let resp = route(&ctx, &get("/home"));
        assert_eq!(resp.status, 404);
        assert!(String::from_utf8(resp.body).unwrap().contains("no props today"));
    }

    #[test]
    fn test_static_asset_bytes_with_html_content_type() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        let bytes = [0x89u8, b'P', b'N', b'G', 0, 1, 2, 3];
        fs::write(ctx.root().join("public/foo.png"), bytes).unwrap();

        let resp = route(&ctx, &get("/public/foo.png"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, CONTENT_TYPE_HTML);
        assert_eq!(resp.body, bytes);
    }

    #[test]
    fn test_missing_static_asset_is_500() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        let resp = route(&ctx, &get("/public/missing.css"));
        assert_eq!(resp.status, 500);
    }

    #[test]
    fn test_compiled_asset_content_type() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        let compiled = ctx.route("/home").unwrap().entry.compiled.clone();
        let path = format!("/{}", compiled.to_string_lossy());
        let resp = route(&ctx, &get(&path));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.content_type, CONTENT_TYPE_JS);
    }

    #[test]
    fn test_api_stub() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        for path in ["/api", "/api/anything/at/all"] {
            let resp = route(&ctx, &get(path));
            assert_eq!(resp.status, 200);
            assert_eq!(resp.body, b"API");
        }
    }

    #[test]
    fn test_not_found_fixed_body() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        let resp = route(&ctx, &get("/nowhere"));
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, b"NOT FOUND");
        assert_eq!(resp.content_type, CONTENT_TYPE_TEXT);
    }

    #[test]
    fn test_route_table_binds_middleware_once() {
        let dir = TempDir::new().unwrap();
        let ctx = built_context(&dir);

        assert!(ctx.route("/home").unwrap().middleware.is_some());
        assert!(ctx.route("/").unwrap().middleware.is_none());
        assert!(ctx.route("/home").unwrap().entry.middleware);
    }
}
