//! Hydration payload injection.
//!
//! Per-request context is serialized to JSON, encoded as a comma-separated
//! byte sequence, and attached with the route path as attributes on a
//! marker element placed just before the document's closing body tag. The
//! client bootstrap decodes the attribute and re-renders the component
//! against those props.

use anyhow::{Context, Result};
use serde_json::Value;

/// Marker element id looked up by the client bootstrap.
pub const MARKER_ID: &str = "__MAREA__";

/// Attribute carrying the encoded context bytes.
pub const DATA_ATTR: &str = "marea-data";

/// Attribute carrying the resolved route path.
pub const ROUTE_ATTR: &str = "marea-route";

/// Encode context props as comma-separated decimal bytes of their JSON
/// serialization.
pub fn encode_context(props: &Value) -> String {
    let json = props.to_string();
    json.as_bytes()
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Decode an encoded context attribute back into props.
pub fn decode_context(encoded: &str) -> Result<Value> {
    if encoded.is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let bytes = encoded
        .split(',')
        .map(str::parse::<u8>)
        .collect::<Result<Vec<u8>, _>>()
        .context("Invalid context byte sequence")?;
    let json = String::from_utf8(bytes).context("Context bytes are not UTF-8")?;
    serde_json::from_str(&json).context("Context is not valid JSON")
}

/// Inject the hydration marker into served HTML.
///
/// The marker lands immediately before the last `</body>`; documents
/// without a closing body tag get it appended.
pub fn inject_context(html: &str, props: &Value, route: &str) -> String {
    let marker = format!(
        r#"<script id="{MARKER_ID}" {DATA_ATTR}="{}" {ROUTE_ATTR}="{}"></script>"#,
        encode_context(props),
        route,
    );

    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + marker.len());
            out.push_str(&html[..pos]);
            out.push_str(&marker);
            out.push_str(&html[pos..]);
            out
        }
        None => {
            let mut out = html.to_string();
            out.push_str(&marker);
            out
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
