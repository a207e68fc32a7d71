//! HTML minification for composed page output.
//!
//! Minification is applied to the final page HTML when `build.minify` is
//! enabled; returns the input unchanged otherwise.

use crate::config::AppConfig;
use std::borrow::Cow;

/// Minify composed page HTML based on config.
///
/// Returns `Cow::Borrowed` if minify disabled, `Cow::Owned` if minified.
pub fn minify_html<'a>(html: &'a str, config: &AppConfig) -> Cow<'a, str> {
    if !config.build.minify {
        return Cow::Borrowed(html);
    }

    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = false;
    cfg.minify_css = true;
    cfg.minify_js = true;

    let minified = minify_html::minify(html.as_bytes(), &cfg);
    Cow::Owned(String::from_utf8_lossy(&minified).into_owned())
}

// ============================================================================
// Tests
// ============================================================================
