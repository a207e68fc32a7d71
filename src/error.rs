//! Request-time error kinds.
//!
//! Handler failures collapse into a small closed set of kinds, each mapped
//! to one HTTP status code. Page-route failures (lookup miss, render,
//! middleware) map to 404; asset and classification failures map to 500.
//! Kinds without a dedicated mapping fall back to Internal.

use thiserror::Error;

/// A request-handling failure.
#[derive(Debug, Error)]
pub enum RouteError {
    /// No page, artifact, or directory for the requested path.
    #[error("NOT FOUND: {0}")]
    NotFound(String),

    /// Filesystem read failed while serving an asset.
    #[error("IO failure: {0}")]
    Io(#[from] std::io::Error),

    /// Composing the response HTML failed.
    #[error("render failure: {0}")]
    Render(String),

    /// A page's middleware returned an error.
    #[error("middleware failure: {0}")]
    Middleware(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RouteError {
    /// HTTP status code for this kind.
    pub const fn status(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::Render(_) | Self::Middleware(_) => 404,
            Self::Io(_) | Self::Internal(_) => 500,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_route_kinds_map_to_404() {
        assert_eq!(RouteError::NotFound("x".into()).status(), 404);
        assert_eq!(RouteError::Render("x".into()).status(), 404);
        assert_eq!(RouteError::Middleware("x".into()).status(), 404);
    }

    #[test]
    fn test_asset_kinds_map_to_500() {
        let io = RouteError::Io(std::io::Error::other("boom"));
        assert_eq!(io.status(), 500);
        assert_eq!(RouteError::Internal("x".into()).status(), 500);
    }

    #[test]
    fn test_display_carries_cause_text() {
        let err = RouteError::Middleware("props lookup failed".into());
        assert!(err.to_string().contains("props lookup failed"));
    }
}
