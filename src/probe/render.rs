// src/probe/render.rs
// =============================================================================
// Optional page-rendering probe.
//
// A renderer (e.g. a headless browser) loads the page itself and reports
// status, title, size and the redirect chain. When one is installed on the
// ProbeExecutor it replaces the plain HTTP request. Only the interface lives
// here.
// =============================================================================

use crate::error::ProbeError;
use async_trait::async_trait;

/// What a renderer reports for one URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub status: u16,
    pub title: String,
    pub content_length: u64,
    /// Every URL visited on the way, in order
    pub redirects: Vec<String>,
}

#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str) -> Result<RenderedPage, ProbeError>;
}
