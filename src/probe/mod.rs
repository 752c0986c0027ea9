// src/probe/mod.rs
// =============================================================================
// Everything that touches a single URL.
//
// Submodules:
// - http:     the probe executor, ProbeResult and the URL join rule
// - html:     title extraction and directory classification
// - liveness: pre-scan target liveness check
// - render:   optional page-renderer interface (headless browser mode)
// =============================================================================

mod html;      // no network, pure string checks
mod http;      // ProbeExecutor, ProbeResult
mod liveness;
mod render;

pub use html::{extract_title, is_directory, LISTING_MARKERS};
pub use http::{join_url, ProbeExecutor, ProbeResult, SELECTED_HEADERS, SLOW_BODY_LIMIT};
pub use liveness::{partition_alive, AssumeAlive, HttpLivenessProber, LivenessProber};
pub use render::{PageRenderer, RenderedPage};
