// src/lib.rs
// =============================================================================
// dirhound: adaptive, concurrent web path discovery.
//
// Module map:
// - config:     ScanConfig and its groups
// - dictionary: word preparation and candidate path synthesis
// - timing:     per-host latency calibration (smart delay / timeout)
// - probe:      one HTTP request per path, HTML helpers, liveness check
// - scan:       worker pool, recursion, session and the Scanner facade
// - progress:   live status reporting
// - report:     writing results to disk
// - error:      the error taxonomy
//
// Most callers only need Scanner and ScanConfig:
//
//   let scanner = Scanner::new(config, words)?;
//   let results = scanner.scan(&["https://example.com".to_string()]).await?;
// =============================================================================

pub mod config;
pub mod dictionary;
pub mod error;
pub mod probe;
pub mod progress;
pub mod report;
pub mod scan;
pub mod timing;

pub use config::ScanConfig;
pub use error::{Result, ScanError};
pub use probe::ProbeResult;
pub use scan::{Scanner, ScannerBuilder};
