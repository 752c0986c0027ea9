// src/scan/mod.rs
// =============================================================================
// The scanning engine.
//
// Submodules:
// - scanner:   the Scanner facade (scan / stop / get_results / save_results)
// - recursion: level-by-level directory recursion with a fixed ceiling
// - pool:      producer / worker pool / collector for one level
// - session:   retained results and the cancellation token
// - filter:    include / exclude status-code filtering
// =============================================================================

mod filter;     // StatusFilter, StatusRange
mod pool;       // TaskScheduler and the Probe trait
mod recursion;  // RecursionController
mod scanner;    // Scanner, ScannerBuilder
mod session;    // ScanSession

pub use filter::{parse_status_codes, StatusFilter, StatusRange};
pub use pool::{Probe, ScanTask, TaskScheduler};
pub use recursion::{effective_ceiling, is_recursion_candidate, RecursionController};
pub use scanner::{normalize_target, Scanner, ScannerBuilder};
pub use session::ScanSession;
