// src/scan/recursion.rs
// =============================================================================
// Depth-bounded recursive directory discovery.
//
// How it works:
// 1. Level 0 scans the targets with the full candidate set
// 2. Every result with status 200/403 that classifies as a directory becomes
//    a target for the next level
// 3. Each of those directories is scanned on its own, one after another, with
//    the same candidate set (the pass itself is concurrent)
// 4. Repeat until nothing new is found, the ceiling is reached or the scan
//    is cancelled
//
// Levels are breadth-first: level N+1 starts only after every directory of
// level N has been scanned. A directory is never scanned twice in one run.
// =============================================================================

use crate::config::MAX_RECURSION_LEVEL;
use crate::error::{RecursionError, Result};
use crate::probe::ProbeResult;
use crate::scan::pool::TaskScheduler;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

// Resolves the configured depth against the fixed ceiling
//
//   0        -> 3 (unset)
//   1..=3    -> as configured
//   above 3  -> 3
pub fn effective_ceiling(configured: usize) -> usize {
    if configured == 0 {
        MAX_RECURSION_LEVEL
    } else {
        configured.min(MAX_RECURSION_LEVEL)
    }
}

/// Whether a result leads to another level
pub fn is_recursion_candidate(result: &ProbeResult) -> bool {
    matches!(result.status, Some(200) | Some(403)) && result.is_directory
}

pub struct RecursionController {
    scheduler: TaskScheduler,
    enabled: bool,
    ceiling: usize,
}

impl RecursionController {
    pub fn new(scheduler: TaskScheduler, enabled: bool, max_depth: usize) -> Self {
        if enabled && max_depth > MAX_RECURSION_LEVEL {
            warn!(
                configured = max_depth,
                ceiling = MAX_RECURSION_LEVEL,
                "recursion depth capped"
            );
        }
        Self {
            scheduler,
            enabled,
            ceiling: effective_ceiling(max_depth),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Runs level 0 and, when enabled, every recursion level after it
    ///
    /// Returns the raw results of all levels. A failure on level 0 is fatal;
    /// failures on individual directories are logged and skipped.
    pub async fn run(&self, targets: &[String], paths: Arc<[String]>) -> Result<Vec<ProbeResult>> {
        let session = Arc::clone(self.scheduler.session());

        info!(targets = targets.len(), paths = paths.len(), "starting level 0");
        let mut all = self.scheduler.run_level(targets, Arc::clone(&paths), 0).await?;

        if !self.enabled {
            return Ok(all);
        }

        let mut scanned: HashSet<String> = targets.iter().cloned().collect();
        let mut frontier = new_directories(&all, &mut scanned);
        let mut level = 0;

        while level < self.ceiling && !frontier.is_empty() && !session.is_cancelled() {
            level += 1;
            info!(level, directories = frontier.len(), "recursing");

            let mut found = Vec::new();
            for directory in &frontier {
                if session.is_cancelled() {
                    break;
                }
                info!(level, %directory, "scanning directory");

                match self.scan_directory(directory, Arc::clone(&paths), level).await {
                    Ok(results) => found.extend(results),
                    Err(e) => warn!(level, error = %e, "skipping directory"),
                }
            }

            frontier = new_directories(&found, &mut scanned);
            all.extend(found);
        }

        Ok(all)
    }

    async fn scan_directory(
        &self,
        directory: &str,
        paths: Arc<[String]>,
        level: usize,
    ) -> std::result::Result<Vec<ProbeResult>, RecursionError> {
        self.scheduler
            .run_level(&[directory.to_string()], paths, level)
            .await
            .map_err(|e| RecursionError {
                directory: directory.to_string(),
                reason: e.to_string(),
            })
    }
}

// Directory URLs among `results` that haven't been scanned yet, in result order
fn new_directories(results: &[ProbeResult], scanned: &mut HashSet<String>) -> Vec<String> {
    results
        .iter()
        .filter(|r| is_recursion_candidate(r))
        .filter(|r| scanned.insert(r.url.clone()))
        .map(|r| r.url.clone())
        .collect()
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. What counts as a directory here?
//    - The collector sets is_directory only for 200/403 answers that pass
//      probe::is_directory (trailing slash or a listing page)
//
// 2. Why is `scanned` seeded with the targets?
//    - The empty path joins back to the target itself ("https://h/" + ""),
//      which would otherwise be scanned again one level down
//
// 3. Levels by example, ceiling 3, every path a directory:
//      level 0: https://h/a/
//      level 1: https://h/a/b/
//      level 2: https://h/a/b/a/
//      level 3: https://h/a/b/a/b/   (found, never scanned)
// -----------------------------------------------------------------------------
