// src/progress.rs
// =============================================================================
// Live progress reporting.
//
// The scheduler's collector calls a StatusPresenter for every result as it
// arrives. Rendering (colors, progress bars) is the presenter's business; the
// engine only needs the trait. LogPresenter reports through tracing so the
// binary gets readable output without a terminal UI.
// =============================================================================

use crate::probe::ProbeResult;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

pub trait StatusPresenter: Send + Sync {
    /// A new scheduling pass of `total` tasks is starting
    fn level_started(&self, level: usize, total: usize);

    /// One result was collected
    fn update(&self, result: &ProbeResult);

    /// The scan finished with these retained results
    fn finished(&self, results: &[ProbeResult]);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPresenter;

impl StatusPresenter for SilentPresenter {
    fn level_started(&self, _level: usize, _total: usize) {}
    fn update(&self, _result: &ProbeResult) {}
    fn finished(&self, _results: &[ProbeResult]) {}
}

/// Logs hits at info level, everything else at debug
#[derive(Debug, Default)]
pub struct LogPresenter {
    done: AtomicUsize,
    total: AtomicUsize,
}

/// Log a progress line every this many results
const PROGRESS_EVERY: usize = 500;

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusPresenter for LogPresenter {
    fn level_started(&self, level: usize, total: usize) {
        self.done.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
        info!(level, total, "scan pass started");
    }

    fn update(&self, result: &ProbeResult) {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);

        match result.status {
            Some(status) if status != 404 => info!(
                status,
                length = result.content_length,
                url = %result.url,
                redirect = result.redirect.as_deref().unwrap_or(""),
                "found"
            ),
            _ => debug!(url = %result.url, status = ?result.status, error = ?result.error, "miss"),
        }

        if done % PROGRESS_EVERY == 0 {
            info!(done, total, "progress");
        }
    }

    fn finished(&self, results: &[ProbeResult]) {
        let directories = results.iter().filter(|r| r.is_directory).count();
        let errors = results.iter().filter(|r| !r.is_ok()).count();
        info!(retained = results.len(), directories, errors, "scan finished");
    }
}
