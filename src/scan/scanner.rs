// src/scan/scanner.rs
// =============================================================================
// The public face of the engine.
//
// A Scanner owns one session: the validated config, the candidate path set
// (computed once), the collaborators and the retained results.
//
//   let scanner = Scanner::new(config, words)?;
//   let results = scanner.scan(&targets).await?;
//   scanner.save_results(Path::new("report.json")).await?;
//
// Collaborators default to the real implementations (HTTP probe executor,
// HEAD-based liveness check, tracing presenter, report writer for the
// configured format). ScannerBuilder swaps any of them out.
// =============================================================================

use crate::config::ScanConfig;
use crate::dictionary::{prepare_words, synthesize_paths};
use crate::error::{InternalFault, Result, TargetError};
use crate::probe::{partition_alive, HttpLivenessProber, LivenessProber, PageRenderer, ProbeExecutor, ProbeResult};
use crate::progress::{LogPresenter, StatusPresenter};
use crate::report::{report_writer, ReportWriter};
use crate::scan::filter::StatusFilter;
use crate::scan::pool::{Probe, TaskScheduler};
use crate::scan::recursion::RecursionController;
use crate::scan::session::ScanSession;
use crate::timing::{Calibrator, HostTimingRegistry, HostTimingState};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

pub struct Scanner {
    config: ScanConfig,
    paths: Arc<[String]>,
    session: Arc<ScanSession>,
    timing: Arc<HostTimingRegistry>,
    probe: Arc<dyn Probe>,
    liveness: Arc<dyn LivenessProber>,
    presenter: Arc<dyn StatusPresenter>,
    report: Box<dyn ReportWriter>,
}

/// Assembles a Scanner, optionally replacing its collaborators
pub struct ScannerBuilder {
    config: ScanConfig,
    words: Vec<String>,
    probe: Option<Arc<dyn Probe>>,
    renderer: Option<Arc<dyn PageRenderer>>,
    calibrator: Option<Arc<dyn Calibrator>>,
    liveness: Option<Arc<dyn LivenessProber>>,
    presenter: Option<Arc<dyn StatusPresenter>>,
    report: Option<Box<dyn ReportWriter>>,
}

impl ScannerBuilder {
    pub fn new(config: ScanConfig, words: Vec<String>) -> Self {
        Self {
            config,
            words,
            probe: None,
            renderer: None,
            calibrator: None,
            liveness: None,
            presenter: None,
            report: None,
        }
    }

    /// Replaces the HTTP probe executor entirely
    pub fn probe(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Keeps the executor but fetches pages through `renderer`
    pub fn renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn calibrator(mut self, calibrator: Arc<dyn Calibrator>) -> Self {
        self.calibrator = Some(calibrator);
        self
    }

    pub fn liveness(mut self, liveness: Arc<dyn LivenessProber>) -> Self {
        self.liveness = Some(liveness);
        self
    }

    pub fn presenter(mut self, presenter: Arc<dyn StatusPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn report_writer(mut self, report: Box<dyn ReportWriter>) -> Self {
        self.report = Some(report);
        self
    }

    /// Validates the config and synthesizes the candidate path set
    pub fn build(self) -> Result<Scanner> {
        let config = self.config.validate()?;

        let words = prepare_words(&self.words, config.dictionary.case);
        let paths: Arc<[String]> = synthesize_paths(&words, &config.dictionary).into();

        let timing = Arc::new(match self.calibrator {
            Some(calibrator) => {
                HostTimingRegistry::with_calibrator(calibrator, config.connection.delay(), config.connection.timeout())
            }
            None => HostTimingRegistry::new(config.connection.delay(), config.connection.timeout()),
        });

        let probe: Arc<dyn Probe> = match self.probe {
            Some(probe) => probe,
            None => {
                let executor = ProbeExecutor::new(&config, Arc::clone(&timing))?;
                match self.renderer {
                    Some(renderer) => Arc::new(executor.with_renderer(renderer)),
                    None => Arc::new(executor),
                }
            }
        };

        let liveness: Arc<dyn LivenessProber> = match self.liveness {
            Some(liveness) => liveness,
            None => Arc::new(HttpLivenessProber::new(&config)?),
        };

        let presenter = self.presenter.unwrap_or_else(|| Arc::new(LogPresenter::new()));
        let report = self.report.unwrap_or_else(|| report_writer(config.output.format));
        let session = Arc::new(ScanSession::new(StatusFilter::from_config(&config.general)));

        info!(
            words = words.len(),
            paths = paths.len(),
            threads = config.pool_size(),
            "scanner ready"
        );

        Ok(Scanner {
            config,
            paths,
            session,
            timing,
            probe,
            liveness,
            presenter,
            report,
        })
    }
}

impl Scanner {
    /// Scanner with the default collaborators
    pub fn new(config: ScanConfig, words: Vec<String>) -> Result<Self> {
        ScannerBuilder::new(config, words).build()
    }

    pub fn builder(config: ScanConfig, words: Vec<String>) -> ScannerBuilder {
        ScannerBuilder::new(config, words)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The deduplicated candidate paths every level is scanned with
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Timing state of every host calibrated so far
    pub async fn host_stats(&self) -> Vec<HostTimingState> {
        self.timing.host_stats().await
    }

    /// Scans `targets` and returns the retained results
    ///
    /// Fatal conditions (no targets, a malformed target, an empty candidate
    /// set, no alive target) are returned as errors before any probing. After
    /// stop() the scan winds down and returns whatever was retained.
    pub async fn scan(&self, targets: &[String]) -> Result<Vec<ProbeResult>> {
        match AssertUnwindSafe(self.run(targets)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(InternalFault::from_panic("scan", payload).into()),
        }
    }

    async fn run(&self, targets: &[String]) -> Result<Vec<ProbeResult>> {
        let targets: Vec<&str> = targets
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if targets.is_empty() {
            return Err(TargetError::NoTargets.into());
        }

        let targets = targets
            .into_iter()
            .map(normalize_target)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if self.paths.is_empty() {
            return Err(TargetError::EmptyWordlist.into());
        }

        let (alive, _dead) = partition_alive(self.liveness.as_ref(), &targets).await;
        if alive.is_empty() {
            return Err(TargetError::NoAliveTargets { checked: targets.len() }.into());
        }

        let scheduler = TaskScheduler::new(
            Arc::clone(&self.probe),
            Arc::clone(&self.session),
            Arc::clone(&self.presenter),
            self.config.pool_size(),
            self.config.connection.delay() > Duration::ZERO,
        );
        let controller = RecursionController::new(
            scheduler,
            self.config.general.recursive,
            self.config.general.max_recursion_depth,
        );

        let raw = controller.run(&alive, Arc::clone(&self.paths)).await?;

        let retained = self.session.snapshot().await;
        info!(
            probed = raw.len(),
            retained = retained.len(),
            stopped = self.session.is_cancelled(),
            "scan finished"
        );
        self.presenter.finished(&retained);
        Ok(retained)
    }

    /// Asks a running scan to stop; safe to call from any task
    pub fn stop(&self) {
        self.session.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.session.is_cancelled()
    }

    /// Copy of the retained results so far
    pub async fn get_results(&self) -> Vec<ProbeResult> {
        self.session.snapshot().await
    }

    /// Writes the retained results with the configured report writer
    pub async fn save_results(&self, path: &Path) -> Result<()> {
        let results = self.session.snapshot().await;
        self.report.write(&results, path)?;
        info!(path = %path.display(), results = results.len(), "report saved");
        Ok(())
    }
}

// Checks that a target is an absolute http(s) URL with a host and gives it a
// trailing slash
//
//   "https://example.com"      -> "https://example.com/"
//   "http://10.0.0.1:8080/app" -> "http://10.0.0.1:8080/app/"
//   "example.com"              -> InvalidTarget
pub fn normalize_target(target: &str) -> std::result::Result<String, TargetError> {
    let invalid = |reason: String| TargetError::InvalidTarget {
        target: target.to_string(),
        reason,
    };

    let parsed = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }

    let mut normalized = target.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Ok(normalized)
}
