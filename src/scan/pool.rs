// src/scan/pool.rs
// =============================================================================
// The task scheduler: one recursion level's worth of probing.
//
//   producer ──tasks──▶ [bounded queue, 2 x pool] ──▶ worker 0..N
//                                                       │
//   collector ◀──results── [bounded queue, 2 x pool] ◀──┘
//
// - The producer walks targets x paths and stops early on cancellation.
// - Each worker pulls tasks until the queue is closed or the scan is
//   cancelled, runs the probe and, when a static delay is configured, sleeps
//   for the host's smart delay before pulling again.
// - The collector (the caller's own task) stamps the recursion level and the
//   directory flag, reports progress and feeds the session.
//
// run_level() returns only after every worker has exited and the result
// queue has been drained. A panic inside one task is caught at the worker
// boundary and logged; the worker moves on to its next task.
// =============================================================================

use crate::error::{InternalFault, Result};
use crate::probe::{is_directory, ProbeExecutor, ProbeResult};
use crate::progress::StatusPresenter;
use crate::scan::session::ScanSession;
use crate::timing::host_key;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use url::Url;

/// One unit of work: a path under a target
#[derive(Debug, Clone)]
pub struct ScanTask {
    pub target: Arc<str>,
    pub path: Arc<str>,
}

/// What the pool needs from a prober
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &str, path: &str) -> ProbeResult;

    /// Pause before a worker's next task, after probing `url`
    async fn pacing_delay(&self, url: &str) -> Duration;
}

#[async_trait]
impl Probe for ProbeExecutor {
    async fn probe(&self, target: &str, path: &str) -> ProbeResult {
        ProbeExecutor::probe(self, target, path).await
    }

    async fn pacing_delay(&self, url: &str) -> Duration {
        match Url::parse(url) {
            Ok(parsed) => self.timing().smart_delay(&host_key(&parsed)).await,
            Err(_) => Duration::ZERO,
        }
    }
}

pub struct TaskScheduler {
    probe: Arc<dyn Probe>,
    session: Arc<ScanSession>,
    presenter: Arc<dyn StatusPresenter>,
    pool_size: usize,
    pacing: bool,
}

impl TaskScheduler {
    /// `pacing` enables the per-worker smart delay between tasks
    pub fn new(
        probe: Arc<dyn Probe>,
        session: Arc<ScanSession>,
        presenter: Arc<dyn StatusPresenter>,
        pool_size: usize,
        pacing: bool,
    ) -> Self {
        Self {
            probe,
            session,
            presenter,
            pool_size: pool_size.max(1),
            pacing,
        }
    }

    pub fn session(&self) -> &Arc<ScanSession> {
        &self.session
    }

    /// Probes every path under every target and returns all results of the pass
    ///
    /// The returned list is unfiltered; only retained results reach the session.
    pub async fn run_level(&self, targets: &[String], paths: Arc<[String]>, level: usize) -> Result<Vec<ProbeResult>> {
        if targets.is_empty() || paths.is_empty() {
            return Ok(Vec::new());
        }

        let cancel = self.session.cancel_token();
        self.presenter.level_started(level, targets.len() * paths.len());

        let capacity = self.pool_size * 2;
        let (task_tx, task_rx) = mpsc::channel::<ScanTask>(capacity);
        let (result_tx, mut result_rx) = mpsc::channel::<ProbeResult>(capacity);
        let task_rx = Arc::new(Mutex::new(task_rx));

        let producer = tokio::spawn(produce(
            targets.iter().map(|t| Arc::from(t.as_str())).collect(),
            paths,
            task_tx,
            cancel.clone(),
        ));

        let mut workers = Vec::with_capacity(self.pool_size);
        for id in 0..self.pool_size {
            workers.push(tokio::spawn(work(
                id,
                Arc::clone(&self.probe),
                Arc::clone(&task_rx),
                result_tx.clone(),
                cancel.clone(),
                self.pacing,
            )));
        }
        // the collector loop below ends once every worker's sender is gone
        drop(result_tx);

        let mut collected = Vec::new();
        while let Some(mut result) = result_rx.recv().await {
            result.recursion_level = level;
            // only pages that answered 200 or 403 can be directories
            result.is_directory = matches!(result.status, Some(200) | Some(403))
                && is_directory(&result.url, &result.headers, &result.body);
            self.presenter.update(&result);
            self.session.add(result.clone()).await;
            collected.push(result);
        }

        for (id, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!(worker = id, error = %e, "worker task ended abnormally");
            }
        }
        producer.await.map_err(|e| InternalFault {
            context: format!("task producer at level {}", level),
            message: e.to_string(),
        })?;

        debug!(level, results = collected.len(), cancelled = cancel.is_cancelled(), "level drained");
        Ok(collected)
    }
}

async fn produce(targets: Vec<Arc<str>>, paths: Arc<[String]>, tx: mpsc::Sender<ScanTask>, cancel: CancellationToken) {
    for target in &targets {
        for path in paths.iter() {
            let task = ScanTask {
                target: Arc::clone(target),
                path: Arc::from(path.as_str()),
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                sent = tx.send(task) => {
                    if sent.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

async fn work(
    id: usize,
    probe: Arc<dyn Probe>,
    tasks: Arc<Mutex<mpsc::Receiver<ScanTask>>>,
    results: mpsc::Sender<ProbeResult>,
    cancel: CancellationToken,
    pacing: bool,
) {
    loop {
        let task = {
            let mut rx = tasks.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                task = rx.recv() => task,
            }
        };
        let Some(task) = task else { break };

        let outcome = AssertUnwindSafe(probe.probe(&task.target, &task.path))
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let fault = InternalFault::from_panic(
                    format!("worker {} probing '{}' under '{}'", id, task.path, task.target),
                    payload,
                );
                error!(%fault, "task panicked, continuing with next task");
                continue;
            }
        };

        let url = result.url.clone();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = results.send(result) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        if pacing {
            let delay = probe.pacing_delay(&url).await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentPresenter;
    use crate::scan::filter::StatusFilter;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Answers 200 for paths starting with "ok", 404 otherwise; panics on "boom"
    struct FakeProbe {
        calls: AtomicUsize,
        paced: AtomicUsize,
        delay: Duration,
        pace: Duration,
    }

    impl FakeProbe {
        fn new(delay: Duration) -> Arc<Self> {
            Self::paced(delay, Duration::from_millis(1))
        }

        fn paced(delay: Duration, pace: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                paced: AtomicUsize::new(0),
                delay,
                pace,
            })
        }
    }

    #[async_trait]
    impl Probe for FakeProbe {
        async fn probe(&self, target: &str, path: &str) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if path == "boom" {
                panic!("probe exploded");
            }
            tokio::time::sleep(self.delay).await;
            let url = crate::probe::join_url(target, path);
            let mut result = ProbeResult::new(target, path, &url);
            result.status = Some(if path.starts_with("ok") { 200 } else { 404 });
            result
        }

        async fn pacing_delay(&self, _url: &str) -> Duration {
            self.paced.fetch_add(1, Ordering::SeqCst);
            self.pace
        }
    }

    fn paths(list: &[&str]) -> Arc<[String]> {
        list.iter().map(|p| p.to_string()).collect::<Vec<_>>().into()
    }

    fn scheduler(probe: Arc<FakeProbe>, filter: StatusFilter, pool: usize, pacing: bool) -> TaskScheduler {
        TaskScheduler::new(
            probe,
            Arc::new(ScanSession::new(filter)),
            Arc::new(SilentPresenter),
            pool,
            pacing,
        )
    }

    #[tokio::test]
    async fn test_every_task_runs_once() {
        let probe = FakeProbe::new(Duration::ZERO);
        let scheduler = scheduler(Arc::clone(&probe), StatusFilter::default(), 4, false);
        let targets = vec!["https://a/".to_string(), "https://b/".to_string()];

        let results = scheduler
            .run_level(&targets, paths(&["ok1", "x", "ok2", "y", "z"]), 2)
            .await
            .unwrap();

        assert_eq!(results.len(), 10);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 10);
        let urls: HashSet<_> = results.iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls.len(), 10);
        assert!(results.iter().all(|r| r.recursion_level == 2));
    }

    #[tokio::test]
    async fn test_session_only_keeps_filtered_results() {
        let probe = FakeProbe::new(Duration::ZERO);
        let filter = StatusFilter::new(&["200".to_string()], &[]);
        let scheduler = scheduler(probe, filter, 3, true);

        let results = scheduler
            .run_level(&["https://a/".to_string()], paths(&["ok1", "nope", "ok2"]), 0)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(scheduler.session().len().await, 2);
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stop_worker() {
        let probe = FakeProbe::new(Duration::ZERO);
        // a single worker must survive the panic to finish the rest
        let scheduler = scheduler(Arc::clone(&probe), StatusFilter::default(), 1, false);

        let results = scheduler
            .run_level(&["https://a/".to_string()], paths(&["ok1", "boom", "ok2"]), 0)
            .await
            .unwrap();

        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
        let mut got: Vec<_> = results.iter().map(|r| r.path.clone()).collect();
        got.sort();
        assert_eq!(got, vec!["ok1", "ok2"]);
    }

    #[tokio::test]
    async fn test_directory_flag_is_stamped() {
        let probe = FakeProbe::new(Duration::ZERO);
        let scheduler = scheduler(probe, StatusFilter::default(), 2, false);

        let results = scheduler
            .run_level(&["https://a/".to_string()], paths(&["ok/", "ok", "gone/"]), 0)
            .await
            .unwrap();

        let dir = results.iter().find(|r| r.path == "ok/").unwrap();
        let file = results.iter().find(|r| r.path == "ok").unwrap();
        let missing = results.iter().find(|r| r.path == "gone/").unwrap();
        assert!(dir.is_directory);
        assert!(!file.is_directory);
        // a 404 with a trailing slash is not a directory
        assert_eq!(missing.status, Some(404));
        assert!(!missing.is_directory);
    }

    #[tokio::test]
    async fn test_worker_sleeps_between_tasks() {
        let probe = FakeProbe::paced(Duration::ZERO, Duration::from_millis(50));
        let scheduler = scheduler(Arc::clone(&probe), StatusFilter::default(), 1, true);

        let started = std::time::Instant::now();
        let results = scheduler
            .run_level(&["https://a/".to_string()], paths(&["ok1", "ok2", "ok3"]), 0)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(probe.paced.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_no_pacing_without_static_delay() {
        let probe = FakeProbe::paced(Duration::ZERO, Duration::from_secs(5));
        let scheduler = scheduler(Arc::clone(&probe), StatusFilter::default(), 1, false);

        let started = std::time::Instant::now();
        scheduler
            .run_level(&["https://a/".to_string()], paths(&["ok1", "ok2", "ok3"]), 0)
            .await
            .unwrap();

        assert_eq!(probe.paced.load(Ordering::SeqCst), 0);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_cancellation_drains_pool() {
        let probe = FakeProbe::new(Duration::from_millis(20));
        let scheduler = Arc::new(scheduler(Arc::clone(&probe), StatusFilter::default(), 4, false));
        let many: Vec<String> = (0..10_000).map(|i| format!("ok{}", i)).collect();
        let many: Arc<[String]> = many.into();

        let run = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run_level(&["https://a/".to_string()], many, 0).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        scheduler.session().cancel();

        let results = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("run_level should return after cancel")
            .unwrap()
            .unwrap();
        assert!(results.len() < 10_000);
        assert!(probe.calls.load(Ordering::SeqCst) < 10_000);
    }

    #[tokio::test]
    async fn test_empty_inputs() {
        let probe = FakeProbe::new(Duration::ZERO);
        let scheduler = scheduler(Arc::clone(&probe), StatusFilter::default(), 2, false);
        assert!(scheduler.run_level(&[], paths(&["a"]), 0).await.unwrap().is_empty());
        assert!(scheduler
            .run_level(&["https://a/".to_string()], paths(&[]), 0)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. How do several workers share one receiver?
//    - mpsc::Receiver has a single owner, so it sits behind Arc<Mutex<..>>
//    - A worker holds the lock only while waiting for the next task
//
// 2. What does `biased;` do in select!?
//    - Branches are polled top to bottom instead of randomly
//    - Cancellation is listed first, so it wins when both are ready
//
// 3. When does the collector loop end?
//    - recv() returns None once every Sender clone is dropped
//    - Each worker owns one clone and drops it on exit; run_level drops
//      the original right after spawning them
// -----------------------------------------------------------------------------
