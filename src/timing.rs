// src/timing.rs
// =============================================================================
// Host timing registry: per-host adaptive pacing and request deadlines.
//
// The first probe to a host triggers one calibration: a raw TCP connect to
// port 80 (falling back to 443), timed. From that baseline latency we derive
//
//   smart delay   = clamp(baseline * 10, 100ms, 5s)
//   smart timeout = clamp(baseline * 30, 5s, 30s)
//
// Hosts that cannot be reached fall back to the static delay/timeout from the
// configuration.
//
// Calibration is single-flight: the map holds one OnceCell per host, so any
// number of concurrent first callers wait on the same calibration instead of
// each dialing the host.
// =============================================================================

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, warn};
use url::Url;

/// Connect timeout for each calibration attempt
pub const CALIBRATION_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const DELAY_MULTIPLIER: u32 = 10;
const TIMEOUT_MULTIPLIER: u32 = 30;
const SLOW_MULTIPLIER: u32 = 20;

pub const MIN_SMART_DELAY: Duration = Duration::from_millis(100);
pub const MAX_SMART_DELAY: Duration = Duration::from_secs(5);
pub const MIN_SMART_TIMEOUT: Duration = Duration::from_secs(5);
pub const MAX_SMART_TIMEOUT: Duration = Duration::from_secs(30);

/// Slow-response threshold for hosts without a baseline
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(2);

/// Calibrated timing parameters for one host
#[derive(Debug, Clone, PartialEq)]
pub struct HostTimingState {
    /// `host[:port]` key
    pub host: String,
    /// Measured connect latency; `None` when calibration failed
    pub baseline: Option<Duration>,
    pub smart_delay: Duration,
    pub smart_timeout: Duration,
    pub calibrated_at: Instant,
    pub alive: bool,
}

impl HostTimingState {
    fn calibrated(host: &str, baseline: Duration) -> Self {
        Self {
            host: host.to_string(),
            baseline: Some(baseline),
            smart_delay: smart_delay_for(baseline),
            smart_timeout: smart_timeout_for(baseline),
            calibrated_at: Instant::now(),
            alive: true,
        }
    }

    fn fallback(host: &str, delay: Duration, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            baseline: None,
            smart_delay: delay,
            smart_timeout: timeout,
            calibrated_at: Instant::now(),
            alive: false,
        }
    }

    /// True when `elapsed` exceeds 20x the baseline (or 2s without one)
    pub fn is_slow(&self, elapsed: Duration) -> bool {
        match self.baseline {
            Some(baseline) => elapsed > baseline.saturating_mul(SLOW_MULTIPLIER),
            None => elapsed > DEFAULT_SLOW_THRESHOLD,
        }
    }
}

/// Pacing delay derived from a baseline latency
pub fn smart_delay_for(baseline: Duration) -> Duration {
    baseline
        .saturating_mul(DELAY_MULTIPLIER)
        .clamp(MIN_SMART_DELAY, MAX_SMART_DELAY)
}

/// Request deadline derived from a baseline latency
pub fn smart_timeout_for(baseline: Duration) -> Duration {
    baseline
        .saturating_mul(TIMEOUT_MULTIPLIER)
        .clamp(MIN_SMART_TIMEOUT, MAX_SMART_TIMEOUT)
}

/// Registry key for a URL: host, plus the port when one is explicit
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Strips the port (and IPv6 brackets) from a `host[:port]` key
fn dial_name(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        return rest.split(']').next().unwrap_or(rest);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Measures connection latency to a host
#[async_trait]
pub trait Calibrator: Send + Sync {
    /// Returns the elapsed connect time, or `None` if the host is unreachable
    async fn measure(&self, hostname: &str) -> Option<Duration>;
}

/// Times a raw TCP connect, trying each port in turn
#[derive(Debug, Clone)]
pub struct TcpCalibrator {
    ports: Vec<u16>,
    connect_timeout: Duration,
}

impl Default for TcpCalibrator {
    fn default() -> Self {
        Self::with_ports(vec![80, 443], CALIBRATION_CONNECT_TIMEOUT)
    }
}

impl TcpCalibrator {
    pub fn with_ports(ports: Vec<u16>, connect_timeout: Duration) -> Self {
        Self {
            ports,
            connect_timeout,
        }
    }
}

#[async_trait]
impl Calibrator for TcpCalibrator {
    async fn measure(&self, hostname: &str) -> Option<Duration> {
        // Elapsed time covers failed attempts too: a host that only answers
        // on the fallback port is treated as slow.
        let start = Instant::now();
        for &port in &self.ports {
            let attempt = tokio::time::timeout(self.connect_timeout, TcpStream::connect((hostname, port)));
            match attempt.await {
                Ok(Ok(_stream)) => return Some(start.elapsed()),
                Ok(Err(e)) => debug!(host = hostname, port, error = %e, "calibration connect failed"),
                Err(_) => debug!(host = hostname, port, "calibration connect timed out"),
            }
        }
        None
    }
}

/// Per-host timing cache shared by every worker of a session
pub struct HostTimingRegistry {
    hosts: RwLock<HashMap<String, Arc<OnceCell<HostTimingState>>>>,
    calibrator: Arc<dyn Calibrator>,
    static_delay: Duration,
    static_timeout: Duration,
}

impl HostTimingRegistry {
    /// Registry using TCP calibration and the given static fallbacks
    pub fn new(static_delay: Duration, static_timeout: Duration) -> Self {
        Self::with_calibrator(Arc::new(TcpCalibrator::default()), static_delay, static_timeout)
    }

    pub fn with_calibrator(
        calibrator: Arc<dyn Calibrator>,
        static_delay: Duration,
        static_timeout: Duration,
    ) -> Self {
        Self {
            hosts: RwLock::new(HashMap::new()),
            calibrator,
            static_delay,
            static_timeout,
        }
    }

    /// Returns the host's timing state, calibrating it on first use
    pub async fn resolve(&self, host: &str) -> HostTimingState {
        if host.is_empty() {
            return HostTimingState::fallback(host, self.static_delay, self.static_timeout);
        }

        let cell = self.cell_for(host).await;
        cell.get_or_init(|| self.calibrate(host)).await.clone()
    }

    pub async fn smart_delay(&self, host: &str) -> Duration {
        self.resolve(host).await.smart_delay
    }

    pub async fn smart_timeout(&self, host: &str) -> Duration {
        self.resolve(host).await.smart_timeout
    }

    pub async fn is_slow_response(&self, host: &str, elapsed: Duration) -> bool {
        self.resolve(host).await.is_slow(elapsed)
    }

    /// Snapshot of every host calibrated so far
    pub async fn host_stats(&self) -> Vec<HostTimingState> {
        let hosts = self.hosts.read().await;
        hosts.values().filter_map(|cell| cell.get().cloned()).collect()
    }

    /// Forgets every calibration
    pub async fn clear(&self) {
        self.hosts.write().await.clear();
    }

    async fn cell_for(&self, host: &str) -> Arc<OnceCell<HostTimingState>> {
        if let Some(cell) = self.hosts.read().await.get(host) {
            return Arc::clone(cell);
        }
        let mut hosts = self.hosts.write().await;
        Arc::clone(
            hosts
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    async fn calibrate(&self, host: &str) -> HostTimingState {
        match self.calibrator.measure(dial_name(host)).await {
            Some(baseline) => {
                let state = HostTimingState::calibrated(host, baseline);
                debug!(
                    host,
                    baseline_ms = baseline.as_millis() as u64,
                    delay_ms = state.smart_delay.as_millis() as u64,
                    timeout_ms = state.smart_timeout.as_millis() as u64,
                    "host calibrated"
                );
                state
            }
            None => {
                warn!(host, "calibration failed, using static delay and timeout");
                HostTimingState::fallback(host, self.static_delay, self.static_timeout)
            }
        }
    }
}


// -----------------------------------------------------------------------------
// NOTES:
//
// 1. How does the single-flight work?
//    - The map only hands out Arc<OnceCell<..>>, created under the write lock
//    - get_or_init() runs the calibration for the first caller; everyone else
//      awaits the same cell
//
// 2. Why does the key keep the port but dialing drop it?
//    - "example.com:8080" and "example.com" are different services, so they
//      get separate entries
//    - Calibration always dials ports 80 and 443 of the bare host name
//
// 3. Duration arithmetic
//    - saturating_mul() caps at Duration::MAX instead of panicking
//    - clamp() comes from Ord, which Duration implements
// -----------------------------------------------------------------------------
