// src/probe/liveness.rs
// =============================================================================
// Target liveness pre-check.
//
// Before any path is probed, each target's root is checked once with a HEAD
// request. 2xx and 3xx answers count as alive; anything else (including
// transport errors) is retried with a linear backoff and finally reported as
// dead. Only alive targets are scanned.
//
// The scanner only depends on the LivenessProber trait, so callers that have
// already checked their targets can plug in AssumeAlive.
// =============================================================================

use crate::config::ScanConfig;
use crate::error::ConfigError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[async_trait]
pub trait LivenessProber: Send + Sync {
    async fn is_alive(&self, target: &str) -> bool;
}

/// Treats every target as alive
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeAlive;

#[async_trait]
impl LivenessProber for AssumeAlive {
    async fn is_alive(&self, _target: &str) -> bool {
        true
    }
}

/// HEAD-request liveness check with retries
pub struct HttpLivenessProber {
    client: Client,
    retries: u32,
}

impl HttpLivenessProber {
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.connection.liveness_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            retries: config.connection.liveness_retries.max(1),
        })
    }

    async fn check_once(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.is_redirection()
            }
            Err(e) => {
                debug!(url, error = %e, "liveness attempt failed");
                false
            }
        }
    }
}

#[async_trait]
impl LivenessProber for HttpLivenessProber {
    async fn is_alive(&self, target: &str) -> bool {
        let url = match root_url(target) {
            Some(url) => url,
            None => return false,
        };

        for attempt in 1..=self.retries {
            if self.check_once(&url).await {
                return true;
            }
            if attempt < self.retries {
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
            }
        }
        false
    }
}

// "scheme://host[:port]/" of a target
fn root_url(target: &str) -> Option<String> {
    let parsed = Url::parse(target).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}/", parsed.scheme(), host, port),
        None => format!("{}://{}/", parsed.scheme(), host),
    })
}

/// Splits targets into (alive, dead), preserving order
pub async fn partition_alive(prober: &dyn LivenessProber, targets: &[String]) -> (Vec<String>, Vec<String>) {
    let mut alive = Vec::new();
    let mut dead = Vec::new();

    for target in targets {
        if prober.is_alive(target).await {
            alive.push(target.clone());
        } else {
            warn!(target = %target, "target is not alive, skipping");
            dead.push(target.clone());
        }
    }

    (alive, dead)
}
