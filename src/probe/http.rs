// src/probe/http.rs
// =============================================================================
// The probe executor: one HTTP request for one (target, path) pair.
//
// Flow of a probe:
// 1. Join target and path into the full URL (join_url)
// 2. Look up the host's timing state; its smart timeout is the deadline
// 3. Send the configured method with static headers / cookie / auth / body
// 4. Read the body: fully for normal responses, only the first 1KB when the
//    response was slow compared to the host's baseline
// 5. Normalize everything into a ProbeResult
//
// A probe never fails: transport errors end up in ProbeResult::error with no
// status code, so one bad request can't take a worker down.
// =============================================================================

use crate::config::{Auth, ScanConfig};
use crate::error::{ConfigError, ProbeError};
use crate::probe::html::extract_title;
use crate::probe::render::PageRenderer;
use crate::timing::{host_key, HostTimingRegistry};
use ::time::{format_description::well_known, OffsetDateTime};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use url::Url;

/// How much of a slow response body is read
pub const SLOW_BODY_LIMIT: usize = 1024;

/// Response headers kept on each result
pub const SELECTED_HEADERS: &[&str] = &[
    "content-type",
    "content-length",
    "location",
    "server",
    "x-powered-by",
];

// The normalized outcome of probing one path
//
// Created once per executed task and never modified after it reaches the
// session. Headers and body are kept for directory classification but left
// out of reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// The base URL the path was appended to
    pub target: String,
    /// The candidate path as synthesized
    pub path: String,
    /// target + path
    pub url: String,
    /// Absent when the request never got a response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub content_length: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(skip)]
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub body: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub recursion_level: usize,
    pub is_directory: bool,
}

impl ProbeResult {
    pub fn new(target: &str, path: &str, url: &str) -> Self {
        Self {
            target: target.to_string(),
            path: path.to_string(),
            url: url.to_string(),
            status: None,
            content_length: 0,
            title: String::new(),
            redirect: None,
            headers: BTreeMap::new(),
            body: String::new(),
            timestamp: now_rfc3339(),
            error: None,
            recursion_level: 0,
            is_directory: false,
        }
    }

    fn failed(mut self, error: ProbeError) -> Self {
        self.status = None;
        self.error = Some(error.to_string());
        self
    }

    /// True when a response (of any status) was received
    pub fn is_ok(&self) -> bool {
        self.status.is_some() && self.error.is_none()
    }
}

// Joins a target and a candidate path
//
// - one trailing '/' or '\' is stripped from the target
// - empty path           -> target + "/"
// - path with leading '/' or '\' -> target + path
// - anything else        -> target + "/" + path
//
// Examples:
//   join_url("https://h/", "")     -> "https://h/"
//   join_url("https://h", "/x")    -> "https://h/x"
//   join_url("https://h", "a/b")   -> "https://h/a/b"
pub fn join_url(target: &str, path: &str) -> String {
    let base = target
        .strip_suffix('/')
        .or_else(|| target.strip_suffix('\\'))
        .unwrap_or(target);

    if path.is_empty() {
        format!("{}/", base)
    } else if path.starts_with('/') || path.starts_with('\\') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Executes probes with a shared client and host timing registry
pub struct ProbeExecutor {
    client: Client,
    method: Method,
    auth: Option<Auth>,
    body: Option<String>,
    timing: Arc<HostTimingRegistry>,
    renderer: Option<Arc<dyn PageRenderer>>,
}

impl ProbeExecutor {
    /// Builds the HTTP client from the request and connection settings
    pub fn new(config: &ScanConfig, timing: Arc<HostTimingRegistry>) -> Result<Self, ConfigError> {
        let request = &config.request;

        let user_agent = request
            .user_agent
            .clone()
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| format!("dirhound/{}", env!("CARGO_PKG_VERSION")));

        let redirect = if request.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        };

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .redirect(redirect)
            .default_headers(static_headers(config)?);

        if let Some(proxy) = config.connection.proxy.as_deref().filter(|p| !p.is_empty()) {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| ConfigError::InvalidProxy {
                url: proxy.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            method: request.http_method()?,
            auth: request.credentials()?,
            body: request.data.clone().filter(|_| request.sends_body()),
            timing,
            renderer: None,
        })
    }

    /// Routes every probe through `renderer` instead of the HTTP client
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn timing(&self) -> &Arc<HostTimingRegistry> {
        &self.timing
    }

    /// Probes `path` under `target`
    pub async fn probe(&self, target: &str, path: &str) -> ProbeResult {
        let url = join_url(target, path);
        let result = ProbeResult::new(target, path, &url);

        let parsed = match parse_probe_url(&url) {
            Ok(parsed) => parsed,
            Err(e) => return result.failed(e),
        };

        if let Some(renderer) = &self.renderer {
            return render_probe(renderer.as_ref(), result).await;
        }

        self.http_probe(result, parsed).await
    }

    async fn http_probe(&self, mut result: ProbeResult, url: Url) -> ProbeResult {
        let host = host_key(&url);
        let timing = self.timing.resolve(&host).await;

        let mut request = self
            .client
            .request(self.method.clone(), url)
            .timeout(timing.smart_timeout);

        match &self.auth {
            Some(Auth::Basic { username, password }) => {
                request = request.basic_auth(username, Some(password));
            }
            Some(Auth::Bearer(token)) => {
                request = request.bearer_auth(token);
            }
            None => {}
        }
        if let Some(body) = &self.body {
            request = request.body(body.clone());
        }

        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %result.url, error = %e, "probe failed");
                return result.failed(ProbeError::Transport(describe_error(&e)));
            }
        };
        let elapsed = started.elapsed();

        let status = response.status().as_u16();
        result.headers = selected_headers(&response);
        if (300..400).contains(&status) {
            result.redirect = result.headers.get("location").cloned();
        }

        let body = if timing.is_slow(elapsed) {
            debug!(url = %result.url, elapsed_ms = elapsed.as_millis() as u64, "slow response, reading prefix only");
            read_prefix(response, SLOW_BODY_LIMIT).await
        } else {
            match response.bytes().await {
                Ok(bytes) => bytes.to_vec(),
                Err(e) => return result.failed(ProbeError::Body(describe_error(&e))),
            }
        };

        result.status = Some(status);
        result.content_length = body.len() as u64;
        result.body = String::from_utf8_lossy(&body).into_owned();
        result.title = extract_title(&result.body);

        debug!(url = %result.url, status, length = result.content_length, "probed");
        result
    }
}

async fn render_probe(renderer: &dyn PageRenderer, mut result: ProbeResult) -> ProbeResult {
    match renderer.render(&result.url).await {
        Ok(page) => {
            result.status = Some(page.status);
            result.title = page.title;
            result.content_length = page.content_length;
            if !page.redirects.is_empty() {
                result.redirect = Some(page.redirects.join(" -> "));
            }
            result
        }
        Err(e) => result.failed(e),
    }
}

fn parse_probe_url(url: &str) -> Result<Url, ProbeError> {
    let parsed = Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(parsed)
}

// Configured headers plus the cookie, as a default header map for the client
fn static_headers(config: &ScanConfig) -> Result<HeaderMap, ConfigError> {
    let mut headers = HeaderMap::new();

    for (name, value) in config.request.header_pairs()? {
        let line = format!("{}: {}", name, value);
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeader(line.clone()))?;
        let value = HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidHeader(line))?;
        headers.insert(name, value);
    }

    if let Some(cookie) = config.request.cookie.as_deref().filter(|c| !c.is_empty()) {
        let value = HeaderValue::from_str(cookie)
            .map_err(|_| ConfigError::InvalidHeader(format!("Cookie: {}", cookie)))?;
        headers.insert(COOKIE, value);
    }

    Ok(headers)
}

fn selected_headers(response: &Response) -> BTreeMap<String, String> {
    SELECTED_HEADERS
        .iter()
        .filter_map(|name| {
            response
                .headers()
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

// Reads at most `limit` bytes; a read error just ends the prefix early
async fn read_prefix(mut response: Response, limit: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(limit);
    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    buf.truncate(limit);
    buf
}

// Short, stable description of a reqwest error
fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_redirect() {
        "too many redirects".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::render::RenderedPage;
    use async_trait::async_trait;
    use std::time::Duration;

    fn executor(config: &ScanConfig) -> ProbeExecutor {
        let timing = Arc::new(HostTimingRegistry::new(Duration::ZERO, Duration::from_secs(5)));
        ProbeExecutor::new(config, timing).unwrap()
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://h", ""), "https://h/");
        assert_eq!(join_url("https://h/", ""), "https://h/");
        assert_eq!(join_url("https://h", "/x"), "https://h/x");
        assert_eq!(join_url("https://h/", "/x"), "https://h/x");
        assert_eq!(join_url("https://h", "x"), "https://h/x");
        assert_eq!(join_url("https://h", "a/b"), "https://h/a/b");
        assert_eq!(join_url("https://h/", "a/b/"), "https://h/a/b/");
        assert_eq!(join_url("https://h\\", "/admin"), "https://h/admin");
        assert_eq!(join_url("https://h/", "\\admin"), "https://h\\admin");
        assert_eq!(join_url("https://h/api", "/v1/users"), "https://h/api/v1/users");
    }

    #[test]
    fn test_result_serialization_skips_body_and_headers() {
        let mut result = ProbeResult::new("https://h/", "admin", "https://h/admin");
        result.status = Some(200);
        result.body = "secret".to_string();
        result.headers.insert("server".to_string(), "nginx".to_string());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"status\":200"));
        assert!(!json.contains("secret"));
        assert!(!json.contains("nginx"));
        assert!(!json.contains("\"error\""));
    }

    #[test]
    fn test_new_rejects_bad_header() {
        let mut config = ScanConfig::default();
        config.request.headers = vec!["Bad Header: x".to_string()];
        let timing = Arc::new(HostTimingRegistry::new(Duration::ZERO, Duration::from_secs(5)));
        assert!(matches!(
            ProbeExecutor::new(&config, timing),
            Err(ConfigError::InvalidHeader(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_url_is_recorded_not_raised() {
        let result = executor(&ScanConfig::default()).probe("not-a-url", "admin").await;
        assert_eq!(result.status, None);
        assert!(result.error.unwrap().contains("invalid URL"));
    }

    struct StubRenderer;

    #[async_trait]
    impl PageRenderer for StubRenderer {
        async fn render(&self, url: &str) -> Result<RenderedPage, ProbeError> {
            if url.ends_with("broken") {
                return Err(ProbeError::Renderer("tab crashed".to_string()));
            }
            Ok(RenderedPage {
                status: 200,
                title: "Rendered".to_string(),
                content_length: 42,
                redirects: vec!["https://h/a".to_string(), "https://h/b".to_string()],
            })
        }
    }

    #[tokio::test]
    async fn test_renderer_replaces_http_probe() {
        let executor = executor(&ScanConfig::default()).with_renderer(Arc::new(StubRenderer));

        let result = executor.probe("https://h/", "page").await;
        assert_eq!(result.status, Some(200));
        assert_eq!(result.title, "Rendered");
        assert_eq!(result.content_length, 42);
        assert_eq!(result.redirect.as_deref(), Some("https://h/a -> https://h/b"));

        let failed = executor.probe("https://h/", "broken").await;
        assert_eq!(failed.status, None);
        assert!(failed.error.unwrap().contains("tab crashed"));
    }
}
