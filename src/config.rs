// src/config.rs
// =============================================================================
// Scan configuration.
//
// A ScanConfig is an explicit value handed to every component's constructor;
// there is no process-wide configuration. The binary builds one from CLI flags
// (optionally merged over a JSON file), library users build one in code.
//
// Groups mirror the knobs of a classic dirsearch-style tool:
// - general:    pool size, recursion, status filters
// - dictionary: extension / prefix / suffix / case rules
// - request:    method, headers, auth, body
// - connection: static timeout and delay, proxy, liveness check
// - output:     report format
// =============================================================================

use crate::error::ConfigError;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Worker count used when the configured thread count is unset or non-positive
pub const DEFAULT_THREADS: usize = 25;

/// Static request timeout in seconds used when none (or a non-positive one) is configured
pub const DEFAULT_TIMEOUT_SECS: f64 = 7.5;

/// Recursion ceiling applied regardless of configuration
pub const MAX_RECURSION_LEVEL: usize = 3;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub general: GeneralConfig,
    pub dictionary: DictionaryConfig,
    pub request: RequestConfig,
    pub connection: ConnectionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Number of concurrent workers; <= 0 means "use the default"
    pub threads: i64,
    /// Re-scan discovered directories
    pub recursive: bool,
    /// Configured depth bound; never raises the ceiling above MAX_RECURSION_LEVEL
    pub max_recursion_depth: usize,
    /// Status allowlist, e.g. ["200", "301-302"]
    pub include_status: Vec<String>,
    /// Status denylist; wins over the allowlist
    pub exclude_status: Vec<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS as i64,
            recursive: false,
            max_recursion_depth: MAX_RECURSION_LEVEL,
            include_status: Vec::new(),
            exclude_status: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    pub extensions: Vec<String>,
    pub extension_mode: ExtensionMode,
    pub case: CaseTransform,
    pub exclude_extensions: Vec<String>,
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
}

/// How configured extensions are combined with dictionary words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionMode {
    /// Only substitute the `%EXT%` token
    #[default]
    Default,
    /// Append every extension to every word, plus the directory form
    Force,
    /// Replace (or add) each word's trailing extension
    Overwrite,
}

impl FromStr for ExtensionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "force" | "force-extensions" => Ok(Self::Force),
            "overwrite" | "overwrite-extensions" => Ok(Self::Overwrite),
            other => Err(ConfigError::UnknownOption {
                kind: "extension mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Case transform applied to raw words before synthesis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseTransform {
    #[default]
    None,
    Lower,
    Upper,
    Capitalize,
}

impl FromStr for CaseTransform {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lower" | "lowercase" => Ok(Self::Lower),
            "upper" | "uppercase" => Ok(Self::Upper),
            "capitalize" | "capitalization" => Ok(Self::Capitalize),
            other => Err(ConfigError::UnknownOption {
                kind: "case transform",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    pub method: String,
    /// Raw "Name: value" header lines
    pub headers: Vec<String>,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    /// Request body, sent only with POST, PUT and PATCH
    pub data: Option<String>,
    pub auth: Option<String>,
    /// "basic" or "bearer"
    pub auth_type: Option<String>,
    pub follow_redirects: bool,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            user_agent: None,
            cookie: None,
            data: None,
            auth: None,
            auth_type: None,
            follow_redirects: false,
        }
    }
}

/// Static credentials attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    Basic { username: String, password: String },
    Bearer(String),
}

impl RequestConfig {
    /// Parsed HTTP method
    pub fn http_method(&self) -> Result<Method, ConfigError> {
        let upper = self.method.trim().to_ascii_uppercase();
        Method::from_bytes(upper.as_bytes()).map_err(|_| ConfigError::InvalidMethod(self.method.clone()))
    }

    /// Whether the configured body should be attached for this method
    pub fn sends_body(&self) -> bool {
        matches!(
            self.method.trim().to_ascii_uppercase().as_str(),
            "POST" | "PUT" | "PATCH"
        )
    }

    /// Header lines split into (name, value) pairs
    pub fn header_pairs(&self) -> Result<Vec<(String, String)>, ConfigError> {
        self.headers
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (name, value) = line
                    .split_once(':')
                    .ok_or_else(|| ConfigError::InvalidHeader(line.clone()))?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::InvalidHeader(line.clone()));
                }
                Ok((name.to_string(), value.trim().to_string()))
            })
            .collect()
    }

    /// Credentials derived from `auth` and `auth_type`
    ///
    /// Basic credentials may be given as `user:password`; a bare value is
    /// sent as the password with an empty user name.
    pub fn credentials(&self) -> Result<Option<Auth>, ConfigError> {
        let kind = match self.auth_type.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(kind) => kind.to_ascii_lowercase(),
        };
        let secret = match self.auth.as_deref() {
            Some(secret) if !secret.is_empty() => secret,
            _ => return Err(ConfigError::MissingCredentials(kind)),
        };
        match kind.as_str() {
            "basic" => {
                let (username, password) = secret.split_once(':').unwrap_or(("", secret));
                Ok(Some(Auth::Basic {
                    username: username.to_string(),
                    password: password.to_string(),
                }))
            }
            "bearer" => Ok(Some(Auth::Bearer(secret.to_string()))),
            _ => Err(ConfigError::InvalidAuthType(kind)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Static request timeout in seconds, used for hosts that fail calibration
    pub timeout: f64,
    /// Static per-request delay in seconds; > 0 enables per-worker pacing
    pub delay: f64,
    pub proxy: Option<String>,
    /// Per-attempt timeout of the liveness pre-check, in seconds
    pub liveness_timeout: f64,
    pub liveness_retries: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            delay: 0.0,
            proxy: None,
            liveness_timeout: 60.0,
            liveness_retries: 3,
        }
    }
}

impl ConnectionConfig {
    pub fn timeout(&self) -> Duration {
        secs(self.timeout).unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    pub fn delay(&self) -> Duration {
        secs(self.delay).unwrap_or(Duration::ZERO)
    }

    pub fn liveness_timeout(&self) -> Duration {
        secs(self.liveness_timeout).unwrap_or(Duration::from_secs(60))
    }
}

fn secs(value: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(value).ok()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: ReportFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Plain,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::UnknownOption {
                kind: "report format",
                value: other.to_string(),
            }),
        }
    }
}

impl ScanConfig {
    /// Normalizes defaults and rejects values that cannot work
    ///
    /// - non-positive thread count -> DEFAULT_THREADS
    /// - non-positive or non-finite timeout -> DEFAULT_TIMEOUT_SECS
    /// - negative or non-finite delay -> 0
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.general.threads <= 0 {
            self.general.threads = DEFAULT_THREADS as i64;
        }
        if !(self.connection.timeout.is_finite() && self.connection.timeout > 0.0) {
            self.connection.timeout = DEFAULT_TIMEOUT_SECS;
        }
        if !(self.connection.delay.is_finite() && self.connection.delay >= 0.0) {
            self.connection.delay = 0.0;
        }

        self.request.http_method()?;
        self.request.header_pairs()?;
        self.request.credentials()?;

        if let Some(proxy) = self.connection.proxy.as_deref().filter(|p| !p.is_empty()) {
            url::Url::parse(proxy).map_err(|e| ConfigError::InvalidProxy {
                url: proxy.to_string(),
                reason: e.to_string(),
            })?;
        }

        Ok(self)
    }

    /// Worker pool size
    pub fn pool_size(&self) -> usize {
        if self.general.threads <= 0 {
            DEFAULT_THREADS
        } else {
            self.general.threads as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.pool_size(), 25);
        assert_eq!(config.connection.timeout(), Duration::from_millis(7500));
        assert_eq!(config.connection.delay(), Duration::ZERO);
        assert_eq!(config.general.max_recursion_depth, MAX_RECURSION_LEVEL);
        assert_eq!(config.request.method, "GET");
    }

    #[test]
    fn test_validate_normalizes() {
        let mut config = ScanConfig::default();
        config.general.threads = -4;
        config.connection.timeout = 0.0;
        config.connection.delay = -1.0;

        let config = config.validate().unwrap();
        assert_eq!(config.general.threads, 25);
        assert_eq!(config.connection.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.connection.delay, 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_header() {
        let mut config = ScanConfig::default();
        config.request.headers = vec!["NoColonHere".to_string()];
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InvalidHeader("NoColonHere".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_bad_proxy() {
        let mut config = ScanConfig::default();
        config.connection.proxy = Some("not a url".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidProxy { .. })
        ));
    }

    #[test]
    fn test_header_pairs_trimmed() {
        let request = RequestConfig {
            headers: vec!["X-Api-Key:  abc ".to_string(), "Accept: */*".to_string()],
            ..RequestConfig::default()
        };
        let pairs = request.header_pairs().unwrap();
        assert_eq!(
            pairs,
            vec![
                ("X-Api-Key".to_string(), "abc".to_string()),
                ("Accept".to_string(), "*/*".to_string()),
            ]
        );
    }

    #[test]
    fn test_credentials() {
        let mut request = RequestConfig {
            auth: Some("admin:hunter2".to_string()),
            auth_type: Some("Basic".to_string()),
            ..RequestConfig::default()
        };
        assert_eq!(
            request.credentials().unwrap(),
            Some(Auth::Basic {
                username: "admin".to_string(),
                password: "hunter2".to_string()
            })
        );

        request.auth_type = Some("bearer".to_string());
        assert_eq!(
            request.credentials().unwrap(),
            Some(Auth::Bearer("admin:hunter2".to_string()))
        );

        request.auth_type = Some("digest".to_string());
        assert!(matches!(
            request.credentials(),
            Err(ConfigError::InvalidAuthType(_))
        ));
    }

    #[test]
    fn test_sends_body_only_for_mutating_methods() {
        let mut request = RequestConfig::default();
        assert!(!request.sends_body());
        request.method = "post".to_string();
        assert!(request.sends_body());
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{
            "general": { "threads": 8, "recursive": true, "include_status": ["200"] },
            "dictionary": { "extensions": ["php"], "extension_mode": "force" },
            "output": { "format": "json" }
        }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.pool_size(), 8);
        assert!(config.general.recursive);
        assert_eq!(config.dictionary.extension_mode, ExtensionMode::Force);
        assert_eq!(config.output.format, ReportFormat::Json);
        // untouched groups keep their defaults
        assert_eq!(config.connection.timeout, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("force".parse::<ExtensionMode>().unwrap(), ExtensionMode::Force);
        assert_eq!("uppercase".parse::<CaseTransform>().unwrap(), CaseTransform::Upper);
        assert!("xml".parse::<ReportFormat>().is_err());
    }
}
