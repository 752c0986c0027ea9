// src/error.rs
// =============================================================================
// Error types for the scanning engine.
//
// Only two classes are fatal for a scan:
// - ConfigError: the configuration could not be turned into a working client
// - TargetError: nothing to scan (no targets, none alive, empty wordlist)
//
// Everything else degrades instead of aborting:
// - ProbeError is rendered into the ProbeResult's error field
// - RecursionError is logged and that directory branch is skipped
// - InternalFault is a panic caught at a worker boundary and logged
// =============================================================================

use thiserror::Error;

/// Top-level error returned by the public scanner API
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Target error: {0}")]
    Target(#[from] TargetError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Internal fault: {0}")]
    Internal(#[from] InternalFault),
}

/// Invalid or unusable configuration; the scan never starts
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid proxy URL '{url}': {reason}")]
    InvalidProxy { url: String, reason: String },

    #[error("Unsupported auth type '{0}': expected 'basic' or 'bearer'")]
    InvalidAuthType(String),

    #[error("Auth type '{0}' configured without credentials")]
    MissingCredentials(String),

    #[error("Invalid header '{0}': expected 'Name: value'")]
    InvalidHeader(String),

    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),

    #[error("Unknown {kind} '{value}'")]
    UnknownOption { kind: &'static str, value: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Nothing (valid) to scan
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("No targets specified")]
    NoTargets,

    #[error("Invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("None of the {checked} target(s) is alive")]
    NoAliveTargets { checked: usize },

    #[error("Wordlist produced no candidate paths")]
    EmptyWordlist,
}

/// Failure of a single probe; stored as text on the result, never propagated
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("page renderer failed: {0}")]
    Renderer(String),
}

/// Failure scanning one discovered directory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to scan directory '{directory}': {reason}")]
pub struct RecursionError {
    pub directory: String,
    pub reason: String,
}

/// A panic or join failure caught at a task boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: {message}")]
pub struct InternalFault {
    pub context: String,
    pub message: String,
}

impl InternalFault {
    /// Builds a fault from a `catch_unwind` payload
    pub fn from_panic(context: impl Into<String>, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self {
            context: context.into(),
            message,
        }
    }
}

/// Report writing errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ScanError
pub type Result<T> = std::result::Result<T, ScanError>;
