// src/cli.rs
// =============================================================================
// The command-line interface, defined with clap's derive API.
//
// Every scan setting has a flag. Flags that are left out keep the value from
// the --config file (when given) or the library default, so a JSON file can
// hold the usual settings and the command line only the differences.
//
// Example:
//   dirhound https://example.com -w words.txt -e php,html --mode force -r
// =============================================================================

use clap::Parser;
use dirhound::config::{CaseTransform, ExtensionMode, ReportFormat, ScanConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dirhound",
    version,
    about = "Discover hidden paths and directories on web servers",
    long_about = "dirhound probes web servers with paths built from a wordlist, adapting \
                  its pacing to each host's latency and optionally recursing into the \
                  directories it finds."
)]
pub struct Cli {
    /// Target base URLs (e.g., https://example.com)
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Wordlist file, or a directory of wordlist files
    #[arg(short, long)]
    pub wordlist: PathBuf,

    /// JSON config file; command-line flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    // ---- dictionary ----
    /// Extensions, comma-separated (e.g., php,html)
    #[arg(short, long, value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// How extensions are applied: default, force or overwrite
    #[arg(long)]
    pub mode: Option<ExtensionMode>,

    /// Prefixes added to every word, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub prefixes: Vec<String>,

    /// Suffixes added to every non-directory word, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub suffixes: Vec<String>,

    /// Skip words ending with these extensions, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub exclude_extensions: Vec<String>,

    /// Case transform for words: none, lower, upper or capitalize
    #[arg(long)]
    pub case: Option<CaseTransform>,

    // ---- general ----
    /// Number of concurrent workers (default: 25)
    #[arg(short, long)]
    pub threads: Option<i64>,

    /// Recurse into discovered directories
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum recursion depth (capped at 3)
    #[arg(long)]
    pub max_recursion_depth: Option<usize>,

    /// Only keep these status codes (e.g., 200,301-302)
    #[arg(short = 'i', long = "include-status")]
    pub include_status: Vec<String>,

    /// Drop these status codes (e.g., 404,500-599)
    #[arg(short = 'x', long = "exclude-status")]
    pub exclude_status: Vec<String>,

    // ---- request ----
    /// HTTP method
    #[arg(short, long)]
    pub method: Option<String>,

    /// Extra header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    #[arg(long)]
    pub user_agent: Option<String>,

    #[arg(long)]
    pub cookie: Option<String>,

    /// Request body (sent with POST, PUT and PATCH)
    #[arg(short, long)]
    pub data: Option<String>,

    /// Credentials: "user:pass" for basic, the token for bearer
    #[arg(long)]
    pub auth: Option<String>,

    /// basic or bearer
    #[arg(long)]
    pub auth_type: Option<String>,

    /// Follow redirects instead of reporting them
    #[arg(short = 'F', long)]
    pub follow_redirects: bool,

    // ---- connection ----
    /// Static request timeout in seconds, used when a host can't be calibrated
    #[arg(long)]
    pub timeout: Option<f64>,

    /// Static delay in seconds; any value above 0 turns on per-host pacing
    #[arg(long)]
    pub delay: Option<f64>,

    /// Proxy URL (e.g., http://127.0.0.1:8080)
    #[arg(short, long)]
    pub proxy: Option<String>,

    // ---- output ----
    /// Save the results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report file format: plain or json
    #[arg(long)]
    pub format: Option<ReportFormat>,

    /// Print the results as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies the flags that were given on top of `base`
    pub fn apply(&self, mut base: ScanConfig) -> ScanConfig {
        let general = &mut base.general;
        if let Some(threads) = self.threads {
            general.threads = threads;
        }
        general.recursive |= self.recursive;
        if let Some(depth) = self.max_recursion_depth {
            general.max_recursion_depth = depth;
        }
        override_list(&mut general.include_status, &self.include_status);
        override_list(&mut general.exclude_status, &self.exclude_status);

        let dictionary = &mut base.dictionary;
        override_list(&mut dictionary.extensions, &self.extensions);
        override_list(&mut dictionary.prefixes, &self.prefixes);
        override_list(&mut dictionary.suffixes, &self.suffixes);
        override_list(&mut dictionary.exclude_extensions, &self.exclude_extensions);
        if let Some(mode) = self.mode {
            dictionary.extension_mode = mode;
        }
        if let Some(case) = self.case {
            dictionary.case = case;
        }

        let request = &mut base.request;
        if let Some(method) = &self.method {
            request.method = method.clone();
        }
        override_list(&mut request.headers, &self.headers);
        override_opt(&mut request.user_agent, &self.user_agent);
        override_opt(&mut request.cookie, &self.cookie);
        override_opt(&mut request.data, &self.data);
        override_opt(&mut request.auth, &self.auth);
        override_opt(&mut request.auth_type, &self.auth_type);
        request.follow_redirects |= self.follow_redirects;

        let connection = &mut base.connection;
        if let Some(timeout) = self.timeout {
            connection.timeout = timeout;
        }
        if let Some(delay) = self.delay {
            connection.delay = delay;
        }
        override_opt(&mut connection.proxy, &self.proxy);

        if let Some(format) = self.format {
            base.output.format = format;
        }

        base
    }
}

fn override_list(target: &mut Vec<String>, given: &[String]) {
    if !given.is_empty() {
        *target = given.to_vec();
    }
}

fn override_opt(target: &mut Option<String>, given: &Option<String>) {
    if given.is_some() {
        *target = given.clone();
    }
}
