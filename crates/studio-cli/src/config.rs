//! # Configuration
//!
//! Three layers, lowest to highest precedence:
//!
//! 1. built-in defaults ([`PartialConfig::defaults`]);
//! 2. a configuration file (`trpcStudio.config.json`, `.json5` or `.jsonc`
//!    in the working directory, or the file named by `--config`);
//! 3. command-line arguments ([`ConfigArgs`]).
//!
//! The merged [`PartialConfig`] is validated into a [`StudioConfig`]. Every
//! problem is collected so the user sees them all at once.
//!
//! A configuration file that is missing, unreadable or invalid never stops
//! startup on its own; the outcome is kept as a [`FileOutcome`] and logged
//! once logging is up.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::logging::LogLevel;

/// File names searched for, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "trpcStudio.config.json",
    "trpcStudio.config.json5",
    "trpcStudio.config.jsonc",
];

/// Router module extensions accepted for `routerPath`.
pub const ROUTER_EXTENSIONS: &[&str] = &[
    ".ts", ".js", ".mjs", ".cjs", ".mts", ".cts", ".json", ".json5", ".jsonc",
];

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ── Command-line layer ──────────────────────────────────────────────

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to the file to import the tRPC router from.
    #[arg(short = 'p', long, alias = "routerPath", global = true)]
    pub router_path: Option<PathBuf>,

    /// Endpoint that handles the tRPC requests.
    #[arg(short = 'e', long, alias = "trpcEndpoint", global = true)]
    pub trpc_endpoint: Option<String>,

    /// Address to bind the studio server to.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Port to bind the studio server to.
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Timeout for each relayed call, in seconds.
    #[arg(long, global = true)]
    pub request_timeout_secs: Option<u64>,

    /// Configuration file to use instead of searching the working directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run with verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run with debug logging.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Run with no logging.
    #[arg(long, global = true)]
    pub silent: bool,
}

impl ConfigArgs {
    /// The values given on the command line. Flags that were not passed
    /// stay unset so they do not mask the file.
    pub fn to_partial(&self) -> PartialConfig {
        PartialConfig {
            router_path: self.router_path.clone(),
            trpc_endpoint: self.trpc_endpoint.clone(),
            host: self.host.clone(),
            port: self.port,
            request_timeout_secs: self.request_timeout_secs,
            verbose: self.verbose.then_some(true),
            debug: self.debug.then_some(true),
            silent: self.silent.then_some(true),
        }
    }
}

// ── Unvalidated configuration ───────────────────────────────────────

/// Configuration as read from one source; any key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialConfig {
    pub router_path: Option<PathBuf>,
    pub trpc_endpoint: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub request_timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
    pub debug: Option<bool>,
    pub silent: Option<bool>,
}

impl PartialConfig {
    pub fn defaults() -> Self {
        Self {
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
            ..Self::default()
        }
    }

    /// Layer `over` on top of `self`; keys set in `over` win.
    pub fn merge(self, over: PartialConfig) -> Self {
        Self {
            router_path: over.router_path.or(self.router_path),
            trpc_endpoint: over.trpc_endpoint.or(self.trpc_endpoint),
            host: over.host.or(self.host),
            port: over.port.or(self.port),
            request_timeout_secs: over.request_timeout_secs.or(self.request_timeout_secs),
            verbose: over.verbose.or(self.verbose),
            debug: over.debug.or(self.debug),
            silent: over.silent.or(self.silent),
        }
    }

    /// `verbose` beats `debug`, which beats `silent`.
    pub fn log_level(&self) -> LogLevel {
        if self.verbose == Some(true) {
            LogLevel::Trace
        } else if self.debug == Some(true) {
            LogLevel::Debug
        } else if self.silent == Some(true) {
            LogLevel::Off
        } else {
            LogLevel::Info
        }
    }

    /// Validate everything `serve` needs. Relative paths resolve against `cwd`.
    pub fn validate(&self, cwd: &Path) -> Result<StudioConfig, ConfigError> {
        let mut issues = Vec::new();
        let router_path = check_router_path(self.router_path.as_deref(), cwd, &mut issues);
        let trpc_endpoint = check_endpoint(self.trpc_endpoint.as_deref(), &mut issues);

        let request_timeout_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            issues.push(ConfigIssue::new(
                "requestTimeoutSecs",
                "Number must be greater than 0",
            ));
        }

        match (router_path, trpc_endpoint) {
            (Some(router_path), Some(trpc_endpoint)) if issues.is_empty() => Ok(StudioConfig {
                router_path,
                trpc_endpoint,
                host: self.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: self.port.unwrap_or(DEFAULT_PORT),
                request_timeout: Duration::from_secs(request_timeout_secs),
                log_level: self.log_level(),
            }),
            _ => Err(ConfigError { issues }),
        }
    }

    /// Validate only the router path, for commands that never call the
    /// endpoint.
    pub fn validate_router_path(&self, cwd: &Path) -> Result<PathBuf, ConfigError> {
        let mut issues = Vec::new();
        check_router_path(self.router_path.as_deref(), cwd, &mut issues)
            .ok_or(ConfigError { issues })
    }
}

fn check_router_path(
    raw: Option<&Path>,
    cwd: &Path,
    issues: &mut Vec<ConfigIssue>,
) -> Option<PathBuf> {
    let Some(raw) = raw else {
        issues.push(ConfigIssue::new("routerPath", "Required"));
        return None;
    };

    let name = raw.to_string_lossy();
    if !ROUTER_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        issues.push(ConfigIssue::new(
            "routerPath",
            format!(
                "Only {} files are supported",
                ROUTER_EXTENSIONS.join(", ")
            ),
        ));
        return None;
    }

    let resolved = cwd.join(raw);
    if !resolved.exists() {
        issues.push(ConfigIssue::new("routerPath", "File does not exist"));
        return None;
    }
    Some(resolved)
}

fn check_endpoint(raw: Option<&str>, issues: &mut Vec<ConfigIssue>) -> Option<Url> {
    let Some(raw) = raw else {
        issues.push(ConfigIssue::new("trpcEndpoint", "Required"));
        return None;
    };

    let url = match Url::parse(raw.trim_end_matches('/')) {
        Ok(url) => url,
        Err(_) => {
            issues.push(ConfigIssue::new("trpcEndpoint", "Invalid URL"));
            return None;
        }
    };
    if !matches!(url.scheme(), "http" | "https") {
        issues.push(ConfigIssue::new(
            "trpcEndpoint",
            "Endpoint must start with 'http' or 'https'",
        ));
        return None;
    }
    Some(url)
}

// ── Validated configuration ─────────────────────────────────────────

/// Configuration for `serve`, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct StudioConfig {
    /// Absolute path of the router module.
    pub router_path: PathBuf,
    pub trpc_endpoint: Url,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub log_level: LogLevel,
}

/// One rejected configuration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub key: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn new(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            key,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at \"{}\"", self.message, self.key)
    }
}

#[derive(Debug, Error)]
#[error("Invalid configuration:\n{}", render_issues(.issues))]
pub struct ConfigError {
    pub issues: Vec<ConfigIssue>,
}

fn render_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

// ── File layer ──────────────────────────────────────────────────────

/// What happened when looking for a configuration file.
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(PathBuf),
    NotFound,
    /// The file exists but could not be used; its contents are ignored.
    Invalid { path: PathBuf, reason: String },
}

impl FileOutcome {
    /// Log the outcome. Called after logging is initialized.
    pub fn report(&self) {
        match self {
            Self::Loaded(path) => {
                tracing::info!("Loaded configuration from {}", path.display());
            }
            Self::NotFound => tracing::info!("No configuration file found"),
            Self::Invalid { path, reason } => {
                tracing::error!(
                    "Error while loading configuration file {}: {reason}",
                    path.display()
                );
            }
        }
    }
}

/// Find the configuration file: `explicit` if given, otherwise the first
/// of [`CONFIG_FILE_NAMES`] present in `dir`.
pub fn find_config_file(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(dir.join(path)),
        None => CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file()),
    }
}

/// Read the configuration file layer. Never fails.
pub fn load_file(explicit: Option<&Path>, dir: &Path) -> (PartialConfig, FileOutcome) {
    let Some(path) = find_config_file(explicit, dir) else {
        return (PartialConfig::default(), FileOutcome::NotFound);
    };

    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|text| json5::from_str::<PartialConfig>(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(config) => (config, FileOutcome::Loaded(path)),
        Err(reason) => (PartialConfig::default(), FileOutcome::Invalid { path, reason }),
    }
}
