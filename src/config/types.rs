//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and library configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    CACHE_FILE_PATH, DB_PATH, DEFAULT_GEO_SERVICE_BASE, DEFAULT_USER_AGENT, LOOKUP_TIMEOUT_SECS,
    STORE_NAMESPACE,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Which backend holds the durable tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// SQLite key-value table (default)
    Sqlite,
    /// Single JSON file
    File,
    /// Process memory only; nothing survives a restart
    Memory,
}

/// How resolved records are printed by the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per address
    Plain,
    /// One JSON object per line
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use server_geo::GeoCacheConfig;
/// use std::time::Duration;
///
/// let config = GeoCacheConfig {
///     lookup_timeout: Duration::from_secs(3),
///     max_entries: Some(10_000),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct GeoCacheConfig {
    /// Base URL of the geography lookup service
    pub service_base: String,

    /// Upper bound on a single lookup
    pub lookup_timeout: Duration,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Maximum number of cached addresses; `None` keeps every entry forever
    pub max_entries: Option<usize>,

    /// Identifier the durable snapshot is stored under (SQLite row key)
    pub namespace: String,
}

impl Default for GeoCacheConfig {
    fn default() -> Self {
        Self {
            service_base: DEFAULT_GEO_SERVICE_BASE.to_string(),
            lookup_timeout: Duration::from_secs(LOOKUP_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_entries: None,
            namespace: STORE_NAMESPACE.to_string(),
        }
    }
}

/// Command-line options for the `server_geo` binary.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "server_geo",
    version,
    about = "Resolve server addresses to country, city and timezone with a persistent cache."
)]
pub struct Opt {
    /// Addresses to resolve (IPv4, IPv6 or hostname accepted by the lookup service)
    #[arg(required = true, value_name = "ADDRESS")]
    pub addresses: Vec<String>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Output format for resolved records: plain|json
    #[arg(long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Geography lookup service base URL
    #[arg(long, env = "SERVER_GEO_SERVICE_BASE", default_value = DEFAULT_GEO_SERVICE_BASE)]
    pub service_base: String,

    /// Per-lookup timeout in seconds
    #[arg(long, default_value_t = LOOKUP_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Maximum number of cached addresses (unbounded when omitted)
    #[arg(long)]
    pub max_entries: Option<usize>,

    /// Durable store backend: sqlite|file|memory
    #[arg(long, value_enum, default_value = "sqlite")]
    pub store: StoreKind,

    /// SQLite database path (used with --store sqlite)
    #[arg(long, env = "SERVER_GEO_DB_PATH", default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// JSON cache file path (used with --store file)
    #[arg(long, env = "SERVER_GEO_CACHE_FILE", default_value = CACHE_FILE_PATH)]
    pub cache_file: PathBuf,

    /// Identifier the snapshot is stored under (used with --store sqlite)
    #[arg(long, env = "SERVER_GEO_NAMESPACE", default_value = STORE_NAMESPACE)]
    pub namespace: String,
}

impl From<&Opt> for GeoCacheConfig {
    fn from(opt: &Opt) -> Self {
        GeoCacheConfig {
            service_base: opt.service_base.clone(),
            lookup_timeout: Duration::from_secs(opt.timeout_seconds),
            user_agent: opt.user_agent.clone(),
            max_entries: opt.max_entries,
            namespace: opt.namespace.clone(),
        }
    }
}
