//! Configuration Module
//!
//! Loads server, upstream, cache and fallback settings from environment
//! variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

// == Mock Mode ==
/// When the mock generator may answer a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockMode {
    /// Only after upstream and store both came up empty
    #[default]
    Fallback,
    /// Always; upstream and store are skipped
    Always,
    /// Never; the chain ends at the store
    Off,
}

impl FromStr for MockMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fallback" => Ok(Self::Fallback),
            "always" | "true" => Ok(Self::Always),
            "off" | "false" | "never" => Ok(Self::Off),
            other => Err(format!("unknown mock mode '{other}'")),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen port
    pub server_port: u16,
    /// Base URL of the pRPC status API
    pub upstream_base_url: String,
    /// Path of the "all nodes" endpoint
    pub upstream_nodes_path: String,
    /// Path prefix of the single-node endpoint; the id is appended
    pub upstream_node_path: String,
    /// Per-call upstream timeout
    pub request_timeout: Duration,
    /// Extra attempts after a network or timeout failure
    pub retry_attempts: u32,
    /// Default cache TTL
    pub cache_ttl: Duration,
    /// Optional LRU bound on the cache
    pub cache_max_entries: Option<usize>,
    /// Whether the upstream API is called at all
    pub upstream_enabled: bool,
    pub mock_mode: MockMode,
    /// Records produced on first use of the mock generator
    pub mock_node_count: usize,
    /// Fixed seed for reproducible mock data
    pub mock_seed: Option<u64>,
    /// CORS origins; `*` allows any
    pub allowed_origins: Vec<String>,
    /// Background refresh period; zero disables the task
    pub refresh_interval: Duration,
    /// JSON file backing the persisted store; in-memory when unset
    pub store_path: Option<String>,
    /// Deployment environment reported by `/health`
    pub environment: String,
    /// Service name reported by `/health`
    pub service_name: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP listen port (default: 5000)
    /// - `PRPC_BASE_URL` - upstream base URL (default: https://rpc.xandeum.network)
    /// - `PRPC_NODES_PATH` / `PRPC_NODE_PATH` - upstream endpoint paths
    /// - `REQUEST_TIMEOUT` - upstream timeout in seconds (default: 30)
    /// - `RETRY_ATTEMPTS` - extra attempts on network/timeout failures (default: 0)
    /// - `CACHE_TTL` - cache TTL in seconds (default: 30)
    /// - `CACHE_MAX_ENTRIES` - optional LRU bound (default: unbounded)
    /// - `UPSTREAM_ENABLED` - call the upstream API (default: true)
    /// - `MOCK_DATA` - `fallback`, `always` or `off` (default: fallback)
    /// - `MOCK_NODE_COUNT` - generated node count (default: 12)
    /// - `MOCK_SEED` - fixed mock seed (default: random)
    /// - `ALLOWED_ORIGINS` - comma-separated CORS origins
    /// - `REFRESH_INTERVAL` - background refresh in seconds, 0 disables (default: 30)
    /// - `STORE_PATH` - JSON store file (default: in-memory)
    /// - `APP_ENV` - environment name (default: development)
    /// - `SERVICE_NAME` - service name (default: pNode Analytics API)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_port: parse_env("PORT").unwrap_or(defaults.server_port),
            upstream_base_url: string_env("PRPC_BASE_URL").unwrap_or(defaults.upstream_base_url),
            upstream_nodes_path: string_env("PRPC_NODES_PATH")
                .unwrap_or(defaults.upstream_nodes_path),
            upstream_node_path: string_env("PRPC_NODE_PATH").unwrap_or(defaults.upstream_node_path),
            request_timeout: parse_env("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            retry_attempts: parse_env("RETRY_ATTEMPTS").unwrap_or(defaults.retry_attempts),
            cache_ttl: parse_env("CACHE_TTL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES").or(defaults.cache_max_entries),
            upstream_enabled: bool_env("UPSTREAM_ENABLED").unwrap_or(defaults.upstream_enabled),
            mock_mode: parse_env("MOCK_DATA").unwrap_or(defaults.mock_mode),
            mock_node_count: parse_env("MOCK_NODE_COUNT").unwrap_or(defaults.mock_node_count),
            mock_seed: parse_env("MOCK_SEED").or(defaults.mock_seed),
            allowed_origins: string_env("ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or(defaults.allowed_origins),
            refresh_interval: parse_env("REFRESH_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            store_path: string_env("STORE_PATH").or(defaults.store_path),
            environment: string_env("APP_ENV").unwrap_or(defaults.environment),
            service_name: string_env("SERVICE_NAME").unwrap_or(defaults.service_name),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 5000,
            upstream_base_url: "https://rpc.xandeum.network".to_string(),
            upstream_nodes_path: "/api/v1/pnodes".to_string(),
            upstream_node_path: "/api/v1/pnode".to_string(),
            request_timeout: Duration::from_secs(30),
            retry_attempts: 0,
            cache_ttl: Duration::from_secs(30),
            cache_max_entries: None,
            upstream_enabled: true,
            mock_mode: MockMode::Fallback,
            mock_node_count: 12,
            mock_seed: None,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:5174".to_string(),
                "http://localhost:3000".to_string(),
            ],
            refresh_interval: Duration::from_secs(30),
            store_path: None,
            environment: "development".to_string(),
            service_name: "pNode Analytics API".to_string(),
        }
    }
}

// == Env Helpers ==
/// Non-empty, trimmed value of `key`.
fn string_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    string_env(key).and_then(|v| v.parse().ok())
}

fn bool_env(key: &str) -> Option<bool> {
    string_env(key).and_then(|v| parse_bool(&v))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
