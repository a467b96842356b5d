//! Configuration schema definitions.
//!
//! This module defines the complete configuration surface of the dev proxy
//! and chunk planner. Keys keep the camelCase names of the frontend tool
//! config they mirror (`outDir`, `changeOrigin`, `manualChunks`, ...).

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Origin every built-in route forwards to.
pub const DEFAULT_BACKEND_ORIGIN: &str = "http://localhost:8000";

/// Path prefixes served by the inference backend.
pub const BACKEND_PREFIXES: [&str; 7] = [
    "/predict",
    "/predict_base64",
    "/predict_clipboard",
    "/feedback",
    "/statistics",
    "/reload_model",
    "/health",
];

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevConfig {
    /// Development server settings, including the proxy table.
    pub server: ServerOptions,

    /// Production build settings, including the chunk map.
    pub build: BuildOptions,

    /// Upstream timeouts.
    pub timeouts: TimeoutConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Development server options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerOptions {
    /// TCP port to listen on.
    pub port: u16,

    /// Bind to all interfaces (`true`), localhost only (`false`), or an address.
    pub host: HostOption,

    /// Fail instead of trying the next port when `port` is taken.
    pub strict_port: bool,

    /// Directory served for requests no proxy rule matches.
    pub root: String,

    /// Reject request bodies larger than this many bytes.
    pub max_body_size: Option<usize>,

    /// Path prefix to proxy rule.
    pub proxy: BTreeMap<String, ProxyRule>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        let proxy = BACKEND_PREFIXES
            .iter()
            .map(|prefix| {
                (
                    prefix.to_string(),
                    ProxyRule::Detailed {
                        target: DEFAULT_BACKEND_ORIGIN.to_string(),
                        change_origin: true,
                    },
                )
            })
            .collect();

        Self {
            port: 3000,
            host: HostOption::All(true),
            strict_port: false,
            root: ".".to_string(),
            max_body_size: None,
            proxy,
        }
    }
}

/// `server.host`: a flag or an explicit bind address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HostOption {
    /// `true` binds every interface, `false` binds loopback only.
    All(bool),
    /// Explicit IP address to bind.
    Address(String),
}

impl HostOption {
    /// Resolve to the IP address the listener binds.
    pub fn bind_ip(&self) -> Result<IpAddr, std::net::AddrParseError> {
        match self {
            HostOption::All(true) => Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            HostOption::All(false) => Ok(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            HostOption::Address(addr) if addr == "localhost" => Ok(IpAddr::V4(Ipv4Addr::LOCALHOST)),
            HostOption::Address(addr) => addr.parse(),
        }
    }
}

/// A single `server.proxy` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ProxyRule {
    /// Shorthand form: just the target origin, Host header kept.
    Target(String),
    /// Table form.
    #[serde(rename_all = "camelCase")]
    Detailed {
        target: String,
        #[serde(default)]
        change_origin: bool,
    },
}

impl ProxyRule {
    pub fn target(&self) -> &str {
        match self {
            ProxyRule::Target(target) => target,
            ProxyRule::Detailed { target, .. } => target,
        }
    }

    /// Whether the Host header is rewritten to the target's authority.
    pub fn change_origin(&self) -> bool {
        match self {
            ProxyRule::Target(_) => false,
            ProxyRule::Detailed { change_origin, .. } => *change_origin,
        }
    }
}

/// Production build options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildOptions {
    /// Output directory.
    pub out_dir: String,

    /// Subdirectory of `out_dir` for emitted chunks and assets.
    pub assets_dir: String,

    /// Emit a `.map` file next to every chunk.
    pub sourcemap: bool,

    /// Minification engine selector.
    pub minify: Minify,

    pub rollup_options: RollupOptions,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            out_dir: "dist".to_string(),
            assets_dir: "assets".to_string(),
            sourcemap: false,
            minify: Minify::Engine(MinifyEngine::Terser),
            rollup_options: RollupOptions::default(),
        }
    }
}

impl BuildOptions {
    /// Chunk name to ordered module identifiers.
    pub fn manual_chunks(&self) -> &BTreeMap<String, Vec<String>> {
        &self.rollup_options.output.manual_chunks
    }
}

/// `build.minify`: `false`, `true` (default engine) or an engine name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Minify {
    Enabled(bool),
    Engine(MinifyEngine),
}

impl Minify {
    /// The engine that will run, if any.
    pub fn engine(&self) -> Option<MinifyEngine> {
        match self {
            Minify::Enabled(true) => Some(MinifyEngine::Esbuild),
            Minify::Enabled(false) => None,
            Minify::Engine(engine) => Some(*engine),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MinifyEngine {
    Esbuild,
    Terser,
}

impl std::fmt::Display for MinifyEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MinifyEngine::Esbuild => write!(f, "esbuild"),
            MinifyEngine::Terser => write!(f, "terser"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RollupOptions {
    pub output: OutputOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputOptions {
    /// Chunk name to the module identifiers placed in it.
    pub manual_chunks: BTreeMap<String, Vec<String>>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        let mut manual_chunks = BTreeMap::new();
        manual_chunks.insert(
            "vendor".to_string(),
            vec!["vue".to_string(), "element-plus".to_string()],
        );
        manual_chunks.insert(
            "icons".to_string(),
            vec!["@element-plus/icons-vue".to_string()],
        );
        Self { manual_chunks }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the backend to produce response headers, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
