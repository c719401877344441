use anyhow::Context;
use serde::Deserialize;

/// Server configuration.
///
/// Values are layered: built-in defaults, then an optional YAML file named
/// by the `GALE_CONFIG` environment variable, then individual environment
/// variable overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind the listening socket on
    pub host: String,
    /// Port to bind the listening socket on
    pub port: u16,
    /// Seconds a connection may live without completing a request/response cycle
    pub request_timeout: u64,
    /// Upper bound in bytes for a single request (headers and body)
    pub request_max_size: usize,
    /// Enables debug-level logging in the binary
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            request_timeout: 60,
            request_max_size: 100_000_000,
            debug: false,
        }
    }
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Recognized variables: `GALE_CONFIG` (path to a YAML file), `GALE_HOST`,
    /// `GALE_PORT`, `GALE_REQUEST_TIMEOUT`, `GALE_REQUEST_MAX_SIZE`,
    /// `GALE_DEBUG`. Unparseable numeric overrides are ignored.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("GALE_CONFIG") {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(host) = std::env::var("GALE_HOST") {
            cfg.host = host;
        }
        if let Ok(port) = std::env::var("GALE_PORT") {
            if let Ok(port) = port.parse() {
                cfg.port = port;
            }
        }
        if let Ok(timeout) = std::env::var("GALE_REQUEST_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                cfg.request_timeout = timeout;
            }
        }
        if let Ok(max_size) = std::env::var("GALE_REQUEST_MAX_SIZE") {
            if let Ok(max_size) = max_size.parse() {
                cfg.request_max_size = max_size;
            }
        }
        if let Ok(debug) = std::env::var("GALE_DEBUG") {
            cfg.debug = debug == "1" || debug.eq_ignore_ascii_case("true");
        }

        Ok(cfg)
    }

    /// Parses configuration from a YAML file. Missing keys fall back to defaults.
    pub fn from_yaml_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path))?;
        serde_yaml::from_str(&raw).with_context(|| format!("Invalid config file {}", path))
    }

    /// The `host:port` pair to bind on.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
