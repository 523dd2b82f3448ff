//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `LANDMARK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_EMBED_TIMEOUT_MS, DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_IMAGE_BYTES,
    DEFAULT_MIN_MATCH_COUNT, DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::verify::EngineConfig;

/// Deployment configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `LANDMARK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory holding the reference `.npy` artifacts. Default: `./references`.
    pub references_path: PathBuf,

    /// Endpoint of the external image embedding service. `None` runs the stub embedder.
    pub embedder_url: Option<String>,

    /// Fixed embedding dimension for the whole store. Default: `768`.
    pub embedding_dim: usize,

    /// Minimum cosine similarity for a reference to count toward the quorum. Default: `0.80`.
    pub similarity_threshold: f32,

    /// References at or above the threshold required for a match. Default: `3`.
    pub min_match_count: usize,

    /// Upper bound on one embedding call. Default: 30 s.
    pub embed_timeout: Duration,

    /// Period of the background store reload. `None` disables it. Default: disabled.
    pub reload_interval: Option<Duration>,

    /// Largest accepted image upload in bytes. Default: 10 MiB.
    pub max_image_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            references_path: PathBuf::from("./references"),
            embedder_url: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_match_count: DEFAULT_MIN_MATCH_COUNT,
            embed_timeout: Duration::from_millis(DEFAULT_EMBED_TIMEOUT_MS),
            reload_interval: None,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "LANDMARK_PORT";
    const ENV_BIND_ADDR: &'static str = "LANDMARK_BIND_ADDR";
    const ENV_REFERENCES_PATH: &'static str = "LANDMARK_REFERENCES_PATH";
    const ENV_EMBEDDER_URL: &'static str = "LANDMARK_EMBEDDER_URL";
    const ENV_EMBEDDING_DIM: &'static str = "LANDMARK_EMBEDDING_DIM";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "LANDMARK_SIMILARITY_THRESHOLD";
    const ENV_MIN_MATCH_COUNT: &'static str = "LANDMARK_MIN_MATCH_COUNT";
    const ENV_EMBED_TIMEOUT_MS: &'static str = "LANDMARK_EMBED_TIMEOUT_MS";
    const ENV_RELOAD_INTERVAL_SECS: &'static str = "LANDMARK_RELOAD_INTERVAL_SECS";
    const ENV_MAX_IMAGE_BYTES: &'static str = "LANDMARK_MAX_IMAGE_BYTES";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let references_path =
            Self::parse_path_from_env(Self::ENV_REFERENCES_PATH, defaults.references_path);
        let embedder_url = Self::parse_optional_string_from_env(Self::ENV_EMBEDDER_URL);
        let embedding_dim =
            Self::parse_strict_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?;
        let similarity_threshold = Self::parse_strict_from_env(
            Self::ENV_SIMILARITY_THRESHOLD,
            defaults.similarity_threshold,
        )?;
        let min_match_count =
            Self::parse_strict_from_env(Self::ENV_MIN_MATCH_COUNT, defaults.min_match_count)?;
        let embed_timeout = Duration::from_millis(Self::parse_u64_from_env(
            Self::ENV_EMBED_TIMEOUT_MS,
            DEFAULT_EMBED_TIMEOUT_MS,
        ));
        let reload_interval = match Self::parse_u64_from_env(Self::ENV_RELOAD_INTERVAL_SECS, 0) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let max_image_bytes =
            Self::parse_u64_from_env(Self::ENV_MAX_IMAGE_BYTES, defaults.max_image_bytes as u64)
                as usize;

        Ok(Self {
            port,
            bind_addr,
            references_path,
            embedder_url,
            embedding_dim,
            similarity_threshold,
            min_match_count,
            embed_timeout,
            reload_interval,
            max_image_bytes,
        })
    }

    /// Validates paths and decision parameters (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.references_path.exists() && !self.references_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.references_path.clone(),
            });
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::InvalidEmbeddingDim);
        }

        if self.embed_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        if let Some(url) = &self.embedder_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidEmbedderUrl { value: url.clone() });
        }

        self.engine_config().map(|_| ())
    }

    /// Builds the verification engine parameters from this config.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        EngineConfig::new(self.similarity_threshold, self.min_match_count)
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        match self.bind_addr {
            IpAddr::V4(addr) => format!("{}:{}", addr, self.port),
            IpAddr::V6(addr) => format!("[{}]:{}", addr, self.port),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Decision parameters must not silently fall back when malformed.
    fn parse_strict_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }
}
