//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: TOURBOOK_, nesting separator: `__`)
//! 2. An explicit file passed to [`Config::load_from`]
//! 3. Current working directory: ./config.toml
//! 4. XDG config directory: ~/.config/tourbook/config.toml
//! 5. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::auth::PasswordConfig;
use crate::error::{Error, Result};

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "TOURBOOK_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Password hashing configuration
    #[serde(default)]
    pub password: PasswordConfig,

    /// Middleware configuration
    #[serde(default)]
    pub middleware: MiddlewareConfig,

    /// Startup data
    #[serde(default)]
    pub data: DataConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (development, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl ServiceConfig {
    /// Whether the service runs in production
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HMAC secret used to sign and verify tokens
    #[serde(default)]
    pub secret: String,

    /// JWT algorithm (HS256, HS384, HS512)
    #[serde(default = "default_jwt_algorithm")]
    pub algorithm: String,

    /// Token lifetime in seconds; also the `jwt` cookie's Max-Age
    #[serde(default = "default_jwt_expires_in")]
    pub expires_in_secs: u64,

    /// JWT issuer to set and validate
    #[serde(default)]
    pub issuer: Option<String>,

    /// JWT audience to set and validate
    #[serde(default)]
    pub audience: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: default_jwt_algorithm(),
            expires_in_secs: default_jwt_expires_in(),
            issuer: None,
            audience: None,
        }
    }
}

/// Middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Maximum request body size in kilobytes
    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,

    /// Catch panics in handlers and answer 500
    #[serde(default = "default_true")]
    pub catch_panic: bool,

    /// Compress response bodies
    #[serde(default = "default_true")]
    pub compression: bool,

    /// CORS mode: "permissive" or "restrictive"
    #[serde(default = "default_cors_mode")]
    pub cors_mode: String,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            body_limit_kb: default_body_limit_kb(),
            catch_panic: true,
            compression: true,
            cors_mode: default_cors_mode(),
        }
    }
}

impl MiddlewareConfig {
    /// Body limit in bytes
    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_kb.saturating_mul(1024)
    }
}

/// Data loaded at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON array of tours imported into the empty store
    #[serde(default)]
    pub tours_seed: Option<PathBuf>,
}

// Default value functions
fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_jwt_algorithm() -> String {
    "HS256".to_string()
}

fn default_jwt_expires_in() -> u64 {
    90 * 24 * 60 * 60
}

fn default_true() -> bool {
    true
}

fn default_body_limit_kb() -> usize {
    10
}

fn default_cors_mode() -> String {
    "permissive".to_string()
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Environment variables (TOURBOOK_ prefix) override all file-based configs.
    pub fn load() -> Result<Self> {
        let config_paths = Self::find_config_paths();

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so that higher priority files override
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        Self::finish(figment)
    }

    /// Load configuration from a specific file
    ///
    /// `./config.toml`, if present, still applies beneath it; environment
    /// variables still apply above it.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("config.toml"))
            .merge(Toml::file(path.as_ref()));

        Self::finish(figment)
    }

    fn finish(figment: Figment) -> Result<Self> {
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.jwt.secret.trim().is_empty() {
            return Err(Error::Config(Box::new(figment::Error::from(format!(
                "jwt.secret must be set (e.g. {}JWT__SECRET)",
                ENV_PREFIX
            )))));
        }
        if !self.jwt.algorithm.to_uppercase().starts_with("HS") {
            return Err(Error::Config(Box::new(figment::Error::from(format!(
                "Unsupported JWT algorithm: {}",
                self.jwt.algorithm
            )))));
        }
        Ok(())
    }

    /// Config file locations, highest priority first
    fn find_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix("tourbook");
        if let Some(path) = xdg_dirs.find_config_file("config.toml") {
            paths.push(path);
        }

        paths
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: "tourbook".to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
            },
            jwt: JwtConfig::default(),
            password: PasswordConfig::default(),
            middleware: MiddlewareConfig::default(),
            data: DataConfig::default(),
        }
    }
}
