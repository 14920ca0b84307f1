use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::assessment::EngineConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the service and the assessment engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: load_engine()?,
        })
    }
}

fn load_engine() -> Result<EngineConfig, ConfigError> {
    let mut engine = EngineConfig::default();

    if let Ok(raw) = env::var("ENGINE_MODALITY_WEIGHTS") {
        let (text, voice, video) = parse_weights(&raw)?;
        engine.fusion = engine.fusion.with_weights(text, voice, video);
    }

    if let Ok(raw) = env::var("ENGINE_CACHE_CAPACITY") {
        engine.cache.capacity = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "ENGINE_CACHE_CAPACITY",
                value: raw.clone(),
            })?;
    }

    if let Ok(raw) = env::var("ENGINE_CACHE_TTL_SECS") {
        engine.cache.ttl_secs = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "ENGINE_CACHE_TTL_SECS",
                value: raw.clone(),
            })?;
    }

    if let Ok(raw) = env::var("ENGINE_EXTERNAL_TIMEOUT_SECS") {
        engine.external.timeout_secs = raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| ConfigError::InvalidNumber {
                key: "ENGINE_EXTERNAL_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
    }

    if let Ok(raw) = env::var("ENGINE_SESSION_RETENTION_SECS") {
        engine.retention.ttl_secs = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber {
                key: "ENGINE_SESSION_RETENTION_SECS",
                value: raw.clone(),
            })?;
    }

    if let Ok(raw) = env::var("ENGINE_EXTERNAL_ANALYSIS") {
        engine.external.enabled = parse_switch(&raw).ok_or(ConfigError::InvalidSwitch {
            key: "ENGINE_EXTERNAL_ANALYSIS",
            value: raw.clone(),
        })?;
    }

    Ok(engine)
}

/// Parses `"text,voice,video"`; each weight must be finite and non-negative with a positive sum.
fn parse_weights(raw: &str) -> Result<(f64, f64, f64), ConfigError> {
    let invalid = || ConfigError::InvalidWeights(raw.to_string());

    let weights = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>, _>>()?;

    match weights.as_slice() {
        [text, voice, video]
            if weights.iter().all(|w| w.is_finite() && *w >= 0.0)
                && text + voice + video > 0.0 =>
        {
            Ok((*text, *voice, *video))
        }
        _ => Err(invalid()),
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" | "enabled" => Some(true),
        "off" | "false" | "0" | "no" | "disabled" => Some(false),
        _ => None,
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidWeights(String),
    InvalidNumber { key: &'static str, value: String },
    InvalidSwitch { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidWeights(value) => write!(
                f,
                "ENGINE_MODALITY_WEIGHTS must be three non-negative numbers \"text,voice,video\" with a positive sum, got '{value}'"
            ),
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a whole number, got '{value}'")
            }
            ConfigError::InvalidSwitch { key, value } => {
                write!(f, "{key} must be on or off, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidWeights(_)
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidSwitch { .. } => None,
        }
    }
}
