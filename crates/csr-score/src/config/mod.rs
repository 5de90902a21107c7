use crate::scoring::{PillarWeights, ScoreMode, ScoringError};
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_DATA_PATH: &str = "csr_data_200_entreprises_26indicateurs.csv";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_env() -> Self {
        match env::var("APP_ENV")
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Everything the service and the report commands read from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
}

impl AppConfig {
    /// Read `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::from_env(),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig::from_env(),
            data: DataConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("APP_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match env::var("APP_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self { host, port })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost {
                host: self.host.clone(),
                source,
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `log_level` is either a bare level applied to the CSR crates or a full
/// `EnvFilter` expression.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl TelemetryConfig {
    fn from_env() -> Self {
        let log_level = env::var("APP_LOG_LEVEL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Self { log_level }
    }
}

/// Where the indicator table lives and how it is scored.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub source_path: PathBuf,
    pub score_mode: ScoreMode,
    pub weights: PillarWeights,
}

impl DataConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let source_path = env::var("CSR_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH));

        let score_mode = match env::var("CSR_SCORE_MODE") {
            Ok(raw) => ScoreMode::parse(&raw).ok_or(ConfigError::InvalidScoreMode(raw))?,
            Err(_) => ScoreMode::default(),
        };

        let weights = match env::var("CSR_WEIGHTS") {
            Ok(raw) if !raw.trim().is_empty() => {
                PillarWeights::parse(&raw).map_err(ConfigError::InvalidWeights)?
            }
            _ => PillarWeights::default(),
        };

        Ok(Self {
            source_path,
            score_mode,
            weights,
        })
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_DATA_PATH),
            score_mode: ScoreMode::default(),
            weights: PillarWeights::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16, got '{0}'")]
    InvalidPort(String),
    #[error("APP_HOST must parse to an IPv4 or IPv6 address, got '{host}'")]
    InvalidHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("CSR_SCORE_MODE must be 'recompute' or 'published', got '{0}'")]
    InvalidScoreMode(String),
    #[error("CSR_WEIGHTS is invalid: {0}")]
    InvalidWeights(#[source] ScoringError),
}
