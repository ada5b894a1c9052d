use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_QUEUE_CAPACITY: usize = 64;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub tasks: TaskConfig,
    pub tenancy: TenancyConfig,
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

        let queue_capacity = match env::var("TASK_QUEUE_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidQueueCapacity)?,
            Err(_) => DEFAULT_QUEUE_CAPACITY,
        };

        let filter_enabled = match env::var("APP_TENANT_FILTER") {
            Ok(raw) => parse_toggle(&raw).ok_or(ConfigError::InvalidTenantFilter { value: raw })?,
            Err(_) => true,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            tasks: TaskConfig { queue_capacity },
            tenancy: TenancyConfig { filter_enabled },
        })
    }
}

fn parse_toggle(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "enabled" => Some(true),
        "off" | "false" | "0" | "disabled" => Some(false),
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

/// Background task queue sizing.
#[derive(Debug, Clone, Copy)]
pub struct TaskConfig {
    pub queue_capacity: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Whether reads and writes are confined to the acting user's organization/company.
///
/// Turning the filter off makes every actor behave like a super-admin; it exists for
/// maintenance runs and should stay on in production.
#[derive(Debug, Clone, Copy)]
pub struct TenancyConfig {
    pub filter_enabled: bool,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            filter_enabled: true,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidQueueCapacity,
    InvalidTenantFilter { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidQueueCapacity => {
                write!(f, "TASK_QUEUE_CAPACITY must be a positive integer")
            }
            ConfigError::InvalidTenantFilter { value } => {
                write!(f, "APP_TENANT_FILTER must be 'on' or 'off' (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidQueueCapacity
            | ConfigError::InvalidTenantFilter { .. } => None,
        }
    }
}
