use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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

const DEFAULT_TAX_RATE_PERCENT: f64 = 7.75;
const DEFAULT_TAX_LOOKUP_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_TAX_CACHE_TTL_SECS: u64 = 900;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub tax: TaxLookupConfig,
    pub catalog: CatalogConfig,
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

        let lookup_url = non_empty_var("APP_TAX_LOOKUP_URL");
        let timeout_ms = match non_empty_var("APP_TAX_LOOKUP_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout)?,
            None => DEFAULT_TAX_LOOKUP_TIMEOUT_MS,
        };
        let cache_ttl_secs = match non_empty_var("APP_TAX_CACHE_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidCacheTtl)?,
            None => DEFAULT_TAX_CACHE_TTL_SECS,
        };
        let default_rate_percent = match non_empty_var("APP_DEFAULT_TAX_RATE") {
            Some(raw) => parse_tax_rate(&raw)?,
            None => DEFAULT_TAX_RATE_PERCENT,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            tax: TaxLookupConfig {
                lookup_url,
                timeout_ms,
                cache_ttl_secs,
                default_rate_percent,
            },
            catalog: CatalogConfig {
                lease_programs_csv: non_empty_var("APP_LEASE_PROGRAMS_CSV").map(PathBuf::from),
                finance_programs_csv: non_empty_var("APP_FINANCE_PROGRAMS_CSV")
                    .map(PathBuf::from),
                tax_config_csv: non_empty_var("APP_TAX_CONFIG_CSV").map(PathBuf::from),
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_tax_rate(raw: &str) -> Result<f64, ConfigError> {
    match raw.parse::<f64>() {
        Ok(rate) if rate.is_finite() && (0.0..100.0).contains(&rate) => Ok(rate),
        _ => Err(ConfigError::InvalidTaxRate),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Remote sales-tax lookup settings. No URL means lookups are disabled and
/// quotes fall back to the static tax table.
#[derive(Debug, Clone)]
pub struct TaxLookupConfig {
    pub lookup_url: Option<String>,
    pub timeout_ms: u64,
    /// How long a looked-up rate is reused before asking the service again.
    pub cache_ttl_secs: u64,
    pub default_rate_percent: f64,
}

impl TaxLookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Optional CSV sources for the admin-maintained program tables.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub lease_programs_csv: Option<PathBuf>,
    pub finance_programs_csv: Option<PathBuf>,
    pub tax_config_csv: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidCacheTtl,
    InvalidTaxRate,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "APP_TAX_LOOKUP_TIMEOUT_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidCacheTtl => {
                write!(f, "APP_TAX_CACHE_TTL_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidTaxRate => {
                write!(f, "APP_DEFAULT_TAX_RATE must be a percentage between 0 and 100")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidCacheTtl
            | ConfigError::InvalidTaxRate => None,
        }
    }
}
