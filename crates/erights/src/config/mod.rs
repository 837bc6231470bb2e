use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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

    /// Production responses carry generic 500 messages; other stages may
    /// surface the underlying error text.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub database: DatabaseConfig,
    pub mail: MailConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").ok(),
            max_connections: parse_env_number("DATABASE_MAX_CONNECTIONS", 5)?,
        };

        let mail = MailConfig {
            api_key: env::var("MAILGUN_API_KEY").ok(),
            domain: env::var("MAILGUN_DOMAIN").unwrap_or_default(),
            from_email: env::var("MAILGUN_FROM_EMAIL").unwrap_or_default(),
            from_name: env::var("MAILGUN_FROM_NAME").unwrap_or_else(|_| "E-rights".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_default(),
            asset_base_url: env::var("ASSET_BASE_URL").ok(),
            attachment_timeout_secs: parse_env_number("ATTACHMENT_TIMEOUT_SECS", 15)?,
        };

        let auth = AuthConfig {
            session_ttl_minutes: parse_env_number("SESSION_TTL_MINUTES", 60)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            database,
            mail,
            auth,
        })
    }
}

fn parse_env_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
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

/// Relational store connection settings. A missing URL selects the
/// in-memory store, which is only suitable for local development.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

/// Mailgun delivery settings. A missing API key disables outbound delivery
/// and routes notifications to the log-only gateway.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: Option<String>,
    pub domain: String,
    pub from_email: String,
    pub from_name: String,
    pub admin_email: String,
    pub asset_base_url: Option<String>,
    pub attachment_timeout_secs: u64,
}

impl MailConfig {
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

/// Admin session issuance settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub session_ttl_minutes: i64,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "DATABASE_URL",
            "DATABASE_MAX_CONNECTIONS",
            "MAILGUN_API_KEY",
            "MAILGUN_DOMAIN",
            "MAILGUN_FROM_EMAIL",
            "MAILGUN_FROM_NAME",
            "ADMIN_EMAIL",
            "ASSET_BASE_URL",
            "ATTACHMENT_TIMEOUT_SECS",
            "SESSION_TTL_MINUTES",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.database.url.is_none());
        assert!(config.mail.api_key.is_none());
        assert_eq!(config.auth.session_ttl_minutes, 60);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
    }

    #[test]
    fn rejects_non_numeric_ttl() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SESSION_TTL_MINUTES", "soon");
        let err = AppConfig::load().expect_err("ttl must be numeric");
        assert!(err.to_string().contains("SESSION_TTL_MINUTES"));
    }
}
