use crate::error::{AppError, AppResult};
use serde::Deserialize;

const PLACEHOLDER_SECRET: &str = "change-me";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub database_min_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub database_connection_timeout: u64,

    pub redis_url: String,

    #[serde(default = "default_host")]
    pub server_host: String,
    #[serde(default = "default_port")]
    pub server_port: u16,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default)]
    pub jwt_issuer: Option<String>,

    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_analytics_cache_ttl")]
    pub analytics_cache_ttl_secs: u64,
    #[serde(default = "default_escalation_interval")]
    pub escalation_interval_hours: i64,
    #[serde(default = "default_export_max_rows")]
    pub export_max_rows: i64,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

// Default value functions
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connection_timeout() -> u64 {
    30
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_secret() -> String {
    PLACEHOLDER_SECRET.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_analytics_cache_ttl() -> u64 {
    300
} // 5 minutes
fn default_escalation_interval() -> i64 {
    24
}
fn default_export_max_rows() -> i64 {
    10_000
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()
            .map_err(|e| AppError::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.database_max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be > 0".to_string(),
            ));
        }

        if self.database_min_connections > self.database_max_connections {
            return Err(AppError::Config(
                "DATABASE_MIN_CONNECTIONS cannot be greater than DATABASE_MAX_CONNECTIONS"
                    .to_string(),
            ));
        }

        if self.jwt_secret.is_empty() || self.jwt_secret == PLACEHOLDER_SECRET {
            return Err(AppError::Config(
                "JWT_SECRET must be set to a secure value".to_string(),
            ));
        }

        if self.escalation_interval_hours <= 0 {
            return Err(AppError::Config(
                "ESCALATION_INTERVAL_HOURS must be > 0".to_string(),
            ));
        }

        if self.export_max_rows <= 0 {
            return Err(AppError::Config("EXPORT_MAX_ROWS must be > 0".to_string()));
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(AppError::Config(
                "LOG_FORMAT must be either 'json' or 'pretty'".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            min_connections: self.database_min_connections,
            connection_timeout: self.database_connection_timeout,
        }
    }

    pub fn auth(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            issuer: self.jwt_issuer.clone(),
        }
    }

    pub fn logging(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.log_level.clone(),
            format: self.log_format.clone(),
        }
    }

    pub fn escalation_interval(&self) -> chrono::Duration {
        chrono::Duration::hours(self.escalation_interval_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/grievance".to_string(),
            database_max_connections: 10,
            database_min_connections: 2,
            database_connection_timeout: 30,
            redis_url: "redis://127.0.0.1/".to_string(),
            server_host: default_host(),
            server_port: default_port(),
            cors_origins: default_cors_origins(),
            jwt_secret: "a-real-secret".to_string(),
            jwt_issuer: None,
            log_level: default_log_level(),
            log_format: default_log_format(),
            analytics_cache_ttl_secs: default_analytics_cache_ttl(),
            escalation_interval_hours: default_escalation_interval(),
            export_max_rows: default_export_max_rows(),
        }
    }

    #[test]
    fn accepts_sane_config() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_address(), "127.0.0.1:8000");
        assert_eq!(config.escalation_interval(), chrono::Duration::hours(24));
    }

    #[test]
    fn rejects_placeholder_secret() {
        let mut config = base_config();
        config.jwt_secret = PLACEHOLDER_SECRET.to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut config = base_config();
        config.database_min_connections = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        let mut config = base_config();
        config.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
