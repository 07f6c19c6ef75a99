use crate::utils::lifecycle::DEFAULT_RETENTION_DAYS;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub paystack: PaystackConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Shared secret of the hosted auth service; tokens are verified, never issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub public_key: String,
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub base_url: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.sportybet.com/api/ng/orders/share".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
    pub cache_ttl_secs: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://gnews.io/api/v4/search".to_string(),
            cache_ttl_secs: 1800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub retention_days: i64,
    pub reconcile_interval_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            reconcile_interval_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub role_cache_ttl_secs: u64,
    /// Emails that are made admin when their profile signs up.
    pub bootstrap_admin_emails: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            role_cache_ttl_secs: 60,
            bootstrap_admin_emails: Vec::new(),
        }
    }
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_currency() -> String {
    "GHS".to_string()
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn override_string(target: &mut String, name: &str) {
    if let Some(v) = get_env(name) {
        *target = v;
    }
}

/// Comma separated; blank entries are dropped.
fn override_list(target: &mut Vec<String>, name: &str) {
    if let Some(v) = get_env(name) {
        *target = v
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

fn override_parse<T: std::str::FromStr>(target: &mut T, name: &str) {
    if let Some(v) = get_env(name).and_then(|v| v.parse::<T>().ok()) {
        *target = v;
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            // No file: build entirely from the environment
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str)
            .map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
            },
            paystack: PaystackConfig {
                secret_key: get_env("PAYSTACK_SECRET_KEY").unwrap_or_default(),
                public_key: get_env("PAYSTACK_PUBLIC_KEY").unwrap_or_default(),
                base_url: get_env("PAYSTACK_BASE_URL").unwrap_or_else(default_paystack_base_url),
                currency: get_env("PAYSTACK_CURRENCY").unwrap_or_else(default_currency),
            },
            booking: BookingConfig::default(),
            news: NewsConfig::default(),
            lifecycle: LifecycleConfig::default(),
            access: AccessConfig::default(),
        })
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        override_string(&mut self.server.host, "SERVER_HOST");
        override_parse(&mut self.server.port, "SERVER_PORT");
        override_string(&mut self.database.url, "DATABASE_URL");
        override_parse(&mut self.database.max_connections, "DB_MAX_CONNECTIONS");
        override_string(&mut self.jwt.secret, "JWT_SECRET");

        override_string(&mut self.paystack.secret_key, "PAYSTACK_SECRET_KEY");
        override_string(&mut self.paystack.public_key, "PAYSTACK_PUBLIC_KEY");
        override_string(&mut self.paystack.base_url, "PAYSTACK_BASE_URL");
        override_string(&mut self.paystack.currency, "PAYSTACK_CURRENCY");

        override_string(&mut self.booking.base_url, "BOOKING_BASE_URL");

        override_string(&mut self.news.api_key, "GNEWS_API_KEY");
        override_string(&mut self.news.base_url, "GNEWS_BASE_URL");
        override_parse(&mut self.news.cache_ttl_secs, "NEWS_CACHE_TTL_SECS");

        override_parse(&mut self.lifecycle.retention_days, "LIFECYCLE_RETENTION_DAYS");
        override_parse(
            &mut self.lifecycle.reconcile_interval_secs,
            "LIFECYCLE_RECONCILE_INTERVAL_SECS",
        );

        override_parse(&mut self.access.role_cache_ttl_secs, "ROLE_CACHE_TTL_SECS");
        override_list(&mut self.access.bootstrap_admin_emails, "BOOTSTRAP_ADMIN_EMAILS");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_file_uses_section_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/tips"
            max_connections = 5

            [jwt]
            secret = "s3cret"

            [paystack]
            secret_key = "sk_test"
            public_key = "pk_test"
        "#;

        let config = Config::parse(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.paystack.currency, "GHS");
        assert_eq!(config.paystack.base_url, "https://api.paystack.co");
        assert_eq!(config.lifecycle.retention_days, 3);
        assert_eq!(config.news.cache_ttl_secs, 1800);
        assert_eq!(config.access.role_cache_ttl_secs, 60);
        assert!(config.access.bootstrap_admin_emails.is_empty());
        assert!(config.booking.base_url.contains("sportybet"));
    }

    #[test]
    fn test_parse_bootstrap_admins() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/tips"
            max_connections = 5

            [jwt]
            secret = "s3cret"

            [paystack]
            secret_key = "sk_test"
            public_key = "pk_test"

            [access]
            bootstrap_admin_emails = ["owner@example.com"]
        "#;

        let config = Config::parse(raw).unwrap();
        assert_eq!(config.access.bootstrap_admin_emails, vec!["owner@example.com"]);
        assert_eq!(config.access.role_cache_ttl_secs, 60);
    }

    #[test]
    fn test_parse_rejects_missing_sections() {
        assert!(Config::parse("[server]\nhost = \"x\"\nport = 1\n").is_err());
    }
}
