use crate::error::ConfigError;
use crate::parse;

/// PostgreSQL connection settings.
///
/// When `url` is set (from `DATABASE_URL`) it takes precedence over the
/// individual parts.
#[derive(Clone, Debug)]
pub struct DbConfig {
    pub url: Option<String>,
    pub user: String,
    pub password: String,
    pub host: String,
    pub name: String,
    pub max_open_conns: u32,
    /// Connections the pool keeps open even when idle.
    pub min_conns: u32,
    pub disable_tls: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            host: "localhost".to_string(),
            name: "postgres".to_string(),
            max_open_conns: 10,
            min_conns: 0,
            disable_tls: true,
        }
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            url: parse::var(lookup, "DATABASE_URL"),
            user: parse::string(lookup, "SALES_DB_USER", &defaults.user),
            password: parse::string(lookup, "SALES_DB_PASSWORD", &defaults.password),
            host: parse::string(lookup, "SALES_DB_HOST", &defaults.host),
            name: parse::string(lookup, "SALES_DB_NAME", &defaults.name),
            max_open_conns: parse::parsed(lookup, "SALES_DB_MAX_OPEN_CONNS", defaults.max_open_conns)?,
            min_conns: parse::parsed(lookup, "SALES_DB_MIN_CONNS", defaults.min_conns)?,
            disable_tls: parse::flag(lookup, "SALES_DB_DISABLE_TLS", defaults.disable_tls)?,
        };

        if config.max_open_conns == 0 {
            return Err(ConfigError::invalid(
                "SALES_DB_MAX_OPEN_CONNS",
                "0",
                "must be at least 1",
            ));
        }
        if config.min_conns > config.max_open_conns {
            return Err(ConfigError::invalid(
                "SALES_DB_MIN_CONNS",
                &config.min_conns.to_string(),
                "must not exceed SALES_DB_MAX_OPEN_CONNS",
            ));
        }

        Ok(config)
    }
}
