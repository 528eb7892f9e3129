use std::time::Duration;

use crate::error::ConfigError;
use crate::parse;

#[derive(Clone, Debug)]
pub struct WebConfig {
    pub api_host: String,
    pub debug_host: String,
    /// How long in-flight requests get to drain before the server is closed.
    pub shutdown_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0:3000".to_string(),
            debug_host: "0.0.0.0:4000".to_string(),
            shutdown_timeout: Duration::from_secs(20),
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let allowed_origins = parse::var(lookup, "SALES_WEB_ALLOWED_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);

        Ok(Self {
            api_host: parse::string(lookup, "SALES_WEB_API_HOST", &defaults.api_host),
            debug_host: parse::string(lookup, "SALES_WEB_DEBUG_HOST", &defaults.debug_host),
            shutdown_timeout: parse::duration(
                lookup,
                "SALES_WEB_SHUTDOWN_TIMEOUT",
                defaults.shutdown_timeout,
            )?,
            allowed_origins,
        })
    }
}
