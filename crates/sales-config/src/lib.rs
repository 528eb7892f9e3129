//! # Sales Config
//!
//! Configuration types for the Sales API, loaded from `SALES_*` environment
//! variables:
//!
//! - [`web`]: API/debug listen addresses, shutdown timeout, CORS origins
//! - [`auth`]: key folder, active key id, issuer and token lifetime
//! - [`db`]: PostgreSQL connection settings
//! - [`log`]: log file directory and console format
//!
//! Every struct also has a `from_lookup` constructor taking a closure, which
//! is how the tests feed values in without touching the process environment.
//!
//! # Example
//!
//! ```ignore
//! use sales_config::{AuthConfig, DbConfig, WebConfig};
//!
//! dotenvy::dotenv().ok();
//! let web = WebConfig::from_env()?;
//! let auth = AuthConfig::from_env()?;
//! let db = DbConfig::from_env()?;
//! ```

pub mod auth;
pub mod db;
pub mod error;
pub mod log;
pub mod web;

mod parse;

pub use auth::AuthConfig;
pub use db::DbConfig;
pub use error::ConfigError;
pub use log::LogConfig;
pub use web::WebConfig;

/// Everything the API binary needs at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub web: WebConfig,
    pub auth: AuthConfig,
    pub db: DbConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            web: WebConfig::from_lookup(&lookup)?,
            auth: AuthConfig::from_lookup(&lookup)?,
            db: DbConfig::from_lookup(&lookup)?,
            log: LogConfig::from_lookup(&lookup)?,
        })
    }
}
