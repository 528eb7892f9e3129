use std::path::PathBuf;

use crate::error::ConfigError;
use crate::parse;

#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    /// When set, a daily rolling JSON log file is written here.
    pub dir: Option<PathBuf>,
    /// Emit console logs as JSON instead of the compact format.
    pub json: bool,
}

impl LogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let json = match parse::var(lookup, "SALES_LOG_FORMAT").as_deref() {
            None | Some("text") | Some("compact") => false,
            Some("json") => true,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "SALES_LOG_FORMAT",
                    other,
                    "expected text or json",
                ));
            }
        };

        Ok(Self {
            dir: parse::var(lookup, "SALES_LOG_DIR").map(PathBuf::from),
            json,
        })
    }
}
