use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::parse;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// Folder holding `<kid>.pem` / `<kid>.pub.pem` key pairs.
    pub keys_folder: PathBuf,
    /// Key id used to sign new tokens.
    pub active_kid: String,
    pub issuer: String,
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            keys_folder: PathBuf::from("zarf/keys/"),
            active_kid: "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1".to_string(),
            issuer: "service project".to_string(),
            token_ttl: Duration::from_secs(3600),
        }
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            keys_folder: parse::var(lookup, "SALES_AUTH_KEYS_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.keys_folder),
            active_kid: parse::string(lookup, "SALES_AUTH_ACTIVE_KID", &defaults.active_kid),
            issuer: parse::string(lookup, "SALES_AUTH_ISSUER", &defaults.issuer),
            token_ttl: parse::duration(lookup, "SALES_AUTH_TOKEN_TTL", defaults.token_ttl)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config.keys_folder, PathBuf::from("zarf/keys/"));
        assert_eq!(config.issuer, "service project");
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
    }

    #[test]
    fn test_ttl_in_seconds() {
        let lookup = |k: &str| (k == "SALES_AUTH_TOKEN_TTL").then(|| "600".to_string());
        let config = AuthConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.token_ttl, Duration::from_secs(600));
    }
}
