use std::str::FromStr;
use std::time::Duration;

use sales_config::DbConfig;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use tracing::{debug, warn};

use crate::error::DbError;

const STATUS_CHECK_ATTEMPTS: u32 = 3;

/// Builds connect options from `DATABASE_URL` when present, otherwise from
/// the individual `SALES_DB_*` parts. `host` may carry a `:port` suffix.
pub fn connect_options(config: &DbConfig) -> Result<PgConnectOptions, DbError> {
    if let Some(url) = &config.url {
        return PgConnectOptions::from_str(url).map_err(DbError::from);
    }

    let (host, port) = match config.host.split_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .map_err(|_| DbError::Config(format!("invalid port in host {:?}", config.host)))?;
            (host, Some(port))
        }
        None => (config.host.as_str(), None),
    };

    let mut options = PgConnectOptions::new()
        .host(host)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(if config.disable_tls {
            PgSslMode::Disable
        } else {
            PgSslMode::Require
        });

    if let Some(port) = port {
        options = options.port(port);
    }

    Ok(options)
}

/// Creates the pool without connecting. Connections are made on first use so
/// the service can start and report readiness while the database comes up.
pub fn open(config: &DbConfig) -> Result<PgPool, DbError> {
    let options = connect_options(config)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_open_conns)
        .min_connections(config.min_conns)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy_with(options);

    Ok(pool)
}

/// Returns `Ok` once the database answers a trivial query.
///
/// A few quick retries smooth over a pool that is still establishing its
/// first connection; callers bound the total time with their own deadline.
pub async fn status_check(pool: &PgPool) -> Result<(), DbError> {
    let mut attempt = 1;
    loop {
        match sqlx::query_scalar::<_, bool>("SELECT true")
            .fetch_one(pool)
            .await
        {
            Ok(_) => {
                debug!(attempt, "database status check passed");
                return Ok(());
            }
            Err(e) if attempt < STATUS_CHECK_ATTEMPTS => {
                warn!(attempt, error = %e, "database status check failed, retrying");
                tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_parts() {
        let config = DbConfig {
            host: "db.internal:6432".to_string(),
            user: "sales".to_string(),
            name: "sales".to_string(),
            ..DbConfig::default()
        };
        let options = connect_options(&config).unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6432);
        assert_eq!(options.get_username(), "sales");
        assert_eq!(options.get_database(), Some("sales"));
    }

    #[test]
    fn test_url_takes_precedence() {
        let config = DbConfig {
            url: Some("postgres://app:secret@pg:5433/orders".to_string()),
            ..DbConfig::default()
        };
        let options = connect_options(&config).unwrap();

        assert_eq!(options.get_host(), "pg");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_database(), Some("orders"));
    }

    #[test]
    fn test_bad_port() {
        let config = DbConfig {
            host: "localhost:abc".to_string(),
            ..DbConfig::default()
        };
        assert!(matches!(connect_options(&config), Err(DbError::Config(_))));
    }
}
