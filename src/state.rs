use std::sync::Arc;

use anyhow::Context as _;
use sales_auth::{Auth, KeyStore};
use sales_config::Config;
use sales_db::{Database, PgDatabase};
use tracing::{info, warn};

use crate::metrics::Metrics;
use crate::modules::users::{PgUserRepository, UserService};
use crate::web::Shutdown;

/// Everything the routes are built from.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub auth: Arc<Auth>,
    pub db: Arc<dyn Database>,
    pub metrics: Arc<Metrics>,
    pub shutdown: Shutdown,
    pub build: String,
    pub allowed_origins: Vec<String>,
}

impl AppState {
    pub fn new(
        users: UserService,
        auth: Arc<Auth>,
        db: Arc<dyn Database>,
        shutdown: Shutdown,
        build: impl Into<String>,
    ) -> Self {
        Self {
            users,
            auth,
            db,
            metrics: Arc::new(Metrics::default()),
            shutdown,
            build: build.into(),
            allowed_origins: vec!["*".to_string()],
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }
}

/// Builds the key store and the PostgreSQL-backed state from configuration.
///
/// The pool connects lazily; readiness reports whether the database is
/// actually reachable.
pub fn init_app_state(
    config: &Config,
    build: &str,
    shutdown: Shutdown,
) -> anyhow::Result<AppState> {
    let keys = KeyStore::from_dir(&config.auth.keys_folder).with_context(|| {
        format!("loading keys from {}", config.auth.keys_folder.display())
    })?;
    if !keys.contains(&config.auth.active_kid) {
        warn!(kid = %config.auth.active_kid, "active kid has no key in the keys folder");
    }
    let auth = Arc::new(Auth::new(
        Arc::new(keys),
        config.auth.issuer.clone(),
        config.auth.token_ttl,
    ));

    let pool = sales_db::open(&config.db).context("opening database pool")?;
    info!(host = %config.db.host, name = %config.db.name, "database pool configured");

    let users = UserService::new(Arc::new(PgUserRepository::new(pool.clone())));
    let db: Arc<dyn Database> = Arc::new(PgDatabase::new(pool));

    Ok(AppState::new(users, auth, db, shutdown, build)
        .with_allowed_origins(config.web.allowed_origins.clone()))
}
