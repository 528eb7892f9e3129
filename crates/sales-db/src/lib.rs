//! # Sales DB
//!
//! PostgreSQL access for the Sales API.
//!
//! - [`pool`]: building the connection pool from [`DbConfig`] and checking
//!   that the database is reachable
//! - [`tx`]: the [`Database`] / [`Transaction`] capabilities handed to the
//!   request pipeline, and [`Conn`] for running a query either on the pool or
//!   inside the request's transaction
//! - [`migrate`]: embedded schema migrations
//!
//! # Example
//!
//! ```ignore
//! use sales_db::{open, status_check, migrate};
//!
//! let pool = open(&DbConfig::from_env()?)?;
//! status_check(&pool).await?;
//! migrate(&pool).await?;
//! ```
//!
//! [`DbConfig`]: sales_config::DbConfig

pub mod error;
pub mod pool;
pub mod tx;

pub use error::DbError;
pub use pool::{connect_options, open, status_check};
pub use sqlx::PgPool;
pub use tx::{Conn, Database, PgDatabase, PgTransaction, Transaction};

/// Applies every pending migration in `crates/sales-db/migrations`.
pub async fn migrate(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// True when the database rejected a write because of a unique constraint.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
