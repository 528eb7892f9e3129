use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("transaction already committed or rolled back")]
    TransactionClosed,

    #[error("invalid database configuration: {0}")]
    Config(String),
}
