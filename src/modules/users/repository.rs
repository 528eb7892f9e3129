use async_trait::async_trait;
use sales_core::{OrderBy, Page};
use sales_db::{Conn, PgPool, Transaction, is_unique_violation};
use sales_models::{Email, QueryFilter, User, UserError, UserRow};
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Storage for users.
///
/// Writes take the request's transaction when there is one; reads always run
/// on their own connection unless a transaction is passed.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User, tx: Option<&dyn Transaction>) -> Result<(), UserError>;
    async fn update(&self, user: &User, tx: Option<&dyn Transaction>) -> Result<(), UserError>;
    /// Deleting a user that does not exist is not an error.
    async fn delete(&self, user_id: Uuid, tx: Option<&dyn Transaction>) -> Result<(), UserError>;
    async fn query(
        &self,
        filter: &QueryFilter,
        order: &OrderBy,
        page: &Page,
    ) -> Result<Vec<User>, UserError>;
    async fn count(&self, filter: &QueryFilter) -> Result<i64, UserError>;
    async fn query_by_id(
        &self,
        user_id: Uuid,
        tx: Option<&dyn Transaction>,
    ) -> Result<User, UserError>;
    async fn query_by_email(&self, email: &Email) -> Result<User, UserError>;
}

const USER_COLUMNS: &str = "user_id, name, email, roles, password_hash, department, enabled, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_error(err: impl Into<anyhow::Error>, action: &'static str) -> UserError {
    UserError::Store(err.into().context(action))
}

fn write_error(err: sqlx::Error, action: &'static str) -> UserError {
    if is_unique_violation(&err) {
        warn!("email already in use");
        return UserError::UniqueEmail;
    }
    store_error(err, action)
}

fn into_user(row: UserRow) -> Result<User, UserError> {
    User::try_from(row).map_err(|e| store_error(e, "parsing user row"))
}

/// Name filters match as a literal substring, so `%` and `_` lose their
/// wildcard meaning.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &QueryFilter) {
    let mut sep = " WHERE ";
    if let Some(id) = filter.user_id {
        qb.push(sep).push("user_id = ").push_bind(id);
        sep = " AND ";
    }
    if let Some(name) = &filter.name {
        qb.push(sep)
            .push("name LIKE ")
            .push_bind(format!("%{}%", escape_like(name)))
            .push(" ESCAPE '\\'");
        sep = " AND ";
    }
    if let Some(email) = &filter.email {
        qb.push(sep).push("email = ").push_bind(email.clone());
        sep = " AND ";
    }
    if let Some(start) = filter.start_created_date {
        qb.push(sep).push("created_at >= ").push_bind(start);
        sep = " AND ";
    }
    if let Some(end) = filter.end_created_date {
        qb.push(sep).push("created_at <= ").push_bind(end);
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self, user, tx), fields(db.operation = "INSERT", db.table = "users", user.id = %user.id))]
    async fn create(&self, user: &User, tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        let row = UserRow::from(user);
        let mut conn = Conn::acquire(&self.pool, tx)
            .await
            .map_err(|e| store_error(e, "acquiring connection"))?;

        sqlx::query(
            "INSERT INTO users (user_id, name, email, roles, password_hash, department, enabled, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(row.user_id)
        .bind(row.name)
        .bind(row.email)
        .bind(row.roles)
        .bind(row.password_hash)
        .bind(row.department)
        .bind(row.enabled)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(conn.get().map_err(|e| store_error(e, "inserting user"))?)
        .await
        .map_err(|e| write_error(e, "inserting user"))?;

        Ok(())
    }

    #[instrument(skip(self, user, tx), fields(db.operation = "UPDATE", db.table = "users", user.id = %user.id))]
    async fn update(&self, user: &User, tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        let row = UserRow::from(user);
        let mut conn = Conn::acquire(&self.pool, tx)
            .await
            .map_err(|e| store_error(e, "acquiring connection"))?;

        let result = sqlx::query(
            "UPDATE users SET name = $2, email = $3, roles = $4, password_hash = $5,
                 department = $6, enabled = $7, updated_at = $8
             WHERE user_id = $1",
        )
        .bind(row.user_id)
        .bind(row.name)
        .bind(row.email)
        .bind(row.roles)
        .bind(row.password_hash)
        .bind(row.department)
        .bind(row.enabled)
        .bind(row.updated_at)
        .execute(conn.get().map_err(|e| store_error(e, "updating user"))?)
        .await
        .map_err(|e| write_error(e, "updating user"))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, tx), fields(db.operation = "DELETE", db.table = "users"))]
    async fn delete(&self, user_id: Uuid, tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        let mut conn = Conn::acquire(&self.pool, tx)
            .await
            .map_err(|e| store_error(e, "acquiring connection"))?;

        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(conn.get().map_err(|e| store_error(e, "deleting user"))?)
            .await
            .map_err(|e| store_error(e, "deleting user"))?;

        debug!(rows = result.rows_affected(), "user delete executed");
        Ok(())
    }

    #[instrument(skip(self, filter), fields(db.operation = "SELECT", db.table = "users"))]
    async fn query(
        &self,
        filter: &QueryFilter,
        order: &OrderBy,
        page: &Page,
    ) -> Result<Vec<User>, UserError> {
        let mut qb = QueryBuilder::new(format!("SELECT {} FROM users", USER_COLUMNS));
        push_filter(&mut qb, filter);
        // Field names are checked against an allow-list before they get here.
        qb.push(format!(" ORDER BY {} {}", order.field, order.direction.as_sql()));
        qb.push(" OFFSET ").push_bind(page.offset());
        qb.push(" LIMIT ").push_bind(page.limit());

        let rows = qb
            .build_query_as::<UserRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error(e, "querying users"))?;

        rows.into_iter().map(into_user).collect()
    }

    #[instrument(skip(self, filter), fields(db.operation = "SELECT", db.table = "users"))]
    async fn count(&self, filter: &QueryFilter) -> Result<i64, UserError> {
        let mut qb = QueryBuilder::new("SELECT count(1) FROM users");
        push_filter(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| store_error(e, "counting users"))
    }

    #[instrument(skip(self, tx), fields(db.operation = "SELECT", db.table = "users"))]
    async fn query_by_id(
        &self,
        user_id: Uuid,
        tx: Option<&dyn Transaction>,
    ) -> Result<User, UserError> {
        let mut conn = Conn::acquire(&self.pool, tx)
            .await
            .map_err(|e| store_error(e, "acquiring connection"))?;

        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(conn.get().map_err(|e| store_error(e, "querying user"))?)
        .await
        .map_err(|e| store_error(e, "querying user"))?;

        row.ok_or(UserError::NotFound).and_then(into_user)
    }

    #[instrument(skip(self, email), fields(db.operation = "SELECT", db.table = "users"))]
    async fn query_by_email(&self, email: &Email) -> Result<User, UserError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.clone())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_error(e, "querying user by email"))?;

        row.ok_or(UserError::NotFound).and_then(into_user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_filter_sql_is_parameterized() {
        let filter = QueryFilter {
            name: Some("bill".to_string()),
            email: Some(Email::new_unchecked("bill@example.com")),
            start_created_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..QueryFilter::default()
        };

        let mut qb = QueryBuilder::new("SELECT count(1) FROM users");
        push_filter(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT count(1) FROM users WHERE name LIKE $1 ESCAPE '\\' AND email = $2 AND created_at >= $3"
        );
    }

    #[test]
    fn test_empty_filter_has_no_where() {
        let mut qb = QueryBuilder::new("SELECT count(1) FROM users");
        push_filter(&mut qb, &QueryFilter::default());
        assert_eq!(qb.sql(), "SELECT count(1) FROM users");
    }
}
