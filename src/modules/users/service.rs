use std::sync::Arc;

use chrono::{DateTime, Utc};
use sales_core::{OrderBy, Page, hash_password_with_cost, verify_password};
use sales_db::Transaction;
use sales_models::{Email, NewUser, QueryFilter, UpdateUser, User, UserError};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::repository::UserRepository;

/// User business rules on top of a [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self::with_cost(repo, bcrypt::DEFAULT_COST)
    }

    /// Tests use a low cost so hashing stays fast.
    pub fn with_cost(repo: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self { repo, bcrypt_cost }
    }

    fn hash(&self, password: &str) -> Result<String, UserError> {
        hash_password_with_cost(password, self.bcrypt_cost).map_err(|e| UserError::Store(e.error))
    }

    #[instrument(skip(self, nu, tx), fields(user.email = %nu.email))]
    pub async fn create(
        &self,
        nu: NewUser,
        now: DateTime<Utc>,
        tx: Option<&dyn Transaction>,
    ) -> Result<User, UserError> {
        let user = User {
            id: Uuid::new_v4(),
            password_hash: self.hash(&nu.password)?,
            name: nu.name,
            email: nu.email,
            roles: nu.roles,
            department: nu.department,
            enabled: true,
            created_at: now,
            updated_at: now,
        };

        self.repo.create(&user, tx).await?;

        info!(user.id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self, user, uu, tx), fields(user.id = %user.id))]
    pub async fn update(
        &self,
        mut user: User,
        uu: UpdateUser,
        now: DateTime<Utc>,
        tx: Option<&dyn Transaction>,
    ) -> Result<User, UserError> {
        let password_hash = match &uu.password {
            Some(password) => Some(self.hash(password)?),
            None => None,
        };
        user.apply(uu, password_hash, now);

        self.repo.update(&user, tx).await?;
        Ok(user)
    }

    #[instrument(skip(self, tx))]
    pub async fn delete(&self, user_id: Uuid, tx: Option<&dyn Transaction>) -> Result<(), UserError> {
        self.repo.delete(user_id, tx).await
    }

    pub async fn query(
        &self,
        filter: &QueryFilter,
        order: &OrderBy,
        page: &Page,
    ) -> Result<Vec<User>, UserError> {
        self.repo.query(filter, order, page).await
    }

    pub async fn count(&self, filter: &QueryFilter) -> Result<i64, UserError> {
        self.repo.count(filter).await
    }

    pub async fn query_by_id(
        &self,
        user_id: Uuid,
        tx: Option<&dyn Transaction>,
    ) -> Result<User, UserError> {
        self.repo.query_by_id(user_id, tx).await
    }

    pub async fn query_by_email(&self, email: &Email) -> Result<User, UserError> {
        self.repo.query_by_email(email).await
    }

    /// Looks the user up by email and checks the password.
    ///
    /// An unknown email, a wrong password and a disabled account all come
    /// back as [`UserError::AuthenticationFailure`].
    #[instrument(skip(self, email, password))]
    pub async fn authenticate(&self, email: &Email, password: &str) -> Result<User, UserError> {
        let user = match self.repo.query_by_email(email).await {
            Ok(user) => user,
            Err(UserError::NotFound) => {
                warn!("login for unknown email");
                return Err(UserError::AuthenticationFailure);
            }
            Err(e) => return Err(e),
        };

        let matches =
            verify_password(password, &user.password_hash).map_err(|e| UserError::Store(e.error))?;
        if !matches {
            warn!(user.id = %user.id, "login with wrong password");
            return Err(UserError::AuthenticationFailure);
        }

        if !user.enabled {
            warn!(user.id = %user.id, "login for disabled user");
            return Err(UserError::AuthenticationFailure);
        }

        Ok(user)
    }
}
