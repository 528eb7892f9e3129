//! User domain models.

use chrono::{DateTime, Utc};
use sales_auth::{Role, RoleError};
use sqlx::FromRow;
use uuid::Uuid;

use crate::email::Email;

/// A user as held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: Email,
    pub roles: Vec<Role>,
    pub password_hash: String,
    pub department: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Overwrites only the fields present in `update` and refreshes
    /// `updated_at`.
    pub fn apply(&mut self, update: UpdateUser, password_hash: Option<String>, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(roles) = update.roles {
            self.roles = roles;
        }
        if let Some(department) = update.department {
            self.department = Some(department);
        }
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        self.updated_at = now;
    }
}

/// What is needed to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub roles: Vec<Role>,
    pub department: Option<String>,
    pub password: String,
}

/// A partial update. `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub roles: Option<Vec<Role>>,
    pub department: Option<String>,
    pub password: Option<String>,
    pub enabled: Option<bool>,
}

impl UpdateUser {
    /// True when the update touches fields only an administrator may change.
    pub fn touches_privileged(&self) -> bool {
        self.roles.is_some() || self.enabled.is_some()
    }
}

/// The `users` table row. Roles are stored as text and parsed on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub name: String,
    pub email: Email,
    pub roles: Vec<String>,
    pub password_hash: String,
    pub department: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RoleError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.user_id,
            name: row.name,
            email: row.email,
            roles: Role::parse_all(&row.roles)?,
            password_hash: row.password_hash,
            department: row.department,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        UserRow {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            roles: user.roles.iter().map(|r| r.to_string()).collect(),
            password_hash: user.password_hash.clone(),
            department: user.department.clone(),
            enabled: user.enabled,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
