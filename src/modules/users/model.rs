//! Request and response documents for the users routes.
//!
//! The app-layer types here are the wire shape. They convert into the
//! domain types from `sales_models` once they have been validated.

use chrono::{DateTime, Utc};
use sales_auth::Role;
use sales_core::FieldErrors;
use sales_models::{Email, NewUser, UpdateUser, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Fields a list query may be ordered by.
pub const ORDER_FIELDS: &[&str] = &["user_id", "name", "email", "roles", "enabled"];

/// A user as returned to clients. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub department: String,
    pub enabled: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&User> for AppUser {
    fn from(user: &User) -> Self {
        AppUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            roles: user.roles.iter().map(|r| r.to_string()).collect(),
            department: user.department.clone().unwrap_or_default(),
            enabled: user.enabled,
            created_at: rfc3339(user.created_at),
            updated_at: rfc3339(user.updated_at),
        }
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// `{"user": ...}`, the data of every single-user response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserData {
    pub user: AppUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub user: AppUser,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AppNewUser {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "at least one role is required"))]
    pub roles: Vec<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

impl AppNewUser {
    pub fn into_new_user(self) -> Result<NewUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let roles = parse_roles(&self.roles, &mut errors);
        let email = Email::new(self.email);
        if let Err(e) = &email {
            errors.add("email", e.to_string());
        }
        let email = match email {
            Ok(email) if errors.is_empty() => email,
            _ => return Err(errors),
        };

        Ok(NewUser {
            name: self.name,
            email,
            roles,
            department: self.department.filter(|d| !d.is_empty()),
            password: self.password,
        })
    }
}

/// A partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct AppUpdateUser {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email"))]
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub department: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    pub enabled: Option<bool>,
}

impl AppUpdateUser {
    pub fn into_update(self) -> Result<UpdateUser, FieldErrors> {
        let mut errors = FieldErrors::new();

        let roles = self.roles.as_ref().map(|names| {
            if names.is_empty() {
                errors.add("roles", "at least one role is required");
            }
            parse_roles(names, &mut errors)
        });

        let email = self.email.map(Email::new).transpose().unwrap_or_else(|e| {
            errors.add("email", e.to_string());
            None
        });

        if self.password.is_some() || self.password_confirm.is_some() {
            match (&self.password, &self.password_confirm) {
                (Some(password), _) if password.is_empty() => {
                    errors.add("password", "password cannot be empty")
                }
                (Some(password), Some(confirm)) if password == confirm => {}
                _ => errors.add("passwordConfirm", "passwords do not match"),
            }
        }

        errors.into_result()?;

        Ok(UpdateUser {
            name: self.name,
            email,
            roles,
            department: self.department,
            password: self.password,
            enabled: self.enabled,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppLoginRequest {
    #[validate(email(message = "invalid email"))]
    pub email: String,
    pub password: String,
}

fn parse_roles(names: &[String], errors: &mut FieldErrors) -> Vec<Role> {
    let mut roles = Vec::with_capacity(names.len());
    for name in names {
        match name.parse::<Role>() {
            Ok(role) if !roles.contains(&role) => roles.push(role),
            Ok(_) => {}
            Err(_) => errors.add("roles", format!("invalid value for role {:?}", name)),
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Bill Kennedy",
            "email": "bill@example.com",
            "roles": ["ADMIN"],
            "department": "IT",
            "password": "gophers",
            "passwordConfirm": "gophers"
        })
    }

    #[test]
    fn test_new_user_converts() {
        let app: AppNewUser = serde_json::from_value(new_user_json()).unwrap();
        assert!(app.validate().is_ok());

        let nu = app.into_new_user().unwrap();
        assert_eq!(nu.email, "bill@example.com");
        assert_eq!(nu.roles, vec![Role::Admin]);
        assert_eq!(nu.department.as_deref(), Some("IT"));
    }

    #[test]
    fn test_new_user_rejects_unknown_fields() {
        let mut json = new_user_json();
        json["isAdmin"] = serde_json::json!(true);
        assert!(serde_json::from_value::<AppNewUser>(json).is_err());
    }

    #[test]
    fn test_new_user_password_mismatch() {
        let mut json = new_user_json();
        json["passwordConfirm"] = serde_json::json!("rustaceans");
        let app: AppNewUser = serde_json::from_value(json).unwrap();

        let errors = FieldErrors::from(app.validate().unwrap_err());
        assert_eq!(errors.len(), 1);
        assert!(errors.fields().values().all(|m| m == "passwords do not match"));
    }

    #[test]
    fn test_new_user_unknown_role() {
        let mut json = new_user_json();
        json["roles"] = serde_json::json!(["ADMIN", "ROOT"]);
        let app: AppNewUser = serde_json::from_value(json).unwrap();

        let errors = app.into_new_user().unwrap_err();
        assert_eq!(errors.get("roles"), Some("invalid value for role \"ROOT\""));
    }

    #[test]
    fn test_update_only_present_fields() {
        let app: AppUpdateUser =
            serde_json::from_value(serde_json::json!({ "department": "Sales" })).unwrap();
        let update = app.into_update().unwrap();

        assert_eq!(update.department.as_deref(), Some("Sales"));
        assert!(update.name.is_none());
        assert!(!update.touches_privileged());
    }

    #[test]
    fn test_update_password_needs_confirm() {
        let app: AppUpdateUser =
            serde_json::from_value(serde_json::json!({ "password": "new-secret" })).unwrap();
        let errors = app.into_update().unwrap_err();
        assert_eq!(errors.get("passwordConfirm"), Some("passwords do not match"));
    }

    #[test]
    fn test_update_roles_touch_privileged() {
        let app: AppUpdateUser =
            serde_json::from_value(serde_json::json!({ "roles": ["USER"], "enabled": false }))
                .unwrap();
        let update = app.into_update().unwrap();
        assert_eq!(update.roles, Some(vec![Role::User]));
        assert!(update.touches_privileged());
    }

    #[test]
    fn test_app_user_hides_password_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ann".to_string(),
            email: Email::new_unchecked("ann@example.com"),
            roles: vec![Role::User],
            password_hash: "$2b$04$secret".to_string(),
            department: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(AppUser::from(&user)).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["USER"]));
        assert_eq!(json["createdAt"], now.to_rfc3339());
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
