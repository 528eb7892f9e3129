//! Administrative operations behind the `sales-admin` binary.

use anyhow::{Context as _, bail};
use chrono::Utc;
use sales_auth::{Auth, Role};
use sales_models::{Email, NewUser, User, UserError};

use crate::modules::users::UserService;

/// Creates an enabled user holding the ADMIN and USER roles.
pub async fn create_admin(
    users: &UserService,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<User> {
    if name.trim().is_empty() {
        bail!("name is required");
    }
    if password.is_empty() {
        bail!("password is required");
    }
    let email = Email::new(email)?;

    let nu = NewUser {
        name: name.trim().to_string(),
        email,
        roles: vec![Role::Admin, Role::User],
        department: None,
        password: password.to_string(),
    };

    match users.create(nu, Utc::now(), None).await {
        Ok(user) => Ok(user),
        Err(UserError::UniqueEmail) => bail!("a user with this email already exists"),
        Err(e) => Err(e).context("creating admin"),
    }
}

/// Mints a token for an existing user, signed with `kid`.
pub async fn gen_token(
    users: &UserService,
    auth: &Auth,
    email: &str,
    kid: &str,
) -> anyhow::Result<String> {
    let email = Email::new(email)?;
    let user = match users.query_by_email(&email).await {
        Ok(user) => user,
        Err(UserError::NotFound) => bail!("no user with email {}", email),
        Err(e) => return Err(e).context("looking up user"),
    };

    let claims = auth.new_claims(user.id, user.roles.iter().copied());
    let token = auth
        .generate_token(kid, &claims)
        .with_context(|| format!("signing token with kid {}", kid))?;
    Ok(token)
}
