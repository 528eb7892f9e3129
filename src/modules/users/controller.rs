use std::sync::Arc;

use axum::extract::Request;
use axum::http::StatusCode;
use sales_auth::{Auth, AuthError, Role};
use sales_core::{AppError, Direction, FieldErrors, OrderBy, Page, PageDocument, Success};
use sales_models::{Email, QueryFilter, UserError};
use uuid::Uuid;

use crate::middleware::role::INVALID_ID;
use crate::web::{Context, HandlerResult, decode, param, query, respond, respond_empty};

use super::model::{
    AppLoginRequest, AppNewUser, AppUpdateUser, AppUser, LoginData, ORDER_FIELDS, UserData,
};
use super::service::UserService;

/// Everything the user handlers need, cloned into every call.
#[derive(Clone)]
pub struct UserHandlers {
    pub users: UserService,
    pub auth: Arc<Auth>,
}

impl UserHandlers {
    pub fn new(users: UserService, auth: Arc<Auth>) -> Self {
        Self { users, auth }
    }
}

/// Maps domain failures onto what the client sees.
fn user_error(err: UserError) -> AppError {
    match err {
        UserError::NotFound => AppError::not_found(err),
        UserError::UniqueEmail => AppError::conflict(err),
        UserError::AuthenticationFailure => AppError::unauthorized(err),
        UserError::Store(e) => AppError::internal(e),
    }
}

/// The `user_id` of the route, as checked by the authorize middleware.
fn subject(ctx: &Context) -> Result<Uuid, AppError> {
    if let Some(id) = ctx.subject_id {
        return Ok(id);
    }
    let raw = param(ctx, "user_id")
        .ok_or_else(|| AppError::bad_request(anyhow::anyhow!("id is required")))?;
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(anyhow::anyhow!(INVALID_ID)))
}

fn user_response(user: &sales_models::User) -> Success<UserData> {
    Success::new(UserData {
        user: AppUser::from(user),
    })
}

pub async fn create(h: UserHandlers, ctx: Context, req: Request) -> HandlerResult {
    let app: AppNewUser = decode(req).await?;
    let nu = app.into_new_user().map_err(AppError::fields)?;

    let tx = ctx.tx();
    let user = h
        .users
        .create(nu, ctx.values.now, tx.as_deref())
        .await
        .map_err(user_error)?;

    respond(&ctx, StatusCode::CREATED, &user_response(&user))
}

pub async fn login(h: UserHandlers, ctx: Context, req: Request) -> HandlerResult {
    let kid = req
        .headers()
        .get("kid")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|kid| !kid.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::fields(FieldErrors::single("kid", "missing kid")))?;

    let app: AppLoginRequest = decode(req).await?;
    let email = Email::new(app.email)
        .map_err(|_| AppError::fields(FieldErrors::single("email", "invalid email")))?;

    let user = h
        .users
        .authenticate(&email, &app.password)
        .await
        .map_err(user_error)?;

    let claims = h.auth.new_claims(user.id, user.roles.iter().copied());
    let token = h.auth.generate_token(&kid, &claims).map_err(|e| match e {
        AuthError::KeyNotFound(_) => AppError::fields(FieldErrors::single("kid", "unknown kid")),
        other => AppError::internal(anyhow::Error::new(other).context("generating token")),
    })?;

    let data = LoginData {
        user: AppUser::from(&user),
        token,
    };
    respond(&ctx, StatusCode::CREATED, &Success::new(data))
}

pub async fn query_by_id(h: UserHandlers, ctx: Context, _req: Request) -> HandlerResult {
    let user_id = subject(&ctx)?;
    let tx = ctx.tx();
    let user = h
        .users
        .query_by_id(user_id, tx.as_deref())
        .await
        .map_err(user_error)?;

    respond(&ctx, StatusCode::OK, &user_response(&user))
}

pub async fn query_users(h: UserHandlers, ctx: Context, req: Request) -> HandlerResult {
    let values = query(&req);

    let mut errors = FieldErrors::new();
    let page = Page::parse(&values).unwrap_or_else(|e| {
        errors.merge(e);
        Page::default()
    });
    let filter = QueryFilter::parse(&values).unwrap_or_else(|e| {
        errors.merge(e);
        QueryFilter::default()
    });
    let order = OrderBy::parse(
        values.get("orderBy").map(String::as_str),
        OrderBy::new("user_id", Direction::Asc),
        ORDER_FIELDS,
    )
    .unwrap_or_else(|e| {
        errors.merge(e);
        OrderBy::new("user_id", Direction::Asc)
    });
    errors.into_result().map_err(AppError::fields)?;

    let users = h
        .users
        .query(&filter, &order, &page)
        .await
        .map_err(user_error)?;
    let total = h.users.count(&filter).await.map_err(user_error)?;

    let items = users.iter().map(AppUser::from).collect();
    respond(
        &ctx,
        StatusCode::OK,
        &PageDocument::new(items, total, page.number, page.size),
    )
}

pub async fn update(h: UserHandlers, ctx: Context, req: Request) -> HandlerResult {
    let user_id = subject(&ctx)?;
    let app: AppUpdateUser = decode(req).await?;
    let uu = app.into_update().map_err(AppError::fields)?;

    let claims = ctx.claims()?;
    if uu.touches_privileged() && !claims.has_role(Role::Admin) {
        return Err(AppError::unauthorized(anyhow::anyhow!(
            "only an admin may change roles or enabled, sub[{}]",
            claims.sub
        )));
    }

    let tx = ctx.tx();
    let user = h
        .users
        .query_by_id(user_id, tx.as_deref())
        .await
        .map_err(user_error)?;
    let user = h
        .users
        .update(user, uu, ctx.values.now, tx.as_deref())
        .await
        .map_err(user_error)?;

    respond(&ctx, StatusCode::OK, &user_response(&user))
}

pub async fn delete(h: UserHandlers, ctx: Context, _req: Request) -> HandlerResult {
    let user_id = subject(&ctx)?;
    let tx = ctx.tx();
    h.users
        .delete(user_id, tx.as_deref())
        .await
        .map_err(user_error)?;

    respond_empty(&ctx, StatusCode::NO_CONTENT)
}
