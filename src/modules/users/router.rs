use std::sync::Arc;

use axum::routing::MethodFilter;
use sales_auth::{Auth, Rule};
use sales_db::Database;

use crate::middleware::{authenticate, authorize, execute_in_transaction};
use crate::web::{App, handler_with_state};

use super::controller::{self, UserHandlers};

/// Registers the user routes under `version`.
pub fn init_users_routes(
    app: &mut App,
    version: &str,
    handlers: UserHandlers,
    auth: Arc<Auth>,
    db: Arc<dyn Database>,
) {
    let authen = authenticate(auth.clone());
    let rule_admin = authorize(auth.clone(), Rule::AdminOnly);
    let rule_admin_or_subject = authorize(auth, Rule::AdminOrSubject);
    let tran = execute_in_transaction(db);

    app.handle(
        MethodFilter::POST,
        version,
        "/users",
        handler_with_state(handlers.clone(), controller::create),
        &[],
    );
    app.handle(
        MethodFilter::POST,
        version,
        "/users/login",
        handler_with_state(handlers.clone(), controller::login),
        &[],
    );

    app.handle(
        MethodFilter::PUT,
        version,
        "/users/{user_id}",
        handler_with_state(handlers.clone(), controller::update),
        &[authen.clone(), rule_admin_or_subject.clone(), tran],
    );

    app.handle(
        MethodFilter::GET,
        version,
        "/users/{user_id}",
        handler_with_state(handlers.clone(), controller::query_by_id),
        &[authen.clone(), rule_admin_or_subject],
    );
    app.handle(
        MethodFilter::GET,
        version,
        "/users",
        handler_with_state(handlers.clone(), controller::query_users),
        &[authen.clone(), rule_admin.clone()],
    );

    app.handle(
        MethodFilter::DELETE,
        version,
        "/users/{user_id}",
        handler_with_state(handlers, controller::delete),
        &[authen, rule_admin],
    );
}
