#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use sales_api::db::MemoryDatabase;
use sales_api::modules::users::{MemoryUserRepository, UserService};
use sales_api::router::init_router;
use sales_api::state::AppState;
use sales_api::web::Shutdown;
use sales_auth::{Auth, KeyStore, Role};
use sales_models::{Email, NewUser, User};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const KID: &str = "test-kid";
pub const PASSWORD: &str = "gophers";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub repo: Arc<MemoryUserRepository>,
    pub db: Arc<MemoryDatabase>,
}

pub fn setup_test_app() -> TestApp {
    let keys = KeyStore::new().with_hmac(KID, b"integration-test-secret");
    let auth = Arc::new(Auth::new(
        Arc::new(keys),
        "service project",
        Duration::from_secs(3600),
    ));

    let repo = Arc::new(MemoryUserRepository::new());
    let users = UserService::with_cost(repo.clone(), sales_core::TEST_BCRYPT_COST);
    let db = Arc::new(MemoryDatabase::new());
    let (shutdown, _rx) = Shutdown::new();

    let state = AppState::new(users, auth, db.clone(), shutdown, "test");
    TestApp {
        router: init_router(state.clone()),
        state,
        repo,
        db,
    }
}

pub fn generate_unique_email() -> String {
    format!("user-{}@example.com", Uuid::new_v4().simple())
}

pub async fn create_test_user(app: &TestApp, email: &str, roles: &[Role]) -> User {
    let nu = NewUser {
        name: "Test User".to_string(),
        email: Email::new(email).unwrap(),
        roles: roles.to_vec(),
        department: None,
        password: PASSWORD.to_string(),
    };
    app.state.users.create(nu, Utc::now(), None).await.unwrap()
}

pub fn token_for(app: &TestApp, user: &User) -> String {
    let claims = app.state.auth.new_claims(user.id, user.roles.iter().copied());
    app.state.auth.generate_token(KID, &claims).unwrap()
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends the request and returns the status and the JSON body
/// (`Value::Null` for an empty body).
pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    if body.is_empty() {
        return (status, Value::Null);
    }
    (status, serde_json::from_slice(&body).unwrap())
}
