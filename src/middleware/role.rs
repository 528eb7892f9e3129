use std::sync::Arc;

use sales_auth::{Auth, Rule};
use sales_core::AppError;
use uuid::Uuid;

use crate::web::{self, Handler, Middleware, handler, middleware};

pub const INVALID_ID: &str = "ID is not in its proper form";

/// Checks the context claims against `rule`.
///
/// When the route carries a `user_id` path parameter it must be a UUID; it is
/// stored in the context as the subject and used by `admin_or_subject`.
pub fn authorize(auth: Arc<Auth>, rule: Rule) -> Middleware {
    middleware(move |next: Handler| {
        let auth = auth.clone();
        handler(move |mut ctx, req| {
            let auth = auth.clone();
            let next = next.clone();
            async move {
                let claims = ctx.claims()?;

                let subject = match web::param(&ctx, "user_id") {
                    Some(raw) => Some(
                        Uuid::parse_str(raw)
                            .map_err(|_| AppError::bad_request(anyhow::anyhow!(INVALID_ID)))?,
                    ),
                    None => None,
                };

                auth.authorize(claims, subject, rule).map_err(|e| {
                    AppError::unauthorized(anyhow::anyhow!(
                        "authorize: you are not authorized for that action, claims[{:?}] rule[{}]: {}",
                        claims.roles,
                        rule,
                        e
                    ))
                })?;

                ctx.subject_id = subject;
                next(ctx, req).await
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{Context, RequestValues, respond};
    use axum::body::Body;
    use axum::extract::Request;
    use axum::http::StatusCode;
    use sales_auth::{Claims, KeyStore, Role};
    use std::collections::HashMap;
    use std::time::Duration;

    fn auth() -> Arc<Auth> {
        Arc::new(Auth::new(
            Arc::new(KeyStore::new()),
            "service project",
            Duration::from_secs(60),
        ))
    }

    fn context(claims: Claims, user_id: Option<&str>) -> Context {
        let params: HashMap<String, String> = user_id
            .map(|id| HashMap::from([("user_id".to_string(), id.to_string())]))
            .unwrap_or_default();
        let mut ctx = Context::new(Arc::new(RequestValues::new(params)));
        ctx.claims = Some(claims);
        ctx
    }

    fn echo_subject() -> Handler {
        handler(|ctx, _req| async move {
            let subject = ctx.subject_id.map(|id| id.to_string()).unwrap_or_default();
            respond(&ctx, StatusCode::OK, &subject)
        })
    }

    #[tokio::test]
    async fn test_admin_only_rejects_user() {
        let auth = auth();
        let claims = auth.new_claims(Uuid::new_v4(), [Role::User]);
        let chain = authorize(auth, Rule::AdminOnly)(echo_subject());

        let err = chain(context(claims, None), Request::new(Body::empty()))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_subject_may_access_self() {
        let auth = auth();
        let id = Uuid::new_v4();
        let claims = auth.new_claims(id, [Role::User]);
        let chain = authorize(auth, Rule::AdminOrSubject)(echo_subject());

        let id_text = id.to_string();
        let response = chain(context(claims, Some(id_text.as_str())), Request::new(Body::empty()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_subject_denied_for_other_user() {
        let auth = auth();
        let claims = auth.new_claims(Uuid::new_v4(), [Role::User]);
        let chain = authorize(auth, Rule::AdminOrSubject)(echo_subject());

        let other = Uuid::new_v4().to_string();
        let err = chain(context(claims, Some(other.as_str())), Request::new(Body::empty()))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let auth = auth();
        let claims = auth.new_claims(Uuid::new_v4(), [Role::Admin]);
        let chain = authorize(auth, Rule::AdminOrSubject)(echo_subject());

        let err = chain(context(claims, Some("42")), Request::new(Body::empty()))
            .await
            .unwrap_err();
        let (status, doc) = err.classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(doc.error, INVALID_ID);
    }

    #[tokio::test]
    async fn test_missing_claims_is_unauthorized() {
        let chain = authorize(auth(), Rule::Any)(echo_subject());
        let err = chain(Context::default(), Request::new(Body::empty()))
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }
}
