use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use sales_db::Database;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::web::{Context, HandlerResult, respond};

const READINESS_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct HealthHandlers {
    pub build: String,
    pub db: Arc<dyn Database>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Readiness {
    pub status: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liveness {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "podIP", skip_serializing_if = "Option::is_none")]
    pub pod_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// 200 when the database answers within a second, 500 otherwise.
///
/// The failure is written as a response rather than returned as an error so
/// it is never mistaken for an unexpected one.
pub async fn readiness(h: HealthHandlers, ctx: Context, _req: Request) -> HandlerResult {
    let (status, code) = match tokio::time::timeout(READINESS_TIMEOUT, h.db.status_check()).await {
        Ok(Ok(())) => ("ok", StatusCode::OK),
        Ok(Err(e)) => {
            info!(error = %e, "readiness failure");
            ("db not ready", StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            info!("readiness failure: status check timed out");
            ("db not ready", StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    respond(
        &ctx,
        code,
        &Readiness {
            status: status.to_string(),
        },
    )
}

/// Reports that the process is up, with pod details when running under
/// Kubernetes (set through the downward API).
pub async fn liveness(h: HealthHandlers, ctx: Context, _req: Request) -> HandlerResult {
    let data = Liveness {
        status: "up".to_string(),
        build: non_empty(Some(h.build)),
        host: Some(hostname()),
        name: env_var("KUBERNETES_NAME"),
        pod_ip: env_var("KUBERNETES_POD_IP"),
        node: env_var("KUBERNETES_NODE_NAME"),
        namespace: env_var("KUBERNETES_NAMESPACE"),
    };
    respond(&ctx, StatusCode::OK, &data)
}

fn env_var(key: &str) -> Option<String> {
    non_empty(env::var(key).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn hostname() -> String {
    env_var("HOSTNAME")
        .or_else(|| non_empty(fs::read_to_string("/etc/hostname").ok().map(|h| h.trim().to_string())))
        .unwrap_or_else(|| "unavailable".to_string())
}
