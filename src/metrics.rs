use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Context as _;
use axum::{Json, Router, extract::State, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use serde::Serialize;

use crate::web::{Handler, Middleware, handler, middleware};

/// Process-wide request counters, shared by the metrics and panics
/// middleware and read by `/debug/vars`.
///
/// Every update is mirrored to the `metrics` facade so the Prometheus
/// exporter sees the same numbers.
#[derive(Debug, Default)]
pub struct Metrics {
    requests: AtomicU64,
    errors: AtomicU64,
    panics: AtomicU64,
    in_flight: AtomicI64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
    pub panics: u64,
    pub in_flight: i64,
}

impl Metrics {
    /// Counts a request and marks it in flight until the guard drops.
    pub fn start_request(self: &Arc<Self>) -> InFlight {
        self.requests.fetch_add(1, Ordering::Relaxed);
        counter!("requests").increment(1);
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        gauge!("in_flight_requests").set(now as f64);
        InFlight {
            metrics: self.clone(),
        }
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        counter!("errors").increment(1);
    }

    pub fn record_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
        counter!("panics").increment(1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

pub struct InFlight {
    metrics: Arc<Metrics>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let now = self.metrics.in_flight.fetch_sub(1, Ordering::Relaxed) - 1;
        gauge!("in_flight_requests").set(now as f64);
    }
}

/// Counts requests, in-flight requests and requests whose chain returned an
/// error.
pub fn metrics(registry: Arc<Metrics>) -> Middleware {
    middleware(move |next: Handler| {
        let registry = registry.clone();
        handler(move |ctx, req| {
            let next = next.clone();
            let registry = registry.clone();
            async move {
                let _in_flight = registry.start_request();
                let result = next(ctx.clone(), req).await;

                histogram!("request_duration_seconds")
                    .record(ctx.values.started.elapsed().as_secs_f64());
                if result.is_err() {
                    registry.record_error();
                }
                result
            }
        })
    })
}

/// Installs the Prometheus recorder and its upkeep task.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )
        .context("setting histogram buckets")?
        .install_recorder()
        .context("installing Prometheus recorder")?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    Ok(handle)
}

#[derive(Clone)]
pub struct DebugState {
    pub build: String,
    pub metrics: Arc<Metrics>,
    pub prometheus: Option<PrometheusHandle>,
}

#[derive(Serialize)]
struct Vars {
    build: String,
    #[serde(flatten)]
    metrics: MetricsSnapshot,
}

/// Router for the debug listener: `/debug/vars` and `/metrics`.
pub fn debug_app(state: DebugState) -> Router {
    Router::new()
        .route("/debug/vars", get(vars))
        .route("/metrics", get(prometheus))
        .with_state(state)
}

async fn vars(State(state): State<DebugState>) -> Json<Vars> {
    Json(Vars {
        build: state.build.clone(),
        metrics: state.metrics.snapshot(),
    })
}

async fn prometheus(State(state): State<DebugState>) -> String {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
