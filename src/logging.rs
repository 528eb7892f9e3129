use std::fs;
use std::net::SocketAddr;

use anyhow::Context as _;
use axum::extract::ConnectInfo;
use sales_config::LogConfig;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::web::{Handler, Middleware, handler, middleware};

const DEFAULT_FILTER: &str = "sales_api=info,tower_http=warn,sqlx=warn";

/// Logs the start and the end of every request.
///
/// The completed status is the one recorded by the last respond call, so
/// errors rendered by the error middleware are reported with their status.
pub fn logger() -> Middleware {
    middleware(|next: Handler| {
        handler(move |ctx, req| {
            let next = next.clone();
            async move {
                let method = req.method().clone();
                let path = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str().to_string())
                    .unwrap_or_else(|| req.uri().path().to_string());
                let remote_addr = req
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                let trace_id = ctx.trace_id();

                info!(%trace_id, %method, %path, %remote_addr, "request started");

                let result = next(ctx.clone(), req).await;

                let status = ctx.values.status().map(|s| s.as_u16()).unwrap_or(0);
                let since_ms = ctx.values.started.elapsed().as_millis() as u64;
                match status {
                    500..=599 => error!(%trace_id, %method, %path, status, since_ms, "request completed"),
                    400..=499 => warn!(%trace_id, %method, %path, status, since_ms, "request completed"),
                    _ => info!(%trace_id, %method, %path, status, since_ms, "request completed"),
                }

                result
            }
        })
    })
}

/// Installs the global subscriber.
///
/// Console output is compact text unless JSON is requested. When a log
/// directory is configured a daily rolling JSON file is written as well; the
/// returned guard must live until shutdown so buffered lines get flushed.
pub fn init_tracing(config: &LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let console_layer = if config.json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_filter(filter())
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_file(true)
            .with_line_number(true)
            .compact()
            .with_filter(filter())
            .boxed()
    };

    let (file_layer, guard) = match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "sales-api.json");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_current_span(true)
                .with_span_list(true)
                .with_filter(filter())
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
