use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use dotenvy::dotenv;
use sales_api::logging::init_tracing;
use sales_api::metrics::{DebugState, debug_app, init_metrics};
use sales_api::middleware::install_panic_hook;
use sales_api::router::init_router;
use sales_api::state::init_app_state;
use sales_api::web::Shutdown;
use sales_config::Config;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};

const BUILD: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env().context("loading configuration")?;
    let _log_guard = init_tracing(&config.log)?;
    install_panic_hook();

    if let Err(e) = run(config).await {
        error!(error = %format!("{:#}", e), "service stopped with an error");
        return Err(e);
    }
    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    info!(build = BUILD, "starting service");

    let prometheus = match init_metrics() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!(error = %e, "prometheus exporter disabled");
            None
        }
    };

    let (shutdown, shutdown_rx) = Shutdown::new();
    let state = init_app_state(&config, BUILD, shutdown)?;

    let debug = debug_app(DebugState {
        build: BUILD.to_string(),
        metrics: state.metrics.clone(),
        prometheus,
    });
    let debug_listener = TcpListener::bind(&config.web.debug_host)
        .await
        .with_context(|| format!("binding debug listener on {}", config.web.debug_host))?;
    info!(addr = %config.web.debug_host, "debug server listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(debug_listener, debug).await {
            error!(error = %e, "debug server failed");
        }
    });

    let app = init_router(state);
    let listener = TcpListener::bind(&config.web.api_host)
        .await
        .with_context(|| format!("binding api listener on {}", config.web.api_host))?;
    info!(addr = %config.web.api_host, "api server listening");

    let (fired_tx, fired_rx) = oneshot::channel();
    let graceful = async move {
        let reason = wait_for_shutdown(shutdown_rx).await;
        info!(reason = %reason, "shutdown started");
        let _ = fired_tx.send(());
    };

    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(graceful)
        .await
    });

    tokio::select! {
        result = &mut server => {
            result.context("api server task")?.context("api server")?;
        }
        _ = fired_rx => {
            drain(&mut server, config.web.shutdown_timeout).await?;
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Waits for in-flight requests to finish, then gives up and closes every
/// connection.
async fn drain(
    server: &mut tokio::task::JoinHandle<std::io::Result<()>>,
    timeout: Duration,
) -> anyhow::Result<()> {
    match tokio::time::timeout(timeout, &mut *server).await {
        Ok(result) => {
            result.context("api server task")?.context("api server")?;
            Ok(())
        }
        Err(_) => {
            server.abort();
            bail!("could not stop server gracefully within {:?}", timeout)
        }
    }
}

/// Resolves on SIGINT, SIGTERM or a request-triggered shutdown, returning the
/// reason.
async fn wait_for_shutdown(mut internal: watch::Receiver<Option<String>>) -> String {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let requested = async {
        loop {
            let current = internal.borrow_and_update().clone();
            if let Some(reason) = current {
                return reason;
            }
            if internal.changed().await.is_err() {
                return std::future::pending::<String>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => "interrupt".to_string(),
        _ = terminate => "terminate".to_string(),
        reason = requested => reason,
    }
}
