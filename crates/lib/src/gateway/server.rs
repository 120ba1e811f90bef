//! Public redirect server and process orchestration.
//!
//! `GET /{file_id}` resolves the id through getFile and answers 301 to the file host.
//! [`run_relay`] starts the update ingestor next to the HTTP listener and stops both on SIGINT/SIGTERM.

use crate::channels::TelegramChannel;
use crate::config::Settings;
use crate::relay::{FileResolver, PathResolver, ReplyEmitter, UpdateIngestor};
use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared state for the redirect handler. Read-only; requests share nothing mutable.
#[derive(Clone)]
pub struct RedirectState {
    pub resolver: Arc<dyn PathResolver>,
    /// File host base URL without trailing slash.
    pub file_server_url: Arc<str>,
}

/// Router for the public surface: `/` (missing id) and `/:file_id`.
pub fn redirect_router(resolver: Arc<dyn PathResolver>, file_server_url: &str) -> Router {
    let state = RedirectState {
        resolver,
        file_server_url: Arc::from(file_server_url.trim_end_matches('/')),
    };
    Router::new()
        .route("/", get(missing_file_id))
        .route("/:file_id", get(redirect_file))
        .with_state(state)
}

/// GET / has no file id.
async fn missing_file_id() -> Response {
    (StatusCode::BAD_REQUEST, "file_id must not be empty").into_response()
}

/// GET /:file_id resolves the id and redirects to `<file-server-url>/d/<path>`.
/// A blank id is rejected; any other id goes to the resolver exactly as decoded.
async fn redirect_file(State(state): State<RedirectState>, Path(file_id): Path<String>) -> Response {
    if file_id.trim().is_empty() {
        return missing_file_id().await;
    }
    match state.resolver.resolve(&file_id).await {
        Ok(path) => {
            log::debug!("fileID: {}, filePath: {}", file_id, path.as_str());
            let target = path.redirect_target(&state.file_server_url);
            (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, target)]).into_response()
        }
        Err(e) => {
            log::warn!("resolving file {} failed: {}", file_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("unable to resolve file path: {}", e),
            )
                .into_response()
        }
    }
}

/// Run the relay until SIGINT or SIGTERM.
pub async fn run_relay(settings: Settings) -> Result<()> {
    run_relay_until(settings, shutdown_signal()).await
}

/// Run the relay until `shutdown` completes.
///
/// On shutdown the ingestor is told to stop at its next poll boundary, the listener stops
/// accepting connections and drains in-flight requests, then the ingestor task is awaited.
pub async fn run_relay_until<F>(settings: Settings, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let telegram = Arc::new(TelegramChannel::new(&settings));
    match telegram.get_me().await {
        Ok(me) => log::info!(
            "authorized as bot @{} ({})",
            me.username.as_deref().unwrap_or("?"),
            me.id
        ),
        Err(e) => log::warn!("telegram getMe failed: {}", e),
    }

    let resolver: Arc<dyn PathResolver> = Arc::new(FileResolver::new(telegram.clone(), &settings));
    let emitter = ReplyEmitter::new(telegram.clone(), &settings);
    let ingestor = UpdateIngestor::new(telegram, emitter, settings.retry_delay);

    let (stop_tx, stop_rx) = watch::channel(false);
    let stop_tx = Arc::new(stop_tx);
    let ingestor_task = tokio::spawn(ingestor.run(stop_rx));

    let app = redirect_router(resolver, &settings.file_server_url);
    let bind_addr = settings.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            let _ = stop_tx.send(true);
            let _ = ingestor_task.await;
            return Err(anyhow::Error::new(e).context(format!("binding to {}", bind_addr)));
        }
    };
    log::info!("redirect server listening on {}", bind_addr);

    let stop_on_signal = stop_tx.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            log::info!("shutdown signal received, stopping ingestor and draining connections");
            let _ = stop_on_signal.send(true);
        })
        .await
        .context("redirect server exited");

    let _ = stop_tx.send(true);
    if let Err(e) = ingestor_task.await {
        log::warn!("update ingestor task failed: {}", e);
    }
    served?;
    log::info!("relay stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
