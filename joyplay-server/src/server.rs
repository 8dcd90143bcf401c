//! Router and server lifecycle

use crate::error::ApiError;
use crate::playground::Playground;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{header, HeaderValue},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use joyplay_sandbox::{
    CancellationToken, CompileRequest, CompileResponse, FormatRequest, FormatResponse,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Room for framing on top of the largest accepted snippet
const BODY_LIMIT_SLACK: usize = 64 * 1024;

/// Create the playground router
pub fn create_router(playground: Arc<Playground>) -> Router {
    let body_limit = playground.store().max_snippet_bytes() + BODY_LIMIT_SLACK;

    Router::new()
        .route("/compile", post(handle_compile))
        .route("/fmt", post(handle_format))
        .route("/share", post(handle_share))
        .route("/p/:id", get(handle_snippet))
        .route("/js/:id", get(handle_render))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::map_response(allow_any_origin))
        .with_state(playground)
}

/// Serve until the playground's shutdown token is cancelled, then drain
/// in-flight requests
pub async fn start_server(listener: tokio::net::TcpListener, playground: Arc<Playground>) -> Result<()> {
    let shutdown = playground.shutdown_token().clone();
    let app = create_router(playground);

    let bind_addr = listener
        .local_addr()
        .context("Failed to obtain server bind address")?;
    info!("Starting playground server on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Playground server error")?;

    info!("Playground server stopped");
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM
pub async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
        _ = shutdown.cancelled() => return,
    }
    shutdown.cancel();
}

async fn allow_any_origin(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    response
}

/// Handle POST /compile
async fn handle_compile(
    State(playground): State<Arc<Playground>>,
    body: Bytes,
) -> Result<Json<CompileResponse>, ApiError> {
    let request: CompileRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    debug!(code_len = request.body.len(), "Received compile request");

    Ok(Json(playground.compile(&request.body).await?))
}

/// Handle POST /fmt
async fn handle_format(
    State(playground): State<Arc<Playground>>,
    body: Bytes,
) -> Result<Json<FormatResponse>, ApiError> {
    let request: FormatRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    debug!(code_len = request.body.len(), imports = request.imports, "Received format request");

    Ok(Json(playground.format(&request.body, request.imports).await?))
}

/// Handle POST /share
async fn handle_share(
    State(playground): State<Arc<Playground>>,
    body: Bytes,
) -> Result<String, ApiError> {
    let id = playground.share(&body).await?;
    Ok(id.to_string())
}

/// Handle GET /p/{id}
async fn handle_snippet(
    State(playground): State<Arc<Playground>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let body = playground.snippet(&id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response())
}

/// Handle GET /js/{id}
async fn handle_render(
    State(playground): State<Arc<Playground>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    Ok(Html(playground.render(&id).await?))
}
