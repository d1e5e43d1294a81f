//! Local HTTP boundary for the front-end view.
//!
//! `POST /invoke` takes an [`Invocation`] and answers `{"ok": ...}` or
//! `{"error": {...}}`. `GET /health` reports readiness and the suggested
//! hotkey. Any other path is served from the front-end directory.

use crate::{AppError, AppResult, Dispatcher, Invocation, Reply};

use audio_switcher_core::{Config, ErrorKind};

use std::{
    net::Ipv4Addr,
    panic::Location,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use error_location::ErrorLocation;
use serde::Serialize;
use tokio::{net::TcpListener, sync::watch};
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing::{info, instrument, warn};

/// Response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Envelope {
    Ok(Reply),
    Error(ErrorBody),
}

/// Error payload: a stable kind plus a human-readable message.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorBody {
    pub(crate) kind: WireKind,
    pub(crate) message: String,
    pub(crate) retryable: bool,
}

/// Error kind on the wire: a registry kind, or `"internal"`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum WireKind {
    Registry(ErrorKind),
    Internal(&'static str),
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    default_hotkey: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, retryable) = match &self {
            AppError::Registry { source, .. } => {
                let kind = source.kind();
                (status_for(kind), WireKind::Registry(kind), source.is_retryable())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                WireKind::Internal("internal"),
                false,
            ),
        };

        let body = Envelope::Error(ErrorBody {
            kind,
            message: self.to_string(),
            retryable,
        });

        (status, Json(body)).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::UnknownDevice => StatusCode::NOT_FOUND,
        ErrorKind::DeviceExcluded | ErrorKind::NoDevices => StatusCode::CONFLICT,
        ErrorKind::InvalidHotkey => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotReady | ErrorKind::DeviceQuery => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::DeviceActivation | ErrorKind::ConfigCorrupt | ErrorKind::ConfigWrite => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Build the boundary router, falling back to files under `ui_dir`.
pub(crate) fn router(dispatcher: Arc<Dispatcher>, ui_dir: &Path) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .route("/health", get(health))
        .fallback_service(ServeDir::new(ui_dir))
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}

async fn invoke(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(invocation): Json<Invocation>,
) -> Result<Json<Envelope>, AppError> {
    let cmd = invocation.name();

    match dispatcher.dispatch(invocation).await {
        Ok(reply) => Ok(Json(Envelope::Ok(reply))),
        Err(e) => {
            warn!(cmd, error = %e, "Invocation failed");
            Err(e)
        }
    }
}

async fn health(State(dispatcher): State<Arc<Dispatcher>>) -> Json<Health> {
    let status = if dispatcher.is_ready() {
        "ready"
    } else {
        "starting"
    };
    Json(Health {
        status,
        default_hotkey: Config::DEFAULT_HOTKEY,
    })
}

/// Serve the boundary on the loopback interface until shutdown is signalled.
#[instrument(skip(dispatcher, shutdown_rx))]
pub(crate) async fn serve(
    dispatcher: Arc<Dispatcher>,
    port: u16,
    ui_dir: PathBuf,
    mut shutdown_rx: watch::Receiver<bool>,
) -> AppResult<()> {
    let caller = Location::caller();

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .await
        .map_err(|e| AppError::ServerError {
            reason: format!("Failed to bind 127.0.0.1:{}: {}", port, e),
            location: ErrorLocation::from(caller),
        })?;

    if !ui_dir.is_dir() {
        warn!(ui_dir = %ui_dir.display(), "Front-end directory missing, settings page will 404");
    }
    info!(port, ui_dir = %ui_dir.display(), "Boundary listening");

    axum::serve(listener, router(dispatcher, &ui_dir))
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .map_err(|e| AppError::ServerError {
            reason: format!("Server stopped: {}", e),
            location: ErrorLocation::from(caller),
        })?;

    info!("Boundary stopped");

    Ok(())
}
