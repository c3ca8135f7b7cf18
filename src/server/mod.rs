//! HTTP server for the manager
//!
//! Maps the REST API onto the registry, status store and dispatcher. All
//! bodies are JSON with `Content-Type: application/json; charset=utf-8`.
//!
//! # Routes
//!
//! - `GET /ping` - Liveness
//! - `GET /metrics` - Prometheus metrics
//! - `GET /workers` - List registered workers
//! - `POST /workers` - Register or update a worker
//! - `GET /workers/{id}` - Get one worker
//! - `GET /workers/{id}/jobs` - Statuses reported by one worker
//! - `GET /workers/{id}/jobs/{mirror}` - One status
//! - `POST /workers/{id}/jobs/{mirror}` - Report a status
//! - `GET /jobs` - Fleet job board
//! - `POST /cmd` - Relay an operator command to a worker
//!
//! # Example
//!
//! ```no_run
//! use mirrorfleet::config::ManagerConfig;
//! use mirrorfleet::{Manager, ManagerServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ManagerConfig::new();
//!     let addr = config.server.bind_address();
//!     let manager = Manager::from_config(config).expect("Failed to open storage");
//!
//!     ManagerServer::new(manager).run(&addr).await.expect("Server failed");
//! }
//! ```

mod response;

pub use response::{ApiError, ApiJson, JSON_UTF8};

use crate::manager::Manager;
use crate::metrics;
use crate::model::{ClientCommand, MirrorId, MirrorStatus, WorkerId, WorkerRecord};
use crate::status::AggregatedJob;
use crate::{ManagerError, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

type AppState = Arc<Manager>;

/// HTTP front end for a [`Manager`]
pub struct ManagerServer {
    manager: Arc<Manager>,
}

impl ManagerServer {
    pub fn new(manager: Manager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }

    /// Get a reference to the manager (for testing)
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Build the router
    pub fn router(&self) -> Router {
        let max_body_size = self.manager.config().server.max_body_size;

        Router::new()
            .route("/ping", get(ping))
            .route("/metrics", get(export_metrics))
            .route("/workers", get(list_workers).post(register_worker))
            .route("/workers/{id}", get(get_worker))
            .route("/workers/{id}/jobs", get(list_jobs_of_worker))
            .route(
                "/workers/{id}/jobs/{mirror}",
                get(get_job_of_worker).post(update_job_of_worker),
            )
            .route("/jobs", get(list_all_jobs))
            .route("/cmd", axum::routing::post(handle_client_cmd))
            .layer(axum::extract::DefaultBodyLimit::max(max_body_size))
            .with_state(self.manager.clone())
    }

    /// Bind `addr` and serve until Ctrl-C
    pub async fn run(self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an existing listener until `shutdown` resolves, then close storage
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local = listener.local_addr()?;
        tracing::info!(
            addr = %local,
            require_registered_worker = self.manager.statuses().requires_registered_worker(),
            "Manager listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Manager stopped");
        self.manager.shutdown()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

fn malformed(rejection: JsonRejection) -> ApiError {
    ApiError(ManagerError::Malformed(rejection.body_text()))
}

fn bad_path(rejection: PathRejection) -> ApiError {
    ApiError(ManagerError::Malformed(rejection.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

async fn ping() -> impl IntoResponse {
    response::info("pong")
}

async fn export_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::encode_metrics(),
    )
}

async fn list_workers(
    State(manager): State<AppState>,
) -> std::result::Result<ApiJson<Vec<WorkerRecord>>, ApiError> {
    Ok(ApiJson(manager.registry().list_workers()?))
}

async fn register_worker(
    State(manager): State<AppState>,
    body: std::result::Result<Json<WorkerRecord>, JsonRejection>,
) -> std::result::Result<ApiJson<WorkerRecord>, ApiError> {
    let Json(worker) = body.map_err(malformed)?;
    Ok(ApiJson(manager.registry().register_worker(worker)?))
}

async fn get_worker(
    State(manager): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> std::result::Result<ApiJson<WorkerRecord>, ApiError> {
    let Path(id) = path.map_err(bad_path)?;
    Ok(ApiJson(manager.registry().get_worker(&WorkerId::new(id))?))
}

async fn list_jobs_of_worker(
    State(manager): State<AppState>,
    path: std::result::Result<Path<String>, PathRejection>,
) -> std::result::Result<ApiJson<Vec<MirrorStatus>>, ApiError> {
    let Path(id) = path.map_err(bad_path)?;
    let statuses = manager.statuses().list_mirror_status(&WorkerId::new(id))?;
    Ok(ApiJson(statuses))
}

async fn get_job_of_worker(
    State(manager): State<AppState>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
) -> std::result::Result<ApiJson<MirrorStatus>, ApiError> {
    let Path((id, mirror)) = path.map_err(bad_path)?;
    let status = manager
        .statuses()
        .get_mirror_status(&WorkerId::new(id), &MirrorId::new(mirror))?;
    Ok(ApiJson(status))
}

async fn update_job_of_worker(
    State(manager): State<AppState>,
    path: std::result::Result<Path<(String, String)>, PathRejection>,
    body: std::result::Result<Json<MirrorStatus>, JsonRejection>,
) -> std::result::Result<ApiJson<MirrorStatus>, ApiError> {
    let Path((id, mirror)) = path.map_err(bad_path)?;
    let Json(status) = body.map_err(malformed)?;
    let stored = manager.statuses().update_mirror_status(
        &WorkerId::new(id),
        &MirrorId::new(mirror),
        status,
    )?;
    Ok(ApiJson(stored))
}

async fn list_all_jobs(
    State(manager): State<AppState>,
) -> std::result::Result<ApiJson<Vec<AggregatedJob>>, ApiError> {
    Ok(ApiJson(manager.statuses().aggregated_jobs()?))
}

async fn handle_client_cmd(
    State(manager): State<AppState>,
    body: std::result::Result<Json<ClientCommand>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let Json(command) = body.map_err(malformed)?;
    let worker_id = command.worker_id.clone();
    manager.dispatcher().dispatch(command).await?;
    Ok(response::info(format!(
        "successfully sent command to worker {}",
        worker_id
    )))
}
