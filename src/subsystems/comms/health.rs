//! Liveness endpoint — `GET /` answers with a fixed string so hosting
//! platforms can probe the process. No business logic lives here.

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::runtime::{Component, ComponentFuture};

pub const LIVENESS_BODY: &str = "travelbot is running";

pub struct HealthServer {
    channel_id: String,
    bind_addr: String,
}

impl HealthServer {
    pub fn new(channel_id: impl Into<String>, bind_addr: impl Into<String>) -> Self {
        Self { channel_id: channel_id.into(), bind_addr: bind_addr.into() }
    }
}

impl Component for HealthServer {
    fn id(&self) -> &str {
        &self.channel_id
    }

    fn run(self: Box<Self>, shutdown: CancellationToken) -> ComponentFuture {
        Box::pin(run_health(self.channel_id, self.bind_addr, shutdown))
    }
}

async fn run_health(
    channel_id: String,
    bind_addr: String,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("health bind failed on {bind_addr}: {e}")))?;

    info!(%channel_id, %bind_addr, "health endpoint listening");

    axum::serve(listener, router())
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("health server error: {e}")))?;

    info!(%channel_id, "health endpoint shut down");
    Ok(())
}

pub fn router() -> Router {
    Router::new().route("/", get(liveness))
}

async fn liveness() -> &'static str {
    LIVENESS_BODY
}
