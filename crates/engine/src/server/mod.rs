mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::AlertEngine;

pub use routes::{AlertsResponse, StatusResponse};

pub struct Server {
    engine: Arc<AlertEngine>,
}

impl Server {
    pub fn new(engine: Arc<AlertEngine>) -> Self {
        Self { engine }
    }

    pub fn build_router(self) -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/alerts", get(routes::list_alerts))
            .route("/alerts/counts", get(routes::counts))
            .route("/alerts/refresh", post(routes::refresh))
            .route("/alerts/acknowledged", get(routes::acknowledged))
            .route("/alerts/{id}/acknowledge", post(routes::acknowledge))
            .route("/status", get(routes::status))
            .route("/metrics", get(routes::metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(self.engine)
    }

    /// Serves until `shutdown` resolves.
    pub async fn start<F>(self, addr: &str, shutdown: F) -> crate::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
