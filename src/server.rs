use std::sync::Arc;

use anyhow::{Context as _, Result};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tokio::net::TcpListener;
use tracing::warn;

use crate::metrics::PduMetrics;

pub fn router(metrics: Arc<PduMetrics>) -> Router {
    Router::new()
        .route("/", get(scrape))
        .route("/metrics", get(scrape))
        .with_state(metrics)
}

pub async fn serve(listener: TcpListener, metrics: Arc<PduMetrics>) -> Result<()> {
    axum::serve(listener, router(metrics))
        .await
        .context("metrics server failed")
}

async fn scrape(State(metrics): State<Arc<PduMetrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(err) => {
            warn!("failed to render metrics: {err:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}")).into_response()
        }
    }
}
