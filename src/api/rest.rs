//! Router and server wiring.

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers;
use crate::api::ApiState;

/// Builds the broker's router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/queue/:name",
            get(handlers::get_message)
                .put(handlers::put_message)
                .fallback(handlers::unsupported_method),
        )
        .route("/queues", get(handlers::list_queues))
        .fallback(handlers::unknown_route)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves HTTP on `listener` until `state.shutdown` is cancelled, then lets
/// in-flight requests finish.
pub async fn serve(listener: TcpListener, state: ApiState) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP API listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("HTTP API stopped");
    Ok(())
}
