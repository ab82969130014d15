pub mod handlers;
pub mod ingest;
pub mod output;

use std::future::Future;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use intact_core::envelope::UPLOAD_PATH;

pub use handlers::ApiState;
pub use output::OutputDir;

/// Build the router. Upload bodies are unbounded; memory is bounded by
/// streaming, not by a size cap.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route(
            UPLOAD_PATH,
            post(handlers::handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route("/status", get(handlers::handle_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(state: ApiState, addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, state, shutdown).await
}

/// Serve on an already-bound listener (tests bind port 0).
pub async fn serve_on<F>(listener: TcpListener, state: ApiState, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!(%addr, output = %state.output.path().display(), "upload endpoint listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
