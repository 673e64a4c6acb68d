//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use calswitch_app::ports::TaskIntrospection;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts API routes under `/api` next to the `/health` check, with a
/// [`TraceLayer`] logging each request/response at the `DEBUG` level.
pub fn build<Q>(state: AppState<Q>) -> Router
where
    Q: TaskIntrospection + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
