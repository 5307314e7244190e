use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use chronod_core::ChronodConfig;
use chronod_engine::Engine;
use chronod_store::TaskStore;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: ChronodConfig,
    pub store: Arc<TaskStore>,
    pub engine: Engine,
    pub data_dir: PathBuf,
}

/// Assemble the full Axum router.
///
/// `/api/*` and `/mcp` sit behind the shared-token check; `/health` stays
/// open for probes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let guarded = Router::new()
        .route(
            "/api/tasks",
            get(crate::http::tasks::list_tasks).post(crate::http::tasks::create_task),
        )
        .route(
            "/api/tasks/{id}",
            get(crate::http::tasks::get_task)
                .put(crate::http::tasks::update_task)
                .patch(crate::http::tasks::update_task)
                .delete(crate::http::tasks::delete_task),
        )
        .route("/api/tasks/{id}/run", post(crate::http::tasks::run_task))
        .route("/api/tasks/{id}/logs", get(crate::http::tasks::task_logs))
        .route("/mcp", post(crate::mcp::mcp_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            crate::auth::require_api_key,
        ));

    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .merge(guarded)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
