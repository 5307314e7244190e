use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;

/// Shared-token gate for the API and MCP routes.
///
/// When no token is configured the check is disabled entirely, matching a
/// trusted-network deployment.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    if let Some(token) = state
        .config
        .gateway
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
    {
        let supplied = req
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());
        if supplied != Some(token) {
            return Err((StatusCode::UNAUTHORIZED, "Unauthorized"));
        }
    }
    Ok(next.run(req).await)
}
