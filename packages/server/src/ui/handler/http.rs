//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
};

use crate::{
    infrastructure::dto::{http::ConnectionSummaryDto, websocket::NotificationDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Debug endpoint listing online users and their connection counts
pub async fn list_connections(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<ConnectionSummaryDto>> {
    let online = state.registry.online_users().await;

    Json(
        online
            .into_iter()
            .map(|(user_id, connections)| ConnectionSummaryDto {
                user_id: user_id.into_string(),
                connections,
            })
            .collect(),
    )
}

/// Drain the caller's undelivered notifications, oldest first
pub async fn take_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<NotificationDto>>, StatusCode> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = state.verifier.verify(token).await.map_err(|e| {
        tracing::debug!("Rejected notifications request: {}", e);
        StatusCode::UNAUTHORIZED
    })?;

    let pending = state.inbox.take_pending(&user_id).await;
    tracing::debug!(user_id = %user_id, count = pending.len(), "Pending notifications taken");

    Ok(Json(pending.iter().map(NotificationDto::from).collect()))
}
