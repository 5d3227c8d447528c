use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::models::actor::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.notifications.list(&actor).await?))
}

#[axum::debug_handler]
pub async fn mark_read(
    State(state): State<AppState>,
    actor: Actor,
    Path(notification_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(
        state.notifications.mark_read(&actor, notification_id).await?,
    ))
}
