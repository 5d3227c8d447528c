use axum::{extract::State, response::IntoResponse, Json};

use crate::models::actor::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn applicant_dashboard(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.reports.applicant_dashboard(&actor).await?))
}

#[axum::debug_handler]
pub async fn employer_dashboard(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.reports.employer_dashboard(&actor).await?))
}

#[axum::debug_handler]
pub async fn employer_reports(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.reports.employer_reports(&actor).await?))
}
