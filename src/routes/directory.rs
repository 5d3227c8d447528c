use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::dto::directory_dto::{
    EmployerAction, EmployerListQuery, InviteApplicantRequest, RegisterApplicantRequest,
    RegisterCompanyRequest, RegisterEmployerRequest,
};
use crate::models::actor::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn register_company(
    State(state): State<AppState>,
    Json(payload): Json<RegisterCompanyRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let (company, admin) = state.directory.register_company(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "company": company, "admin": admin })),
    ))
}

#[axum::debug_handler]
pub async fn pending_companies(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.directory.list_pending_companies(&actor).await?))
}

#[axum::debug_handler]
pub async fn approve_company(
    State(state): State<AppState>,
    actor: Actor,
    Path(company_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.directory.approve_company(&actor, company_id).await?))
}

#[axum::debug_handler]
pub async fn reject_company(
    State(state): State<AppState>,
    actor: Actor,
    Path(company_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    state.directory.reject_company(&actor, company_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn register_applicant(
    State(state): State<AppState>,
    Json(payload): Json<RegisterApplicantRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let user = state.directory.register_applicant(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn register_employer(
    State(state): State<AppState>,
    Json(payload): Json<RegisterEmployerRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let user = state.directory.register_employer(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[axum::debug_handler]
pub async fn list_employers(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<EmployerListQuery>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.directory.list_employers(&actor, query).await?))
}

#[axum::debug_handler]
pub async fn manage_employer(
    State(state): State<AppState>,
    actor: Actor,
    Path((employer_id, action)): Path<(Uuid, EmployerAction)>,
) -> crate::error::Result<impl IntoResponse> {
    match state
        .directory
        .manage_employer(&actor, employer_id, action)
        .await?
    {
        Some(user) => Ok(Json(user).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[axum::debug_handler]
pub async fn list_applicants(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.directory.list_applicants(&actor).await?))
}

#[axum::debug_handler]
pub async fn invite_applicant(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<InviteApplicantRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let (invitation, _message) = state.directory.invite_applicant(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}
