use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::dto::catalog_dto::{
    CreateCategoryRequest, CreateQuestionRequest, CreateTestRequest, TestListQuery,
    UpdateQuestionRequest, UpdateTestRequest,
};
use crate::models::actor::Actor;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_categories(
    State(state): State<AppState>,
    actor: Actor,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.catalog.list_categories(&actor).await?))
}

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateCategoryRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let category = state.catalog.create_category(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    actor: Actor,
    Query(query): Query<TestListQuery>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.catalog.list_tests(&actor, query).await?))
}

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreateTestRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let test = state.catalog.create_test(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(test)))
}

#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    actor: Actor,
    Path(test_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.catalog.get_test(&actor, test_id).await?))
}

#[axum::debug_handler]
pub async fn update_test(
    State(state): State<AppState>,
    actor: Actor,
    Path(test_id): Path<Uuid>,
    Json(payload): Json<UpdateTestRequest>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(state.catalog.update_test(&actor, test_id, payload).await?))
}

#[axum::debug_handler]
pub async fn delete_test(
    State(state): State<AppState>,
    actor: Actor,
    Path(test_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    state.catalog.delete_test(&actor, test_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    actor: Actor,
    Path(test_id): Path<Uuid>,
    Json(payload): Json<CreateQuestionRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let question = state
        .catalog
        .create_question(&actor, test_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    actor: Actor,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> crate::error::Result<impl IntoResponse> {
    Ok(Json(
        state
            .catalog
            .update_question(&actor, question_id, payload)
            .await?,
    ))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    actor: Actor,
    Path(question_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    state.catalog.delete_question(&actor, question_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
