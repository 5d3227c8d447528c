use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::assessment_dto::{
    AssignTestRequest, CurrentQuestionResponse, DecisionRequest, ManualScoreRequest,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::models::actor::Actor;
use crate::services::assignment_service::NextQuestion;
use crate::AppState;

#[axum::debug_handler]
pub async fn current_question(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let response = match state.assignments.next_question(&actor, assignment_id).await? {
        NextQuestion::Question(question) => CurrentQuestionResponse::Question(question.into()),
        NextQuestion::Complete => CurrentQuestionResponse::Complete,
    };
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let saved = state
        .assignments
        .submit_answer(&actor, assignment_id, payload)
        .await?;
    Ok(Json(SubmitAnswerResponse::new(saved)))
}

#[axum::debug_handler]
pub async fn result(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    let report = state.assignments.compute_score(&actor, assignment_id).await?;
    Ok(Json(report))
}

#[axum::debug_handler]
pub async fn decide(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<Uuid>,
    Json(payload): Json<DecisionRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let assignment = state
        .assignments
        .decide_outcome(&actor, assignment_id, payload.decision)
        .await?;
    Ok(Json(assignment))
}

#[axum::debug_handler]
pub async fn delete_assignment(
    State(state): State<AppState>,
    actor: Actor,
    Path(assignment_id): Path<Uuid>,
) -> crate::error::Result<impl IntoResponse> {
    state
        .assignments
        .delete_assignment(&actor, assignment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn manual_score(
    State(state): State<AppState>,
    actor: Actor,
    Path(answer_id): Path<Uuid>,
    Json(payload): Json<ManualScoreRequest>,
) -> crate::error::Result<impl IntoResponse> {
    payload.validate()?;
    let answer = state
        .assignments
        .set_manual_points(&actor, answer_id, payload.manual_points)
        .await?;
    Ok(Json(answer))
}

#[axum::debug_handler]
pub async fn assign_test(
    State(state): State<AppState>,
    actor: Actor,
    Path(test_id): Path<Uuid>,
    Json(payload): Json<AssignTestRequest>,
) -> crate::error::Result<impl IntoResponse> {
    let assignment = state
        .assignments
        .assign_test(&actor, test_id, payload.applicant_id)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}
