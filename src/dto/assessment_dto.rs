use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::assignment::Decision;
use crate::models::question::{QuestionType, QuestionWithOptions};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub question_id: Uuid,
    #[validate(length(max = 10000, message = "Answer text is too long"))]
    pub answer_text: Option<String>,
    pub selected_option_id: Option<Uuid>,
    #[serde(default)]
    pub selected_option_ids: Vec<Uuid>,
    /// Seconds spent on the question, as reported by the client.
    pub time_taken: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerResponse {
    pub status: String,
    pub saved: bool,
}

impl SubmitAnswerResponse {
    pub fn new(saved: bool) -> Self {
        Self {
            status: "success".to_string(),
            saved,
        }
    }
}

/// Option as shown to the applicant; correctness stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentedOption {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresentedQuestion {
    pub question_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub time_per_question: i32,
    pub options: Vec<PresentedOption>,
    pub has_options: bool,
    pub is_multiple: bool,
}

impl From<QuestionWithOptions> for PresentedQuestion {
    fn from(value: QuestionWithOptions) -> Self {
        let QuestionWithOptions { question, options } = value;
        Self {
            question_id: question.id,
            text: question.text,
            question_type: question.question_type,
            points: question.points,
            time_per_question: question.time_per_question,
            has_options: !options.is_empty(),
            is_multiple: question.question_type == QuestionType::Multiple,
            options: options
                .into_iter()
                .map(|o| PresentedOption {
                    id: o.id,
                    text: o.text,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CurrentQuestionResponse {
    Question(PresentedQuestion),
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ManualScoreRequest {
    #[validate(range(min = 0, message = "Manual points cannot be negative"))]
    pub manual_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignTestRequest {
    pub applicant_id: Uuid,
}
