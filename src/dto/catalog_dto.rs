use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{
    QuestionType, QuestionWithOptions, DEFAULT_POINTS, DEFAULT_TIME_PER_QUESTION,
};
use crate::models::test::Test;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub category_id: Uuid,
    #[serde(default, deserialize_with = "trim_optional_string")]
    #[validate(length(max = 100))]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTestRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub category_id: Option<Uuid>,
    /// Absent leaves the position alone; `null` or a blank string clears it.
    #[serde(default, deserialize_with = "present_optional_string")]
    pub position: Option<Option<String>>,
}

/// Query string of the employer's test list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestListQuery {
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    #[serde(default, deserialize_with = "trim_optional_string")]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OptionRequest {
    #[validate(length(min = 1, message = "Option text cannot be empty"))]
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    pub text: String,
    /// Defaults to the test's category.
    pub category_id: Option<Uuid>,
    pub question_type: QuestionType,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, message = "Points must be at least 1"))]
    pub points: i32,
    #[serde(default = "default_time_per_question")]
    #[validate(range(min = 1, message = "Time per question must be at least 1 second"))]
    pub time_per_question: i32,
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<OptionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, message = "Question text cannot be empty"))]
    pub text: Option<String>,
    pub category_id: Option<Uuid>,
    pub question_type: Option<QuestionType>,
    #[validate(range(min = 1, message = "Points must be at least 1"))]
    pub points: Option<i32>,
    #[validate(range(min = 1, message = "Time per question must be at least 1 second"))]
    pub time_per_question: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestDetailResponse {
    #[serde(flatten)]
    pub test: Test,
    pub questions: Vec<QuestionWithOptions>,
}

fn default_points() -> i32 {
    DEFAULT_POINTS
}

fn default_time_per_question() -> i32 {
    DEFAULT_TIME_PER_QUESTION
}

fn trim_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn present_optional_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    trim_optional_string(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_distinguishes_missing_and_cleared_position() {
        let untouched: UpdateTestRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(untouched.position, None);

        let cleared: UpdateTestRequest = serde_json::from_str(r#"{"position":null}"#).unwrap();
        assert_eq!(cleared.position, Some(None));

        let blank: UpdateTestRequest = serde_json::from_str(r#"{"position":"  "}"#).unwrap();
        assert_eq!(blank.position, Some(None));

        let set: UpdateTestRequest = serde_json::from_str(r#"{"position":" QA "}"#).unwrap();
        assert_eq!(set.position, Some(Some("QA".to_string())));
    }

    #[test]
    fn question_defaults_apply() {
        let req: CreateQuestionRequest =
            serde_json::from_str(r#"{"text":"Why?","question_type":"open"}"#).unwrap();
        assert_eq!(req.points, DEFAULT_POINTS);
        assert_eq!(req.time_per_question, DEFAULT_TIME_PER_QUESTION);
        assert!(req.options.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn zero_points_rejected() {
        let req: CreateQuestionRequest =
            serde_json::from_str(r#"{"text":"Why?","question_type":"open","points":0}"#).unwrap();
        assert!(req.validate().is_err());
    }
}
