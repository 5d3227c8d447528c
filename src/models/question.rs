use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const DEFAULT_POINTS: i32 = 1;
pub const DEFAULT_TIME_PER_QUESTION: i32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Single,
    Multiple,
    Open,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Open => "open",
        }
    }

    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionType::Open)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(QuestionType::Single),
            "multiple" => Ok(QuestionType::Multiple),
            "open" => Ok(QuestionType::Open),
            other => Err(format!("unknown question type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub test_id: Uuid,
    pub category_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub time_per_question: i32,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Question {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let raw_type: String = row.try_get("question_type")?;
        let question_type = raw_type
            .parse::<QuestionType>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(Self {
            id: row.try_get("id")?,
            test_id: row.try_get("test_id")?,
            category_id: row.try_get("category_id")?,
            text: row.try_get("text")?,
            question_type,
            points: row.try_get("points")?,
            time_per_question: row.try_get("time_per_question")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A selectable answer for a choice question. Named `QuestionOption` to keep
/// clear of `std::option::Option`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub is_correct: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub test_id: Uuid,
    pub category_id: Uuid,
    pub text: String,
    pub question_type: QuestionType,
    pub points: i32,
    pub time_per_question: i32,
    pub options: Vec<NewOption>,
}

#[derive(Debug, Clone)]
pub struct NewOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QuestionChanges {
    pub text: Option<String>,
    pub category_id: Option<Uuid>,
    pub question_type: Option<QuestionType>,
    pub points: Option<i32>,
    pub time_per_question: Option<i32>,
}

/// A question together with its options, in stable order.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

impl QuestionWithOptions {
    pub fn correct_option_ids(&self) -> std::collections::BTreeSet<Uuid> {
        self.options
            .iter()
            .filter(|o| o.is_correct)
            .map(|o| o.id)
            .collect()
    }

    pub fn has_option(&self, option_id: Uuid) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}
