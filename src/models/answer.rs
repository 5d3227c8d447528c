use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub question_id: Uuid,
    pub answer_text: Option<String>,
    pub selected_option_id: Option<Uuid>,
    pub selected_option_ids: Vec<Uuid>,
    pub time_taken: i32,
    pub is_submitted: bool,
    pub manual_points: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Answer {
    pub fn selected_set(&self) -> BTreeSet<Uuid> {
        self.selected_option_ids.iter().copied().collect()
    }
}

/// What the applicant chose, already checked against the question type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerSelection {
    Single(Uuid),
    Multiple(BTreeSet<Uuid>),
    Open(String),
}

/// A final answer ready to be stored for one (assignment, question) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerSubmission {
    pub selection: AnswerSelection,
    pub time_taken: i32,
}

impl AnswerSubmission {
    /// Column values in storage order: text, single option, option set.
    pub fn columns(&self) -> (Option<String>, Option<Uuid>, Vec<Uuid>) {
        match &self.selection {
            AnswerSelection::Single(id) => (None, Some(*id), Vec::new()),
            AnswerSelection::Multiple(ids) => (None, None, ids.iter().copied().collect()),
            AnswerSelection::Open(text) => (Some(text.clone()), None, Vec::new()),
        }
    }
}
