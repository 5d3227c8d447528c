use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::answer::Answer;
use crate::models::question::{QuestionType, QuestionWithOptions};

/// Per-answer line of a score report.
#[derive(Debug, Clone, Serialize)]
pub struct GradedAnswer {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub question_text: String,
    pub question_type: QuestionType,
    pub answer_text: Option<String>,
    pub selected_options: Vec<String>,
    pub time_taken: i32,
    pub points_earned: i32,
    pub max_points: i32,
    pub manual_points: i32,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub score: i32,
    pub max_score: i32,
    pub answers: Vec<GradedAnswer>,
}

pub struct ScoringService;

impl ScoringService {
    /// Points an answer earns for its question.
    ///
    /// Single choice scores only when the question has exactly one correct
    /// option and it is the one selected. Multiple choice requires the
    /// selected set to equal the correct set. Open answers carry whatever
    /// the employer awarded manually, capped at the question's points.
    pub fn points_for(question: &QuestionWithOptions, answer: &Answer) -> i32 {
        let points = question.question.points;
        match question.question.question_type {
            QuestionType::Single => {
                let correct = question.correct_option_ids();
                match (correct.len(), answer.selected_option_id) {
                    (1, Some(selected)) if correct.contains(&selected) => points,
                    _ => 0,
                }
            }
            QuestionType::Multiple => {
                let correct = question.correct_option_ids();
                if !correct.is_empty() && answer.selected_set() == correct {
                    points
                } else {
                    0
                }
            }
            QuestionType::Open => answer.manual_points.clamp(0, points),
        }
    }

    /// Scores every submitted answer. Each answered question adds its full
    /// `points` to `max_score`, open questions included; unanswered
    /// questions add nothing.
    pub fn score(questions: &[QuestionWithOptions], answers: &[Answer]) -> ScoreReport {
        let by_id: HashMap<Uuid, &QuestionWithOptions> =
            questions.iter().map(|q| (q.question.id, q)).collect();

        let mut score = 0;
        let mut max_score = 0;
        let mut graded = Vec::with_capacity(answers.len());

        for answer in answers.iter().filter(|a| a.is_submitted) {
            let Some(question) = by_id.get(&answer.question_id) else {
                continue;
            };
            let earned = Self::points_for(question, answer);
            score += earned;
            max_score += question.question.points;

            let selected = answer.selected_set();
            let selected_options = question
                .options
                .iter()
                .filter(|o| Some(o.id) == answer.selected_option_id || selected.contains(&o.id))
                .map(|o| o.text.clone())
                .collect();

            graded.push(GradedAnswer {
                answer_id: answer.id,
                question_id: question.question.id,
                question_text: question.question.text.clone(),
                question_type: question.question.question_type,
                answer_text: answer.answer_text.clone(),
                selected_options,
                time_taken: answer.time_taken,
                points_earned: earned,
                max_points: question.question.points,
                manual_points: answer.manual_points,
                needs_review: question.question.question_type == QuestionType::Open
                    && answer.manual_points == 0,
            });
        }

        ScoreReport {
            score,
            max_score,
            answers: graded,
        }
    }
}
