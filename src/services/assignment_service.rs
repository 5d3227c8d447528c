use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::assessment_dto::SubmitAnswerRequest;
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::answer::{Answer, AnswerSelection, AnswerSubmission};
use crate::models::assignment::{Decision, TestAssignment};
use crate::models::notification::NewNotification;
use crate::models::question::{QuestionType, QuestionWithOptions};
use crate::models::test::Test;
use crate::models::user::Role;
use crate::repositories::{AssignmentRepository, CatalogRepository, DirectoryRepository};
use crate::services::catalog_service::load_questions;
use crate::services::scoring_service::{ScoreReport, ScoringService};

/// What the applicant should see next.
#[derive(Debug, Clone)]
pub enum NextQuestion {
    Question(QuestionWithOptions),
    Complete,
}

/// Drives a test assignment from creation to the employer's verdict.
#[derive(Clone)]
pub struct AssignmentService {
    catalog: Arc<dyn CatalogRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    directory: Arc<dyn DirectoryRepository>,
}

impl AssignmentService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        directory: Arc<dyn DirectoryRepository>,
    ) -> Self {
        Self {
            catalog,
            assignments,
            directory,
        }
    }

    pub async fn assign_test(
        &self,
        actor: &Actor,
        test_id: Uuid,
        applicant_id: Uuid,
    ) -> Result<TestAssignment> {
        actor.ensure_employer()?;
        let company_id = actor.ensure_company_member()?;
        let test = self.owned_test(actor, test_id).await?;

        let applicant = self
            .directory
            .find_user(applicant_id)
            .await?
            .filter(|u| u.role == Role::Applicant && u.company_id == Some(company_id))
            .ok_or_else(|| Error::not_found("Applicant"))?;

        let assignment = self.assignments.create(test.id, applicant.id).await?;
        tracing::info!(
            assignment_id = %assignment.id,
            test_id = %test.id,
            applicant_id = %applicant.id,
            "test assigned"
        );
        Ok(assignment)
    }

    /// First unanswered question of the assignment's test, or `Complete`.
    /// Running out of questions closes the assignment; only the call that
    /// performs the close logs it.
    pub async fn next_question(&self, actor: &Actor, assignment_id: Uuid) -> Result<NextQuestion> {
        let assignment = self.applicant_assignment(actor, assignment_id).await?;
        if !assignment.is_active {
            return Ok(NextQuestion::Complete);
        }

        let answered: HashSet<Uuid> = self
            .assignments
            .list_answers(assignment.id)
            .await?
            .into_iter()
            .filter(|a| a.is_submitted)
            .map(|a| a.question_id)
            .collect();

        let pending = self
            .catalog
            .list_questions(assignment.test_id)
            .await?
            .into_iter()
            .find(|q| !answered.contains(&q.id));

        match pending {
            Some(question) => {
                let options = self.catalog.list_options(question.id).await?;
                Ok(NextQuestion::Question(QuestionWithOptions { question, options }))
            }
            None => {
                if self.assignments.deactivate(assignment.id).await? {
                    tracing::info!(assignment_id = %assignment.id, "assignment completed");
                }
                Ok(NextQuestion::Complete)
            }
        }
    }

    /// Stores the applicant's answer for one question. Returns whether
    /// anything was saved: a non-positive `time_taken` is ignored.
    pub async fn submit_answer(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        request: SubmitAnswerRequest,
    ) -> Result<bool> {
        let assignment = self.applicant_assignment(actor, assignment_id).await?;

        let question = self
            .catalog
            .find_question(request.question_id)
            .await?
            .filter(|q| q.test_id == assignment.test_id)
            .ok_or_else(|| Error::not_found("Question"))?;

        if !assignment.is_active {
            return Err(Error::Conflict("Assignment is already completed".into()));
        }

        if request.time_taken <= 0 {
            tracing::debug!(
                assignment_id = %assignment.id,
                question_id = %question.id,
                time_taken = request.time_taken,
                "ignoring answer without elapsed time"
            );
            return Ok(false);
        }

        request.validate()?;
        let options = self.catalog.list_options(question.id).await?;
        let question = QuestionWithOptions { question, options };
        let selection = selection_for(&question, &request)?;

        self.assignments
            .save_answer(
                assignment.id,
                question.question.id,
                AnswerSubmission {
                    selection,
                    time_taken: request.time_taken,
                },
            )
            .await?;
        Ok(true)
    }

    /// Score of the assignment as it stands. Visible to the applicant who
    /// took it and to the employer who owns the test.
    pub async fn compute_score(&self, actor: &Actor, assignment_id: Uuid) -> Result<ScoreReport> {
        actor.ensure_active()?;
        let assignment = self.find_assignment(assignment_id).await?;
        let test = self
            .catalog
            .find_test(assignment.test_id)
            .await?
            .ok_or_else(|| Error::not_found("Assignment"))?;

        let allowed = actor.is_applicant_of(&assignment)
            || (actor.role == Role::Employer && actor.owns_test(&test));
        if !allowed {
            return Err(Error::not_found("Assignment"));
        }

        self.score_assignment(&assignment).await
    }

    pub async fn score_assignment(&self, assignment: &TestAssignment) -> Result<ScoreReport> {
        let questions = load_questions(self.catalog.as_ref(), assignment.test_id).await?;
        let answers = self.assignments.list_answers(assignment.id).await?;
        Ok(ScoringService::score(&questions, &answers))
    }

    /// Records the employer's verdict on a finished assignment. Repeating
    /// the current verdict changes nothing and sends nothing.
    pub async fn decide_outcome(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
        decision: Decision,
    ) -> Result<TestAssignment> {
        let (assignment, test) = self.owned_assignment(actor, assignment_id).await?;
        if assignment.is_active {
            return Err(Error::Conflict(
                "Assignment is still in progress".into(),
            ));
        }

        let Some(status) = assignment.status.transition(decision) else {
            return Ok(assignment);
        };

        let notice = NewNotification::for_test(
            assignment.applicant_id,
            test.id,
            decision.notification_message(&test.title),
        );
        let updated = self
            .assignments
            .record_decision(assignment.id, status, notice)
            .await?;
        tracing::info!(
            assignment_id = %updated.id,
            status = updated.status.as_str(),
            "assignment decided"
        );
        Ok(updated)
    }

    pub async fn set_manual_points(
        &self,
        actor: &Actor,
        answer_id: Uuid,
        points: i32,
    ) -> Result<Answer> {
        actor.ensure_employer()?;
        let answer = self
            .assignments
            .find_answer(answer_id)
            .await?
            .ok_or_else(|| Error::not_found("Answer"))?;
        self.owned_assignment(actor, answer.assignment_id)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found("Answer"),
                other => other,
            })?;

        let question = self
            .catalog
            .find_question(answer.question_id)
            .await?
            .ok_or_else(|| Error::not_found("Answer"))?;
        if question.question_type != QuestionType::Open {
            return Err(Error::invalid(
                "manual_points",
                "Manual points apply to open questions only",
            ));
        }
        if points < 0 || points > question.points {
            return Err(Error::invalid(
                "manual_points",
                "Manual points must be between 0 and the question's points",
            ));
        }

        self.assignments.set_manual_points(answer.id, points).await
    }

    pub async fn delete_assignment(&self, actor: &Actor, assignment_id: Uuid) -> Result<()> {
        let (assignment, _) = self.owned_assignment(actor, assignment_id).await?;
        if !self.assignments.delete(assignment.id).await? {
            return Err(Error::not_found("Assignment"));
        }
        tracing::info!(assignment_id = %assignment.id, "assignment deleted");
        Ok(())
    }

    async fn find_assignment(&self, id: Uuid) -> Result<TestAssignment> {
        self.assignments
            .find(id)
            .await?
            .ok_or_else(|| Error::not_found("Assignment"))
    }

    async fn applicant_assignment(&self, actor: &Actor, id: Uuid) -> Result<TestAssignment> {
        actor.ensure_applicant()?;
        let assignment = self.find_assignment(id).await?;
        if !actor.is_applicant_of(&assignment) {
            return Err(Error::not_found("Assignment"));
        }
        Ok(assignment)
    }

    async fn owned_test(&self, actor: &Actor, test_id: Uuid) -> Result<Test> {
        self.catalog
            .find_test(test_id)
            .await?
            .filter(|t| actor.owns_test(t))
            .ok_or_else(|| Error::not_found("Test"))
    }

    async fn owned_assignment(&self, actor: &Actor, id: Uuid) -> Result<(TestAssignment, Test)> {
        actor.ensure_employer()?;
        let assignment = self.find_assignment(id).await?;
        let test = self
            .owned_test(actor, assignment.test_id)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found("Assignment"),
                other => other,
            })?;
        Ok((assignment, test))
    }
}

/// Checks the submitted fields against the question type.
fn selection_for(
    question: &QuestionWithOptions,
    request: &SubmitAnswerRequest,
) -> Result<AnswerSelection> {
    match question.question.question_type {
        QuestionType::Single => {
            let selected = request.selected_option_id.ok_or_else(|| {
                Error::invalid("selected_option_id", "An option must be selected")
            })?;
            if !question.has_option(selected) {
                return Err(Error::invalid(
                    "selected_option_id",
                    "Option does not belong to this question",
                ));
            }
            Ok(AnswerSelection::Single(selected))
        }
        QuestionType::Multiple => {
            if request.selected_option_ids.is_empty() {
                return Err(Error::invalid(
                    "selected_option_ids",
                    "At least one option must be selected",
                ));
            }
            if !request
                .selected_option_ids
                .iter()
                .all(|id| question.has_option(*id))
            {
                return Err(Error::invalid(
                    "selected_option_ids",
                    "Option does not belong to this question",
                ));
            }
            Ok(AnswerSelection::Multiple(
                request.selected_option_ids.iter().copied().collect(),
            ))
        }
        QuestionType::Open => match request.answer_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(AnswerSelection::Open(text.to_string())),
            _ => Err(Error::invalid("answer_text", "An answer is required")),
        },
    }
}
