use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::answer::{Answer, AnswerSubmission};
use crate::models::assignment::{AssignmentStatus, TestAssignment};
use crate::models::notification::NewNotification;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    async fn create(&self, test_id: Uuid, applicant_id: Uuid) -> Result<TestAssignment>;
    async fn find(&self, id: Uuid) -> Result<Option<TestAssignment>>;
    async fn list_for_tests(&self, test_ids: Vec<Uuid>) -> Result<Vec<TestAssignment>>;
    async fn list_for_applicant(&self, applicant_id: Uuid) -> Result<Vec<TestAssignment>>;
    /// Flips `is_active` to false. Returns true only for the call that
    /// performed the transition.
    async fn deactivate(&self, id: Uuid) -> Result<bool>;
    /// Stores the new status and upserts the (applicant, test) notification
    /// in one unit of work.
    async fn record_decision(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        notice: NewNotification,
    ) -> Result<TestAssignment>;
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn list_answers(&self, assignment_id: Uuid) -> Result<Vec<Answer>>;
    /// Insert-or-overwrite of the single answer row for (assignment, question),
    /// marking it submitted. Manual points survive re-submission.
    async fn save_answer(
        &self,
        assignment_id: Uuid,
        question_id: Uuid,
        submission: AnswerSubmission,
    ) -> Result<Answer>;
    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>>;
    async fn set_manual_points(&self, answer_id: Uuid, points: i32) -> Result<Answer>;
}

const ASSIGNMENT_COLUMNS: &str = "id, test_id, applicant_id, is_active, status, created_at";
const ANSWER_COLUMNS: &str = "id, assignment_id, question_id, answer_text, selected_option_id, \
     selected_option_ids, time_taken, is_submitted, manual_points, created_at, updated_at";

#[derive(Clone)]
pub struct PgAssignmentRepository {
    pool: PgPool,
}

impl PgAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssignmentRepository for PgAssignmentRepository {
    async fn create(&self, test_id: Uuid, applicant_id: Uuid) -> Result<TestAssignment> {
        let row = sqlx::query_as::<_, TestAssignment>(&format!(
            r#"INSERT INTO test_assignments (id, test_id, applicant_id, is_active, status, created_at)
               VALUES ($1, $2, $3, TRUE, 'pending', $4)
               RETURNING {}"#,
            ASSIGNMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(test_id)
        .bind(applicant_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find(&self, id: Uuid) -> Result<Option<TestAssignment>> {
        let row = sqlx::query_as::<_, TestAssignment>(&format!(
            "SELECT {} FROM test_assignments WHERE id = $1",
            ASSIGNMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_for_tests(&self, test_ids: Vec<Uuid>) -> Result<Vec<TestAssignment>> {
        let rows = sqlx::query_as::<_, TestAssignment>(&format!(
            "SELECT {} FROM test_assignments WHERE test_id = ANY($1) ORDER BY created_at ASC, id ASC",
            ASSIGNMENT_COLUMNS
        ))
        .bind(test_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_for_applicant(&self, applicant_id: Uuid) -> Result<Vec<TestAssignment>> {
        let rows = sqlx::query_as::<_, TestAssignment>(&format!(
            "SELECT {} FROM test_assignments WHERE applicant_id = $1 ORDER BY created_at ASC, id ASC",
            ASSIGNMENT_COLUMNS
        ))
        .bind(applicant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"UPDATE test_assignments SET is_active = FALSE WHERE id = $1 AND is_active"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn record_decision(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        notice: NewNotification,
    ) -> Result<TestAssignment> {
        let mut tx = self.pool.begin().await?;

        let assignment = sqlx::query_as::<_, TestAssignment>(&format!(
            "UPDATE test_assignments SET status = $1 WHERE id = $2 RETURNING {}",
            ASSIGNMENT_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("Assignment"))?;

        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, message, is_read, test_id, created_at)
            VALUES ($1, $2, $3, FALSE, $4, $5)
            ON CONFLICT (user_id, test_id) WHERE test_id IS NOT NULL
            DO UPDATE SET message = EXCLUDED.message, is_read = FALSE
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(notice.user_id)
        .bind(notice.message)
        .bind(notice.test_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM test_assignments WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_answers(&self, assignment_id: Uuid) -> Result<Vec<Answer>> {
        let rows = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {} FROM answers WHERE assignment_id = $1 ORDER BY created_at ASC, id ASC",
            ANSWER_COLUMNS
        ))
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn save_answer(
        &self,
        assignment_id: Uuid,
        question_id: Uuid,
        submission: AnswerSubmission,
    ) -> Result<Answer> {
        let (answer_text, selected_option_id, selected_option_ids) = submission.columns();
        let now = Utc::now();
        let row = sqlx::query_as::<_, Answer>(&format!(
            r#"
            INSERT INTO answers (
                id, assignment_id, question_id, answer_text, selected_option_id,
                selected_option_ids, time_taken, is_submitted, manual_points, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, 0, $8, $8)
            ON CONFLICT (assignment_id, question_id) DO UPDATE SET
                answer_text = EXCLUDED.answer_text,
                selected_option_id = EXCLUDED.selected_option_id,
                selected_option_ids = EXCLUDED.selected_option_ids,
                time_taken = EXCLUDED.time_taken,
                is_submitted = TRUE,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            ANSWER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(assignment_id)
        .bind(question_id)
        .bind(answer_text)
        .bind(selected_option_id)
        .bind(selected_option_ids)
        .bind(submission.time_taken)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>> {
        let row = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {} FROM answers WHERE id = $1",
            ANSWER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn set_manual_points(&self, answer_id: Uuid, points: i32) -> Result<Answer> {
        let row = sqlx::query_as::<_, Answer>(&format!(
            "UPDATE answers SET manual_points = $1, updated_at = $2 WHERE id = $3 RETURNING {}",
            ANSWER_COLUMNS
        ))
        .bind(points)
        .bind(Utc::now())
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| Error::not_found("Answer"))
    }
}
