use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::category::Category;
use crate::models::question::{
    NewQuestion, Question, QuestionChanges, QuestionOption, QuestionWithOptions,
};
use crate::models::test::{NewTest, Test, TestChanges, TestFilter};

/// Tests, questions, options and categories. Listing methods return rows in
/// creation order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>>;
    async fn create_category(&self, name: String) -> Result<Category>;

    async fn find_test(&self, id: Uuid) -> Result<Option<Test>>;
    async fn list_tests(&self, filter: TestFilter) -> Result<Vec<Test>>;
    async fn create_test(&self, test: NewTest) -> Result<Test>;
    async fn update_test(&self, id: Uuid, changes: TestChanges) -> Result<Test>;
    /// Removes the test together with its questions, options, assignments,
    /// answers and test-linked notifications.
    async fn delete_test(&self, id: Uuid) -> Result<bool>;

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>>;
    async fn list_questions(&self, test_id: Uuid) -> Result<Vec<Question>>;
    async fn create_question(&self, question: NewQuestion) -> Result<QuestionWithOptions>;
    async fn update_question(&self, id: Uuid, changes: QuestionChanges) -> Result<Question>;
    async fn delete_question(&self, id: Uuid) -> Result<bool>;
    /// Whether any assignment has a submitted answer for the question.
    async fn has_submitted_answers(&self, question_id: Uuid) -> Result<bool>;

    async fn list_options(&self, question_id: Uuid) -> Result<Vec<QuestionOption>>;
    async fn list_options_for_test(&self, test_id: Uuid) -> Result<Vec<QuestionOption>>;
}

#[derive(Clone)]
pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(
            r#"SELECT id, name, created_at FROM categories ORDER BY name ASC, id ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            r#"SELECT id, name, created_at FROM categories WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_category(&self, name: String) -> Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (id, name, created_at) VALUES ($1, $2, $3)
               RETURNING id, name, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_test(&self, id: Uuid) -> Result<Option<Test>> {
        let row = sqlx::query_as::<_, Test>(
            r#"SELECT id, title, category_id, created_by, position, created_at
               FROM tests WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_tests(&self, filter: TestFilter) -> Result<Vec<Test>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, title, category_id, created_by, position, created_at FROM tests WHERE TRUE",
        );
        if let Some(owner) = filter.created_by {
            qb.push(" AND created_by = ").push_bind(owner);
        }
        if let Some(search) = filter.search {
            qb.push(" AND strpos(lower(title), lower(")
                .push_bind(search)
                .push(")) > 0");
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(position) = filter.position {
            qb.push(" AND position = ").push_bind(position);
        }
        qb.push(" ORDER BY created_at ASC, id ASC");

        let rows = qb.build_query_as::<Test>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn create_test(&self, test: NewTest) -> Result<Test> {
        let row = sqlx::query_as::<_, Test>(
            r#"
            INSERT INTO tests (id, title, category_id, created_by, position, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, category_id, created_by, position, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(test.title)
        .bind(test.category_id)
        .bind(test.created_by)
        .bind(test.position)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_test(&self, id: Uuid, changes: TestChanges) -> Result<Test> {
        let clear_position = matches!(changes.position, Some(None));
        let position = changes.position.flatten();
        let row = sqlx::query_as::<_, Test>(
            r#"
            UPDATE tests
            SET
                title = COALESCE($1, title),
                category_id = COALESCE($2, category_id),
                position = CASE WHEN $3 THEN NULL ELSE COALESCE($4, position) END
            WHERE id = $5
            RETURNING id, title, category_id, created_by, position, created_at
            "#,
        )
        .bind(changes.title)
        .bind(changes.category_id)
        .bind(clear_position)
        .bind(position)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_test(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM tests WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>> {
        let row = sqlx::query_as::<_, Question>(
            r#"SELECT id, test_id, category_id, text, question_type, points, time_per_question, created_at
               FROM questions WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, Question>(
            r#"SELECT id, test_id, category_id, text, question_type, points, time_per_question, created_at
               FROM questions WHERE test_id = $1
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<QuestionWithOptions> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let created = sqlx::query_as::<_, Question>(
            r#"
            INSERT INTO questions (id, test_id, category_id, text, question_type, points, time_per_question, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, test_id, category_id, text, question_type, points, time_per_question, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(question.test_id)
        .bind(question.category_id)
        .bind(question.text)
        .bind(question.question_type.as_str())
        .bind(question.points)
        .bind(question.time_per_question)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let mut options = Vec::with_capacity(question.options.len());
        for (idx, option) in question.options.into_iter().enumerate() {
            // Offset timestamps keep authoring order stable under ORDER BY created_at.
            let created_at = now + chrono::Duration::microseconds(idx as i64);
            let row = sqlx::query_as::<_, QuestionOption>(
                r#"
                INSERT INTO options (id, question_id, text, is_correct, created_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, question_id, text, is_correct, created_at
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(created.id)
            .bind(option.text)
            .bind(option.is_correct)
            .bind(created_at)
            .fetch_one(&mut *tx)
            .await?;
            options.push(row);
        }

        tx.commit().await?;
        Ok(QuestionWithOptions {
            question: created,
            options,
        })
    }

    async fn update_question(&self, id: Uuid, changes: QuestionChanges) -> Result<Question> {
        let row = sqlx::query_as::<_, Question>(
            r#"
            UPDATE questions
            SET
                text = COALESCE($1, text),
                category_id = COALESCE($2, category_id),
                question_type = COALESCE($3, question_type),
                points = COALESCE($4, points),
                time_per_question = COALESCE($5, time_per_question)
            WHERE id = $6
            RETURNING id, test_id, category_id, text, question_type, points, time_per_question, created_at
            "#,
        )
        .bind(changes.text)
        .bind(changes.category_id)
        .bind(changes.question_type.map(|t| t.as_str()))
        .bind(changes.points)
        .bind(changes.time_per_question)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| Error::not_found("Question"))
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM questions WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn has_submitted_answers(&self, question_id: Uuid) -> Result<bool> {
        let answered: bool = sqlx::query_scalar(
            r#"SELECT EXISTS (SELECT 1 FROM answers WHERE question_id = $1 AND is_submitted)"#,
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(answered)
    }

    async fn list_options(&self, question_id: Uuid) -> Result<Vec<QuestionOption>> {
        let rows = sqlx::query_as::<_, QuestionOption>(
            r#"SELECT id, question_id, text, is_correct, created_at
               FROM options WHERE question_id = $1
               ORDER BY created_at ASC, id ASC"#,
        )
        .bind(question_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_options_for_test(&self, test_id: Uuid) -> Result<Vec<QuestionOption>> {
        let rows = sqlx::query_as::<_, QuestionOption>(
            r#"SELECT o.id, o.question_id, o.text, o.is_correct, o.created_at
               FROM options o
               JOIN questions q ON q.id = o.question_id
               WHERE q.test_id = $1
               ORDER BY o.created_at ASC, o.id ASC"#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
