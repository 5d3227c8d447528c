use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::catalog_dto::{
    CreateCategoryRequest, CreateQuestionRequest, CreateTestRequest, TestDetailResponse,
    TestListQuery, UpdateQuestionRequest, UpdateTestRequest,
};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::category::Category;
use crate::models::question::{
    NewOption, NewQuestion, Question, QuestionChanges, QuestionType, QuestionWithOptions,
};
use crate::models::test::{NewTest, Test, TestChanges, TestFilter};
use crate::repositories::CatalogRepository;

/// Questions of a test with their options attached, both in creation order.
pub async fn load_questions(
    catalog: &dyn CatalogRepository,
    test_id: Uuid,
) -> Result<Vec<QuestionWithOptions>> {
    let questions = catalog.list_questions(test_id).await?;
    let mut options_by_question: HashMap<Uuid, Vec<_>> = HashMap::new();
    for option in catalog.list_options_for_test(test_id).await? {
        options_by_question
            .entry(option.question_id)
            .or_default()
            .push(option);
    }
    Ok(questions
        .into_iter()
        .map(|question| QuestionWithOptions {
            options: options_by_question.remove(&question.id).unwrap_or_default(),
            question,
        })
        .collect())
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn list_categories(&self, actor: &Actor) -> Result<Vec<Category>> {
        actor.ensure_active()?;
        self.catalog.list_categories().await
    }

    pub async fn create_category(
        &self,
        actor: &Actor,
        payload: CreateCategoryRequest,
    ) -> Result<Category> {
        if !actor.is_staff {
            actor.ensure_employer()?;
        }
        payload.validate()?;
        let category = self.catalog.create_category(payload.name.trim().to_string()).await?;
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    pub async fn create_test(&self, actor: &Actor, payload: CreateTestRequest) -> Result<Test> {
        actor.ensure_employer()?;
        payload.validate()?;
        self.require_category(payload.category_id).await?;

        let test = self
            .catalog
            .create_test(NewTest {
                title: payload.title.trim().to_string(),
                category_id: payload.category_id,
                created_by: actor.user_id,
                position: payload.position,
            })
            .await?;
        tracing::info!(test_id = %test.id, employer_id = %actor.user_id, "test created");
        Ok(test)
    }

    pub async fn list_tests(&self, actor: &Actor, query: TestListQuery) -> Result<Vec<Test>> {
        actor.ensure_employer()?;
        self.catalog
            .list_tests(TestFilter {
                created_by: Some(actor.user_id),
                search: query.q,
                category_id: query.category_id,
                position: query.position,
            })
            .await
    }

    pub async fn get_test(&self, actor: &Actor, test_id: Uuid) -> Result<TestDetailResponse> {
        let test = self.owned_test(actor, test_id).await?;
        let questions = load_questions(self.catalog.as_ref(), test.id).await?;
        Ok(TestDetailResponse { test, questions })
    }

    pub async fn update_test(
        &self,
        actor: &Actor,
        test_id: Uuid,
        payload: UpdateTestRequest,
    ) -> Result<Test> {
        let test = self.owned_test(actor, test_id).await?;
        payload.validate()?;
        if let Some(category_id) = payload.category_id {
            self.require_category(category_id).await?;
        }
        self.catalog
            .update_test(
                test.id,
                TestChanges {
                    title: payload.title.map(|t| t.trim().to_string()),
                    category_id: payload.category_id,
                    position: payload.position,
                },
            )
            .await
    }

    pub async fn delete_test(&self, actor: &Actor, test_id: Uuid) -> Result<()> {
        let test = self.owned_test(actor, test_id).await?;
        if !self.catalog.delete_test(test.id).await? {
            return Err(Error::not_found("Test"));
        }
        tracing::info!(test_id = %test.id, "test deleted with its questions and assignments");
        Ok(())
    }

    pub async fn create_question(
        &self,
        actor: &Actor,
        test_id: Uuid,
        payload: CreateQuestionRequest,
    ) -> Result<QuestionWithOptions> {
        let test = self.owned_test(actor, test_id).await?;
        payload.validate()?;

        match payload.question_type {
            QuestionType::Open if !payload.options.is_empty() => {
                return Err(Error::invalid(
                    "options",
                    "Open questions cannot have options",
                ));
            }
            QuestionType::Single | QuestionType::Multiple if payload.options.len() < 2 => {
                return Err(Error::invalid(
                    "options",
                    "Choice questions need at least two options",
                ));
            }
            _ => {}
        }

        let category_id = payload.category_id.unwrap_or(test.category_id);
        self.require_category(category_id).await?;

        let correct = payload.options.iter().filter(|o| o.is_correct).count();
        if payload.question_type == QuestionType::Single && correct != 1 {
            tracing::warn!(
                test_id = %test.id,
                correct_options = correct,
                "single-choice question does not have exactly one correct option and can never score"
            );
        }

        let created = self
            .catalog
            .create_question(NewQuestion {
                test_id: test.id,
                category_id,
                text: payload.text.trim().to_string(),
                question_type: payload.question_type,
                points: payload.points,
                time_per_question: payload.time_per_question,
                options: payload
                    .options
                    .into_iter()
                    .map(|o| NewOption {
                        text: o.text.trim().to_string(),
                        is_correct: o.is_correct,
                    })
                    .collect(),
            })
            .await?;
        tracing::info!(question_id = %created.question.id, test_id = %test.id, "question created");
        Ok(created)
    }

    pub async fn update_question(
        &self,
        actor: &Actor,
        question_id: Uuid,
        payload: UpdateQuestionRequest,
    ) -> Result<Question> {
        let question = self.owned_question(actor, question_id).await?;
        payload.validate()?;

        let rescoring = payload.points.is_some_and(|p| p != question.points)
            || payload
                .question_type
                .is_some_and(|t| t != question.question_type);
        if rescoring && self.catalog.has_submitted_answers(question.id).await? {
            return Err(Error::Conflict(
                "Points and type cannot change once the question has been answered".into(),
            ));
        }

        if let Some(new_type) = payload.question_type {
            let option_count = self.catalog.list_options(question.id).await?.len();
            if !new_type.has_options() && option_count > 0 {
                return Err(Error::invalid(
                    "question_type",
                    "Remove the options before turning this into an open question",
                ));
            }
            if new_type.has_options() && option_count < 2 {
                return Err(Error::invalid(
                    "question_type",
                    "Choice questions need at least two options",
                ));
            }
        }
        if let Some(category_id) = payload.category_id {
            self.require_category(category_id).await?;
        }

        self.catalog
            .update_question(
                question.id,
                QuestionChanges {
                    text: payload.text.map(|t| t.trim().to_string()),
                    category_id: payload.category_id,
                    question_type: payload.question_type,
                    points: payload.points,
                    time_per_question: payload.time_per_question,
                },
            )
            .await
    }

    pub async fn delete_question(&self, actor: &Actor, question_id: Uuid) -> Result<()> {
        let question = self.owned_question(actor, question_id).await?;
        if !self.catalog.delete_question(question.id).await? {
            return Err(Error::not_found("Question"));
        }
        Ok(())
    }

    /// The test, provided the caller authored it. Foreign tests read as
    /// missing.
    async fn owned_test(&self, actor: &Actor, test_id: Uuid) -> Result<Test> {
        actor.ensure_employer()?;
        self.catalog
            .find_test(test_id)
            .await?
            .filter(|t| actor.owns_test(t))
            .ok_or_else(|| Error::not_found("Test"))
    }

    async fn owned_question(&self, actor: &Actor, question_id: Uuid) -> Result<Question> {
        actor.ensure_employer()?;
        let question = self
            .catalog
            .find_question(question_id)
            .await?
            .ok_or_else(|| Error::not_found("Question"))?;
        self.owned_test(actor, question.test_id)
            .await
            .map_err(|e| match e {
                Error::NotFound(_) => Error::not_found("Question"),
                other => other,
            })?;
        Ok(question)
    }

    async fn require_category(&self, category_id: Uuid) -> Result<Category> {
        self.catalog
            .find_category(category_id)
            .await?
            .ok_or_else(|| Error::not_found("Category"))
    }
}
