#![allow(dead_code)]

pub mod memory;

use assessment_backend::config::{Config, InvitationConfig};
use assessment_backend::dto::catalog_dto::{
    CreateCategoryRequest, CreateQuestionRequest, CreateTestRequest, OptionRequest,
};
use assessment_backend::models::actor::Actor;
use assessment_backend::models::company::{Company, NewCompany};
use assessment_backend::models::question::{QuestionType, QuestionWithOptions};
use assessment_backend::models::test::Test;
use assessment_backend::models::user::{NewUser, Role, User};
use assessment_backend::repositories::DirectoryRepository;
use assessment_backend::AppState;
use chrono::Utc;
use uuid::Uuid;

pub use memory::InMemoryStore;

pub const JWT_SECRET: &str = "test_secret_key";

pub fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        db_max_connections: 1,
        jwt_secret: JWT_SECRET.into(),
        api_rps: 1000,
        invitation: InvitationConfig {
            sender: "noreply@example.test".into(),
            registration_url: "https://example.test/register/applicant".into(),
        },
    }
}

/// An approved company with an approved employer and an applicant, backed
/// by the in-memory store.
pub struct World {
    pub store: InMemoryStore,
    pub state: AppState,
    pub company: Company,
    pub admin: User,
    pub employer: Actor,
    pub applicant: Actor,
}

impl World {
    pub async fn new() -> Self {
        let store = InMemoryStore::new();
        let state = AppState::new(test_config(), store.repositories());

        let (company, _) = store
            .create_company_with_admin(
                NewCompany {
                    name: "Acme".into(),
                    contact_email: "hr@acme.test".into(),
                    phone_number: None,
                    description: "Widgets".into(),
                },
                new_user("acme_admin", Role::CompanyAdmin, None, false),
            )
            .await
            .unwrap();
        let company = store.approve_company(company.id).await.unwrap();
        let admin = store
            .list_company_users(company.id, Role::CompanyAdmin)
            .await
            .unwrap()
            .remove(0);

        let employer = store
            .create_user(new_user("erin", Role::Employer, Some(company.id), true))
            .await
            .unwrap();
        let applicant = store
            .create_user(new_user("alex", Role::Applicant, Some(company.id), true))
            .await
            .unwrap();

        Self {
            store,
            state,
            company,
            admin,
            employer: Actor::from(&employer),
            applicant: Actor::from(&applicant),
        }
    }

    pub async fn another_employer(&self, username: &str) -> Actor {
        let user = self
            .store
            .create_user(new_user(username, Role::Employer, Some(self.company.id), true))
            .await
            .unwrap();
        Actor::from(&user)
    }

    pub async fn another_applicant(&self, username: &str) -> Actor {
        let user = self
            .store
            .create_user(new_user(username, Role::Applicant, Some(self.company.id), true))
            .await
            .unwrap();
        Actor::from(&user)
    }

    pub async fn platform_admin(&self) -> Actor {
        let user = self
            .store
            .seed_user(User {
                id: Uuid::new_v4(),
                username: "root".into(),
                email: "root@example.test".into(),
                first_name: String::new(),
                last_name: String::new(),
                role: Role::CompanyAdmin,
                company_id: None,
                is_approved: true,
                is_active: true,
                is_staff: true,
                position: None,
                created_at: Utc::now(),
            })
            .await;
        Actor::from(&user)
    }

    pub async fn test(&self, title: &str) -> Test {
        let category = self
            .state
            .catalog
            .create_category(
                &self.employer,
                CreateCategoryRequest {
                    name: "Engineering".into(),
                },
            )
            .await
            .unwrap();
        self.state
            .catalog
            .create_test(
                &self.employer,
                CreateTestRequest {
                    title: title.into(),
                    category_id: category.id,
                    position: Some("Backend".into()),
                },
            )
            .await
            .unwrap()
    }

    pub async fn question(
        &self,
        test: &Test,
        question_type: QuestionType,
        points: i32,
        correct: &[bool],
    ) -> QuestionWithOptions {
        self.state
            .catalog
            .create_question(
                &self.employer,
                test.id,
                CreateQuestionRequest {
                    text: format!("{} question", question_type),
                    category_id: None,
                    question_type,
                    points,
                    time_per_question: 60,
                    options: correct
                        .iter()
                        .enumerate()
                        .map(|(i, is_correct)| OptionRequest {
                            text: format!("option {}", i),
                            is_correct: *is_correct,
                        })
                        .collect(),
                },
            )
            .await
            .unwrap()
    }
}

pub fn new_user(username: &str, role: Role, company_id: Option<Uuid>, is_approved: bool) -> NewUser {
    NewUser {
        username: username.into(),
        email: format!("{}@example.test", username),
        first_name: username.into(),
        last_name: "Tester".into(),
        role,
        company_id,
        is_approved,
        position: None,
    }
}
