//! Process-local store implementing every repository trait. Mirrors the
//! Postgres schema's uniqueness and cascade rules.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use assessment_backend::error::{Error, Result};
use assessment_backend::models::answer::{Answer, AnswerSubmission};
use assessment_backend::models::assignment::{AssignmentStatus, TestAssignment};
use assessment_backend::models::category::Category;
use assessment_backend::models::company::{Company, Invitation, NewCompany};
use assessment_backend::models::notification::{NewNotification, Notification};
use assessment_backend::models::question::{
    NewQuestion, Question, QuestionChanges, QuestionOption, QuestionWithOptions,
};
use assessment_backend::models::test::{NewTest, Test, TestChanges, TestFilter};
use assessment_backend::models::user::{NewUser, Role, User};

use assessment_backend::repositories::{
    AssignmentRepository, CatalogRepository, DirectoryRepository, NotificationRepository,
    Repositories,
};

#[derive(Default)]
struct State {
    clock: i64,
    categories: Vec<Category>,
    tests: Vec<Test>,
    questions: Vec<Question>,
    options: Vec<QuestionOption>,
    assignments: Vec<TestAssignment>,
    answers: Vec<Answer>,
    notifications: Vec<Notification>,
    companies: Vec<Company>,
    users: Vec<User>,
    invitations: Vec<Invitation>,
}

impl State {
    /// Strictly increasing timestamps so creation order is observable even
    /// when rows are created within the same instant.
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000) + Duration::milliseconds(self.clock)
    }

    fn remove_assignments_where(&mut self, pred: impl Fn(&TestAssignment) -> bool) {
        let removed: Vec<Uuid> = self
            .assignments
            .iter()
            .filter(|a| pred(a))
            .map(|a| a.id)
            .collect();
        self.assignments.retain(|a| !removed.contains(&a.id));
        self.answers.retain(|a| !removed.contains(&a.assignment_id));
    }

    fn remove_questions_where(&mut self, pred: impl Fn(&Question) -> bool) {
        let removed: Vec<Uuid> = self
            .questions
            .iter()
            .filter(|q| pred(q))
            .map(|q| q.id)
            .collect();
        self.questions.retain(|q| !removed.contains(&q.id));
        self.options.retain(|o| !removed.contains(&o.question_id));
        self.answers.retain(|a| !removed.contains(&a.question_id));
    }

    fn remove_test(&mut self, id: Uuid) -> bool {
        let before = self.tests.len();
        self.tests.retain(|t| t.id != id);
        if self.tests.len() == before {
            return false;
        }
        self.remove_questions_where(|q| q.test_id == id);
        self.remove_assignments_where(|a| a.test_id == id);
        self.notifications.retain(|n| n.test_id != Some(id));
        true
    }

    fn remove_user(&mut self, id: Uuid) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        if self.users.len() == before {
            return false;
        }
        let owned: Vec<Uuid> = self
            .tests
            .iter()
            .filter(|t| t.created_by == id)
            .map(|t| t.id)
            .collect();
        for test_id in owned {
            self.remove_test(test_id);
        }
        self.remove_assignments_where(|a| a.applicant_id == id);
        self.notifications.retain(|n| n.user_id != id);
        self.invitations.retain(|i| i.invited_by != id);
        true
    }

    fn upsert_notification(&mut self, notice: NewNotification) {
        if let Some(test_id) = notice.test_id {
            if let Some(existing) = self
                .notifications
                .iter_mut()
                .find(|n| n.user_id == notice.user_id && n.test_id == Some(test_id))
            {
                existing.message = notice.message;
                existing.is_read = false;
                return;
            }
        }
        let created_at = self.tick();
        self.notifications.push(Notification {
            id: Uuid::new_v4(),
            user_id: notice.user_id,
            message: notice.message,
            is_read: false,
            test_id: notice.test_id,
            created_at,
        });
    }

    fn build_user(&mut self, user: NewUser) -> Result<User> {
        if self.users.iter().any(|u| u.username == user.username) {
            return Err(Error::Conflict("Resource already exists".into()));
        }
        let created_at = self.tick();
        Ok(User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            company_id: user.company_id,
            is_approved: user.is_approved,
            is_active: true,
            is_staff: false,
            position: user.position,
            created_at,
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every repository seam backed by this one store.
    pub fn repositories(&self) -> Repositories {
        let store = Arc::new(self.clone());
        Repositories {
            catalog: store.clone(),
            assignments: store.clone(),
            directory: store.clone(),
            notifications: store,
        }
    }

    /// Inserts a fully-formed user, bypassing registration rules. Platform
    /// administrators are only ever provisioned this way.
    pub async fn seed_user(&self, user: User) -> User {
        let mut state = self.state.write().await;
        state.users.push(user.clone());
        user
    }

    pub async fn notifications_for(&self, user_id: Uuid) -> Vec<Notification> {
        let state = self.state.read().await;
        state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let state = self.state.read().await;
        let mut rows = state.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn create_category(&self, name: String) -> Result<Category> {
        let mut state = self.state.write().await;
        let category = Category {
            id: Uuid::new_v4(),
            name,
            created_at: state.tick(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn find_test(&self, id: Uuid) -> Result<Option<Test>> {
        let state = self.state.read().await;
        Ok(state.tests.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tests(&self, filter: TestFilter) -> Result<Vec<Test>> {
        let state = self.state.read().await;
        Ok(state
            .tests
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn create_test(&self, test: NewTest) -> Result<Test> {
        let mut state = self.state.write().await;
        if !state.categories.iter().any(|c| c.id == test.category_id) {
            return Err(Error::not_found("Category"));
        }
        let created = Test {
            id: Uuid::new_v4(),
            title: test.title,
            category_id: test.category_id,
            created_by: test.created_by,
            position: test.position,
            created_at: state.tick(),
        };
        state.tests.push(created.clone());
        Ok(created)
    }

    async fn update_test(&self, id: Uuid, changes: TestChanges) -> Result<Test> {
        let mut state = self.state.write().await;
        let test = state
            .tests
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::not_found("Test"))?;
        if let Some(title) = changes.title {
            test.title = title;
        }
        if let Some(category_id) = changes.category_id {
            test.category_id = category_id;
        }
        if let Some(position) = changes.position {
            test.position = position;
        }
        Ok(test.clone())
    }

    async fn delete_test(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.remove_test(id))
    }

    async fn find_question(&self, id: Uuid) -> Result<Option<Question>> {
        let state = self.state.read().await;
        Ok(state.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn list_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let state = self.state.read().await;
        Ok(state
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .cloned()
            .collect())
    }

    async fn create_question(&self, question: NewQuestion) -> Result<QuestionWithOptions> {
        let mut state = self.state.write().await;
        if !state.tests.iter().any(|t| t.id == question.test_id) {
            return Err(Error::not_found("Test"));
        }
        let created = Question {
            id: Uuid::new_v4(),
            test_id: question.test_id,
            category_id: question.category_id,
            text: question.text,
            question_type: question.question_type,
            points: question.points,
            time_per_question: question.time_per_question,
            created_at: state.tick(),
        };
        let mut options = Vec::with_capacity(question.options.len());
        for option in question.options {
            let row = QuestionOption {
                id: Uuid::new_v4(),
                question_id: created.id,
                text: option.text,
                is_correct: option.is_correct,
                created_at: state.tick(),
            };
            state.options.push(row.clone());
            options.push(row);
        }
        state.questions.push(created.clone());
        Ok(QuestionWithOptions {
            question: created,
            options,
        })
    }

    async fn update_question(&self, id: Uuid, changes: QuestionChanges) -> Result<Question> {
        let mut state = self.state.write().await;
        let question = state
            .questions
            .iter_mut()
            .find(|q| q.id == id)
            .ok_or_else(|| Error::not_found("Question"))?;
        if let Some(text) = changes.text {
            question.text = text;
        }
        if let Some(category_id) = changes.category_id {
            question.category_id = category_id;
        }
        if let Some(question_type) = changes.question_type {
            question.question_type = question_type;
        }
        if let Some(points) = changes.points {
            question.points = points;
        }
        if let Some(time_per_question) = changes.time_per_question {
            question.time_per_question = time_per_question;
        }
        Ok(question.clone())
    }

    async fn delete_question(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.questions.iter().any(|q| q.id == id);
        state.remove_questions_where(|q| q.id == id);
        Ok(existed)
    }

    async fn has_submitted_answers(&self, question_id: Uuid) -> Result<bool> {
        let state = self.state.read().await;
        Ok(state
            .answers
            .iter()
            .any(|a| a.question_id == question_id && a.is_submitted))
    }

    async fn list_options(&self, question_id: Uuid) -> Result<Vec<QuestionOption>> {
        let state = self.state.read().await;
        Ok(state
            .options
            .iter()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn list_options_for_test(&self, test_id: Uuid) -> Result<Vec<QuestionOption>> {
        let state = self.state.read().await;
        let question_ids: Vec<Uuid> = state
            .questions
            .iter()
            .filter(|q| q.test_id == test_id)
            .map(|q| q.id)
            .collect();
        Ok(state
            .options
            .iter()
            .filter(|o| question_ids.contains(&o.question_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryStore {
    async fn create(&self, test_id: Uuid, applicant_id: Uuid) -> Result<TestAssignment> {
        let mut state = self.state.write().await;
        if !state.tests.iter().any(|t| t.id == test_id) {
            return Err(Error::not_found("Test"));
        }
        let assignment = TestAssignment {
            id: Uuid::new_v4(),
            test_id,
            applicant_id,
            is_active: true,
            status: AssignmentStatus::Pending,
            created_at: state.tick(),
        };
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn find(&self, id: Uuid) -> Result<Option<TestAssignment>> {
        let state = self.state.read().await;
        Ok(state.assignments.iter().find(|a| a.id == id).cloned())
    }

    async fn list_for_tests(&self, test_ids: Vec<Uuid>) -> Result<Vec<TestAssignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| test_ids.contains(&a.test_id))
            .cloned()
            .collect())
    }

    async fn list_for_applicant(&self, applicant_id: Uuid) -> Result<Vec<TestAssignment>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter(|a| a.applicant_id == applicant_id)
            .cloned()
            .collect())
    }

    async fn deactivate(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.assignments.iter_mut().find(|a| a.id == id) {
            Some(assignment) if assignment.is_active => {
                assignment.is_active = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn record_decision(
        &self,
        id: Uuid,
        status: AssignmentStatus,
        notice: NewNotification,
    ) -> Result<TestAssignment> {
        let mut state = self.state.write().await;
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::not_found("Assignment"))?;
        assignment.status = status;
        let updated = assignment.clone();
        state.upsert_notification(notice);
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let existed = state.assignments.iter().any(|a| a.id == id);
        state.remove_assignments_where(|a| a.id == id);
        Ok(existed)
    }

    async fn list_answers(&self, assignment_id: Uuid) -> Result<Vec<Answer>> {
        let state = self.state.read().await;
        Ok(state
            .answers
            .iter()
            .filter(|a| a.assignment_id == assignment_id)
            .cloned()
            .collect())
    }

    async fn save_answer(
        &self,
        assignment_id: Uuid,
        question_id: Uuid,
        submission: AnswerSubmission,
    ) -> Result<Answer> {
        let mut state = self.state.write().await;
        if !state.assignments.iter().any(|a| a.id == assignment_id) {
            return Err(Error::not_found("Assignment"));
        }
        let (answer_text, selected_option_id, selected_option_ids) = submission.columns();
        let now = state.tick();
        if let Some(existing) = state
            .answers
            .iter_mut()
            .find(|a| a.assignment_id == assignment_id && a.question_id == question_id)
        {
            existing.answer_text = answer_text;
            existing.selected_option_id = selected_option_id;
            existing.selected_option_ids = selected_option_ids;
            existing.time_taken = submission.time_taken;
            existing.is_submitted = true;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let answer = Answer {
            id: Uuid::new_v4(),
            assignment_id,
            question_id,
            answer_text,
            selected_option_id,
            selected_option_ids,
            time_taken: submission.time_taken,
            is_submitted: true,
            manual_points: 0,
            created_at: now,
            updated_at: now,
        };
        state.answers.push(answer.clone());
        Ok(answer)
    }

    async fn find_answer(&self, id: Uuid) -> Result<Option<Answer>> {
        let state = self.state.read().await;
        Ok(state.answers.iter().find(|a| a.id == id).cloned())
    }

    async fn set_manual_points(&self, answer_id: Uuid, points: i32) -> Result<Answer> {
        let mut state = self.state.write().await;
        let now = state.tick();
        let answer = state
            .answers
            .iter_mut()
            .find(|a| a.id == answer_id)
            .ok_or_else(|| Error::not_found("Answer"))?;
        answer.manual_points = points;
        answer.updated_at = now;
        Ok(answer.clone())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryStore {
    async fn create(&self, notification: NewNotification) -> Result<Notification> {
        let mut state = self.state.write().await;
        let created = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            message: notification.message,
            is_read: false,
            test_id: notification.test_id,
            created_at: state.tick(),
        };
        state.notifications.push(created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        let state = self.state.read().await;
        let mut rows: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>> {
        let mut state = self.state.write().await;
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: String) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;
        let created = state.build_user(user)?;
        state.users.push(created.clone());
        Ok(created)
    }

    async fn list_company_users(&self, company_id: Uuid, role: Role) -> Result<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .filter(|u| u.company_id == Some(company_id) && u.role == role)
            .cloned()
            .collect())
    }

    async fn set_user_flags(
        &self,
        id: Uuid,
        is_approved: Option<bool>,
        is_active: Option<bool>,
        notice: NewNotification,
    ) -> Result<User> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::not_found("User"))?;
        if let Some(approved) = is_approved {
            user.is_approved = approved;
        }
        if let Some(active) = is_active {
            user.is_active = active;
        }
        let updated = user.clone();
        state.upsert_notification(notice);
        Ok(updated)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.remove_user(id))
    }

    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        admin: NewUser,
    ) -> Result<(Company, User)> {
        let mut state = self.state.write().await;
        if state
            .companies
            .iter()
            .any(|c| c.name == company.name || c.contact_email == company.contact_email)
        {
            return Err(Error::Conflict("Resource already exists".into()));
        }
        let created = Company {
            id: Uuid::new_v4(),
            name: company.name,
            contact_email: company.contact_email,
            phone_number: company.phone_number,
            description: company.description,
            is_approved: false,
            created_at: state.tick(),
        };
        let admin = state.build_user(NewUser {
            company_id: Some(created.id),
            ..admin
        })?;
        state.companies.push(created.clone());
        state.users.push(admin.clone());
        Ok((created, admin))
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>> {
        let state = self.state.read().await;
        Ok(state.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn list_pending_companies(&self) -> Result<Vec<Company>> {
        let state = self.state.read().await;
        Ok(state
            .companies
            .iter()
            .filter(|c| !c.is_approved)
            .cloned()
            .collect())
    }

    async fn approve_company(&self, id: Uuid) -> Result<Company> {
        let mut state = self.state.write().await;
        let company = state
            .companies
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::not_found("Company"))?;
        company.is_approved = true;
        let company = company.clone();
        for user in state
            .users
            .iter_mut()
            .filter(|u| u.company_id == Some(id) && u.role == Role::CompanyAdmin)
        {
            user.is_approved = true;
        }
        Ok(company)
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let before = state.companies.len();
        state.companies.retain(|c| c.id != id);
        if state.companies.len() == before {
            return Ok(false);
        }
        let members: Vec<Uuid> = state
            .users
            .iter()
            .filter(|u| u.company_id == Some(id))
            .map(|u| u.id)
            .collect();
        for user_id in members {
            state.remove_user(user_id);
        }
        state.invitations.retain(|i| i.company_id != Some(id));
        Ok(true)
    }

    async fn find_invitation_by_email(&self, email: String) -> Result<Option<Invitation>> {
        let state = self.state.read().await;
        Ok(state.invitations.iter().find(|i| i.email == email).cloned())
    }

    async fn create_invitation(
        &self,
        company_id: Option<Uuid>,
        email: String,
        invited_by: Uuid,
    ) -> Result<Invitation> {
        let mut state = self.state.write().await;
        if state.invitations.iter().any(|i| i.email == email) {
            return Err(Error::Conflict("Resource already exists".into()));
        }
        let invitation = Invitation {
            id: Uuid::new_v4(),
            company_id,
            email,
            invited_by,
            created_at: state.tick(),
        };
        state.invitations.push(invitation.clone());
        Ok(invitation)
    }
}
