use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::dto::report_dto::{
    ApplicantDashboard, AssignmentReport, AssignmentSummary, EmployerDashboard, ReportsResponse,
};
use crate::error::Result;
use crate::models::actor::Actor;
use crate::models::assignment::{AssignmentStatus, TestAssignment};
use crate::models::question::QuestionWithOptions;
use crate::models::test::{Test, TestFilter};
use crate::repositories::{
    AssignmentRepository, CatalogRepository, DirectoryRepository, NotificationRepository,
};
use crate::services::catalog_service::load_questions;
use crate::services::scoring_service::{ScoreReport, ScoringService};

/// Read-only aggregates over assignments for dashboards and employer
/// reports. Scores come from the same `ScoringService` as the result
/// endpoint.
#[derive(Clone)]
pub struct ReportService {
    catalog: Arc<dyn CatalogRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    directory: Arc<dyn DirectoryRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl ReportService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        directory: Arc<dyn DirectoryRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            catalog,
            assignments,
            directory,
            notifications,
        }
    }

    pub async fn applicant_dashboard(&self, actor: &Actor) -> Result<ApplicantDashboard> {
        actor.ensure_applicant()?;
        let assignments = self.assignments.list_for_applicant(actor.user_id).await?;

        let mut titles: HashMap<Uuid, String> = HashMap::new();
        for assignment in &assignments {
            if titles.contains_key(&assignment.test_id) {
                continue;
            }
            if let Some(test) = self.catalog.find_test(assignment.test_id).await? {
                titles.insert(test.id, test.title);
            }
        }

        let (active, completed): (Vec<_>, Vec<_>) =
            assignments.into_iter().partition(|a| a.is_active);
        let accepted_count = count_status(&completed, AssignmentStatus::Accepted);
        let rejected_count = count_status(&completed, AssignmentStatus::Rejected);
        let unread_notifications = self
            .notifications
            .list_for_user(actor.user_id)
            .await?
            .iter()
            .filter(|n| !n.is_read)
            .count();

        let summarize = |list: Vec<TestAssignment>| -> Vec<AssignmentSummary> {
            list.into_iter()
                .map(|assignment| AssignmentSummary {
                    test_title: titles.get(&assignment.test_id).cloned().unwrap_or_default(),
                    assignment,
                })
                .collect()
        };

        Ok(ApplicantDashboard {
            pending_count: active.len(),
            accepted_count,
            rejected_count,
            unread_notifications,
            active_assignments: summarize(active),
            completed_assignments: summarize(completed),
        })
    }

    pub async fn employer_dashboard(&self, actor: &Actor) -> Result<EmployerDashboard> {
        actor.ensure_employer()?;
        let tests = self.own_tests(actor).await?;
        let assignments = self
            .assignments
            .list_for_tests(tests.keys().copied().collect())
            .await?;

        let mut questions = QuestionCache::default();
        let mut total = 0i64;
        let mut completed_count = 0usize;
        for assignment in assignments.iter().filter(|a| !a.is_active) {
            let report = self.score(&mut questions, assignment).await?;
            total += i64::from(report.score);
            completed_count += 1;
        }

        let average_score = if completed_count == 0 {
            0.0
        } else {
            (total as f64 / completed_count as f64 * 100.0).round() / 100.0
        };

        Ok(EmployerDashboard {
            assigned_count: assignments.len(),
            completed_count,
            average_score,
        })
    }

    /// Every assignment of the employer's tests with its scored answers.
    pub async fn employer_reports(&self, actor: &Actor) -> Result<ReportsResponse> {
        actor.ensure_employer()?;
        let tests = self.own_tests(actor).await?;
        let assignments = self
            .assignments
            .list_for_tests(tests.keys().copied().collect())
            .await?;

        let accepted_count = count_status(&assignments, AssignmentStatus::Accepted);
        let rejected_count = count_status(&assignments, AssignmentStatus::Rejected);
        let pending_count = count_status(&assignments, AssignmentStatus::Pending);

        let mut questions = QuestionCache::default();
        let mut usernames: HashMap<Uuid, Option<String>> = HashMap::new();
        let mut reports = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let result = self.score(&mut questions, &assignment).await?;
            if !usernames.contains_key(&assignment.applicant_id) {
                let username = self
                    .directory
                    .find_user(assignment.applicant_id)
                    .await?
                    .map(|u| u.username);
                usernames.insert(assignment.applicant_id, username);
            }
            reports.push(AssignmentReport {
                applicant_username: usernames
                    .get(&assignment.applicant_id)
                    .cloned()
                    .flatten(),
                summary: AssignmentSummary {
                    test_title: tests
                        .get(&assignment.test_id)
                        .map(|t| t.title.clone())
                        .unwrap_or_default(),
                    assignment,
                },
                result,
            });
        }

        Ok(ReportsResponse {
            reports,
            accepted_count,
            rejected_count,
            pending_count,
        })
    }

    async fn own_tests(&self, actor: &Actor) -> Result<HashMap<Uuid, Test>> {
        let tests = self
            .catalog
            .list_tests(TestFilter {
                created_by: Some(actor.user_id),
                ..TestFilter::default()
            })
            .await?;
        Ok(tests.into_iter().map(|t| (t.id, t)).collect())
    }

    async fn score(
        &self,
        cache: &mut QuestionCache,
        assignment: &TestAssignment,
    ) -> Result<ScoreReport> {
        if !cache.0.contains_key(&assignment.test_id) {
            let loaded = load_questions(self.catalog.as_ref(), assignment.test_id).await?;
            cache.0.insert(assignment.test_id, loaded);
        }
        let questions = cache
            .0
            .get(&assignment.test_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let answers = self.assignments.list_answers(assignment.id).await?;
        Ok(ScoringService::score(questions, &answers))
    }
}

#[derive(Default)]
struct QuestionCache(HashMap<Uuid, Vec<QuestionWithOptions>>);

fn count_status(assignments: &[TestAssignment], status: AssignmentStatus) -> usize {
    assignments.iter().filter(|a| a.status == status).count()
}
