use serde::Serialize;
use crate::models::assignment::TestAssignment;
use crate::services::scoring_service::ScoreReport;

/// An assignment with the title of its test, as listed on dashboards.
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentSummary {
    #[serde(flatten)]
    pub assignment: TestAssignment,
    pub test_title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicantDashboard {
    pub active_assignments: Vec<AssignmentSummary>,
    pub completed_assignments: Vec<AssignmentSummary>,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub pending_count: usize,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmployerDashboard {
    pub assigned_count: usize,
    pub completed_count: usize,
    /// Mean score of completed assignments, rounded to two decimals.
    pub average_score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentReport {
    #[serde(flatten)]
    pub summary: AssignmentSummary,
    pub applicant_username: Option<String>,
    #[serde(flatten)]
    pub result: ScoreReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportsResponse {
    pub reports: Vec<AssignmentReport>,
    pub accepted_count: usize,
    pub rejected_count: usize,
    pub pending_count: usize,
}
