use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

/// Employer verdict on a finished assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Accepted,
    Rejected,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Accepted => "accepted",
            AssignmentStatus::Rejected => "rejected",
        }
    }

    /// Status after applying `decision`, or `None` when the decision is
    /// already in effect.
    pub fn transition(self, decision: Decision) -> Option<AssignmentStatus> {
        let next = decision.status();
        if next == self {
            None
        } else {
            Some(next)
        }
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentStatus::Pending),
            "accepted" => Ok(AssignmentStatus::Accepted),
            "rejected" => Ok(AssignmentStatus::Rejected),
            other => Err(format!("unknown assignment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn status(self) -> AssignmentStatus {
        match self {
            Decision::Accept => AssignmentStatus::Accepted,
            Decision::Reject => AssignmentStatus::Rejected,
        }
    }

    pub fn notification_message(self, test_title: &str) -> String {
        match self {
            Decision::Accept => format!(
                "Congratulations! You have been accepted based on the results of the test '{}'.",
                test_title
            ),
            Decision::Reject => format!(
                "Unfortunately, you have been rejected based on the results of the test '{}'.",
                test_title
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAssignment {
    pub id: Uuid,
    pub test_id: Uuid,
    pub applicant_id: Uuid,
    pub is_active: bool,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for TestAssignment {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let raw_status: String = row.try_get("status")?;
        let status = raw_status
            .parse::<AssignmentStatus>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(Self {
            id: row.try_get("id")?,
            test_id: row.try_get("test_id")?,
            applicant_id: row.try_get("applicant_id")?,
            is_active: row.try_get("is_active")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}
