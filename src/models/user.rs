use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employer,
    Applicant,
    CompanyAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employer => "employer",
            Role::Applicant => "applicant",
            Role::CompanyAdmin => "company_admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employer" => Ok(Role::Employer),
            "applicant" => Ok(Role::Applicant),
            "company_admin" => Ok(Role::CompanyAdmin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub is_approved: bool,
    pub is_active: bool,
    pub is_staff: bool,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let raw_role: String = row.try_get("role")?;
        let role = raw_role
            .parse::<Role>()
            .map_err(|e| sqlx::Error::Decode(e.into()))?;
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role,
            company_id: row.try_get("company_id")?,
            is_approved: row.try_get("is_approved")?,
            is_active: row.try_get("is_active")?,
            is_staff: row.try_get("is_staff")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub is_approved: bool,
    pub position: Option<String>,
}

/// Employers of one company, split the way company admins review them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmployerRoster {
    pub pending: Vec<User>,
    pub approved: Vec<User>,
    pub blocked: Vec<User>,
}

impl EmployerRoster {
    pub fn from_users(users: Vec<User>, joined_since: Option<DateTime<Utc>>) -> Self {
        let mut roster = EmployerRoster::default();
        for user in users {
            if user.role != Role::Employer {
                continue;
            }
            if joined_since.is_some_and(|since| user.created_at < since) {
                continue;
            }
            match (user.is_approved, user.is_active) {
                (false, _) => roster.pending.push(user),
                (true, true) => roster.approved.push(user),
                (true, false) => roster.blocked.push(user),
            }
        }
        roster
    }
}
