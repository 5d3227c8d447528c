use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    pub phone_number: Option<String>,
    pub description: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub contact_email: String,
    pub phone_number: Option<String>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub email: String,
    pub invited_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Accepts an optional leading `+` followed by 10 to 15 digits, spaces or
/// dashes.
pub fn is_valid_phone(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let len = body.chars().count();
    (10..=15).contains(&len)
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
}
