use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::company::is_valid_phone;
use crate::models::notification::Notification;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Company name must be 1-255 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub contact_email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterApplicantRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    pub company_id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Position is required"))]
    pub position: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterEmployerRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub company_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployerListQuery {
    pub joined_since: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployerAction {
    Approve,
    Reject,
    Block,
    Unblock,
    Delete,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InviteApplicantRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub unread_count: usize,
    pub notifications: Vec<Notification>,
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone number must be 10-15 digits, spaces or dashes".into());
        Err(err)
    }
}
