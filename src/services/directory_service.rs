use std::sync::Arc;

use chrono::{NaiveTime, TimeZone, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::config::InvitationConfig;
use crate::dto::directory_dto::{
    EmployerAction, EmployerListQuery, InviteApplicantRequest, RegisterApplicantRequest,
    RegisterCompanyRequest, RegisterEmployerRequest,
};
use crate::error::{Error, Result};
use crate::models::actor::Actor;
use crate::models::company::{Company, Invitation, NewCompany};
use crate::models::notification::NewNotification;
use crate::models::user::{EmployerRoster, NewUser, Role, User};
use crate::repositories::DirectoryRepository;

/// Subject and body of an applicant invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl InvitationMessage {
    pub fn build(config: &InvitationConfig, email: &str) -> Self {
        Self {
            from: config.sender.clone(),
            to: email.to_string(),
            subject: "Invitation to register as an applicant".to_string(),
            body: format!(
                "Hello! You are invited to register as an applicant. Follow the link: {}",
                config.registration_url
            ),
        }
    }
}

/// Companies, their members and applicant invitations.
#[derive(Clone)]
pub struct DirectoryService {
    directory: Arc<dyn DirectoryRepository>,
    invitation: InvitationConfig,
}

impl DirectoryService {
    pub fn new(
        directory: Arc<dyn DirectoryRepository>,
        invitation: InvitationConfig,
    ) -> Self {
        Self {
            directory,
            invitation,
        }
    }

    /// Resolves the bearer of a token. Unknown subjects are unauthorized.
    pub async fn resolve_actor(&self, user_id: Uuid) -> Result<Actor> {
        self.directory
            .find_user(user_id)
            .await?
            .map(|user| Actor::from(&user))
            .ok_or_else(|| Error::Unauthorized("Unknown user".into()))
    }

    /// Creates an unapproved company together with its unapproved admin.
    pub async fn register_company(&self, payload: RegisterCompanyRequest) -> Result<(Company, User)> {
        payload.validate()?;
        let (company, admin) = self
            .directory
            .create_company_with_admin(
                NewCompany {
                    name: payload.name.trim().to_string(),
                    contact_email: payload.contact_email.clone(),
                    phone_number: payload.phone_number,
                    description: payload.description,
                },
                NewUser {
                    username: payload.username,
                    email: payload.contact_email,
                    first_name: payload.first_name,
                    last_name: payload.last_name,
                    role: Role::CompanyAdmin,
                    company_id: None,
                    is_approved: false,
                    position: None,
                },
            )
            .await?;
        tracing::info!(company_id = %company.id, "company registered, awaiting approval");
        Ok((company, admin))
    }

    pub async fn list_pending_companies(&self, actor: &Actor) -> Result<Vec<Company>> {
        actor.ensure_platform_admin()?;
        self.directory.list_pending_companies().await
    }

    pub async fn approve_company(&self, actor: &Actor, company_id: Uuid) -> Result<Company> {
        actor.ensure_platform_admin()?;
        let company = self.directory.approve_company(company_id).await?;
        tracing::info!(company_id = %company.id, "company approved");
        Ok(company)
    }

    /// Rejecting a company deletes it along with its accounts.
    pub async fn reject_company(&self, actor: &Actor, company_id: Uuid) -> Result<()> {
        actor.ensure_platform_admin()?;
        if !self.directory.delete_company(company_id).await? {
            return Err(Error::not_found("Company"));
        }
        tracing::info!(company_id = %company_id, "company rejected and removed");
        Ok(())
    }

    pub async fn register_applicant(&self, payload: RegisterApplicantRequest) -> Result<User> {
        payload.validate()?;
        let company = self.approved_company(payload.company_id).await?;
        let user = self
            .directory
            .create_user(NewUser {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: Role::Applicant,
                company_id: Some(company.id),
                is_approved: true,
                position: Some(payload.position.trim().to_string()),
            })
            .await?;
        tracing::info!(user_id = %user.id, company_id = %company.id, "applicant registered");
        Ok(user)
    }

    /// Employers start unapproved until a company admin reviews them.
    pub async fn register_employer(&self, payload: RegisterEmployerRequest) -> Result<User> {
        payload.validate()?;
        let company = self.approved_company(payload.company_id).await?;
        let user = self
            .directory
            .create_user(NewUser {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                role: Role::Employer,
                company_id: Some(company.id),
                is_approved: false,
                position: None,
            })
            .await?;
        tracing::info!(user_id = %user.id, company_id = %company.id, "employer registered, awaiting approval");
        Ok(user)
    }

    pub async fn list_employers(
        &self,
        actor: &Actor,
        query: EmployerListQuery,
    ) -> Result<EmployerRoster> {
        let company_id = actor.ensure_company_admin()?;
        let users = self
            .directory
            .list_company_users(company_id, Role::Employer)
            .await?;
        let since = query
            .joined_since
            .map(|date| Utc.from_utc_datetime(&date.and_time(NaiveTime::default())));
        Ok(EmployerRoster::from_users(users, since))
    }

    /// Applies a company admin's action to one of the company's employers.
    /// Returns the employer afterwards, or `None` when the action removed it.
    pub async fn manage_employer(
        &self,
        actor: &Actor,
        employer_id: Uuid,
        action: EmployerAction,
    ) -> Result<Option<User>> {
        let company_id = actor.ensure_company_admin()?;
        let employer = self
            .directory
            .find_user(employer_id)
            .await?
            .filter(|u| u.role == Role::Employer && u.company_id == Some(company_id))
            .ok_or_else(|| Error::not_found("Employer"))?;
        let company = self
            .directory
            .find_company(company_id)
            .await?
            .ok_or_else(|| Error::not_found("Company"))?;

        let (approved, active, message) = match action {
            EmployerAction::Reject | EmployerAction::Delete => {
                self.directory.delete_user(employer.id).await?;
                tracing::info!(user_id = %employer.id, action = ?action, "employer removed");
                return Ok(None);
            }
            EmployerAction::Approve => (
                Some(true),
                None,
                format!(
                    "Your employer application at company '{}' has been approved.",
                    company.name
                ),
            ),
            EmployerAction::Block => (
                None,
                Some(false),
                format!("Your account at company '{}' has been blocked.", company.name),
            ),
            EmployerAction::Unblock => (
                None,
                Some(true),
                format!("Your account at company '{}' has been unblocked.", company.name),
            ),
        };

        let updated = self
            .directory
            .set_user_flags(
                employer.id,
                approved,
                active,
                NewNotification::for_user(employer.id, message),
            )
            .await?;
        tracing::info!(user_id = %updated.id, action = ?action, "employer updated");
        Ok(Some(updated))
    }

    pub async fn list_applicants(&self, actor: &Actor) -> Result<Vec<User>> {
        let company_id = actor.ensure_company_member()?;
        self.directory
            .list_company_users(company_id, Role::Applicant)
            .await
    }

    /// Records the invitation and hands the message to the mail log. A given
    /// email can only be invited once.
    pub async fn invite_applicant(
        &self,
        actor: &Actor,
        payload: InviteApplicantRequest,
    ) -> Result<(Invitation, InvitationMessage)> {
        let company_id = actor.ensure_company_member()?;
        payload.validate()?;
        let email = payload.email.trim().to_lowercase();

        if self
            .directory
            .find_invitation_by_email(email.clone())
            .await?
            .is_some()
        {
            return Err(Error::Conflict(
                "An invitation has already been sent to this email".into(),
            ));
        }

        let invitation = self
            .directory
            .create_invitation(Some(company_id), email.clone(), actor.user_id)
            .await?;
        let message = InvitationMessage::build(&self.invitation, &email);
        tracing::info!(
            invitation_id = %invitation.id,
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "applicant invitation issued"
        );
        Ok((invitation, message))
    }

    async fn approved_company(&self, company_id: Uuid) -> Result<Company> {
        self.directory
            .find_company(company_id)
            .await?
            .filter(|c| c.is_approved)
            .ok_or_else(|| Error::not_found("Company"))
    }
}
