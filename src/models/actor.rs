use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::assignment::TestAssignment;
use crate::models::test::Test;
use crate::models::user::{Role, User};

/// The caller of a service operation, resolved once per request from the
/// bearer token. Every access rule in the services goes through these
/// predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub is_approved: bool,
    pub is_active: bool,
    pub is_staff: bool,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            company_id: user.company_id,
            is_approved: user.is_approved,
            is_active: user.is_active,
            is_staff: user.is_staff,
        }
    }
}

impl Actor {
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active {
            Ok(())
        } else {
            Err(Error::Forbidden("Account is blocked".into()))
        }
    }

    pub fn ensure_applicant(&self) -> Result<()> {
        self.ensure_active()?;
        if self.role == Role::Applicant {
            Ok(())
        } else {
            Err(Error::Forbidden("Applicant role required".into()))
        }
    }

    /// Active employer whose application has been approved by the company.
    pub fn ensure_employer(&self) -> Result<()> {
        self.ensure_active()?;
        if self.role != Role::Employer {
            return Err(Error::Forbidden("Employer role required".into()));
        }
        if !self.is_approved {
            return Err(Error::Forbidden(
                "Employer application has not been approved yet".into(),
            ));
        }
        Ok(())
    }

    /// Returns the company the admin manages.
    pub fn ensure_company_admin(&self) -> Result<Uuid> {
        self.ensure_active()?;
        match (self.role, self.company_id) {
            (Role::CompanyAdmin, Some(company_id)) if self.is_approved => Ok(company_id),
            (Role::CompanyAdmin, Some(_)) => {
                Err(Error::Forbidden("Company has not been approved yet".into()))
            }
            _ => Err(Error::Forbidden("Company administrator role required".into())),
        }
    }

    pub fn ensure_platform_admin(&self) -> Result<()> {
        self.ensure_active()?;
        if self.is_staff {
            Ok(())
        } else {
            Err(Error::Forbidden("Platform administrator required".into()))
        }
    }

    /// Employer or company admin acting on behalf of a company.
    pub fn ensure_company_member(&self) -> Result<Uuid> {
        self.ensure_active()?;
        let company_id = self
            .company_id
            .ok_or_else(|| Error::Forbidden("Account is not linked to a company".into()))?;
        match self.role {
            Role::Employer | Role::CompanyAdmin if self.is_approved => Ok(company_id),
            Role::Employer | Role::CompanyAdmin => {
                Err(Error::Forbidden("Account has not been approved yet".into()))
            }
            Role::Applicant => Err(Error::Forbidden("Employer role required".into())),
        }
    }

    pub fn owns_test(&self, test: &Test) -> bool {
        test.created_by == self.user_id
    }

    pub fn is_applicant_of(&self, assignment: &TestAssignment) -> bool {
        assignment.applicant_id == self.user_id
    }
}
