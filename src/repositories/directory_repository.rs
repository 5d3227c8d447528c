use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::company::{Company, Invitation, NewCompany};
use crate::models::notification::NewNotification;
use crate::models::user::{NewUser, Role, User};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: String) -> Result<Option<User>>;
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn list_company_users(&self, company_id: Uuid, role: Role) -> Result<Vec<User>>;
    /// Updates the account flags and records `notice` in one unit of work.
    async fn set_user_flags(
        &self,
        id: Uuid,
        is_approved: Option<bool>,
        is_active: Option<bool>,
        notice: NewNotification,
    ) -> Result<User>;
    async fn delete_user(&self, id: Uuid) -> Result<bool>;

    /// Creates the company and its administrator atomically.
    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        admin: NewUser,
    ) -> Result<(Company, User)>;
    async fn find_company(&self, id: Uuid) -> Result<Option<Company>>;
    async fn list_pending_companies(&self) -> Result<Vec<Company>>;
    /// Approves the company and every company admin attached to it.
    async fn approve_company(&self, id: Uuid) -> Result<Company>;
    /// Deletes the company; its users go with it.
    async fn delete_company(&self, id: Uuid) -> Result<bool>;

    async fn find_invitation_by_email(&self, email: String) -> Result<Option<Invitation>>;
    async fn create_invitation(
        &self,
        company_id: Option<Uuid>,
        email: String,
        invited_by: Uuid,
    ) -> Result<Invitation>;
}

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, role, company_id, \
     is_approved, is_active, is_staff, position, created_at";
const COMPANY_COLUMNS: &str =
    "id, name, contact_email, phone_number, description, is_approved, created_at";

#[derive(Clone)]
pub struct PgDirectoryRepository {
    pool: PgPool,
}

impl PgDirectoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_user(tx: &mut Transaction<'_, Postgres>, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (
                id, username, email, first_name, last_name, role, company_id,
                is_approved, is_active, is_staff, position, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, FALSE, $9, $10)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.role.as_str())
        .bind(user.company_id)
        .bind(user.is_approved)
        .bind(user.position)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl DirectoryRepository for PgDirectoryRepository {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: String) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let row = Self::insert_user(&mut tx, user).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_company_users(&self, company_id: Uuid, role: Role) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE company_id = $1 AND role = $2 ORDER BY created_at ASC, id ASC",
            USER_COLUMNS
        ))
        .bind(company_id)
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn set_user_flags(
        &self,
        id: Uuid,
        is_approved: Option<bool>,
        is_active: Option<bool>,
        notice: NewNotification,
    ) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let user = sqlx::query_as::<_, User>(&format!(
            r#"UPDATE users
               SET is_approved = COALESCE($1, is_approved), is_active = COALESCE($2, is_active)
               WHERE id = $3
               RETURNING {}"#,
            USER_COLUMNS
        ))
        .bind(is_approved)
        .bind(is_active)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("User"))?;

        sqlx::query(
            r#"INSERT INTO notifications (id, user_id, message, is_read, test_id, created_at)
               VALUES ($1, $2, $3, FALSE, $4, $5)"#,
        )
        .bind(Uuid::new_v4())
        .bind(notice.user_id)
        .bind(notice.message)
        .bind(notice.test_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_company_with_admin(
        &self,
        company: NewCompany,
        admin: NewUser,
    ) -> Result<(Company, User)> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Company>(&format!(
            r#"
            INSERT INTO companies (id, name, contact_email, phone_number, description, is_approved, created_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6)
            RETURNING {}
            "#,
            COMPANY_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(company.name)
        .bind(company.contact_email)
        .bind(company.phone_number)
        .bind(company.description)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        let admin = Self::insert_user(
            &mut tx,
            NewUser {
                company_id: Some(created.id),
                ..admin
            },
        )
        .await?;

        tx.commit().await?;
        Ok((created, admin))
    }

    async fn find_company(&self, id: Uuid) -> Result<Option<Company>> {
        let row = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE id = $1",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_pending_companies(&self) -> Result<Vec<Company>> {
        let rows = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE NOT is_approved ORDER BY created_at ASC, id ASC",
            COMPANY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn approve_company(&self, id: Uuid) -> Result<Company> {
        let mut tx = self.pool.begin().await?;
        let company = sqlx::query_as::<_, Company>(&format!(
            "UPDATE companies SET is_approved = TRUE WHERE id = $1 RETURNING {}",
            COMPANY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("Company"))?;

        sqlx::query(
            r#"UPDATE users SET is_approved = TRUE WHERE company_id = $1 AND role = 'company_admin'"#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(company)
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(r#"DELETE FROM companies WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_invitation_by_email(&self, email: String) -> Result<Option<Invitation>> {
        let row = sqlx::query_as::<_, Invitation>(
            r#"SELECT id, company_id, email, invited_by, created_at FROM invitations WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_invitation(
        &self,
        company_id: Option<Uuid>,
        email: String,
        invited_by: Uuid,
    ) -> Result<Invitation> {
        let row = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (id, company_id, email, invited_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, company_id, email, invited_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(company_id)
        .bind(email)
        .bind(invited_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
