use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::db::models::{AccountType, RequestStatus, User, VipUpgradeRequest};
use crate::db::store::Store;
use crate::error::AppError;
use crate::Result;

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, phone_number, \
     role, account_type, is_active, is_email_verified, vip_expiry_date, \
     created_at, updated_at, last_login_at";

const REQUEST_COLUMNS: &str = "id, user_id, requested_months, message, status, request_date, \
     processed_date, processed_by, admin_note";

/// Postgres-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: &User) -> Result<User> {
        let query = format!(
            "INSERT INTO users ({USER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {USER_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.full_name)
            .bind(&user.phone_number)
            .bind(user.role)
            .bind(user.account_type)
            .bind(user.is_active)
            .bind(user.is_email_verified)
            .bind(user.vip_expiry_date)
            .bind(user.created_at)
            .bind(user.updated_at)
            .bind(user.last_login_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict("username or email already exists".into())
                }
                _ => e.into(),
            })?;

        Ok(inserted)
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let query = format!(
            "UPDATE users SET username = $2, email = $3, password_hash = $4, \
             full_name = $5, phone_number = $6, role = $7, account_type = $8, \
             is_active = $9, is_email_verified = $10, vip_expiry_date = $11, \
             updated_at = $12, last_login_at = $13 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.full_name)
            .bind(&user.phone_number)
            .bind(user.role)
            .bind(user.account_type)
            .bind(user.is_active)
            .bind(user.is_email_verified)
            .bind(user.vip_expiry_date)
            .bind(user.updated_at)
            .bind(user.last_login_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict("username or email already exists".into())
                }
                _ => e.into(),
            })?;

        Ok(updated)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_login(&self, username_or_email: &str) -> Result<Option<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username_or_email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn list_users_by_account_type(&self, account_type: AccountType) -> Result<Vec<User>> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE account_type = $1 ORDER BY created_at");
        let users = sqlx::query_as::<_, User>(&query)
            .bind(account_type)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn insert_pending_request(
        &self,
        request: &VipUpgradeRequest,
    ) -> Result<VipUpgradeRequest> {
        // Transactional re-check plus the partial unique index on
        // (user_id) WHERE status = 'PENDING' make a duplicate PENDING row
        // impossible under concurrent submissions.
        let mut tx = self.pool.begin().await?;

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM vip_upgrade_requests WHERE user_id = $1 AND status = 'PENDING' FOR UPDATE",
        )
        .bind(request.user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            return Err(AppError::BusinessRule(
                "you already have a pending upgrade request".into(),
            ));
        }

        let query = format!(
            "INSERT INTO vip_upgrade_requests ({REQUEST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {REQUEST_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, VipUpgradeRequest>(&query)
            .bind(request.id)
            .bind(request.user_id)
            .bind(request.requested_months)
            .bind(&request.message)
            .bind(request.status)
            .bind(request.request_date)
            .bind(request.processed_date)
            .bind(request.processed_by)
            .bind(&request.admin_note)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::BusinessRule("you already have a pending upgrade request".into())
                }
                _ => e.into(),
            })?;

        tx.commit().await?;

        Ok(inserted)
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<VipUpgradeRequest>> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM vip_upgrade_requests WHERE id = $1");
        let request = sqlx::query_as::<_, VipUpgradeRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn find_pending_request_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VipUpgradeRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM vip_upgrade_requests \
             WHERE user_id = $1 AND status = 'PENDING'"
        );
        let request = sqlx::query_as::<_, VipUpgradeRequest>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(request)
    }

    async fn list_requests(&self) -> Result<Vec<VipUpgradeRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM vip_upgrade_requests ORDER BY request_date DESC"
        );
        let requests = sqlx::query_as::<_, VipUpgradeRequest>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    async fn list_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<VipUpgradeRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM vip_upgrade_requests \
             WHERE status = $1 ORDER BY request_date DESC"
        );
        let requests = sqlx::query_as::<_, VipUpgradeRequest>(&query)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<VipUpgradeRequest>> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM vip_upgrade_requests \
             WHERE user_id = $1 ORDER BY request_date DESC"
        );
        let requests = sqlx::query_as::<_, VipUpgradeRequest>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(requests)
    }

    async fn delete_request(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM vip_upgrade_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn store_processed(
        &self,
        request: &VipUpgradeRequest,
        upgraded_user: Option<&User>,
    ) -> Result<()> {
        // The status transition and the VIP upgrade it triggers commit as
        // one unit; a crash between the two writes is never observable.
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE vip_upgrade_requests \
             SET status = $2, processed_date = $3, processed_by = $4, admin_note = $5 \
             WHERE id = $1",
        )
        .bind(request.id)
        .bind(request.status)
        .bind(request.processed_date)
        .bind(request.processed_by)
        .bind(&request.admin_note)
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            tx.rollback().await?;
            return Err(e.into());
        }

        if let Some(user) = upgraded_user {
            let result = sqlx::query(
                "UPDATE users SET account_type = $2, vip_expiry_date = $3, updated_at = $4 \
                 WHERE id = $1",
            )
            .bind(user.id)
            .bind(user.account_type)
            .bind(user.vip_expiry_date)
            .bind(user.updated_at)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                tx.rollback().await?;
                return Err(e.into());
            }
        }

        tx.commit().await?;

        Ok(())
    }
}
