use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Regular,
    Vip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// PENDING is the only state a request can leave; APPROVED and
    /// REJECTED are terminal.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub account_type: AccountType,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub vip_expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            full_name: None,
            phone_number: None,
            role: Role::User,
            account_type: AccountType::Regular,
            is_active: true,
            is_email_verified: false,
            vip_expiry_date: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    /// A user is VIP in effect only while the expiry date is in the future.
    /// The raw `account_type` flag stays VIP after expiry until an explicit
    /// downgrade; nothing sweeps expired accounts.
    pub fn is_vip_in_effect(&self) -> bool {
        self.account_type == AccountType::Vip
            && self
                .vip_expiry_date
                .map(|expiry| expiry > Utc::now())
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VipUpgradeRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub requested_months: i32,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub processed_date: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,
    pub admin_note: Option<String>,
}

impl VipUpgradeRequest {
    pub fn new(user_id: Uuid, requested_months: i32, message: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            requested_months,
            message,
            status: RequestStatus::Pending,
            request_date: Utc::now(),
            processed_date: None,
            processed_by: None,
            admin_note: None,
        }
    }
}
