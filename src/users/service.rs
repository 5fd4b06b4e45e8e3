use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::db::{AccountType, Role, Store, User};
use crate::error::AppError;
use crate::validation;
use crate::Result;

/// API projection of a user row; the password hash never leaves the store
/// layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: Role,
    pub account_type: AccountType,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub vip_expiry_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
            role: user.role,
            account_type: user.account_type,
            is_active: user.is_active,
            is_email_verified: user.is_email_verified,
            vip_expiry_date: user.vip_expiry_date,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Partial profile update; only fields present in the payload are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// New expiry after an upgrade of `months` calendar months. The base is the
/// existing expiry while it is still in the future (consecutive upgrades
/// stack), otherwise now.
pub(crate) fn extended_expiry(
    current: Option<DateTime<Utc>>,
    months: i32,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>> {
    let base = match current {
        Some(expiry) if expiry > now => expiry,
        _ => now,
    };

    base.checked_add_months(Months::new(months as u32))
        .ok_or_else(|| AppError::Validation("requested months out of range".into()))
}

/// Mutate `user` into its post-upgrade state. Persisting is the caller's
/// concern so that an approval can commit the request row and the user row
/// together.
pub(crate) fn apply_vip_upgrade(user: &mut User, months: i32, now: DateTime<Utc>) -> Result<()> {
    validation::validate_months(months)?;
    user.vip_expiry_date = Some(extended_expiry(user.vip_expiry_date, months, now)?);
    user.account_type = AccountType::Vip;
    user.updated_at = now;
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user not found with id: {}", user_id)))
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserResponse> {
        let user = self.load_user(user_id).await?;
        Ok(UserResponse::from(&user))
    }

    pub async fn update_profile(&self, user_id: Uuid, patch: UpdateProfile) -> Result<UserResponse> {
        let mut user = self.load_user(user_id).await?;

        if let Some(email) = patch.email {
            if email != user.email {
                validation::validate_email(&email)?;
                if self.store.find_user_by_email(&email).await?.is_some() {
                    return Err(AppError::Conflict("email already exists".into()));
                }
                user.email = email;
                user.is_email_verified = false;
            }
        }

        if let Some(full_name) = patch.full_name {
            user.full_name = Some(full_name);
        }

        if let Some(phone_number) = patch.phone_number {
            user.phone_number = Some(phone_number);
        }

        if let Some(new_password) = patch.new_password {
            let current = patch.current_password.ok_or_else(|| {
                AppError::Validation("current password is required to change password".into())
            })?;

            if !verify_password(&user.password_hash, &current)? {
                return Err(AppError::Validation("current password is incorrect".into()));
            }

            validation::validate_password(&new_password)?;
            user.password_hash = hash_password(&new_password)?;
        }

        user.updated_at = Utc::now();
        let user = self.store.update_user(&user).await?;

        Ok(UserResponse::from(&user))
    }

    /// Soft delete: the row is kept, the account stops authenticating.
    pub async fn deactivate(&self, user_id: Uuid) -> Result<()> {
        let mut user = self.load_user(user_id).await?;
        user.is_active = false;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        info!("Deactivated account {}", user.username);
        Ok(())
    }

    pub async fn upgrade_to_vip(&self, user_id: Uuid, months: i32) -> Result<UserResponse> {
        let mut user = self.load_user(user_id).await?;
        apply_vip_upgrade(&mut user, months, Utc::now())?;
        let user = self.store.update_user(&user).await?;
        info!(
            "Upgraded {} to VIP until {:?}",
            user.username, user.vip_expiry_date
        );
        Ok(UserResponse::from(&user))
    }

    pub async fn downgrade_to_regular(&self, user_id: Uuid) -> Result<UserResponse> {
        let mut user = self.load_user(user_id).await?;
        user.account_type = AccountType::Regular;
        user.vip_expiry_date = None;
        user.updated_at = Utc::now();
        let user = self.store.update_user(&user).await?;
        info!("Downgraded {} to regular", user.username);
        Ok(UserResponse::from(&user))
    }

    pub async fn list_all(&self) -> Result<Vec<UserResponse>> {
        let users = self.store.list_users().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    /// Filters on the raw account-type flag: an expired-but-not-downgraded
    /// VIP is still listed. See DESIGN.md for the rationale.
    pub async fn list_vip(&self) -> Result<Vec<UserResponse>> {
        let users = self
            .store
            .list_users_by_account_type(AccountType::Vip)
            .await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fresh_upgrade_counts_from_now() {
        let now = Utc::now();
        let expiry = extended_expiry(None, 3, now).unwrap();
        assert_eq!(expiry, now.checked_add_months(Months::new(3)).unwrap());
    }

    #[test]
    fn test_stacked_upgrade_extends_existing_expiry() {
        let now = Utc::now();
        let existing = now + Duration::days(10);
        let expiry = extended_expiry(Some(existing), 2, now).unwrap();
        assert_eq!(expiry, existing.checked_add_months(Months::new(2)).unwrap());
    }

    #[test]
    fn test_expired_vip_rebases_to_now() {
        let now = Utc::now();
        let lapsed = now - Duration::days(30);
        let expiry = extended_expiry(Some(lapsed), 1, now).unwrap();
        assert_eq!(expiry, now.checked_add_months(Months::new(1)).unwrap());
    }

    #[test]
    fn test_apply_vip_upgrade_stacks_additively() {
        let now = Utc::now();
        let mut user = User::new("u".into(), "u@example.com".into(), "hash".into());

        apply_vip_upgrade(&mut user, 3, now).unwrap();
        assert_eq!(user.account_type, AccountType::Vip);
        let first = user.vip_expiry_date.unwrap();
        assert_eq!(first, now.checked_add_months(Months::new(3)).unwrap());

        // Second upgrade while still valid extends the previous expiry,
        // not now.
        apply_vip_upgrade(&mut user, 2, now).unwrap();
        let second = user.vip_expiry_date.unwrap();
        assert_eq!(second, first.checked_add_months(Months::new(2)).unwrap());
    }

    #[test]
    fn test_apply_vip_upgrade_rejects_zero_months() {
        let now = Utc::now();
        let mut user = User::new("u".into(), "u@example.com".into(), "hash".into());
        let err = apply_vip_upgrade(&mut user, 0, now).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(user.account_type, AccountType::Regular);
    }
}
