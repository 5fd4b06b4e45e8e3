//! Bootstrap accounts created at startup when missing.

use tracing::info;

use crate::auth::hash_password;
use crate::db::{Role, Store, User};
use crate::Result;

/// Ensure the default administrator and sample user exist. Safe to run on
/// every startup; existing usernames are left untouched.
pub async fn seed_default_accounts(store: &dyn Store) -> Result<()> {
    if store.find_user_by_username("admin").await?.is_none() {
        let mut admin = User::new(
            "admin".to_string(),
            "admin@example.com".to_string(),
            hash_password("admin123")?,
        );
        admin.full_name = Some("Administrator".to_string());
        admin.role = Role::Admin;
        admin.is_email_verified = true;

        store.insert_user(&admin).await?;
        info!("Admin user created (username: admin, password: admin123)");
    }

    if store.find_user_by_username("user").await?.is_none() {
        let mut sample = User::new(
            "user".to_string(),
            "user@example.com".to_string(),
            hash_password("user123")?,
        );
        sample.full_name = Some("Regular User".to_string());
        sample.is_email_verified = true;

        store.insert_user(&sample).await?;
        info!("Sample user created (username: user, password: user123)");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_seed_creates_both_accounts_once() {
        let store = MemoryStore::new();

        seed_default_accounts(&store).await.unwrap();

        let admin = store.find_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.is_email_verified);
        assert!(verify_password(&admin.password_hash, "admin123").unwrap());

        let sample = store.find_user_by_username("user").await.unwrap().unwrap();
        assert_eq!(sample.role, Role::User);

        // Second run leaves the existing rows alone
        seed_default_accounts(&store).await.unwrap();
        let again = store.find_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(again.id, admin.id);
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }
}
