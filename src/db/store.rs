use async_trait::async_trait;
use uuid::Uuid;

use crate::db::models::{AccountType, RequestStatus, User, VipUpgradeRequest};
use crate::Result;

/// Row operations for users and upgrade requests.
///
/// Two methods carry atomicity contracts beyond per-row read-modify-write:
///
/// * [`insert_pending_request`](Store::insert_pending_request) must reject an
///   insert when the user already has a PENDING request, atomically with the
///   insert itself, so concurrent submissions can never leave two PENDING
///   rows for one user.
/// * [`store_processed`](Store::store_processed) must persist the processed
///   request together with the optional updated user row as one unit; a
///   partial commit (request APPROVED, user not upgraded) must not be
///   observable.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<User>;
    async fn update_user(&self, user: &User) -> Result<User>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Lookup by username or email, whichever matches.
    async fn find_user_by_login(&self, username_or_email: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn list_users_by_account_type(&self, account_type: AccountType) -> Result<Vec<User>>;

    async fn insert_pending_request(
        &self,
        request: &VipUpgradeRequest,
    ) -> Result<VipUpgradeRequest>;
    async fn find_request(&self, id: Uuid) -> Result<Option<VipUpgradeRequest>>;
    async fn find_pending_request_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VipUpgradeRequest>>;
    /// All requests, newest first.
    async fn list_requests(&self) -> Result<Vec<VipUpgradeRequest>>;
    async fn list_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<VipUpgradeRequest>>;
    /// One user's requests, newest first.
    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<VipUpgradeRequest>>;
    /// Hard delete; cancelled requests leave no row behind.
    async fn delete_request(&self, id: Uuid) -> Result<()>;
    async fn store_processed(
        &self,
        request: &VipUpgradeRequest,
        upgraded_user: Option<&User>,
    ) -> Result<()>;
}
