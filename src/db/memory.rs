use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::models::{AccountType, RequestStatus, User, VipUpgradeRequest};
use crate::db::store::Store;
use crate::error::AppError;
use crate::Result;

#[derive(Default)]
struct State {
    users: HashMap<Uuid, User>,
    requests: HashMap<Uuid, VipUpgradeRequest>,
}

/// In-memory [`Store`] used by the test suite and demo runs.
///
/// A single lock covers both maps, which gives the same guarantees the
/// Postgres implementation gets from transactions: the pending-request
/// uniqueness check happens under the write lock that performs the insert,
/// and a processed request and its user update land together.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(requests: &mut [VipUpgradeRequest]) {
    requests.sort_by(|a, b| b.request_date.cmp(&a.request_date));
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<User> {
        let mut state = self.state.write().await;
        let duplicate = state
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if duplicate {
            return Err(AppError::Conflict("username or email already exists".into()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(AppError::NotFound("record not found".into()));
        }
        state.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_login(&self, username_or_email: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username_or_email || u.email == username_or_email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn list_users_by_account_type(&self, account_type: AccountType) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.account_type == account_type)
            .cloned()
            .collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn insert_pending_request(
        &self,
        request: &VipUpgradeRequest,
    ) -> Result<VipUpgradeRequest> {
        let mut state = self.state.write().await;
        let has_pending = state
            .requests
            .values()
            .any(|r| r.user_id == request.user_id && r.status == RequestStatus::Pending);
        if has_pending {
            return Err(AppError::BusinessRule(
                "you already have a pending upgrade request".into(),
            ));
        }
        state.requests.insert(request.id, request.clone());
        Ok(request.clone())
    }

    async fn find_request(&self, id: Uuid) -> Result<Option<VipUpgradeRequest>> {
        let state = self.state.read().await;
        Ok(state.requests.get(&id).cloned())
    }

    async fn find_pending_request_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<VipUpgradeRequest>> {
        let state = self.state.read().await;
        Ok(state
            .requests
            .values()
            .find(|r| r.user_id == user_id && r.status == RequestStatus::Pending)
            .cloned())
    }

    async fn list_requests(&self) -> Result<Vec<VipUpgradeRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<VipUpgradeRequest> = state.requests.values().cloned().collect();
        newest_first(&mut requests);
        Ok(requests)
    }

    async fn list_requests_by_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<VipUpgradeRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<VipUpgradeRequest> = state
            .requests
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect();
        newest_first(&mut requests);
        Ok(requests)
    }

    async fn list_requests_for_user(&self, user_id: Uuid) -> Result<Vec<VipUpgradeRequest>> {
        let state = self.state.read().await;
        let mut requests: Vec<VipUpgradeRequest> = state
            .requests
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        newest_first(&mut requests);
        Ok(requests)
    }

    async fn delete_request(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state.requests.remove(&id);
        Ok(())
    }

    async fn store_processed(
        &self,
        request: &VipUpgradeRequest,
        upgraded_user: Option<&User>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.requests.insert(request.id, request.clone());
        if let Some(user) = upgraded_user {
            state.users.insert(user.id, user.clone());
        }
        Ok(())
    }
}
