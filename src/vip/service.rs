use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::db::{AccountType, RequestStatus, Store, User, VipUpgradeRequest};
use crate::error::AppError;
use crate::users::apply_vip_upgrade;
use crate::validation;
use crate::Result;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestPayload {
    pub requested_months: i32,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDecision {
    pub status: RequestStatus,
    pub admin_note: Option<String>,
}

/// API projection of a request, with the owner's name denormalized in.
/// `processed_by` stays internal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VipRequestResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub requested_months: i32,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub request_date: DateTime<Utc>,
    pub processed_date: Option<DateTime<Utc>>,
    pub admin_note: Option<String>,
}

impl VipRequestResponse {
    fn new(request: &VipUpgradeRequest, owner: &User) -> Self {
        Self {
            id: request.id,
            user_id: request.user_id,
            username: owner.username.clone(),
            full_name: owner.full_name.clone(),
            requested_months: request.requested_months,
            message: request.message.clone(),
            status: request.status,
            request_date: request.request_date,
            processed_date: request.processed_date,
            admin_note: request.admin_note.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn Store>,
}

impl RequestService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user not found with id: {}", user_id)))
    }

    async fn load_request(&self, request_id: Uuid) -> Result<VipUpgradeRequest> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("request not found with id: {}", request_id)))
    }

    async fn to_response(&self, request: &VipUpgradeRequest) -> Result<VipRequestResponse> {
        let owner = self.load_user(request.user_id).await?;
        Ok(VipRequestResponse::new(request, &owner))
    }

    pub async fn create_request(
        &self,
        user_id: Uuid,
        payload: CreateRequestPayload,
    ) -> Result<VipRequestResponse> {
        validation::validate_months(payload.requested_months)?;

        let user = self.load_user(user_id).await?;

        if user.account_type == AccountType::Vip {
            return Err(AppError::BusinessRule("user is already VIP".into()));
        }

        // Friendly pre-check; the store re-checks atomically on insert, so a
        // concurrent duplicate still cannot slip through.
        if self
            .store
            .find_pending_request_for_user(user_id)
            .await?
            .is_some()
        {
            return Err(AppError::BusinessRule(
                "you already have a pending upgrade request".into(),
            ));
        }

        let request =
            VipUpgradeRequest::new(user_id, payload.requested_months, payload.message);
        let request = self.store.insert_pending_request(&request).await?;
        info!(
            "User {} requested a {}-month VIP upgrade ({})",
            user.username, request.requested_months, request.id
        );

        Ok(VipRequestResponse::new(&request, &user))
    }

    pub async fn list_all(&self) -> Result<Vec<VipRequestResponse>> {
        let requests = self.store.list_requests().await?;
        let mut responses = Vec::with_capacity(requests.len());
        for request in &requests {
            responses.push(self.to_response(request).await?);
        }
        Ok(responses)
    }

    pub async fn list_pending(&self) -> Result<Vec<VipRequestResponse>> {
        let requests = self
            .store
            .list_requests_by_status(RequestStatus::Pending)
            .await?;
        let mut responses = Vec::with_capacity(requests.len());
        for request in &requests {
            responses.push(self.to_response(request).await?);
        }
        Ok(responses)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<VipRequestResponse>> {
        let user = self.load_user(user_id).await?;
        let requests = self.store.list_requests_for_user(user_id).await?;
        Ok(requests
            .iter()
            .map(|request| VipRequestResponse::new(request, &user))
            .collect())
    }

    /// Cancellation is a hard delete, unlike account deactivation; a
    /// cancelled request leaves no trace.
    pub async fn cancel_request(&self, request_id: Uuid, caller_user_id: Uuid) -> Result<()> {
        let request = self.load_request(request_id).await?;

        if request.user_id != caller_user_id {
            return Err(AppError::Forbidden(
                "you can only cancel your own requests".into(),
            ));
        }

        if request.status.is_terminal() {
            return Err(AppError::BusinessRule(
                "only pending requests can be cancelled".into(),
            ));
        }

        self.store.delete_request(request_id).await?;
        info!("Request {} cancelled by its owner", request_id);
        Ok(())
    }

    /// One-shot transition out of PENDING. Approval computes the owner's
    /// upgraded row and hands both rows to the store to commit as a unit.
    pub async fn process_request(
        &self,
        request_id: Uuid,
        admin_id: Uuid,
        decision: ProcessDecision,
    ) -> Result<VipRequestResponse> {
        let mut request = self.load_request(request_id).await?;

        if request.status.is_terminal() {
            return Err(AppError::BusinessRule(
                "request has already been processed".into(),
            ));
        }

        if decision.status == RequestStatus::Pending {
            return Err(AppError::Validation(
                "decision status must be APPROVED or REJECTED".into(),
            ));
        }

        let now = Utc::now();
        request.status = decision.status;
        request.processed_date = Some(now);
        request.processed_by = Some(admin_id);
        request.admin_note = decision.admin_note;

        let mut owner = self.load_user(request.user_id).await?;
        let upgraded = if decision.status == RequestStatus::Approved {
            apply_vip_upgrade(&mut owner, request.requested_months, now)?;
            Some(&owner)
        } else {
            None
        };

        self.store.store_processed(&request, upgraded).await?;
        info!(
            "Request {} {:?} by admin {}",
            request.id, request.status, admin_id
        );

        Ok(VipRequestResponse::new(&request, &owner))
    }
}
