use actix_web::{web, HttpResponse};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::vip::{CreateRequestPayload, ProcessDecision};
use crate::AppState;

pub async fn create_request(
    identity: AuthenticatedUser,
    req: web::Json<CreateRequestPayload>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!(
        "VIP upgrade request from {} for {} months",
        identity.username, req.requested_months
    );
    let created = state
        .requests
        .create_request(identity.id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(created))
}

pub async fn my_requests(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let requests = state.requests.list_for_user(identity.id).await?;
    Ok(HttpResponse::Ok().json(requests))
}

pub async fn cancel_request(
    identity: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state
        .requests
        .cancel_request(path.into_inner(), identity.id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn all_requests(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    let requests = state.requests.list_all().await?;
    Ok(HttpResponse::Ok().json(requests))
}

pub async fn pending_requests(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    let requests = state.requests.list_pending().await?;
    Ok(HttpResponse::Ok().json(requests))
}

pub async fn process_request(
    identity: AuthenticatedUser,
    path: web::Path<Uuid>,
    req: web::Json<ProcessDecision>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    info!(
        "Admin {} processing request {} as {:?}",
        identity.username, path, req.status
    );
    let processed = state
        .requests
        .process_request(path.into_inner(), identity.id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(processed))
}
