use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::users::UpdateProfile;
use crate::AppState;

pub async fn get_me(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user = state.accounts.get_profile(identity.id).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn update_me(
    identity: AuthenticatedUser,
    req: web::Json<UpdateProfile>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Profile update for user {}", identity.username);
    let user = state
        .accounts
        .update_profile(identity.id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_me(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.accounts.deactivate(identity.id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "account deactivated"
    })))
}

pub async fn get_user(
    identity: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    let user = state.accounts.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn list_users(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    let users = state.accounts.list_all().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn list_vip_users(
    identity: AuthenticatedUser,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    let users = state.accounts.list_vip().await?;
    Ok(HttpResponse::Ok().json(users))
}

#[derive(Debug, Deserialize)]
pub struct UpgradeQuery {
    pub months: Option<i32>,
}

pub async fn upgrade_to_vip(
    identity: AuthenticatedUser,
    path: web::Path<Uuid>,
    query: web::Query<UpgradeQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    let months = query.months.unwrap_or(1);
    info!(
        "Admin {} upgrading user {} by {} months",
        identity.username, path, months
    );
    let user = state
        .accounts
        .upgrade_to_vip(path.into_inner(), months)
        .await?;
    Ok(HttpResponse::Ok().json(user))
}

pub async fn downgrade_to_regular(
    identity: AuthenticatedUser,
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    identity.require_admin()?;
    info!("Admin {} downgrading user {}", identity.username, path);
    let user = state
        .accounts
        .downgrade_to_regular(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(user))
}
