use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, error};

use crate::auth::service::RegisterPayload;
use crate::error::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

pub async fn register(
    req: web::Json<RegisterPayload>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for username: {}", req.username);

    match state.auth.register(req.into_inner()).await {
        Ok(user) => Ok(HttpResponse::Created().json(user)),
        Err(e) => {
            error!("Registration failed: {}", e);
            Err(e)
        }
    }
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received login request for: {}", req.username_or_email);

    match state.auth.login(&req.username_or_email, &req.password).await {
        Ok(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        Err(e) => {
            error!("Login failed for {}: {}", req.username_or_email, e);
            Err(e)
        }
    }
}
