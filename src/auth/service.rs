use chrono::{Duration, Utc};
use jsonwebtoken::{encode, decode, Header, EncodingKey, DecodingKey, Validation, Algorithm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::identity::AuthenticatedUser;
use crate::auth::password::{hash_password, verify_password};
use crate::db::{Store, User};
use crate::error::AppError;
use crate::users::UserResponse;
use crate::validation;
use crate::Result;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // User ID
    pub exp: i64,     // Expiration time
    pub iat: i64,     // Issued at
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    jwt_secret: String,
    token_expiry_hours: i64,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, jwt_secret: String, token_expiry_hours: i64) -> Self {
        Self {
            store,
            jwt_secret,
            token_expiry_hours,
        }
    }

    pub async fn register(&self, payload: RegisterPayload) -> Result<UserResponse> {
        validation::validate_username(&payload.username)?;
        validation::validate_email(&payload.email)?;
        validation::validate_password(&payload.password)?;

        if self
            .store
            .find_user_by_username(&payload.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("username already exists".into()));
        }

        if self
            .store
            .find_user_by_email(&payload.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("email already exists".into()));
        }

        let mut user = User::new(
            payload.username,
            payload.email,
            hash_password(&payload.password)?,
        );
        user.full_name = payload.full_name;
        user.phone_number = payload.phone_number;

        let user = self.store.insert_user(&user).await?;
        info!("Registered user {} ({})", user.username, user.id);

        Ok(UserResponse::from(&user))
    }

    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<LoginOutcome> {
        let mut user = self
            .store
            .find_user_by_login(username_or_email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("invalid credentials".into()))?;

        if !verify_password(&user.password_hash, password)? {
            return Err(AppError::Unauthorized("invalid credentials".into()));
        }

        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".into()));
        }

        let now = Utc::now();
        user.last_login_at = Some(now);
        user.updated_at = now;
        let user = self.store.update_user(&user).await?;

        let token = self.generate_token(&user.id.to_string())?;
        info!("Login successful for user {}", user.username);

        Ok(LoginOutcome {
            token,
            expires_in: self.token_expiry_hours * 3600,
            user: UserResponse::from(&user),
        })
    }

    /// Resolve a bearer token to the calling user. Deactivated or deleted
    /// accounts do not authenticate even while their token is still valid.
    pub async fn resolve_identity(&self, token: &str) -> Result<AuthenticatedUser> {
        let claims = self.decode_token(token)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Unauthorized("invalid token".into()))?;

        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("user not found".into()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized("account is deactivated".into()));
        }

        Ok(AuthenticatedUser {
            id: user.id,
            username: user.username,
            role: user.role,
        })
    }

    fn generate_token(&self, user_id: &str) -> Result<String> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.token_expiry_hours)).timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;

        Ok(token)
    }

    fn decode_token(&self, token: &str) -> Result<Claims> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(claims.claims)
    }
}
