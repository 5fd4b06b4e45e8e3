use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use uuid::Uuid;

use crate::db::Role;
use crate::error::AppError;
use crate::AppState;
use crate::Result;

/// The calling user, resolved once at the HTTP boundary and passed into
/// services explicitly. There is no ambient identity anywhere below the
/// handler layer.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<()> {
        if !self.is_admin() {
            return Err(AppError::Forbidden("admin role required".into()));
        }
        Ok(())
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("application state is not configured".into()))?;

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .ok_or_else(|| AppError::Unauthorized("no authorization token provided".into()))?
                .to_string();

            state.auth.resolve_identity(&token).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> AuthenticatedUser {
        AuthenticatedUser {
            id: Uuid::new_v4(),
            username: "someone".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_admin() {
        assert!(identity(Role::Admin).require_admin().is_ok());

        let err = identity(Role::User).require_admin().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
