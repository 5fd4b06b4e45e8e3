pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod seed;
pub mod users;
pub mod validation;
pub mod vip;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser};
pub use db::{MemoryStore, PgStore, Store};
pub use users::AccountService;
pub use vip::RequestService;

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub accounts: AccountService,
    pub requests: RequestService,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let store =
            PgStore::connect(&config.database.url, config.database.max_connections).await?;

        sqlx::migrate!("./migrations")
            .run(store.pool())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Wire the services over any store; the test suite uses this with
    /// [`MemoryStore`].
    pub fn with_store(config: Settings, store: Arc<dyn Store>) -> Self {
        let auth = AuthService::new(
            store.clone(),
            config.auth.jwt_secret.clone(),
            config.auth.token_expiry_hours,
        );
        let accounts = AccountService::new(store.clone());
        let requests = RequestService::new(store.clone());

        Self {
            config: Arc::new(config),
            store,
            auth,
            accounts,
            requests,
        }
    }
}

/// The full API route table, shared by `main` and the integration tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::handlers::register))
                    .route("/login", web::post().to(auth::handlers::login)),
            )
            .service(
                web::scope("/users")
                    .route("/me", web::get().to(users::handlers::get_me))
                    .route("/me", web::put().to(users::handlers::update_me))
                    .route("/me", web::delete().to(users::handlers::delete_me))
                    .route("/vip", web::get().to(users::handlers::list_vip_users))
                    .route(
                        "/{id}/upgrade-vip",
                        web::post().to(users::handlers::upgrade_to_vip),
                    )
                    .route(
                        "/{id}/downgrade",
                        web::post().to(users::handlers::downgrade_to_regular),
                    )
                    .route("/{id}", web::get().to(users::handlers::get_user))
                    .route("", web::get().to(users::handlers::list_users)),
            )
            .service(
                web::scope("/vip-requests")
                    .route("/my-requests", web::get().to(vip::handlers::my_requests))
                    .route("/admin/all", web::get().to(vip::handlers::all_requests))
                    .route(
                        "/admin/pending",
                        web::get().to(vip::handlers::pending_requests),
                    )
                    .route(
                        "/admin/{id}/process",
                        web::post().to(vip::handlers::process_request),
                    )
                    .route("/{id}", web::delete().to(vip::handlers::cancel_request))
                    .route("", web::post().to(vip::handlers::create_request)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_with_memory_store() {
        let config = Settings::new_for_test().expect("Failed to load test config");
        let state = AppState::with_store(config, Arc::new(MemoryStore::new()));

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.store, &cloned.store));
    }
}
