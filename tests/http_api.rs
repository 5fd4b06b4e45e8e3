use actix_web::{test, web, App};
use chrono::DateTime;
use serde_json::{json, Value};
use std::sync::Arc;

use membership_server::{
    configure_api, health_check, seed, AppState, MemoryStore, Settings,
};

fn test_state() -> web::Data<AppState> {
    let config = Settings::new_for_test().expect("Failed to load test config");
    web::Data::new(AppState::with_store(config, Arc::new(MemoryStore::new())))
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .route("/health", web::get().to(health_check))
                .configure(configure_api),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr, $username:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"usernameOrEmail": $username, "password": $password}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&$app, req).await;
        body["token"]
            .as_str()
            .unwrap_or_else(|| panic!("login failed: {}", body))
            .to_string()
    }};
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

#[actix_web::test]
async fn test_health_check() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(DateTime::parse_from_rfc3339(json["timestamp"].as_str().unwrap()).is_ok());
}

#[actix_web::test]
async fn test_register_login_and_profile_flow() {
    let state = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret123",
            "fullName": "Alice Cooper"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);

    // Duplicate username registers as a conflict
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "secret123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let token = login!(app, "alice", "secret123");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["username"], "alice");
    assert_eq!(me["fullName"], "Alice Cooper");
    assert_eq!(me["accountType"], "REGULAR");
    assert!(me.get("passwordHash").is_none());

    // No token, no profile
    let req = test::TestRequest::get().uri("/api/users/me").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_deactivated_account_stops_authenticating() {
    let state = test_state();
    seed::seed_default_accounts(state.store.as_ref())
        .await
        .unwrap();
    let app = test_app!(state);

    let token = login!(app, "user", "user123");

    let req = test::TestRequest::delete()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // The still-valid token no longer resolves to an identity
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    // And the credentials are rejected at login
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"usernameOrEmail": "user", "password": "user123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_admin_endpoints_reject_ordinary_users() {
    let state = test_state();
    seed::seed_default_accounts(state.store.as_ref())
        .await
        .unwrap();
    let app = test_app!(state);

    let user_token = login!(app, "user", "user123");
    let admin_token = login!(app, "admin", "admin123");

    for uri in [
        "/api/users",
        "/api/users/vip",
        "/api/vip-requests/admin/all",
        "/api/vip-requests/admin/pending",
    ] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&user_token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 403, "expected 403 for {}", uri);

        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&admin_token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success(), "expected success for {}", uri);
    }
}

#[actix_web::test]
async fn test_vip_request_approval_end_to_end() {
    let state = test_state();
    seed::seed_default_accounts(state.store.as_ref())
        .await
        .unwrap();
    let app = test_app!(state);

    let user_token = login!(app, "user", "user123");
    let admin_token = login!(app, "admin", "admin123");

    let req = test::TestRequest::post()
        .uri("/api/vip-requests")
        .insert_header(bearer(&user_token))
        .set_json(json!({"requestedMonths": 3, "message": "3 months please"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["status"], "PENDING");
    let request_id = created["id"].as_str().unwrap().to_string();

    // A second request while one is pending is a workflow violation
    let req = test::TestRequest::post()
        .uri("/api/vip-requests")
        .insert_header(bearer(&user_token))
        .set_json(json!({"requestedMonths": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);

    let req = test::TestRequest::get()
        .uri("/api/vip-requests/admin/pending")
        .insert_header(bearer(&admin_token))
        .to_request();
    let pending: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let req = test::TestRequest::post()
        .uri(&format!("/api/vip-requests/admin/{}/process", request_id))
        .insert_header(bearer(&admin_token))
        .set_json(json!({"status": "APPROVED", "adminNote": "enjoy"}))
        .to_request();
    let processed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(processed["status"], "APPROVED");
    assert_eq!(processed["adminNote"], "enjoy");

    // The owner is now VIP with an expiry date
    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&user_token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["accountType"], "VIP");
    assert!(me["vipExpiryDate"].is_string());

    // Processing is one-shot
    let req = test::TestRequest::post()
        .uri(&format!("/api/vip-requests/admin/{}/process", request_id))
        .insert_header(bearer(&admin_token))
        .set_json(json!({"status": "REJECTED"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn test_cancel_own_pending_request() {
    let state = test_state();
    seed::seed_default_accounts(state.store.as_ref())
        .await
        .unwrap();
    let app = test_app!(state);

    let user_token = login!(app, "user", "user123");

    let req = test::TestRequest::post()
        .uri("/api/vip-requests")
        .insert_header(bearer(&user_token))
        .set_json(json!({"requestedMonths": 1}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let request_id = created["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::delete()
        .uri(&format!("/api/vip-requests/{}", request_id))
        .insert_header(bearer(&user_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 204);

    let req = test::TestRequest::get()
        .uri("/api/vip-requests/my-requests")
        .insert_header(bearer(&user_token))
        .to_request();
    let mine: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(mine.as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn test_admin_direct_upgrade_and_downgrade() {
    let state = test_state();
    seed::seed_default_accounts(state.store.as_ref())
        .await
        .unwrap();
    let app = test_app!(state);

    let user_token = login!(app, "user", "user123");
    let admin_token = login!(app, "admin", "admin123");

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&user_token))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    let user_id = me["id"].as_str().unwrap().to_string();

    // months defaults to 1 when the query parameter is omitted
    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/upgrade-vip", user_id))
        .insert_header(bearer(&admin_token))
        .to_request();
    let upgraded: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(upgraded["accountType"], "VIP");
    assert!(upgraded["vipExpiryDate"].is_string());

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/upgrade-vip?months=2", user_id))
        .insert_header(bearer(&admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // Not an admin operation for ordinary callers
    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/downgrade", user_id))
        .insert_header(bearer(&user_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/{}/downgrade", user_id))
        .insert_header(bearer(&admin_token))
        .to_request();
    let downgraded: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(downgraded["accountType"], "REGULAR");
    assert!(downgraded["vipExpiryDate"].is_null());
}
