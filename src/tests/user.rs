use axum::http::{StatusCode, header::SET_COOKIE};
use chrono::Utc;
use serde_json::json;

use super::helpers::{
    cookie_header, create_test_app, session_cookies, setup_test_db, test_request,
    test_token_service,
};
use crate::models::jwt::Claims;
use crate::models::user::Role;
use crate::services::auth_service::REFRESHED_TOKEN_MESSAGE;

const HOUR: i64 = 3600;
const WEEK: i64 = 7 * 24 * 3600;

fn claims(username: &str, email: &str, role: Role, age_secs: i64, ttl_secs: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        username: Some(username.to_string()),
        email: Some(email.to_string()),
        role: Some(role),
        id: None,
        iat: now - age_secs,
        exp: now - age_secs + ttl_secs,
    }
}

/// Signs a session pair with the test secret so protected endpoints can be
/// exercised without going through login.
fn signed_session(access: &Claims, refresh: &Claims) -> String {
    let tokens = test_token_service();
    let access_token = tokens.issue(access).unwrap();
    let refresh_token = tokens.issue(refresh).unwrap();
    cookie_header(&[
        ("accessToken", access_token.as_str()),
        ("refreshToken", refresh_token.as_str()),
    ])
}

async fn register(app: &axum::Router, username: &str, email: &str) {
    let data = json!({
        "username": username,
        "email": email,
        "password": "password123"
    });
    let (status, _, _) = test_request(app.clone(), "POST", "/api/register", Some(data), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn get_users_requires_cookies() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    let (status, body, _) = test_request(app, "GET", "/api/users", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn get_users_denies_regular_role() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    let cookies = signed_session(
        &claims("tester", "t@test.com", Role::Regular, 0, HOUR),
        &claims("tester", "t@test.com", Role::Regular, 0, WEEK),
    );
    let (status, body, _) = test_request(app, "GET", "/api/users", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn get_users_allows_admin_role() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    register(&app, "alice", "alice@example.com").await;
    register(&app, "bob", "bob@example.com").await;

    let cookies = signed_session(
        &claims("root", "root@test.com", Role::Admin, 0, HOUR),
        &claims("root", "root@test.com", Role::Admin, 0, WEEK),
    );
    let (status, body, _) = test_request(app, "GET", "/api/users", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::OK);
    let users = body["data"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["username"], "alice");
    assert!(body.get("refreshedTokenMessage").is_none());
}

#[tokio::test]
async fn get_user_allows_self_via_login_session() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    register(&app, "alice", "alice@example.com").await;
    let login_data = json!({
        "email": "alice@example.com",
        "password": "password123"
    });
    let (_, _, login_headers) =
        test_request(app.clone(), "POST", "/api/login", Some(login_data), None).await;
    let cookies = session_cookies(&login_headers);

    let (status, body, _) =
        test_request(app, "GET", "/api/users/alice", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn get_user_denies_other_regular_user() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    register(&app, "alice", "alice@example.com").await;

    let cookies = signed_session(
        &claims("bob", "bob@example.com", Role::Regular, 0, HOUR),
        &claims("bob", "bob@example.com", Role::Regular, 0, WEEK),
    );
    let (status, body, _) =
        test_request(app, "GET", "/api/users/alice", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn get_user_allows_admin_fallback() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    register(&app, "alice", "alice@example.com").await;

    let cookies = signed_session(
        &claims("root", "root@test.com", Role::Admin, 0, HOUR),
        &claims("root", "root@test.com", Role::Admin, 0, WEEK),
    );
    let (status, body, _) =
        test_request(app, "GET", "/api/users/alice", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
}

#[tokio::test]
async fn expired_access_token_is_renewed_transparently() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    register(&app, "alice", "alice@example.com").await;

    // access signed 2 hours ago (expired), refresh signed a minute ago
    let cookies = signed_session(
        &claims("alice", "alice@example.com", Role::Regular, 2 * HOUR, HOUR),
        &claims("alice", "alice@example.com", Role::Regular, 60, WEEK),
    );
    let (status, body, headers) =
        test_request(app, "GET", "/api/users/alice", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["refreshedTokenMessage"], REFRESHED_TOKEN_MESSAGE);

    // the replacement access cookie is set and holds a verifiable token
    let set_cookie = headers
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("renewal must set a cookie");
    assert!(set_cookie.starts_with("accessToken="));
    let token = set_cookie
        .trim_start_matches("accessToken=")
        .split(';')
        .next()
        .unwrap();
    let renewed = test_token_service().verify(token).unwrap();
    assert_eq!(renewed.username.as_deref(), Some("alice"));
    assert_eq!(renewed.exp - renewed.iat, HOUR);
}

#[tokio::test]
async fn mismatched_session_is_denied() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    let cookies = signed_session(
        &claims("alice", "alice@example.com", Role::Regular, 0, HOUR),
        &claims("bob", "bob@example.com", Role::Regular, 0, WEEK),
    );
    let (status, body, _) =
        test_request(app, "GET", "/api/users/alice", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Mismatched users");
}

#[tokio::test]
async fn dead_session_must_login_again() {
    let pool = setup_test_db().await;
    let app = create_test_app(pool);

    let age = 8 * 24 * 3600;
    let cookies = signed_session(
        &claims("alice", "alice@example.com", Role::Regular, age, HOUR),
        &claims("alice", "alice@example.com", Role::Regular, age, WEEK),
    );
    let (status, body, _) =
        test_request(app, "GET", "/api/users/alice", None, Some(&cookies)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Perform login again");
}
