mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use sqlx::PgPool;

use giftcert_api::services::user_service::NewUser;
use giftcert_api::services::{ServiceError, TakenField, UserService};

use common::{call, unique};

fn admin() -> String {
    common::bearer(1, &["ROLE_ADMIN", "ROLE_USER"])
}

/// Registers and logs in a fresh user; returns (id, login payload)
async fn register_and_login(router: &Router, username: &str) -> (i64, Value) {
    let (status, body) = call(
        router,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": format!("[User] {}", username),
            "email": format!("{}@mail.com", username),
            "username": username,
            "password": username,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["message"], json!("User registered successfully!"));

    let (status, body) = call(
        router,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": username, "password": username})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let id = body["data"]["id"].as_i64().unwrap();
    (id, body["data"].clone())
}

async fn create_certificate(router: &Router, name: &str, price: f64, tags: &[&str]) -> Value {
    let tags: Vec<Value> = tags.iter().map(|t| json!({"name": t})).collect();
    let (status, body) = call(
        router,
        Method::POST,
        "/certificates",
        Some(&admin()),
        Some(json!({"name": name, "price": price, "duration": 5, "tags": tags})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

async fn place_order(router: &Router, user_id: i64, certificate_id: i64) -> Value {
    let (status, body) = call(
        router,
        Method::POST,
        "/orders",
        Some(&common::bearer(user_id, &["ROLE_USER"])),
        Some(json!({"userId": user_id, "certificateId": certificate_id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

fn tag_names(certificate: &Value) -> Vec<String> {
    let mut names: Vec<String> = certificate["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    names.sort();
    names
}

async fn refresh_rows(pool: &PgPool, user_id: i64) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM refreshtoken WHERE customer_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn register_reports_taken_username_and_email() {
    let Some((router, _pool)) = common::database().await else { return };
    let username = unique("taken");
    register_and_login(&router, &username).await;

    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": "other@mail.com", "username": username, "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Error: Username is already taken!"));

    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"email": format!("{}@mail.com", username), "username": unique("other"), "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Error: Email is already in use!"));
}

#[tokio::test]
async fn concurrent_registrations_report_the_taken_username() {
    let Some((_router, pool)) = common::database().await else { return };
    let username = unique("race");
    let request = |email: &str| NewUser {
        name: None,
        email: email.to_string(),
        username: username.clone(),
        password: "pw".to_string(),
        role: None,
    };

    let users = UserService::new(pool.clone());
    let (first, second) = tokio::join!(
        users.register(request(&format!("{}_a@mail.com", username))),
        users.register(request(&format!("{}_b@mail.com", username))),
    );

    let (ok, err) = match (first, second) {
        (Ok(user), Err(err)) | (Err(err), Ok(user)) => (user, err),
        other => panic!("exactly one registration must succeed: {:?}", other),
    };
    assert_eq!(ok.user.username, username);
    assert!(matches!(err, ServiceError::AlreadyTaken(TakenField::Username)), "{:?}", err);
}

#[tokio::test]
async fn login_keeps_one_refresh_token_per_user() {
    let Some((router, pool)) = common::database().await else { return };
    let username = unique("session");
    let (user_id, first) = register_and_login(&router, &username).await;
    assert_eq!(first["type"], json!("Bearer"));
    assert_eq!(refresh_rows(&pool, user_id).await, 1);

    let (status, second) = call(
        &router,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({"username": username, "password": username})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refresh_rows(&pool, user_id).await, 1);

    // The first login's token was replaced
    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/refreshtoken",
        None,
        Some(json!({"refreshToken": first["refreshToken"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Refresh token is not in database!"));

    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/refreshtoken",
        None,
        Some(json!({"refreshToken": second["data"]["refreshToken"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["refreshToken"], second["data"]["refreshToken"]);
    assert_eq!(body["data"]["tokenType"], json!("Bearer"));
    assert!(body["data"]["accessToken"].is_string());
}

#[tokio::test]
async fn expired_refresh_token_is_removed() {
    let Some((router, pool)) = common::database().await else { return };
    let (user_id, login) = register_and_login(&router, &unique("expired")).await;

    sqlx::query("UPDATE refreshtoken SET expiry_date = now() - interval '1 minute' WHERE customer_id = $1")
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

    let (status, body) = call(
        &router,
        Method::POST,
        "/auth/refreshtoken",
        None,
        Some(json!({"refreshToken": login["refreshToken"]})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Refresh token was expired. Please make a new login request"));
    assert_eq!(refresh_rows(&pool, user_id).await, 0);
}

#[tokio::test]
async fn certificate_tags_are_found_or_created_and_replaced() {
    let Some((router, pool)) = common::database().await else { return };
    let (a, b, c) = (unique("tag_a"), unique("tag_b"), unique("tag_c"));

    let (status, existing) = call(&router, Method::POST, "/tags", Some(&admin()), Some(json!({"name": a}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let certificate = create_certificate(&router, &unique("Spa"), 15.5, &[&a, &b]).await;
    let mut expected = vec![a.clone(), b.clone()];
    expected.sort();
    assert_eq!(tag_names(&certificate), expected);
    let reused = certificate["tags"].as_array().unwrap().iter().find(|t| t["name"] == json!(a)).unwrap();
    assert_eq!(reused["id"], existing["data"]["id"]);

    let (status, patched) = call(
        &router,
        Method::PATCH,
        "/certificates",
        Some(&admin()),
        Some(json!({"id": certificate["id"], "tags": [{"name": b}, {"name": c}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", patched);
    let mut expected = vec![b.clone(), c.clone()];
    expected.sort();
    assert_eq!(tag_names(&patched["data"]), expected);
    assert_eq!(patched["data"]["name"], certificate["name"]);

    // Detached tags stay in the catalogue
    let still_there: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tag WHERE name = $1)")
        .bind(&a)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(still_there);
}

#[tokio::test]
async fn top_used_tag_counts_ordered_certificates() {
    let Some((router, _pool)) = common::database().await else { return };
    let (first, second) = (unique("top_1"), unique("top_2"));
    let (user_id, _) = register_and_login(&router, &unique("buyer")).await;
    let uri = format!("/tags/top-used-tag?userId={}", user_id);
    let auth = common::bearer(user_id, &["ROLE_USER"]);

    let (status, body) = call(&router, Method::GET, &uri, Some(&auth), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!(format!("Requested resource not found (userId = {})", user_id)));

    // Tie: both tags used once, the lower id wins
    let both = create_certificate(&router, &unique("Both"), 10.0, &[&first, &second]).await;
    place_order(&router, user_id, both["id"].as_i64().unwrap()).await;
    let (status, body) = call(&router, Method::GET, &uri, Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!(first));

    let only_second = create_certificate(&router, &unique("Second"), 20.0, &[&second]).await;
    place_order(&router, user_id, only_second["id"].as_i64().unwrap()).await;
    let (_, body) = call(&router, Method::GET, &uri, Some(&auth), None).await;
    assert_eq!(body["data"]["name"], json!(second));

    let (status, _) = call(&router, Method::GET, "/tags/top-used-tag?userId=999999999", Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn highest_cost_and_order_price_capture() {
    let Some((router, _pool)) = common::database().await else { return };
    let (user_id, _) = register_and_login(&router, &unique("cost")).await;
    let uri = format!("/orders/cost?userId={}", user_id);

    let (status, body) = call(&router, Method::GET, &uri, Some(&admin()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["highestCost"].as_f64(), Some(0.0));

    let cheap = create_certificate(&router, &unique("Cheap"), 12.4, &[]).await;
    let dear = create_certificate(&router, &unique("Dear"), 99.99, &[]).await;
    let order = place_order(&router, user_id, cheap["id"].as_i64().unwrap()).await;
    assert_eq!(order["price"].as_f64(), Some(12.4));
    place_order(&router, user_id, dear["id"].as_i64().unwrap()).await;

    let (_, body) = call(&router, Method::GET, &uri, Some(&admin()), None).await;
    assert_eq!(body["data"]["highestCost"].as_f64(), Some(99.99));
}

#[tokio::test]
async fn ordered_users_and_certificates_cannot_be_deleted() {
    let Some((router, _pool)) = common::database().await else { return };
    let (user_id, _) = register_and_login(&router, &unique("keeper")).await;
    let certificate = create_certificate(&router, &unique("Kept"), 30.0, &[]).await;
    let certificate_id = certificate["id"].as_i64().unwrap();
    place_order(&router, user_id, certificate_id).await;

    let (status, body) = call(&router, Method::DELETE, &format!("/users/{}", user_id), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("User cannot be deleted - has found in (1) orders"));

    let (status, body) =
        call(&router, Method::DELETE, &format!("/certificates/{}", certificate_id), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], json!("Gift certificate cannot be deleted - has found in (1) orders"));

    let unused = create_certificate(&router, &unique("Unused"), 1.0, &[]).await;
    let (status, body) =
        call(&router, Method::DELETE, &format!("/certificates/{}", unused["id"]), Some(&admin()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn oversized_prices_are_rejected_before_the_insert() {
    let Some((router, _pool)) = common::database().await else { return };
    let (status, body) = call(
        &router,
        Method::POST,
        "/certificates",
        Some(&admin()),
        Some(json!({"name": unique("Huge"), "price": 1e11})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["price"].is_string());
}

#[tokio::test]
async fn create_admin_grants_both_roles_at_once() {
    let Some((_router, pool)) = common::database().await else { return };
    let username = unique("root");
    let request = || NewUser {
        name: Some("Root".to_string()),
        email: format!("{}@mail.com", username),
        username: username.clone(),
        password: "secret".to_string(),
        role: None,
    };

    let users = UserService::new(pool.clone());
    let admin = users.create_admin(request()).await.unwrap();
    assert!(admin.is_admin());
    assert_eq!(admin.role_names(), vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()]);

    let err = users.create_admin(request()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ref m) if m == "Username is already taken!"));

    let accounts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer WHERE username = $1")
        .bind(&username)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(accounts, 1);
}
