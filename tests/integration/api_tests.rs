//! API integration tests
//!
//! Each test drives the full router over a fresh in-memory store.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lendwell::{
    api,
    config::{AppConfig, AuthConfig, DatabaseConfig, LoggingConfig, ServerConfig},
    repository::Repository,
    services::Services,
    AppState,
};

const ADMIN_SECRET: &str = "integration-bootstrap";

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        auth: AuthConfig {
            jwt_secret: "integration-signing-secret".to_string(),
            admin_secret_key: ADMIN_SECRET.to_string(),
            jwt_expiration_hours: 1,
            hash_memory_kib: 64,
            hash_iterations: 1,
            recheck_account_status: true,
        },
        logging: LoggingConfig::default(),
    }
}

fn test_app() -> Router {
    let config = test_config();
    let services = Services::new(Repository::in_memory(), &config.auth).expect("Failed to create services");

    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Send a request and return the status with the decoded JSON body
async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}

fn person(name: &str, email: &str) -> Value {
    json!({
        "name": name,
        "email": email,
        "phone": "555-0100",
        "password": "secret-pw"
    })
}

async fn login(app: &Router, path: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        path,
        None,
        Some(json!({ "email": email, "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Bootstrap the admin and return its token
async fn admin_token(app: &Router) -> String {
    let mut request = person("Root", "root@example.org");
    request["secretKey"] = json!(ADMIN_SECRET);

    let (status, _) = send(app, Method::POST, "/auth/register-admin", None, Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);

    login(app, "/auth/login-admin", "root@example.org").await
}

/// Register and approve a member, return (account id, token)
async fn approved_member(app: &Router, admin: &str, email: &str) -> (String, String) {
    let (status, body) = send(app, Method::POST, "/auth/register", None, Some(person("Member", email))).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["account"]["id"].as_str().expect("No account id").to_string();

    let (status, _) = send(app, Method::PATCH, &format!("/auth/{}/approve", id), Some(admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let token = login(app, "/auth/login", email).await;
    (id, token)
}

async fn add_book(app: &Router, admin: &str, title: &str, copies: i64) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/books/add-books",
        Some(admin),
        Some(json!({
            "title": title,
            "author": "Stanisław Lem",
            "genre": "Science fiction",
            "publishedDate": "1961-01-01",
            "availableCopies": copies
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add book failed: {body}");
    body["book"]["id"].as_str().expect("No book id").to_string()
}

#[tokio::test]
async fn test_health_check() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_member_waits_for_approval() {
    let app = test_app();
    let admin = admin_token(&app).await;

    let (status, body) = send(&app, Method::POST, "/auth/register", None, Some(person("Ada", "ada@example.org"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["role"], "Member");
    assert!(body["account"].get("password").is_none());
    let id = body["account"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.org", "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");

    let (status, body) = send(&app, Method::PATCH, &format!("/auth/{}/approve", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["status"], "Approved");

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "ada@example.org", "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = test_app();
    admin_token(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "root@example.org", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "nobody@example.org", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_bootstrap_happens_once() {
    let app = test_app();
    admin_token(&app).await;

    let mut second = person("Other", "other@example.org");
    second["secretKey"] = json!(ADMIN_SECRET);
    let (status, body) = send(&app, Method::POST, "/auth/register-admin", None, Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Duplicate");

    let mut wrong = person("Other", "other@example.org");
    wrong["secretKey"] = json!("guess");
    let (status, _) = send(&app, Method::POST, "/auth/register-admin", None, Some(wrong)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_librarian_registration_requires_admin() {
    let app = test_app();
    let admin = admin_token(&app).await;

    let mut request = person("Lib", "lib@example.org");
    request["role"] = json!("Librarian");

    let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(request.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::POST, "/auth/register", Some(&admin), Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["account"]["role"], "Librarian");

    // Librarians start approved
    let librarian = login(&app, "/auth/login-librarian", "lib@example.org").await;
    let (status, _) = send(&app, Method::GET, "/books/all-transactions", Some(&librarian), None).await;
    assert_eq!(status, StatusCode::OK);

    let mut admin_request = person("Sneaky", "sneaky@example.org");
    admin_request["role"] = json!("Admin");
    let (status, _) = send(&app, Method::POST, "/auth/register", None, Some(admin_request)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let (_, alice) = approved_member(&app, &admin, "alice@example.org").await;
    let (_, bob) = approved_member(&app, &admin, "bob@example.org").await;
    let book = add_book(&app, &admin, "Solaris", 1).await;

    let (status, body) = send(&app, Method::POST, &format!("/books/borrow-books/{}", book), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["availableCopies"], 0);
    assert!(body["transaction"]["returnedAt"].is_null());

    let (status, body) = send(&app, Method::POST, &format!("/books/borrow-books/{}", book), Some(&bob), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = send(&app, Method::POST, &format!("/books/return-books/{}", book), Some(&bob), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::POST, &format!("/books/return-books/{}", book), Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["availableCopies"], 1);
    assert!(body["transaction"]["returnedAt"].is_string());

    let (status, body) = send(&app, Method::POST, &format!("/books/borrow-books/{}", book), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["availableCopies"], 0);

    let (status, body) = send(&app, Method::GET, "/books/member-transactions", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let transactions = body["transactions"].as_array().expect("transactions array");
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["item"]["title"], "Solaris");

    let (status, body) = send(&app, Method::GET, "/books/member-transactions", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let transactions = body["transactions"].as_array().expect("transactions array");
    assert_eq!(transactions.len(), 1);
    assert!(transactions[0]["returnedAt"].is_null());

    let (status, body) = send(&app, Method::GET, "/books/all-transactions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().map(Vec::len), Some(2));

    let (_, carol) = approved_member(&app, &admin, "carol@example.org").await;
    let (status, body) = send(&app, Method::GET, "/books/member-transactions", Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"], json!([]));
}

#[tokio::test]
async fn test_catalog_management() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let book = add_book(&app, &admin, "Fiasco", 4).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/books/update-books/{}", book),
        Some(&admin),
        Some(json!({ "availableCopies": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book"]["availableCopies"], 0);
    assert_eq!(body["book"]["title"], "Fiasco");

    let (status, body) = send(&app, Method::GET, "/books/all-books", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["books"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(&app, Method::DELETE, &format!("/books/delete-books/{}", book), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::DELETE, &format!("/books/delete-books/{}", book), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_roles_are_enforced() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let (_, member) = approved_member(&app, &admin, "m@example.org").await;

    let body = json!({ "title": "T", "author": "A", "genre": "G", "publishedDate": "2000-01-01" });

    let (status, response) = send(&app, Method::POST, "/books/add-books", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(response["error"], "NotAuthenticated");

    let (status, response) = send(&app, Method::POST, "/books/add-books", Some(&member), Some(body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["error"], "NotAuthorized");

    let (status, _) = send(&app, Method::GET, "/books/all-transactions", Some(&member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/books/member-transactions", Some(&admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/books/member-transactions", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deleted_member_token_stops_working() {
    let app = test_app();
    let admin = admin_token(&app).await;
    let (id, member) = approved_member(&app, &admin, "m@example.org").await;

    let (status, body) = send(&app, Method::DELETE, &format!("/auth/{}/delete", id), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account"]["email"], "m@example.org");

    let (status, _) = send(&app, Method::GET, "/books/member-transactions", Some(&member), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_routes_and_methods_are_not_found() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");

    let (status, body) = send(&app, Method::DELETE, "/books/all-books", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_malformed_input_is_a_bad_request() {
    let app = test_app();
    let admin = admin_token(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("Failed to build request");
    let response = app.clone().oneshot(request).await.expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::PATCH, "/auth/not-a-uuid/approve", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({ "name": "No email", "phone": "1", "password": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
