//! API integration tests
//!
//! These run against a live server; the admin account is provisioned
//! through registration on first use. Run with: cargo test -- --ignored

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";
const ADMIN_EMAIL: &str = "admin@shelfmark.org";
const ADMIN_PASSWORD: &str = "admin-pass";

/// Helper to get an authenticated admin token. Registers the admin
/// identity first (provisioning grants the admin role to the configured
/// email), falling back to login once the account exists.
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send register request");

    if response.status() == 201 {
        let body: Value = response.json().await.expect("Failed to parse response");
        return body["token"].as_str().expect("No token in response").to_string();
    }

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": ADMIN_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Register a throwaway student and return (token, user id)
async fn register_student(client: &Client, email: &str) -> (String, i64) {
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "student-pass",
            "display_name": "Test Student",
            "department": "CSE",
            "course": "BTech"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["token"].as_str().expect("No token").to_string();
    let id = body["user"]["id"].as_i64().expect("No user id");
    (token, id)
}

#[tokio::test]
#[ignore]
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let _ = get_admin_token(&client).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": ADMIN_EMAIL,
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_registration_provisions_student_role() {
    let client = Client::new();
    let (_token, id) = register_student(&client, "provision-test@campus.edu").await;

    let admin_token = get_admin_token(&client).await;
    let response = client
        .get(format!("{}/users/{}", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["role"], "student");

    // Cleanup
    let _ = client
        .delete(format!("{}/users/{}?force=true", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_duplicate_registration_is_a_conflict() {
    let client = Client::new();
    let (_token, id) = register_student(&client, "duplicate-test@campus.edu").await;

    // Same email again, different casing, surfaces as a conflict
    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "email": "Duplicate-Test@campus.edu",
            "password": "another-pass"
        }))
        .send()
        .await
        .expect("Failed to send register request");

    assert_eq!(response.status(), 409);

    // Cleanup
    let admin_token = get_admin_token(&client).await;
    let _ = client
        .delete(format!("{}/users/{}?force=true", BASE_URL, id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    // Create book
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Test Book",
            "author": "Test Author",
            "isbn": "978-0-00-000000-0",
            "total_copies": 2
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["id"].as_i64().expect("No book ID");
    assert_eq!(body["available_copies"], 2);

    // Delete book
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 204);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_cycle() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;
    let (student_token, student_id) = register_student(&client, "borrower@campus.edu").await;

    // Create a single-copy book for the student's department
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({
            "title": "Borrow Cycle Book",
            "department": "CSE",
            "course": "BTech",
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request");
    let book_id = response.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    // Borrow
    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    // Second borrow of the same book is refused
    let response = client
        .post(format!("{}/books/{}/borrow", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // Book is now unavailable
    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.json::<Value>().await.unwrap()["available_copies"], 0);

    // Return
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    // Returning again is a typed error, not a crash
    let response = client
        .post(format!("{}/books/{}/return", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // History shows one closed loan
    let response = client
        .get(format!("{}/me/borrows", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .send()
        .await
        .expect("Failed to send request");
    let history: Value = response.json().await.unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert!(history[0]["return_date"].is_string());

    // Cleanup
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
    let _ = client
        .delete(format!("{}/users/{}?force=true", BASE_URL, student_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_staff_cannot_borrow() {
    let client = Client::new();
    let admin_token = get_admin_token(&client).await;

    let response = client
        .post(format!("{}/books/1/borrow", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_student_cannot_manage_inventory() {
    let client = Client::new();
    let (student_token, student_id) = register_student(&client, "no-write@campus.edu").await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", student_token))
        .json(&json!({ "title": "Should Fail" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    let admin_token = get_admin_token(&client).await;
    let _ = client
        .delete(format!("{}/users/{}?force=true", BASE_URL, student_id))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["books"].is_number());
    assert!(body["users"].is_number());
    assert!(body["borrows"]["active"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_get_settings() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/settings", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan_period_days"], 14);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
