//! API integration tests
//!
//! Run against a live server and database:
//! `cargo test --test api_tests -- --ignored`

use chrono::Utc;
use library_server::models::{Role, UserClaims};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

fn token(role: Role) -> String {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-this-secret-in-production".to_string());
    let now = Utc::now().timestamp();
    UserClaims {
        sub: format!("{}-test", role),
        user_id: 1,
        role,
        exp: now + 3600,
        iat: now,
    }
    .create_token(&secret)
    .expect("Failed to sign token")
}

/// Suffix that keeps unique columns apart between runs
fn unique() -> u64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64 % 100_000_000_000
}

async fn create_book(client: &Client, auth: &str, quantity: i32) -> Value {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(auth)
        .json(&json!({
            "title": "Integration Test Book",
            "isbn": format!("T{}", unique()),
            "quantity": quantity
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn create_borrower(client: &Client, auth: &str) -> Value {
    let n = unique();
    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .bearer_auth(auth)
        .json(&json!({
            "first_name": "Jan",
            "last_name": "Kowalski",
            "email": format!("jan{}@example.com", n),
            "phone_number": format!("+48{}", n),
            "pesel": format!("{:011}", n),
            "address": "Ul. Testowa 1",
            "postal_code": "00-001",
            "city": "Warszawa"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

async fn borrow(client: &Client, auth: &str, book_ids: &[i64], borrower_id: i64) -> reqwest::Response {
    client
        .post(format!("{}/loans", BASE_URL))
        .bearer_auth(auth)
        .json(&json!({
            "book_ids": book_ids,
            "borrower_id": borrower_id,
            "loan_date": "2024-01-01",
            "return_date": "2024-01-15"
        }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn get_book(client: &Client, auth: &str, id: i64) -> Value {
    client
        .get(format!("{}/books/{}", BASE_URL, id))
        .bearer_auth(auth)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
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
async fn test_readiness_reaches_database() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
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

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .get(format!("{}/books", BASE_URL))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_reader_cannot_borrow() {
    let client = Client::new();

    let response = borrow(&client, &token(Role::Reader), &[1], 1).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_list_books_paginated() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?page=1&per_page=5", BASE_URL))
        .bearer_auth(token(Role::Reader))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["items"].is_array());
    assert!(body["total"].is_number());
    assert_eq!(body["per_page"], 5);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_last_copy() {
    let client = Client::new();
    let auth = token(Role::Librarian);

    let book = create_book(&client, &auth, 1).await;
    let book_id = book["id"].as_i64().expect("book id");
    let borrower = create_borrower(&client, &auth).await;
    let borrower_id = borrower["id"].as_i64().expect("borrower id");

    let response = borrow(&client, &auth, &[book_id], borrower_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    let loan_id = body["loan_ids"][0].as_i64().expect("loan id");

    let book = get_book(&client, &auth, book_id).await;
    assert_eq!(book["quantity"], 0);
    assert_eq!(book["status"], "borrowed");

    // No copies left
    let response = borrow(&client, &auth, &[book_id], borrower_id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "BookNotAvailable");

    let response = client
        .post(format!("{}/loans/return/{}", BASE_URL, loan_id))
        .bearer_auth(&auth)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "returned");

    // A second return must not add another copy
    let response = client
        .post(format!("{}/loans/return/{}", BASE_URL, loan_id))
        .bearer_auth(&auth)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let book = get_book(&client, &auth, book_id).await;
    assert_eq!(book["quantity"], 1);
    assert_eq!(book["status"], "available");
}

#[tokio::test]
#[ignore]
async fn test_failed_batch_borrows_nothing() {
    let client = Client::new();
    let auth = token(Role::Librarian);

    let in_stock = create_book(&client, &auth, 2).await["id"].as_i64().expect("book id");
    let empty = create_book(&client, &auth, 0).await["id"].as_i64().expect("book id");
    let borrower_id = create_borrower(&client, &auth).await["id"].as_i64().expect("borrower id");

    let response = borrow(&client, &auth, &[in_stock, empty], borrower_id).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(get_book(&client, &auth, in_stock).await["quantity"], 2);

    let response = client
        .get(format!("{}/borrowers/{}/loans", BASE_URL, borrower_id))
        .bearer_auth(&auth)
        .send()
        .await
        .expect("Failed to send request");
    let loans: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(loans.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore]
async fn test_book_with_loans_cannot_be_deleted() {
    let client = Client::new();
    let auth = token(Role::Librarian);

    let book_id = create_book(&client, &auth, 1).await["id"].as_i64().expect("book id");
    let borrower_id = create_borrower(&client, &auth).await["id"].as_i64().expect("borrower id");
    let response = borrow(&client, &auth, &[book_id], borrower_id).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&auth)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_pesel_is_rejected() {
    let client = Client::new();
    let auth = token(Role::Librarian);

    let borrower = create_borrower(&client, &auth).await;

    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .bearer_auth(&auth)
        .json(&json!({
            "first_name": "Anna",
            "last_name": "Nowak",
            "pesel": borrower["pesel"],
            "address": "Ul. Inna 2",
            "postal_code": "00-002",
            "city": "Krakow"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duplicate");
}

#[tokio::test]
#[ignore]
async fn test_loan_history_has_display_status() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/history", BASE_URL))
        .bearer_auth(token(Role::Admin))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let rows: Value = response.json().await.expect("Failed to parse response");
    for row in rows.as_array().expect("array") {
        assert!(row["display_status"].is_string());
    }
}

#[tokio::test]
#[ignore]
async fn test_email_duplicate_ignores_case() {
    let client = Client::new();
    let auth = token(Role::Librarian);

    let borrower = create_borrower(&client, &auth).await;
    let email = borrower["email"].as_str().expect("email").to_uppercase();

    let response = client
        .post(format!("{}/borrowers", BASE_URL))
        .bearer_auth(&auth)
        .json(&json!({
            "first_name": "Anna",
            "last_name": "Nowak",
            "email": email,
            "pesel": format!("{:011}", unique() + 1),
            "address": "Ul. Inna 2",
            "postal_code": "00-002",
            "city": "Krakow"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["message"].as_str().unwrap_or_default().contains("email"));
}

#[tokio::test]
#[ignore]
async fn test_admin_manages_employees() {
    let client = Client::new();
    let auth = token(Role::Admin);
    let pesel = format!("{:011}", unique());

    let response = client
        .post(format!("{}/employees", BASE_URL))
        .bearer_auth(&auth)
        .json(&json!({
            "first_name": "Ewa",
            "last_name": "Bibliotekarz",
            "pesel": pesel,
            "hired_date": "2022-03-01"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let employee: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(employee["hired_date"], "2022-03-01");

    let response = client
        .post(format!("{}/employees", BASE_URL))
        .bearer_auth(&auth)
        .json(&json!({ "first_name": "Adam", "last_name": "Drugi", "pesel": pesel }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Duplicate");

    let response = client
        .delete(format!("{}/employees/{}", BASE_URL, employee["id"]))
        .bearer_auth(&auth)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn test_librarian_cannot_list_employees() {
    let client = Client::new();

    let response = client
        .get(format!("{}/employees", BASE_URL))
        .bearer_auth(token(Role::Librarian))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
