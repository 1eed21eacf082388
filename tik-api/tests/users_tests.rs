/// Integration tests for the user endpoints

mod common;

use axum::http::StatusCode;
use common::{user_body, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_create_user_hides_password() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.post("/users/", user_body("johndoe")).await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["username"], "johndoe");
    assert_eq!(body["email"], "johndoe@example.com");
    assert_eq!(body["projects"], json!([]));
    assert_eq!(body["tickets"], json!([]));
    assert_eq!(body["comments"], json!([]));
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_user("johndoe").await;

    let hash: String = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();

    assert!(hash.starts_with("$argon2id$"));
    assert!(!hash.contains("password123"));
}

#[tokio::test]
async fn test_post_then_get_is_identical() {
    let ctx = TestContext::new().await.unwrap();

    let created = ctx.post("/users/", user_body("johndoe")).await;
    created.assert_status(StatusCode::CREATED);
    let id = created.json()["id"].as_i64().unwrap();

    let fetched = ctx.get(&format!("/users/{}", id)).await;
    fetched.assert_status(StatusCode::OK);
    assert_eq!(fetched.json(), created.json());
}

#[tokio::test]
async fn test_pagination_of_two_users() {
    let ctx = TestContext::new().await.unwrap();
    ctx.create_user("alice").await;
    ctx.create_user("bob").await;

    let response = ctx.get("/users/?page=1&size=10").await;

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 10);
    assert_eq!(body["pages"], 1);
    assert_eq!(body["items"][0]["username"], "alice");
    assert_eq!(body["items"][1]["username"], "bob");
    assert_eq!(body["links"]["first"], "/users/?page=1&size=10");
    assert_eq!(body["links"]["last"], "/users/?page=1&size=10");
    assert!(body["links"]["previous"].is_null());
    assert!(body["links"]["next"].is_null());
}

#[tokio::test]
async fn test_pagination_defaults_and_navigation() {
    let ctx = TestContext::new().await.unwrap();
    for name in ["u1", "u2", "u3"] {
        ctx.create_user(name).await;
    }

    let response = ctx.get("/users/").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["page"], 1);
    assert_eq!(response.json()["size"], 50);

    let response = ctx.get("/users/?page=2&size=1").await;
    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["username"], "u2");
    assert_eq!(body["pages"], 3);
    assert_eq!(body["links"]["previous"], "/users/?page=1&size=1");
    assert_eq!(body["links"]["next"], "/users/?page=3&size=1");
}

#[tokio::test]
async fn test_page_past_the_end_is_not_found() {
    let ctx = TestContext::new().await.unwrap();
    ctx.create_user("alice").await;

    let response = ctx.get("/users/?page=5&size=10").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], "No users found");
}

#[tokio::test]
async fn test_page_bounds_are_validated() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/users/?page=0").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"], json!(["query", "page"]));

    let response = ctx.get("/users/?size=101").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"], json!(["query", "size"]));
    assert_eq!(response.json()["errors"][0]["type"], "less_than_equal");

    let response = ctx.get("/users/?size=ten").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["type"], "int_parsing");
}

#[tokio::test]
async fn test_page_beyond_offset_range_is_validated() {
    let ctx = TestContext::new().await.unwrap();
    ctx.create_user("alice").await;

    let response = ctx.get("/users/?page=9223372036854775807&size=50").await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"], json!(["query", "page"]));
    assert_eq!(response.json()["errors"][0]["type"], "less_than_equal");

    let response = ctx.get("/comments/?page=9223372036854775807").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"], json!(["query", "page"]));
}

#[tokio::test]
async fn test_invalid_user_body() {
    let ctx = TestContext::new().await.unwrap();

    let mut body = user_body("johndoe");
    body["email"] = json!("not-an-email");
    body["password"] = json!("short");

    let response = ctx.post("/users/", body).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let errors = response.json()["errors"].clone();
    assert_eq!(errors.as_array().unwrap().len(), 2);
    assert_eq!(errors[0]["loc"], json!(["body", "email"]));
    assert_eq!(errors[1]["loc"], json!(["body", "password"]));
    assert_eq!(errors[1]["type"], "string_too_short");
}

#[tokio::test]
async fn test_duplicate_username_is_integrity_error() {
    let ctx = TestContext::new().await.unwrap();
    ctx.create_user("johndoe").await;

    let mut body = user_body("johndoe");
    body["email"] = json!("other@example.com");

    let response = ctx.post("/users/", body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_partial_update() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_user("johndoe").await;

    let response = ctx
        .put(&format!("/users/{}", id), json!({ "first_name": "Jane" }))
        .await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json()["first_name"], "Jane");
    assert_eq!(response.json()["last_name"], "Doe");
    assert_eq!(response.json()["username"], "johndoe");
}

#[tokio::test]
async fn test_empty_update_returns_current_state() {
    let ctx = TestContext::new().await.unwrap();
    let created = ctx.post("/users/", user_body("johndoe")).await;
    let id = created.json()["id"].as_i64().unwrap();

    let response = ctx.put(&format!("/users/{}", id), json!({})).await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json(), created.json());
}

#[tokio::test]
async fn test_password_update_is_rehashed() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_user("johndoe").await;

    let response = ctx
        .put(&format!("/users/{}", id), json!({ "password": "new-password" }))
        .await;
    response.assert_status(StatusCode::OK);

    let old = ctx
        .post("/auth/token", json!({ "username": "johndoe", "password": "password123" }))
        .await;
    old.assert_status(StatusCode::UNAUTHORIZED);

    let new = ctx
        .post("/auth/token", json!({ "username": "johndoe", "password": "new-password" }))
        .await;
    new.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_update_invalid_email_is_validation_error() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_user("johndoe").await;

    let response = ctx
        .put(&format!("/users/{}", id), json!({ "email": "nope" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"], json!(["body", "email"]));
}

#[tokio::test]
async fn test_delete_user_cascades() {
    let ctx = TestContext::new().await.unwrap();
    let seed = ctx.seed_ticket().await;
    let comment_id = ctx
        .create_comment(seed.user_id, seed.ticket_id, "Reproduced")
        .await;

    let response = ctx.delete(&format!("/users/{}", seed.user_id)).await;
    response.assert_status(StatusCode::OK);

    ctx.get(&format!("/users/{}", seed.user_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    ctx.get(&format!("/projects/{}", seed.project_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    ctx.get(&format!("/tickets/{}", seed.ticket_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    ctx.get(&format!("/comments/{}", comment_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // Labels are not owned by the user and survive.
    ctx.get(&format!("/statuses/{}", seed.status_id))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_user_view_lists_created_entities() {
    let ctx = TestContext::new().await.unwrap();
    let seed = ctx.seed_ticket().await;
    ctx.create_comment(seed.user_id, seed.ticket_id, "First").await;

    let response = ctx.get(&format!("/users/{}", seed.user_id)).await;

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["projects"][0]["label"], "Backend");
    assert_eq!(body["tickets"][0]["title"], "Login fails");
    assert_eq!(body["tickets"][0]["status"]["label"], "Open");
    assert_eq!(body["comments"][0]["content"], "First");
}
