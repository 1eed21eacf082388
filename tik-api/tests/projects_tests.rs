/// Integration tests for the project endpoints

mod common;

use axum::http::StatusCode;
use common::{today, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_create_project() {
    let ctx = TestContext::new().await.unwrap();
    let user_id = ctx.create_user("johndoe").await;

    let response = ctx
        .post(
            "/projects/",
            json!({ "label": "Backend", "description": "API work", "creator_id": user_id }),
        )
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json();
    assert_eq!(body["label"], "Backend");
    assert_eq!(body["description"], "API work");
    assert_eq!(body["creation_date"], today());
    assert!(body["update_date"].is_null());
    assert_eq!(body["creator"]["id"], user_id);
    assert_eq!(body["creator"]["username"], "johndoe");
    assert_eq!(body["tickets"], json!([]));
    assert!(body["creator"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_unknown_creator_is_integrity_error() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post(
            "/projects/",
            json!({ "label": "Orphan", "description": "", "creator_id": 42 }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["status_code"], 400);

    ctx.get("/projects/").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_stamps_update_date() {
    let ctx = TestContext::new().await.unwrap();
    let user_id = ctx.create_user("johndoe").await;
    let id = ctx.create_project(user_id, "Backend").await;

    let response = ctx
        .put(&format!("/projects/{}", id), json!({ "description": "Rewritten" }))
        .await;

    response.assert_status(StatusCode::OK);
    let body = response.json();
    assert_eq!(body["label"], "Backend");
    assert_eq!(body["description"], "Rewritten");
    assert_eq!(body["update_date"], today());
}

#[tokio::test]
async fn test_empty_update_keeps_update_date() {
    let ctx = TestContext::new().await.unwrap();
    let user_id = ctx.create_user("johndoe").await;
    let id = ctx.create_project(user_id, "Backend").await;

    let before = ctx.get(&format!("/projects/{}", id)).await.json();
    let response = ctx.put(&format!("/projects/{}", id), json!({})).await;

    response.assert_status(StatusCode::OK);
    assert_eq!(response.json(), before);
    assert!(response.json()["update_date"].is_null());
}

#[tokio::test]
async fn test_label_length_bound() {
    let ctx = TestContext::new().await.unwrap();
    let user_id = ctx.create_user("johndoe").await;

    let response = ctx
        .post(
            "/projects/",
            json!({ "label": "p".repeat(101), "description": "", "creator_id": user_id }),
        )
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"], json!(["body", "label"]));
}

#[tokio::test]
async fn test_wrong_type_is_validation_error() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post(
            "/projects/",
            json!({ "label": "Backend", "description": "", "creator_id": "one" }),
        )
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json()["errors"][0]["loc"][0], "body");
}

#[tokio::test]
async fn test_list_projects_with_tickets() {
    let ctx = TestContext::new().await.unwrap();
    let seed = ctx.seed_ticket().await;
    ctx.create_project(seed.user_id, "Frontend").await;

    let response = ctx.get("/projects/").await;

    response.assert_status(StatusCode::OK);
    let projects = response.json();
    assert_eq!(projects.as_array().unwrap().len(), 2);
    assert_eq!(projects[0]["tickets"][0]["id"], seed.ticket_id);
    assert_eq!(projects[1]["tickets"], json!([]));
}

#[tokio::test]
async fn test_delete_project_cascades_to_tickets() {
    let ctx = TestContext::new().await.unwrap();
    let seed = ctx.seed_ticket().await;

    ctx.delete(&format!("/projects/{}", seed.project_id))
        .await
        .assert_status(StatusCode::OK);

    ctx.get(&format!("/tickets/{}", seed.ticket_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    ctx.get(&format!("/users/{}", seed.user_id))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_missing_project() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.delete("/projects/7").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], "Project with ID 7 not found");
}
