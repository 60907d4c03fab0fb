//! End-to-end tests of the REST surface built by `ServerBuilder`

mod harness;

use anycrud::prelude::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use harness::*;
use serde_json::{Value, json};

fn make_server() -> (TestServer, InMemoryDatabase) {
    let db = InMemoryDatabase::new();
    let server = TestServer::new(build_app(db.clone())).unwrap();
    (server, db)
}

async fn create_widget(server: &TestServer, name: &str) -> i64 {
    let response = server
        .post("/api/Widget")
        .json(&json!({ "name": name }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["data"]["data"]["id"].as_i64().unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_routes() {
    let (server, _) = make_server();

    for path in ["/health", "/healthz"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
async fn test_create_returns_envelope_with_assigned_id() {
    let (server, db) = make_server();

    let response = server
        .post("/api/Widget")
        .json(&json!({ "name": "Alpha", "code": "A-1" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Widget created");
    assert_eq!(body["data"]["rows_affected"], 1);
    assert_eq!(body["data"]["data"]["name"], "Alpha");
    assert_eq!(body["data"]["data"]["code"], "A-1");
    assert!(body["data"]["data"]["deleted_date"].is_null());

    let id = body["data"]["data"]["id"].as_i64().unwrap();
    assert!(id > 0);
    assert!(db.find::<Widget>(id).unwrap().is_some());
}

#[tokio::test]
async fn test_read_defaults_and_page_envelope() {
    let (server, _) = make_server();
    for i in 0..12 {
        create_widget(&server, &format!("w{}", i)).await;
    }

    let response = server.get("/api/Widget").await;
    response.assert_status_ok();
    let body: Value = response.json();
    let page = &body["data"]["data"];
    assert_eq!(page["current_page"], 1);
    assert_eq!(page["page_size"], 10);
    assert_eq!(page["row_count"], 12);
    assert_eq!(page["page_count"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["rows_affected"], 10);
    assert_eq!(
        body["message"],
        "Widget: 12 items. 10 per page, showing page 1 of 2."
    );

    let second = server
        .get("/api/Widget")
        .add_query_param("page", 2)
        .await;
    let body: Value = second.json();
    assert_eq!(body["data"]["data"]["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_read_all_pages_and_filter() {
    let (server, _) = make_server();
    create_widget(&server, "Alpha").await;
    create_widget(&server, "Beta").await;
    create_widget(&server, "Alpine").await;

    let response = server
        .get("/api/Widget")
        .add_query_param("page", -1)
        .add_query_param("filter", "Alp")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let names: Vec<&str> = body["data"]["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "Alpine"]);
    assert_eq!(
        body["message"],
        "Widget: 2 items. Showing all items (no pagination)."
    );
}

#[tokio::test]
async fn test_update_round_trip() {
    let (server, db) = make_server();
    let id = create_widget(&server, "before").await;

    let response = server
        .put("/api/Widget")
        .json(&json!({ "id": id, "name": "after" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["rows_affected"], 1);
    assert_eq!(db.find::<Widget>(id).unwrap().unwrap().name, "after");
}

#[tokio::test]
async fn test_update_of_unknown_row_is_server_error() {
    let (server, _) = make_server();

    let response = server
        .put("/api/Widget")
        .json(&json!({ "id": 404, "name": "ghost" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["code"], "ROW_NOT_FOUND");
    assert_eq!(body["details"]["id"], 404);
}

#[tokio::test]
async fn test_unassignable_id_is_bad_request() {
    let (server, _) = make_server();
    create_widget(&server, "first").await;

    let response = server
        .post("/api/Widget")
        .json(&json!({ "id": i64::MAX, "name": "last" }))
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "KEY_OUT_OF_RANGE");
    assert_eq!(body["details"]["id"], i64::MAX);

    let listed: Value = server.get("/api/Widget").await.json();
    assert_eq!(listed["data"]["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_soft_delete_then_recover() {
    let (server, _) = make_server();
    let id = create_widget(&server, "Alpha").await;

    let deleted = server.delete(&format!("/api/Widget/{}", id)).await;
    deleted.assert_status_ok();
    let body: Value = deleted.json();
    assert_eq!(body["message"], format!("Widget {} soft-deleted", id));
    assert!(body["data"]["data"]["deleted_date"].is_string());

    let active = server
        .get("/api/Widget")
        .add_query_param("include_deleted", false)
        .await;
    let body: Value = active.json();
    assert_eq!(body["data"]["data"]["row_count"], 0);

    let only_deleted = server
        .get("/api/Widget")
        .add_query_param("include_deleted", true)
        .add_query_param("exclude_actived", true)
        .await;
    let body: Value = only_deleted.json();
    assert_eq!(body["data"]["data"]["row_count"], 1);

    let recovered = server.put(&format!("/api/Widget/{}/recover", id)).await;
    recovered.assert_status_ok();
    let body: Value = recovered.json();
    assert_eq!(body["data"]["rows_affected"], 1);
    assert!(body["data"]["data"]["deleted_date"].is_null());
}

#[tokio::test]
async fn test_hard_delete_then_recover_is_not_found() {
    let (server, db) = make_server();
    let id = create_widget(&server, "gone").await;

    server
        .delete(&format!("/api/Widget/{}", id))
        .add_query_param("save_data", false)
        .await
        .assert_status_ok();
    assert_eq!(db.len::<Widget>().unwrap(), 0);

    server
        .put(&format!("/api/Widget/{}/recover", id))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server
        .delete(&format!("/api/Widget/{}", id))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_by_key() {
    let (server, _) = make_server();
    create_widget(&server, "Alpha").await;

    let found = server
        .get("/api/Widget/by-key")
        .add_query_param("key", "Name")
        .add_query_param("value", "Alpha")
        .await;
    found.assert_status_ok();
    let body: Value = found.json();
    assert_eq!(body["data"]["data"]["name"], "Alpha");
    assert_eq!(body["data"]["rows_affected"], 1);

    let missing = server
        .get("/api/Widget/by-key")
        .add_query_param("key", "name")
        .add_query_param("value", "NoSuchName")
        .await;
    missing.assert_status_ok();
    let body: Value = missing.json();
    assert!(body["data"]["data"].is_null());
    assert_eq!(body["data"]["rows_affected"], 1);
}

// =============================================================================
// Parameter validation
// =============================================================================

#[tokio::test]
async fn test_invalid_read_parameters_rejected() {
    let (server, _) = make_server();

    for (name, value) in [("page", 0), ("page", -2), ("page_size", 0)] {
        let response = server
            .get("/api/Widget")
            .add_query_param(name, value)
            .expect_failure()
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_PARAMETER");
        assert_eq!(body["details"]["parameter"], name);
    }
}

#[tokio::test]
async fn test_exclude_active_without_deleted_is_bad_request() {
    let (server, _) = make_server();

    let response = server
        .get("/api/Widget")
        .add_query_param("include_deleted", false)
        .add_query_param("exclude_actived", true)
        .expect_failure()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_FLAG_COMBINATION");
}

#[tokio::test]
async fn test_non_positive_ids_rejected() {
    let (server, _) = make_server();

    server
        .delete("/api/Widget/0")
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .put("/api/Widget/-1/recover")
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .put("/api/Widget")
        .json(&json!({ "name": "no id" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_key_lookup_parameters_checked() {
    let (server, _) = make_server();

    server
        .get("/api/Widget/by-key")
        .add_query_param("key", "name")
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let unknown = server
        .get("/api/Widget/by-key")
        .add_query_param("key", "colour")
        .add_query_param("value", "red")
        .expect_failure()
        .await;
    unknown.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = unknown.json();
    assert_eq!(body["code"], "UNKNOWN_FIELD");
}

#[tokio::test]
async fn test_searching_type_without_text_is_bad_request() {
    let (server, _) = make_server();

    server
        .post("/api/Counter")
        .json(&json!({ "value": 1 }))
        .await
        .assert_status_ok();

    let response = server.get("/api/Counter").expect_failure().await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "NO_TEXTUAL_FIELDS");
}

// =============================================================================
// Discovery surface
// =============================================================================

#[tokio::test]
async fn test_unmarked_type_has_no_routes() {
    let (server, _) = make_server();

    server
        .get("/api/AuditEntry")
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);
    server.get("/api/Customer").await.assert_status_ok();
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_issues_bearer_token() {
    let (server, _) = make_server();

    let response = server
        .post("/api/User/login")
        .json(&json!({ "username": "ada", "secret": "lovelace" }))
        .await;
    response.assert_status_ok();

    let token: String = response.json();
    let raw = token.strip_prefix("Bearer ").unwrap();
    assert_eq!(raw.split('.').count(), 3);
}

#[tokio::test]
async fn test_login_failures() {
    let (server, _) = make_server();

    server
        .post("/api/User/login")
        .json(&json!({ "username": "ada", "secret": "wrong" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    server
        .post("/api/User/login")
        .json(&json!({ "username": "grace", "secret": "hopper" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::NOT_FOUND);

    server
        .post("/api/User/login")
        .json(&json!({ "username": "", "secret": "" }))
        .expect_failure()
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}
