//! End-to-end checks of the document API over a real socket, backed by the
//! in-memory store.

use reqwest::StatusCode;
use serde_json::{Value, json};
use vellum::routes;
use vellum::state::{AppState, DocumentStore};

async fn spawn_server() -> String {
    let app = routes::app(AppState::new(DocumentStore::memory()), 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn pages(object_id: &str) -> Value {
    json!([{
        "id": "p1",
        "name": "Page 1",
        "backgroundColor": { "hex": "#ffffff", "rgba": "RGBA(255, 255, 255, 1)", "alpha": 1 },
        "objects": [{ "type": "rect", "id": object_id, "left": 5, "top": 6, "width": 70, "height": 80 }]
    }])
}

#[tokio::test]
async fn healthz_is_ok() {
    let base = spawn_server().await;
    let resp = reqwest::get(format!("{base}/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_load_save_round() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client.post(format!("{base}/api/documents")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_owned();

    let doc: Value = client
        .get(format!("{base}/api/documents/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["name"], "New Draft");
    assert_eq!(doc["pages"][0]["name"], "Page 1");
    let created_at = doc["createdAt"].as_i64().unwrap();

    let resp = client
        .put(format!("{base}/api/documents/{id}"))
        .json(&json!({ "pages": pages("r1"), "updatedAt": created_at + 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let doc: Value = client
        .get(format!("{base}/api/documents/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["updatedAt"].as_i64(), Some(created_at + 10));
    assert_eq!(doc["pages"][0]["objects"][0]["id"], "r1");
    assert_eq!(doc["pages"][0]["objects"][0]["type"], "rect");
    assert_eq!(doc["pages"][0]["backgroundColor"]["hex"], "#ffffff");

    // The editor's clock may lag the server's; its saves still land.
    let resp = client
        .put(format!("{base}/api/documents/{id}"))
        .json(&json!({ "pages": pages("r2"), "updatedAt": created_at - 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let doc: Value = client
        .get(format!("{base}/api/documents/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["pages"][0]["objects"][0]["id"], "r2");
    assert_eq!(doc["updatedAt"].as_i64(), Some(created_at - 5));
}

#[tokio::test]
async fn create_with_name_and_list() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/api/documents"))
        .json(&json!({ "name": "Poster", "pages": pages("r1") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let list: Value = client
        .get(format!("{base}/api/documents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Poster");
    assert!(list[0]["updatedAt"].is_i64());
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/documents/00000000-0000-0000-0000-000000000000"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client.get(format!("{base}/api/documents/nope")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .put(format!("{base}/api/documents/nope"))
        .json(&json!({ "pages": [], "updatedAt": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unparseable_pages_are_422() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let created: Value = client
        .post(format!("{base}/api/documents"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap();

    let resp = client
        .put(format!("{base}/api/documents/{id}"))
        .json(&json!({ "pages": [{ "name": "missing id" }], "updatedAt": i64::MAX }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
