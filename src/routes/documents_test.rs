use super::*;
use crate::state::test_helpers::test_app_state;
use serde_json::json;
use uuid::Uuid;

fn save_body(pages: serde_json::Value, updated_at: i64) -> Json<SaveDocumentBody> {
    Json(SaveDocumentBody { pages, updated_at })
}

fn rect_page(object_id: &str) -> serde_json::Value {
    json!([{
        "id": "p1",
        "name": "Page 1",
        "objects": [{ "type": "rect", "id": object_id, "left": 0, "top": 0, "width": 10, "height": 10 }]
    }])
}

// =============================================================================
// document_error_to_status
// =============================================================================

#[test]
fn error_to_status_maps_not_found() {
    let err = DocumentError::NotFound("x".into());
    assert_eq!(document_error_to_status(err), StatusCode::NOT_FOUND);
}

#[test]
fn error_to_status_maps_invalid_payload() {
    let err = DocumentError::InvalidPayload("bad".into());
    assert_eq!(document_error_to_status(err), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn error_to_status_maps_database() {
    let err = DocumentError::Database(sqlx::Error::RowNotFound);
    assert_eq!(document_error_to_status(err), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// parse_create_body
// =============================================================================

#[test]
fn empty_create_body_is_all_defaults() {
    let body = parse_create_body(b"").unwrap();
    assert!(body.name.is_none());
    assert!(body.pages.is_none());
    assert!(parse_create_body(b"  \n").is_ok());
}

#[test]
fn create_body_rejects_garbage() {
    assert_eq!(parse_create_body(b"{not json").unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
}

// =============================================================================
// handlers
// =============================================================================

#[tokio::test]
async fn create_then_get_returns_draft() {
    let state = test_app_state();
    let (status, Json(created)) = create_document(State(state.clone()), Bytes::new()).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(doc) = get_document(State(state), Path(created.id.clone())).await.unwrap();
    assert_eq!(doc.id, created.id);
    assert_eq!(doc.name, "New Draft");
    assert_eq!(doc.pages.len(), 1);
}

#[tokio::test]
async fn create_with_invalid_pages_is_422() {
    let state = test_app_state();
    let body = Bytes::from(json!({ "pages": "nope" }).to_string());
    let err = create_document(State(state), body).await.unwrap_err();
    assert_eq!(err, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn get_malformed_id_is_404() {
    let state = test_app_state();
    let err = get_document(State(state), Path("not-a-uuid".into())).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn save_then_list_reflects_update() {
    let state = test_app_state();
    let (_, Json(created)) = create_document(State(state.clone()), Bytes::new()).await.unwrap();

    let status = save_document(State(state.clone()), Path(created.id.clone()), save_body(rect_page("r1"), i64::MAX))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(list) = list_documents(State(state.clone())).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].updated_at, i64::MAX);

    let Json(doc) = get_document(State(state), Path(created.id)).await.unwrap();
    assert_eq!(doc.pages[0].objects[0].id, "r1");
}

#[tokio::test]
async fn save_with_older_timestamp_is_stored() {
    let state = test_app_state();
    let (_, Json(created)) = create_document(State(state.clone()), Bytes::new()).await.unwrap();

    let status = save_document(State(state.clone()), Path(created.id.clone()), save_body(rect_page("old"), 1))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(doc) = get_document(State(state), Path(created.id)).await.unwrap();
    assert_eq!(doc.pages[0].objects[0].id, "old");
}

#[tokio::test]
async fn save_with_unknown_object_type_is_422() {
    let state = test_app_state();
    let (_, Json(created)) = create_document(State(state.clone()), Bytes::new()).await.unwrap();
    let pages = json!([{ "id": "p1", "objects": [{ "type": "group", "id": "g1" }] }]);
    let err = save_document(State(state.clone()), Path(created.id.clone()), save_body(pages, 5))
        .await
        .unwrap_err();
    assert_eq!(err, StatusCode::UNPROCESSABLE_ENTITY);

    let Json(doc) = get_document(State(state), Path(created.id)).await.unwrap();
    assert!(doc.pages[0].objects.is_empty());
}

#[tokio::test]
async fn save_unknown_is_404() {
    let state = test_app_state();
    let id = Uuid::new_v4().to_string();
    let err = save_document(State(state), Path(id), save_body(rect_page("r1"), 1)).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn save_invalid_pages_is_422() {
    let state = test_app_state();
    let (_, Json(created)) = create_document(State(state.clone()), Bytes::new()).await.unwrap();
    let err = save_document(State(state), Path(created.id), save_body(json!({ "pages": 1 }), i64::MAX))
        .await
        .unwrap_err();
    assert_eq!(err, StatusCode::UNPROCESSABLE_ENTITY);
}
