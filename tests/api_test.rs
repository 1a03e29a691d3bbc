use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use book_lending::adapters::memory::MemoryCatalogStore;
use book_lending::api::{handlers::AppState, router::create_router};
use book_lending::application::loan::{BookLockTable, LoanPolicy, ServiceDependencies};

// ============================================================================
// E2Eテスト用のヘルパー
// ============================================================================

/// インメモリストアでアプリケーションを組み立てる
fn setup_app() -> axum::Router {
    let store = Arc::new(MemoryCatalogStore::new());
    let service_deps = ServiceDependencies {
        book_store: store.clone(),
        member_store: store.clone(),
        loan_store: store,
        book_locks: Arc::new(BookLockTable::new()),
        policy: LoanPolicy::default(),
    };
    create_router(Arc::new(AppState { service_deps }))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 書籍を1冊登録してIDを返す
async fn create_book(app: &axum::Router, isbn: &str, copies: u32) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/books",
            json!({
                "title": "ノルウェイの森",
                "author": "村上春樹",
                "isbn": isbn,
                "total_copies": copies,
                "available_copies": copies,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["id"].as_str().unwrap().to_string()
}

/// 会員を1人登録してIDを返す
async fn create_member(app: &axum::Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/members",
            json!({
                "name": "山田太郎",
                "email": email,
                "phone_number": "090-0000-0000",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await["id"].as_str().unwrap().to_string()
}

// ============================================================================
// テスト
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let app = setup_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_borrow_and_return_flow() {
    let app = setup_app();
    let book_id = create_book(&app, "isbn-e2e-1", 5).await;
    let member_id = create_member(&app, "taro@example.com").await;

    // 借りる
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/loans/borrow",
            json!({ "member_id": member_id, "book_id": book_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan = read_json(response).await;
    assert_eq!(loan["book_id"], book_id.as_str());
    assert_eq!(loan["member_id"], member_id.as_str());
    assert!(loan["returned_at"].is_null());
    // 固定フォーマット（"YYYY-MM-DD HH:MM:SS"）で返る
    let borrowed_at = loan["borrowed_at"].as_str().unwrap();
    assert_eq!(borrowed_at.len(), 19);
    assert_eq!(&borrowed_at[4..5], "-");
    assert_eq!(&borrowed_at[10..11], " ");

    // 在庫が1冊減っている
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/books/{book_id}").as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(read_json(response).await["available_copies"], 4);

    // 返す
    let loan_id = loan["id"].as_str().unwrap().to_string();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/loans/return",
            json!({ "loan_id": loan_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let returned = read_json(response).await;
    assert!(returned["returned_at"].is_string());

    // 在庫が元に戻っている
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/books/{book_id}").as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(read_json(response).await["available_copies"], 5);
}

#[tokio::test]
async fn test_double_return_maps_to_422() {
    let app = setup_app();
    let book_id = create_book(&app, "isbn-e2e-2", 1).await;
    let member_id = create_member(&app, "taro2@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/loans/borrow",
            json!({ "member_id": member_id, "book_id": book_id }),
        ))
        .await
        .unwrap();
    let loan_id = read_json(response).await["id"].as_str().unwrap().to_string();

    let first = app
        .clone()
        .oneshot(json_request("POST", "/loans/return", json!({ "loan_id": loan_id })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .clone()
        .oneshot(json_request("POST", "/loans/return", json!({ "loan_id": loan_id })))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(second).await["error"], "LOAN_ALREADY_RETURNED");
}

#[tokio::test]
async fn test_borrow_unknown_member_maps_to_422() {
    let app = setup_app();
    let book_id = create_book(&app, "isbn-e2e-3", 1).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/loans/borrow",
            json!({
                "member_id": "018f4e6a-0000-7000-8000-000000000000",
                "book_id": book_id,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["error"], "MEMBER_NOT_FOUND");
}

#[tokio::test]
async fn test_return_unknown_loan_maps_to_404() {
    let app = setup_app();
    let response = app
        .oneshot(json_request(
            "POST",
            "/loans/return",
            json!({ "loan_id": "018f4e6a-0000-7000-8000-000000000001" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_isbn_maps_to_400() {
    let app = setup_app();
    create_book(&app, "isbn-e2e-4", 1).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/books",
            json!({
                "title": "t",
                "author": "a",
                "isbn": "isbn-e2e-4",
                "total_copies": 1,
                "available_copies": 1,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "DATA_INVALID");
}

#[tokio::test]
async fn test_retired_book_is_gone_from_api() {
    let app = setup_app();
    let book_id = create_book(&app, "isbn-e2e-5", 1).await;

    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/books/{book_id}").as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(
            Request::get(format!("/books/{book_id}").as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
