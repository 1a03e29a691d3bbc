use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow, create_book, create_member, get_book, get_loan_detail, get_member,
    list_books, list_members, retire_book, retire_member, return_, update_book, update_member,
};

/// APIルーターを構築する
///
/// 貸出エンジン:
/// - POST /loans/borrow - 書籍を借りる
/// - POST /loans/return - 書籍を返却する
/// - GET  /loans/:id    - 貸出の詳細
///
/// カタログ管理:
/// - /books, /members のCRUD（削除は論理削除）
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/loans/borrow", post(borrow))
        .route("/loans/return", post(return_))
        .route("/loans/:id", get(get_loan_detail))
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(retire_book),
        )
        .route("/members", get(list_members).post(create_member))
        .route(
            "/members/:id",
            get(get_member).put(update_member).delete(retire_member),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ヘルスチェック
async fn health_check() -> &'static str {
    "OK"
}
