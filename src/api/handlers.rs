use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::catalog::{book_service, member_service};
use crate::application::loan::{ServiceDependencies, borrow_book, get_loan, return_book};
use crate::domain::commands::{BorrowBook, ReturnBook};
use crate::domain::value_objects::{BookId, LoanId, MemberId};

use super::error::ApiError;
use super::types::{
    BookRequest, BookResponse, BorrowRequest, LoanResponse, MemberRequest, MemberResponse,
    ReturnRequest,
};

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// 貸出（Loan Engine）
// ============================================================================

/// POST /loans/borrow - 書籍を借りる
pub async fn borrow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = BorrowBook {
        member_id: MemberId::from_uuid(req.member_id),
        book_id: BookId::from_uuid(req.book_id),
        borrowed_at: Utc::now(),
    };
    let record = borrow_book(&state.service_deps, cmd).await?;
    Ok((StatusCode::CREATED, Json(LoanResponse::from(record))))
}

/// POST /loans/return - 書籍を返却する
pub async fn return_(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReturnRequest>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnBook {
        loan_id: LoanId::from_uuid(req.loan_id),
        returned_at: Utc::now(),
    };
    let record = return_book(&state.service_deps, cmd).await?;
    Ok(Json(LoanResponse::from(record)))
}

/// GET /loans/:id - 貸出の詳細
pub async fn get_loan_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanResponse>, ApiError> {
    let record = get_loan(&state.service_deps, LoanId::from_uuid(id)).await?;
    Ok(Json(LoanResponse::from(record)))
}

// ============================================================================
// 書籍カタログ管理
// ============================================================================

/// GET /books - 有効な書籍の一覧
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = book_service::list_books(&state.service_deps).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/:id - 書籍の詳細
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = book_service::get_book(&state.service_deps, BookId::from_uuid(id)).await?;
    Ok(Json(BookResponse::from(book)))
}

/// POST /books - 書籍を登録する
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let book = book_service::create_book(&state.service_deps, req.into_input(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// PUT /books/:id - 書籍を更新する
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = book_service::update_book(
        &state.service_deps,
        BookId::from_uuid(id),
        req.into_input(),
        Utc::now(),
    )
    .await?;
    Ok(Json(BookResponse::from(book)))
}

/// DELETE /books/:id - 書籍を除籍する（論理削除）
pub async fn retire_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    book_service::retire_book(&state.service_deps, BookId::from_uuid(id), Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// 会員管理
// ============================================================================

/// GET /members - 有効な会員の一覧
pub async fn list_members(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let members = member_service::list_members(&state.service_deps).await?;
    Ok(Json(members.into_iter().map(MemberResponse::from).collect()))
}

/// GET /members/:id - 会員の詳細
pub async fn get_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member =
        member_service::get_member(&state.service_deps, MemberId::from_uuid(id)).await?;
    Ok(Json(MemberResponse::from(member)))
}

/// POST /members - 会員を登録する
pub async fn create_member(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let member =
        member_service::create_member(&state.service_deps, req.into_input(), Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// PUT /members/:id - 会員情報を更新する
pub async fn update_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = member_service::update_member(
        &state.service_deps,
        MemberId::from_uuid(id),
        req.into_input(),
        Utc::now(),
    )
    .await?;
    Ok(Json(MemberResponse::from(member)))
}

/// DELETE /members/:id - 会員を退会させる（論理削除）
pub async fn retire_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    member_service::retire_member(&state.service_deps, MemberId::from_uuid(id), Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
