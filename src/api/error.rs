use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::application::catalog::CatalogError;
use crate::application::loan::LoanError;

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Loan(LoanError),
    Catalog(CatalogError),
}

impl From<LoanError> for ApiError {
    fn from(err: LoanError) -> Self {
        ApiError::Loan(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            // 404 Not Found - アドレスされたリソースが存在しない
            ApiError::Loan(LoanError::LoanNotFound) => {
                (StatusCode::NOT_FOUND, "LOAN_NOT_FOUND", "Loan not found".to_string())
            }
            ApiError::Catalog(CatalogError::BookNotFound) => {
                (StatusCode::NOT_FOUND, "BOOK_NOT_FOUND", "Book not found".to_string())
            }
            ApiError::Catalog(CatalogError::MemberNotFound) => (
                StatusCode::NOT_FOUND,
                "MEMBER_NOT_FOUND",
                "Member not found".to_string(),
            ),

            // 422 Unprocessable Entity - ビジネスルール違反
            ApiError::Loan(LoanError::MemberNotFound) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MEMBER_NOT_FOUND",
                "Member not found".to_string(),
            ),
            ApiError::Loan(LoanError::BookNotFound) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_NOT_FOUND",
                "Book not found".to_string(),
            ),
            ApiError::Loan(LoanError::BookUnavailable) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "BOOK_UNAVAILABLE",
                "Book is not available for loan".to_string(),
            ),
            ApiError::Loan(LoanError::LoanLimitExceeded) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "LOAN_LIMIT_EXCEEDED",
                "Member has reached the maximum number of borrowed books".to_string(),
            ),
            ApiError::Loan(LoanError::MemberHasOverdueLoan) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MEMBER_HAS_OVERDUE_LOAN",
                "Member has overdue books and cannot borrow more".to_string(),
            ),
            ApiError::Loan(LoanError::LoanAlreadyReturned) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "LOAN_ALREADY_RETURNED",
                "Loan has already been returned".to_string(),
            ),

            // 400 Bad Request - 入力バリデーション
            ApiError::Catalog(err @ CatalogError::DuplicateIsbn(_))
            | ApiError::Catalog(err @ CatalogError::DuplicateEmail(_))
            | ApiError::Catalog(err @ CatalogError::InvalidIsbn)
            | ApiError::Catalog(err @ CatalogError::AvailableExceedsTotal) => {
                (StatusCode::BAD_REQUEST, "DATA_INVALID", err.to_string())
            }

            // 500 Internal Server Error - システム障害
            // 帳簿破損は利用者向けエラーと区別してログに残す
            ApiError::Loan(LoanError::ConsistencyViolation(ref detail)) => {
                tracing::error!("Consistency violation: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONSISTENCY_VIOLATION",
                    "Internal ledger inconsistency detected".to_string(),
                )
            }
            ApiError::Loan(LoanError::StoreError(ref e)) => {
                tracing::error!("Catalog store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Catalog store error".to_string(),
                )
            }
            ApiError::Catalog(CatalogError::StoreError(ref e)) => {
                tracing::error!("Catalog store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Catalog store error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
