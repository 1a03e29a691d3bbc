use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::loan::ServiceDependencies;
use crate::domain::{Book, BookValidationError, Isbn, value_objects::BookId};
use crate::ports::BookStore;

use super::errors::{CatalogError, Result};

/// 書籍の登録・更新リクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl From<BookValidationError> for CatalogError {
    fn from(err: BookValidationError) -> Self {
        match err {
            BookValidationError::AvailableExceedsTotal => CatalogError::AvailableExceedsTotal,
        }
    }
}

/// 新しい書籍を登録する
///
/// ビジネスルール：
/// - ISBNはカタログ全体で一意であること
/// - 貸出可能冊数は所蔵冊数以下であること
pub async fn create_book(
    deps: &ServiceDependencies,
    input: BookInput,
    now: DateTime<Utc>,
) -> Result<Book> {
    tracing::info!(title = %input.title, "Creating new book");

    let isbn = Isbn::new(input.isbn).map_err(|_| CatalogError::InvalidIsbn)?;

    let duplicate = deps
        .book_store
        .book_exists_with_isbn(&isbn)
        .await
        .map_err(CatalogError::StoreError)?;
    if duplicate {
        tracing::warn!(isbn = isbn.value(), "Book creation failed: ISBN already exists");
        return Err(CatalogError::DuplicateIsbn(isbn.value().to_string()));
    }

    let book = Book::new(
        input.title,
        input.author,
        isbn,
        input.total_copies,
        input.available_copies,
        now,
    )?;

    deps.book_store
        .insert_book(&book)
        .await
        .map_err(CatalogError::StoreError)?;

    tracing::info!(book_id = %book.book_id.value(), "Book created");
    Ok(book)
}

/// 書籍を更新する
///
/// `available_copies`のread-update-writeを含むため、貸出・返却と同じ
/// 書籍ロックの中で行う。貸出がコミットした直後の冊数を上書きで
/// 巻き戻してしまう割り込みを防ぐ。
pub async fn update_book(
    deps: &ServiceDependencies,
    book_id: BookId,
    input: BookInput,
    now: DateTime<Utc>,
) -> Result<Book> {
    tracing::info!(book_id = %book_id.value(), "Updating book");

    let _guard = deps.book_locks.acquire(book_id).await;

    let book = deps
        .book_store
        .get_book(book_id)
        .await
        .map_err(CatalogError::StoreError)?
        .filter(Book::is_active)
        .ok_or(CatalogError::BookNotFound)?;

    let isbn = Isbn::new(input.isbn).map_err(|_| CatalogError::InvalidIsbn)?;

    // ISBNを変更する場合のみ一意性を再検証する
    if book.isbn != isbn {
        let duplicate = deps
            .book_store
            .book_exists_with_isbn(&isbn)
            .await
            .map_err(CatalogError::StoreError)?;
        if duplicate {
            return Err(CatalogError::DuplicateIsbn(isbn.value().to_string()));
        }
    }

    let updated = book.update_catalog_info(
        input.title,
        input.author,
        isbn,
        input.total_copies,
        input.available_copies,
        now,
    )?;

    deps.book_store
        .update_book(&updated)
        .await
        .map_err(CatalogError::StoreError)?;

    Ok(updated)
}

/// 書籍を除籍する（論理削除）
pub async fn retire_book(
    deps: &ServiceDependencies,
    book_id: BookId,
    now: DateTime<Utc>,
) -> Result<()> {
    tracing::info!(book_id = %book_id.value(), "Retiring book");

    let _guard = deps.book_locks.acquire(book_id).await;

    let book = deps
        .book_store
        .get_book(book_id)
        .await
        .map_err(CatalogError::StoreError)?
        .filter(Book::is_active)
        .ok_or(CatalogError::BookNotFound)?;

    let retired = book.retire(now);
    deps.book_store
        .update_book(&retired)
        .await
        .map_err(CatalogError::StoreError)?;

    Ok(())
}

/// 書籍の詳細を取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.book_store
        .get_book(book_id)
        .await
        .map_err(CatalogError::StoreError)?
        .filter(Book::is_active)
        .ok_or(CatalogError::BookNotFound)
}

/// 有効な書籍の一覧を取得する
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    deps.book_store
        .list_active_books()
        .await
        .map_err(CatalogError::StoreError)
}
