//! 在庫台帳
//!
//! 書籍の貸出可能冊数に関する唯一の変更経路。デクリメント・
//! インクリメントの算術と不変条件はドメイン層の`Book::reserve_copy` /
//! `release_copy`が持ち、ここでは読み出しとエラー変換を行う。
//! 呼び出しは必ず該当書籍のロック（`BookLockTable`）の中で行うこと。
//! 新しい冊数の永続化は、貸出レコードの書き込みと同一トランザクション
//! （`LoanStore::commit_borrow` / `commit_return`）で行われる。

use chrono::{DateTime, Utc};

use crate::domain::{Book, value_objects::BookId};
use crate::ports::BookStore;

use super::errors::{LoanError, Result};
use super::loan_service::ServiceDependencies;

/// 予約トークン
///
/// デクリメント済みの書籍行を保持する。`commit_borrow`に渡して
/// 貸出の作成と一緒に永続化する。
#[derive(Debug, Clone)]
pub struct Reservation {
    book: Book,
}

impl Reservation {
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// 予約後の貸出可能冊数
    pub fn remaining_copies(&self) -> u32 {
        self.book.available_copies
    }
}

/// 蔵書を1冊確保する
///
/// 書籍が有効で在庫がある場合のみ、冊数を1減らした`Reservation`を返す。
///
/// # エラー
/// 書籍が存在しない・除籍済み・在庫0の場合は`BookUnavailable`
pub async fn try_reserve(
    deps: &ServiceDependencies,
    book_id: BookId,
    now: DateTime<Utc>,
) -> Result<Reservation> {
    let book = deps
        .book_store
        .get_book(book_id)
        .await
        .map_err(LoanError::StoreError)?
        .ok_or(LoanError::BookUnavailable)?;

    let book = book.reserve_copy(now).map_err(|_| LoanError::BookUnavailable)?;
    Ok(Reservation { book })
}

/// 蔵書を1冊戻す
///
/// 冊数を1増やした書籍行を返す。所蔵冊数を超えるインクリメントは
/// 帳簿の破損（返却対象の貸出と冊数の食い違い）を意味するので
/// `ConsistencyViolation`として呼び出しを中断させる。
pub async fn release(
    deps: &ServiceDependencies,
    book_id: BookId,
    now: DateTime<Utc>,
) -> Result<Book> {
    let book = deps
        .book_store
        .get_book(book_id)
        .await
        .map_err(LoanError::StoreError)?
        .ok_or_else(|| {
            LoanError::ConsistencyViolation(format!(
                "open loan references missing book {}",
                book_id.value()
            ))
        })?;

    let total_copies = book.total_copies;
    book.release_copy(now).map_err(|_| {
        LoanError::ConsistencyViolation(format!(
            "returning a copy of book {} would exceed its total of {}",
            book_id.value(),
            total_copies
        ))
    })
}
