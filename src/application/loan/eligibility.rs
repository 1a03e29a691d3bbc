//! 貸出資格チェック
//!
//! 「この会員はいま新しい貸出を開始できるか」を一貫したスナップショット
//! 上で判定する純粋な判定ロジック。状態の変更は一切行わない。
//! 判定順序は固定：会員存在 → 書籍存在 → 書籍在庫 → 上限 → 延滞。
//! 複数の条件に違反するリクエストに対してどのエラーが返るかは
//! この順序で決まるため、順序を変えてはならない。

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{BookId, MemberId};
use crate::ports::{BookStore, LoanStore, MemberStore};

use super::errors::{LoanError, Result};
use super::loan_service::ServiceDependencies;

/// 会員の存在確認
///
/// # エラー
/// 有効な会員が存在しない場合は`MemberNotFound`（退会済みも含む）
pub async fn check_member(deps: &ServiceDependencies, member_id: MemberId) -> Result<()> {
    let member = deps
        .member_store
        .get_member(member_id)
        .await
        .map_err(LoanError::StoreError)?;

    match member {
        Some(member) if member.is_active() => Ok(()),
        _ => Err(LoanError::MemberNotFound),
    }
}

/// 書籍の存在・在庫確認
///
/// # エラー
/// - 有効な書籍が存在しない場合は`BookNotFound`（除籍済みも含む）
/// - 存在するが在庫が0の場合は`BookUnavailable`
pub async fn check_book(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    let book = deps
        .book_store
        .get_book(book_id)
        .await
        .map_err(LoanError::StoreError)?;

    match book {
        Some(book) if book.is_active() => {
            if book.available_copies == 0 {
                Err(LoanError::BookUnavailable)
            } else {
                Ok(())
            }
        }
        _ => Err(LoanError::BookNotFound),
    }
}

/// 貸出上限の確認
///
/// 既存の貸出中冊数が上限を「厳密に超えている」場合のみ拒否する。
/// つまり上限ちょうどの冊数ではまだ借りられ、実効的な上限は
/// `max_borrowed_books + 1`冊になる。観測された挙動をそのまま
/// 再現しており、意図的な方針確認なしに「修正」しないこと。
pub async fn check_borrowing_limit(deps: &ServiceDependencies, member_id: MemberId) -> Result<()> {
    let open_loans = deps
        .loan_store
        .count_open_loans(member_id)
        .await
        .map_err(LoanError::StoreError)?;

    if open_loans > deps.policy.max_borrowed_books {
        return Err(LoanError::LoanLimitExceeded);
    }
    Ok(())
}

/// 延滞ロックの確認
///
/// 返却期限が`as_of`より厳密に前の貸出中レコードが1件でもあれば拒否。
pub async fn check_overdue(
    deps: &ServiceDependencies,
    member_id: MemberId,
    as_of: DateTime<Utc>,
) -> Result<()> {
    let overdue = deps
        .loan_store
        .count_overdue_open_loans(member_id, as_of)
        .await
        .map_err(LoanError::StoreError)?;

    if overdue > 0 {
        return Err(LoanError::MemberHasOverdueLoan);
    }
    Ok(())
}

/// 全チェックを固定順で実行する（最初の失敗で打ち切り）
pub async fn check_all(
    deps: &ServiceDependencies,
    member_id: MemberId,
    book_id: BookId,
    as_of: DateTime<Utc>,
) -> Result<()> {
    check_member(deps, member_id).await?;
    check_book(deps, book_id).await?;
    check_borrowing_limit(deps, member_id).await?;
    check_overdue(deps, member_id, as_of).await?;
    Ok(())
}
