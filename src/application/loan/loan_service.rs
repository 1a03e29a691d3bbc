use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Loan,
    commands::*,
    value_objects::{BookId, LoanId, MemberId},
};
use crate::ports::{BookStore, LoanStore, MemberStore};

use super::eligibility;
use super::errors::{LoanError, Result};
use super::ledger;
use super::lock::BookLockTable;

/// 貸出ポリシー
///
/// 貸出期間と上限冊数は構成定数であり、書籍別・会員別の上書きはない。
#[derive(Debug, Clone, Copy)]
pub struct LoanPolicy {
    /// 貸出期間（日数）
    pub loan_period_days: i64,
    /// 会員1人あたりの最大貸出冊数
    pub max_borrowed_books: u32,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: 14,
            max_borrowed_books: 5,
        }
    }
}

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_store: Arc<dyn BookStore>,
    pub member_store: Arc<dyn MemberStore>,
    pub loan_store: Arc<dyn LoanStore>,
    pub book_locks: Arc<BookLockTable>,
    pub policy: LoanPolicy,
}

/// 貸出レコード
///
/// 呼び出し側へ公開する貸出のスナップショット。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl From<&Loan> for LoanRecord {
    fn from(loan: &Loan) -> Self {
        Self {
            loan_id: loan.loan_id,
            book_id: loan.book_id,
            member_id: loan.member_id,
            borrowed_at: loan.borrowed_at,
            due_date: loan.due_date,
            returned_at: loan.returned_at,
        }
    }
}

/// 書籍を借りる
///
/// ビジネスルール：
/// - 会員が存在すること
/// - 書籍が存在し在庫があること
/// - 会員の貸出中冊数が上限を超えていないこと
/// - 会員に延滞中の貸出がないこと
///
/// # 一貫性保証
///
/// 書籍単位のロックを、資格チェックの前から在庫のデクリメント・
/// 永続化の後まで保持する。これにより資格チェック（書籍分）と予約が
/// 事実上ひとつのクリティカルセクションになり、チェックと変更の間に
/// 他のリクエストが割り込む窓（TOCTOU）が存在しない。
/// 貸出レコードの作成と冊数の更新は`commit_borrow`の
/// 単一トランザクションで永続化される。部分適用は観測されない。
pub async fn borrow_book(deps: &ServiceDependencies, cmd: BorrowBook) -> Result<LoanRecord> {
    tracing::info!(
        member_id = %cmd.member_id.value(),
        book_id = %cmd.book_id.value(),
        "Processing borrow request"
    );

    // 1. 書籍の排他アクセスを獲得（チェックから永続化まで保持する）
    let _guard = deps.book_locks.acquire(cmd.book_id).await;

    // 2. 貸出資格チェック（固定順・最初の失敗で打ち切り）
    eligibility::check_all(deps, cmd.member_id, cmd.book_id, cmd.borrowed_at).await?;

    // 3. 在庫台帳から1冊確保
    let reservation = ledger::try_reserve(deps, cmd.book_id, cmd.borrowed_at).await?;

    // 4. 貸出を開始
    let loan = Loan::open(
        cmd.book_id,
        cmd.member_id,
        cmd.borrowed_at,
        deps.policy.loan_period_days,
    );

    // 5. 貸出の作成と冊数のデクリメントを同一トランザクションで永続化
    deps.loan_store
        .commit_borrow(reservation.book(), &loan)
        .await
        .map_err(LoanError::StoreError)?;

    tracing::info!(
        loan_id = %loan.loan_id.value(),
        member_id = %cmd.member_id.value(),
        book_id = %cmd.book_id.value(),
        remaining_copies = reservation.remaining_copies(),
        "Loan created"
    );

    Ok(LoanRecord::from(&loan))
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 未返却であること（二重返却はエラー、黙って成功にはしない）
///
/// 延滞していても返却は受け付ける。
///
/// # 一貫性保証
///
/// 返却のクローズと冊数のインクリメントは`commit_return`の
/// 単一トランザクションで永続化される。ロック獲得後に貸出を
/// 読み直すので、同じ貸出への並行返却が1冊を2回戻すことはない。
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<LoanRecord> {
    tracing::info!(loan_id = %cmd.loan_id.value(), "Processing return request");

    // 1. 貸出の存在確認
    let loan = deps
        .loan_store
        .get_loan(cmd.loan_id)
        .await
        .map_err(LoanError::StoreError)?
        .ok_or(LoanError::LoanNotFound)?;

    // 2. 二重返却ガード
    if !loan.is_open() {
        return Err(LoanError::LoanAlreadyReturned);
    }

    // 3. 対象書籍の排他アクセスを獲得
    let _guard = deps.book_locks.acquire(loan.book_id).await;

    // 4. ロック下で読み直す。並行する返却が先にクローズしていたら
    //    ここで二重返却として検出される。
    let loan = deps
        .loan_store
        .get_loan(cmd.loan_id)
        .await
        .map_err(LoanError::StoreError)?
        .ok_or(LoanError::LoanNotFound)?;

    let book_id = loan.book_id;
    let closed = loan
        .close(cmd.returned_at)
        .map_err(|_| LoanError::LoanAlreadyReturned)?;

    // 5. 在庫台帳へ1冊戻す
    let book = ledger::release(deps, book_id, cmd.returned_at).await?;

    // 6. クローズと冊数のインクリメントを同一トランザクションで永続化
    deps.loan_store
        .commit_return(&book, &closed)
        .await
        .map_err(LoanError::StoreError)?;

    tracing::info!(
        loan_id = %closed.loan_id.value(),
        book_id = %book_id.value(),
        available_copies = book.available_copies,
        "Loan returned"
    );

    Ok(LoanRecord::from(&closed))
}

/// 貸出の照会
pub async fn get_loan(deps: &ServiceDependencies, loan_id: LoanId) -> Result<LoanRecord> {
    let loan = deps
        .loan_store
        .get_loan(loan_id)
        .await
        .map_err(LoanError::StoreError)?
        .ok_or(LoanError::LoanNotFound)?;
    Ok(LoanRecord::from(&loan))
}
