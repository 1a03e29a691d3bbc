use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Audit, BookId, LoanId, MemberId, errors::CloseLoanError};

/// 貸出エンティティ
///
/// 状態機械は `{} → Open → Closed` のみ。
/// `returned_at`が未設定ならOpen、設定済みならClosed。
/// Closedは終端状態で、`returned_at`はちょうど1回だけ設定される。
/// キャンセルや期限切れによる遷移はない（延滞は状態ではなく導出値）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub member_id: MemberId,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub audit: Audit,
}

impl Loan {
    /// 新しい貸出を開始する
    ///
    /// 返却期限は`borrowed_at + period_days`。
    pub fn open(
        book_id: BookId,
        member_id: MemberId,
        borrowed_at: DateTime<Utc>,
        period_days: i64,
    ) -> Self {
        Self {
            loan_id: LoanId::new(),
            book_id,
            member_id,
            borrowed_at,
            due_date: borrowed_at + Duration::days(period_days),
            returned_at: None,
            audit: Audit::new(borrowed_at),
        }
    }

    /// 貸出中（未返却）か
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// 延滞判定
    ///
    /// 返却期限が`now`より厳密に前の場合のみ延滞。
    /// 期限ちょうどの貸出はまだ延滞ではない。
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_open() && self.due_date < now
    }

    /// 返却する（Open → Closed）
    ///
    /// # エラー
    /// 既に返却済みの場合は`AlreadyReturned`。二重返却はエラーであり、
    /// 冪等な成功にはしない（観測された挙動の通り）。
    pub fn close(self, returned_at: DateTime<Utc>) -> Result<Self, CloseLoanError> {
        if self.returned_at.is_some() {
            return Err(CloseLoanError::AlreadyReturned);
        }
        Ok(Self {
            returned_at: Some(returned_at),
            audit: self.audit.touch(returned_at),
            ..self
        })
    }
}
