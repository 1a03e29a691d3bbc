use thiserror::Error;

/// 貸出エンジンのエラー
///
/// ドメインルール違反（NotFound系、在庫なし、上限超過、延滞ロック、
/// 二重返却）はすべて型付きの戻り値であり、呼び出し側に返される。
/// `ConsistencyViolation`だけは別格：帳簿の破損を示すプログラミング
/// エラー／データ破損であり、正しい入力からは決して発生しない。
/// 握りつぶさず、利用者向けエラーと区別して運用者に見せること。
#[derive(Debug, Error)]
pub enum LoanError {
    /// 有効な会員が存在しない
    #[error("Member not found")]
    MemberNotFound,

    /// 有効な書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 書籍は存在するが貸出できない（在庫0、または除籍済み）
    #[error("Book is not available for loan")]
    BookUnavailable,

    /// 会員の貸出上限を超えている
    #[error("Member has reached the maximum number of borrowed books")]
    LoanLimitExceeded,

    /// 会員に延滞中の貸出がある
    #[error("Member has overdue books")]
    MemberHasOverdueLoan,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 既に返却済み
    #[error("Loan has already been returned")]
    LoanAlreadyReturned,

    /// 帳簿の不変条件が破れている（データ破損）
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    /// ストアのエラー
    #[error("Catalog store error")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 貸出エンジンのResult型
pub type Result<T> = std::result::Result<T, LoanError>;
