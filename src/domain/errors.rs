/// 蔵書生成・更新時のバリデーションエラー
///
/// ISBN自体の検証は`Isbn::new`が行う。ここに来る時点でISBNは検証済み。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    /// 貸出可能冊数が所蔵冊数を超えている
    AvailableExceedsTotal,
}

/// 蔵書予約（貸出可能冊数のデクリメント）のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveCopyError {
    /// 貸出不可（論理削除済み、または貸出可能冊数が0）
    NotLendable,
}

/// 蔵書返却（貸出可能冊数のインクリメント）のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseCopyError {
    /// 所蔵冊数を超えるインクリメント。帳簿が既に壊れていることを示す。
    ExceedsTotalCopies,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseLoanError {
    /// 既に返却済み
    AlreadyReturned,
}
