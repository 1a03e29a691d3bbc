use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Audit, BookId, Isbn,
    errors::{BookValidationError, ReleaseCopyError, ReserveCopyError},
};

/// 書籍エンティティ
///
/// 不変条件：`0 <= available_copies <= total_copies`。
/// `available_copies`を変更できるのは`reserve_copy` / `release_copy`のみ
/// （在庫台帳としての責務）。カタログ管理は`update_catalog_info`で
/// 書誌情報と冊数をまとめて更新する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Isbn,
    pub total_copies: u32,
    pub available_copies: u32,
    pub audit: Audit,
}

impl Book {
    /// 新しい書籍を登録する
    ///
    /// # エラー
    /// 貸出可能冊数が所蔵冊数を超える場合は`AvailableExceedsTotal`
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: Isbn,
        total_copies: u32,
        available_copies: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, BookValidationError> {
        if available_copies > total_copies {
            return Err(BookValidationError::AvailableExceedsTotal);
        }
        Ok(Self {
            book_id: BookId::new(),
            title: title.into(),
            author: author.into(),
            isbn,
            total_copies,
            available_copies,
            audit: Audit::new(now),
        })
    }

    /// 有効（論理削除されていない）か
    pub fn is_active(&self) -> bool {
        self.audit.is_active
    }

    /// 貸出可能か（有効かつ在庫あり）
    pub fn is_lendable(&self) -> bool {
        self.is_active() && self.available_copies > 0
    }

    /// 蔵書を1冊確保する（貸出時のデクリメント）
    ///
    /// # エラー
    /// 論理削除済み、または在庫が0の場合は`NotLendable`
    pub fn reserve_copy(self, now: DateTime<Utc>) -> Result<Self, ReserveCopyError> {
        if !self.is_lendable() {
            return Err(ReserveCopyError::NotLendable);
        }
        Ok(Self {
            available_copies: self.available_copies - 1,
            audit: self.audit.touch(now),
            ..self
        })
    }

    /// 蔵書を1冊戻す（返却時のインクリメント）
    ///
    /// # エラー
    /// 所蔵冊数を超える場合は`ExceedsTotalCopies`。
    /// 正常な貸出・返却の系列では到達しない。到達したら帳簿の破損。
    pub fn release_copy(self, now: DateTime<Utc>) -> Result<Self, ReleaseCopyError> {
        if self.available_copies >= self.total_copies {
            return Err(ReleaseCopyError::ExceedsTotalCopies);
        }
        Ok(Self {
            available_copies: self.available_copies + 1,
            audit: self.audit.touch(now),
            ..self
        })
    }

    /// 書誌情報と冊数を更新する（カタログ管理操作）
    pub fn update_catalog_info(
        self,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: Isbn,
        total_copies: u32,
        available_copies: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, BookValidationError> {
        if available_copies > total_copies {
            return Err(BookValidationError::AvailableExceedsTotal);
        }
        Ok(Self {
            title: title.into(),
            author: author.into(),
            isbn,
            total_copies,
            available_copies,
            audit: self.audit.touch(now),
            ..self
        })
    }

    /// 書籍を除籍する（論理削除）
    ///
    /// 除籍後は新規貸出の対象にならない。終端状態。
    pub fn retire(self, now: DateTime<Utc>) -> Self {
        Self {
            audit: self.audit.retire(now),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book(total: u32, available: u32) -> Book {
        Book::new(
            "深夜特急",
            "沢木耕太郎",
            Isbn::new("978-4-10-123508-6").unwrap(),
            total,
            available,
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_available_over_total() {
        let result = Book::new(
            "t",
            "a",
            Isbn::new("i").unwrap(),
            3,
            4,
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), BookValidationError::AvailableExceedsTotal);
    }

    #[test]
    fn test_reserve_copy_decrements() {
        let book = sample_book(5, 5);
        let book = book.reserve_copy(Utc::now()).unwrap();
        assert_eq!(book.available_copies, 4);
        assert_eq!(book.total_copies, 5);
    }

    #[test]
    fn test_reserve_copy_fails_at_zero() {
        let book = sample_book(5, 0);
        let result = book.reserve_copy(Utc::now());
        assert_eq!(result.unwrap_err(), ReserveCopyError::NotLendable);
    }

    #[test]
    fn test_reserve_copy_fails_when_retired() {
        let book = sample_book(5, 5).retire(Utc::now());
        let result = book.reserve_copy(Utc::now());
        assert_eq!(result.unwrap_err(), ReserveCopyError::NotLendable);
    }

    #[test]
    fn test_release_copy_increments() {
        let book = sample_book(5, 4);
        let book = book.release_copy(Utc::now()).unwrap();
        assert_eq!(book.available_copies, 5);
    }

    #[test]
    fn test_release_copy_never_exceeds_total() {
        let book = sample_book(5, 5);
        let result = book.release_copy(Utc::now());
        assert_eq!(result.unwrap_err(), ReleaseCopyError::ExceedsTotalCopies);
    }

    #[test]
    fn test_retire_keeps_counts() {
        let book = sample_book(5, 3).retire(Utc::now());
        assert!(!book.is_active());
        assert!(!book.is_lendable());
        assert_eq!(book.available_copies, 3);
    }

    #[test]
    fn test_update_catalog_info_validates_counts() {
        let book = sample_book(5, 5);
        let result = book.update_catalog_info(
            "t",
            "a",
            Isbn::new("i").unwrap(),
            2,
            3,
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), BookValidationError::AvailableExceedsTotal);
    }
}
