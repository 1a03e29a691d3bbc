use thiserror::Error;

/// カタログ管理（書籍・会員）のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 書籍が見つからない
    #[error("Book not found")]
    BookNotFound,

    /// 会員が見つからない
    #[error("Member not found")]
    MemberNotFound,

    /// 同一ISBNの書籍が既に存在する
    #[error("Book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    /// 同一メールアドレスの会員が既に存在する
    #[error("Member with email {0} already exists")]
    DuplicateEmail(String),

    /// ISBNが不正（空文字列）
    #[error("ISBN must not be empty")]
    InvalidIsbn,

    /// 貸出可能冊数が所蔵冊数を超えている
    #[error("Available copies cannot be greater than total copies")]
    AvailableExceedsTotal,

    /// ストアのエラー
    #[error("Catalog store error")]
    StoreError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// カタログ管理のResult型
pub type Result<T> = std::result::Result<T, CatalogError>;
