use crate::domain::{Book, Isbn, value_objects::BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍ストアポート
///
/// カタログストアのうち書籍テーブルに対する操作。
/// `available_copies`の永続化は貸出と同一トランザクションで行う必要が
/// あるため、貸出に伴う更新は`LoanStore::commit_borrow` /
/// `commit_return`側にあり、このポートはカタログ管理用の読み書きを持つ。
#[async_trait]
pub trait BookStore: Send + Sync {
    /// IDで書籍を取得する（論理削除済みも含む）
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 有効な書籍の一覧を取得する
    ///
    /// 論理削除のフィルタリングは暗黙の既定ではなく、
    /// このクエリの明示的な述語として実装すること。
    async fn list_active_books(&self) -> Result<Vec<Book>>;

    /// 同一ISBNの書籍が既に存在するか
    async fn book_exists_with_isbn(&self, isbn: &Isbn) -> Result<bool>;

    /// 新しい書籍を永続化する
    async fn insert_book(&self, book: &Book) -> Result<()>;

    /// 書籍を上書き保存する（カタログ管理操作・除籍）
    async fn update_book(&self, book: &Book) -> Result<()>;
}
