use crate::domain::{Member, value_objects::MemberId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 会員ストアポート
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// IDで会員を取得する（論理削除済みも含む）
    async fn get_member(&self, member_id: MemberId) -> Result<Option<Member>>;

    /// 有効な会員の一覧を取得する（明示的なactive述語で絞り込む）
    async fn list_active_members(&self) -> Result<Vec<Member>>;

    /// 同一メールアドレスの会員が既に存在するか
    async fn member_exists_with_email(&self, email: &str) -> Result<bool>;

    /// 新しい会員を永続化する
    async fn insert_member(&self, member: &Member) -> Result<()>;

    /// 会員を上書き保存する（会員管理操作・退会）
    async fn update_member(&self, member: &Member) -> Result<()>;
}
