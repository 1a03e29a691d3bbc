use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Audit, MemberId};

/// 会員エンティティ
///
/// 貸出エンジンからは読み取り専用。メールアドレスはカタログ全体で一意
/// （一意性はストア層で検証）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: MemberId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub audit: Audit,
}

impl Member {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            member_id: MemberId::new(),
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            audit: Audit::new(now),
        }
    }

    pub fn is_active(&self) -> bool {
        self.audit.is_active
    }

    /// 会員情報を更新する
    pub fn update_profile(
        self,
        name: impl Into<String>,
        email: impl Into<String>,
        phone_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone_number: phone_number.into(),
            audit: self.audit.touch(now),
            ..self
        }
    }

    /// 退会する（論理削除）。新規貸出に対して終端状態。
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

    #[test]
    fn test_new_member_is_active() {
        let member = Member::new("山田太郎", "taro@example.com", "090-0000-0000", Utc::now());
        assert!(member.is_active());
    }

    #[test]
    fn test_retire_deactivates() {
        let member =
            Member::new("山田太郎", "taro@example.com", "090-0000-0000", Utc::now()).retire(Utc::now());
        assert!(!member.is_active());
    }
}
