use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::loan::ServiceDependencies;
use crate::domain::{Member, value_objects::MemberId};
use crate::ports::MemberStore;

use super::errors::{CatalogError, Result};

/// 会員の登録・更新リクエスト
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInput {
    pub name: String,
    pub email: String,
    pub phone_number: String,
}

/// 新しい会員を登録する
///
/// ビジネスルール：メールアドレスはカタログ全体で一意であること。
pub async fn create_member(
    deps: &ServiceDependencies,
    input: MemberInput,
    now: DateTime<Utc>,
) -> Result<Member> {
    tracing::info!(name = %input.name, "Creating new member");

    let duplicate = deps
        .member_store
        .member_exists_with_email(&input.email)
        .await
        .map_err(CatalogError::StoreError)?;
    if duplicate {
        return Err(CatalogError::DuplicateEmail(input.email));
    }

    let member = Member::new(input.name, input.email, input.phone_number, now);
    deps.member_store
        .insert_member(&member)
        .await
        .map_err(CatalogError::StoreError)?;

    tracing::info!(member_id = %member.member_id.value(), "Member created");
    Ok(member)
}

/// 会員情報を更新する
pub async fn update_member(
    deps: &ServiceDependencies,
    member_id: MemberId,
    input: MemberInput,
    now: DateTime<Utc>,
) -> Result<Member> {
    let member = deps
        .member_store
        .get_member(member_id)
        .await
        .map_err(CatalogError::StoreError)?
        .filter(Member::is_active)
        .ok_or(CatalogError::MemberNotFound)?;

    // メールアドレスを変更する場合のみ一意性を再検証する
    if member.email != input.email {
        let duplicate = deps
            .member_store
            .member_exists_with_email(&input.email)
            .await
            .map_err(CatalogError::StoreError)?;
        if duplicate {
            return Err(CatalogError::DuplicateEmail(input.email));
        }
    }

    let updated = member.update_profile(input.name, input.email, input.phone_number, now);
    deps.member_store
        .update_member(&updated)
        .await
        .map_err(CatalogError::StoreError)?;

    Ok(updated)
}

/// 会員を退会させる（論理削除）
pub async fn retire_member(
    deps: &ServiceDependencies,
    member_id: MemberId,
    now: DateTime<Utc>,
) -> Result<()> {
    tracing::info!(member_id = %member_id.value(), "Retiring member");

    let member = deps
        .member_store
        .get_member(member_id)
        .await
        .map_err(CatalogError::StoreError)?
        .filter(Member::is_active)
        .ok_or(CatalogError::MemberNotFound)?;

    let retired = member.retire(now);
    deps.member_store
        .update_member(&retired)
        .await
        .map_err(CatalogError::StoreError)?;

    Ok(())
}

/// 会員の詳細を取得する
pub async fn get_member(deps: &ServiceDependencies, member_id: MemberId) -> Result<Member> {
    deps.member_store
        .get_member(member_id)
        .await
        .map_err(CatalogError::StoreError)?
        .filter(Member::is_active)
        .ok_or(CatalogError::MemberNotFound)
}

/// 有効な会員の一覧を取得する
pub async fn list_members(deps: &ServiceDependencies) -> Result<Vec<Member>> {
    deps.member_store
        .list_active_members()
        .await
        .map_err(CatalogError::StoreError)
}
