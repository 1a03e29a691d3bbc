use std::sync::Arc;

use chrono::{TimeZone, Utc};

use book_lending::adapters::memory::MemoryCatalogStore;
use book_lending::application::catalog::{
    BookInput, CatalogError, MemberInput, book_service, member_service,
};
use book_lending::application::loan::{BookLockTable, LoanPolicy, ServiceDependencies};

fn test_deps() -> (ServiceDependencies, Arc<MemoryCatalogStore>) {
    let store = Arc::new(MemoryCatalogStore::new());
    let deps = ServiceDependencies {
        book_store: store.clone(),
        member_store: store.clone(),
        loan_store: store.clone(),
        book_locks: Arc::new(BookLockTable::new()),
        policy: LoanPolicy::default(),
    };
    (deps, store)
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn book_input(isbn: &str) -> BookInput {
    BookInput {
        title: "風の歌を聴け".to_string(),
        author: "村上春樹".to_string(),
        isbn: isbn.to_string(),
        total_copies: 3,
        available_copies: 3,
    }
}

fn member_input(email: &str) -> MemberInput {
    MemberInput {
        name: "佐藤花子".to_string(),
        email: email.to_string(),
        phone_number: "080-1111-2222".to_string(),
    }
}

// ============================================================================
// 書籍カタログ管理
// ============================================================================

#[tokio::test]
async fn test_create_book_and_get_it_back() {
    let (deps, _store) = test_deps();
    let created = book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();

    let fetched = book_service::get_book(&deps, created.book_id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.available_copies, 3);
}

#[tokio::test]
async fn test_create_book_rejects_duplicate_isbn() {
    let (deps, _store) = test_deps();
    book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();

    let result = book_service::create_book(&deps, book_input("isbn-1"), now()).await;
    assert!(matches!(result.unwrap_err(), CatalogError::DuplicateIsbn(_)));
}

#[tokio::test]
async fn test_create_book_rejects_available_over_total() {
    let (deps, _store) = test_deps();
    let mut input = book_input("isbn-1");
    input.available_copies = 4;

    let result = book_service::create_book(&deps, input, now()).await;
    assert!(matches!(
        result.unwrap_err(),
        CatalogError::AvailableExceedsTotal
    ));
}

#[tokio::test]
async fn test_create_book_rejects_empty_isbn() {
    let (deps, _store) = test_deps();
    let result = book_service::create_book(&deps, book_input("  "), now()).await;
    assert!(matches!(result.unwrap_err(), CatalogError::InvalidIsbn));
}

#[tokio::test]
async fn test_update_book_rejects_isbn_taken_by_another_book() {
    let (deps, _store) = test_deps();
    book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();
    let second = book_service::create_book(&deps, book_input("isbn-2"), now())
        .await
        .unwrap();

    let result =
        book_service::update_book(&deps, second.book_id, book_input("isbn-1"), now()).await;
    assert!(matches!(result.unwrap_err(), CatalogError::DuplicateIsbn(_)));
}

#[tokio::test]
async fn test_update_book_keeping_own_isbn_is_allowed() {
    let (deps, _store) = test_deps();
    let created = book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();

    let mut input = book_input("isbn-1");
    input.title = "1973年のピンボール".to_string();
    let updated = book_service::update_book(&deps, created.book_id, input, now())
        .await
        .unwrap();
    assert_eq!(updated.title, "1973年のピンボール");
}

#[tokio::test]
async fn test_retire_book_hides_it_from_reads() {
    let (deps, _store) = test_deps();
    let created = book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();

    book_service::retire_book(&deps, created.book_id, now())
        .await
        .unwrap();

    let result = book_service::get_book(&deps, created.book_id).await;
    assert!(matches!(result.unwrap_err(), CatalogError::BookNotFound));

    let listed = book_service::list_books(&deps).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_update_book_waits_for_the_book_lock() {
    // 貸出・返却が書籍ロックを保持している間、冊数を上書きする更新は
    // 割り込めない
    let (deps, _store) = test_deps();
    let created = book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();

    let guard = deps.book_locks.acquire(created.book_id).await;

    let deps2 = deps.clone();
    let book_id = created.book_id;
    let update = tokio::spawn(async move {
        book_service::update_book(&deps2, book_id, book_input("isbn-1"), now()).await
    });

    tokio::task::yield_now().await;
    assert!(!update.is_finished());

    drop(guard);
    update.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_retire_book_twice_is_not_found() {
    let (deps, _store) = test_deps();
    let created = book_service::create_book(&deps, book_input("isbn-1"), now())
        .await
        .unwrap();

    book_service::retire_book(&deps, created.book_id, now())
        .await
        .unwrap();
    let result = book_service::retire_book(&deps, created.book_id, now()).await;
    assert!(matches!(result.unwrap_err(), CatalogError::BookNotFound));
}

// ============================================================================
// 会員管理
// ============================================================================

#[tokio::test]
async fn test_create_member_and_list() {
    let (deps, _store) = test_deps();
    let created = member_service::create_member(&deps, member_input("hanako@example.com"), now())
        .await
        .unwrap();

    let listed = member_service::list_members(&deps).await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn test_create_member_rejects_duplicate_email() {
    let (deps, _store) = test_deps();
    member_service::create_member(&deps, member_input("hanako@example.com"), now())
        .await
        .unwrap();

    let result =
        member_service::create_member(&deps, member_input("hanako@example.com"), now()).await;
    assert!(matches!(result.unwrap_err(), CatalogError::DuplicateEmail(_)));
}

#[tokio::test]
async fn test_update_member_changes_profile() {
    let (deps, _store) = test_deps();
    let created = member_service::create_member(&deps, member_input("hanako@example.com"), now())
        .await
        .unwrap();

    let mut input = member_input("new@example.com");
    input.name = "佐藤はな子".to_string();
    let updated = member_service::update_member(&deps, created.member_id, input, now())
        .await
        .unwrap();
    assert_eq!(updated.name, "佐藤はな子");
    assert_eq!(updated.email, "new@example.com");
}

#[tokio::test]
async fn test_retire_member_hides_them_from_reads() {
    let (deps, _store) = test_deps();
    let created = member_service::create_member(&deps, member_input("hanako@example.com"), now())
        .await
        .unwrap();

    member_service::retire_member(&deps, created.member_id, now())
        .await
        .unwrap();

    let result = member_service::get_member(&deps, created.member_id).await;
    assert!(matches!(result.unwrap_err(), CatalogError::MemberNotFound));
    assert!(member_service::list_members(&deps).await.unwrap().is_empty());
}
