use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Book, Isbn, Loan, Member,
    value_objects::{BookId, LoanId, MemberId},
};
use crate::ports::{book_store, loan_store, member_store};

/// カタログストアのインメモリ実装
///
/// 組み込み利用とテスト用。3つのテーブルを単一のミューテックスで
/// 保護しているため、`commit_borrow` / `commit_return`は自然に
/// 原子的になる（部分適用は観測されない）。
///
/// コミット時に台帳の不変条件
/// `available_copies = total_copies - 貸出中件数` を検証し、
/// 破れていればコミットを拒否する。
pub struct MemoryCatalogStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    books: HashMap<BookId, Book>,
    members: HashMap<MemberId, Member>,
    loans: HashMap<LoanId, Loan>,
}

impl Inner {
    fn open_loans_for_book(&self, book_id: BookId) -> u32 {
        self.loans
            .values()
            .filter(|loan| loan.book_id == book_id && loan.is_open())
            .count() as u32
    }

    /// 書籍行と貸出行を適用し、台帳の不変条件
    /// `available + open = total` が保たれる場合のみ反映する。
    /// 破れる書き込みは拒否し、状態は変更しない（全適用か無適用か）。
    fn commit(&mut self, book: &Book, loan: &Loan) -> Result<(), String> {
        let saved_book = self.books.insert(book.book_id, book.clone());
        let saved_loan = self.loans.insert(loan.loan_id, loan.clone());

        let open = self.open_loans_for_book(book.book_id);
        if book.available_copies + open != book.total_copies {
            // ロールバック
            match saved_book {
                Some(prev) => self.books.insert(book.book_id, prev),
                None => self.books.remove(&book.book_id),
            };
            match saved_loan {
                Some(prev) => self.loans.insert(loan.loan_id, prev),
                None => self.loans.remove(&loan.loan_id),
            };
            return Err(format!(
                "ledger invariant broken for book {}: total={} available={} open_loans={}",
                book.book_id.value(),
                book.total_copies,
                book.available_copies,
                open
            ));
        }
        Ok(())
    }
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// テストデータ投入用：書籍を直接登録する
    pub fn seed_book(&self, book: Book) {
        self.inner.lock().unwrap().books.insert(book.book_id, book);
    }

    /// テストデータ投入用：会員を直接登録する
    pub fn seed_member(&self, member: Member) {
        self.inner
            .lock()
            .unwrap()
            .members
            .insert(member.member_id, member);
    }

    /// テストデータ投入用：貸出を直接登録する
    pub fn seed_loan(&self, loan: Loan) {
        self.inner.lock().unwrap().loans.insert(loan.loan_id, loan);
    }
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl crate::ports::BookStore for MemoryCatalogStore {
    async fn get_book(&self, book_id: BookId) -> book_store::Result<Option<Book>> {
        Ok(self.inner.lock().unwrap().books.get(&book_id).cloned())
    }

    async fn list_active_books(&self) -> book_store::Result<Vec<Book>> {
        let inner = self.inner.lock().unwrap();
        // 論理削除のフィルタリングは明示的な述語で行う
        let mut books: Vec<Book> = inner
            .books
            .values()
            .filter(|book| book.is_active())
            .cloned()
            .collect();
        books.sort_by_key(|book| book.book_id.value());
        Ok(books)
    }

    async fn book_exists_with_isbn(&self, isbn: &Isbn) -> book_store::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.books.values().any(|book| &book.isbn == isbn))
    }

    async fn insert_book(&self, book: &Book) -> book_store::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .books
            .insert(book.book_id, book.clone());
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> book_store::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .books
            .insert(book.book_id, book.clone());
        Ok(())
    }
}

#[async_trait]
impl crate::ports::MemberStore for MemoryCatalogStore {
    async fn get_member(&self, member_id: MemberId) -> member_store::Result<Option<Member>> {
        Ok(self.inner.lock().unwrap().members.get(&member_id).cloned())
    }

    async fn list_active_members(&self) -> member_store::Result<Vec<Member>> {
        let inner = self.inner.lock().unwrap();
        let mut members: Vec<Member> = inner
            .members
            .values()
            .filter(|member| member.is_active())
            .cloned()
            .collect();
        members.sort_by_key(|member| member.member_id.value());
        Ok(members)
    }

    async fn member_exists_with_email(&self, email: &str) -> member_store::Result<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.members.values().any(|member| member.email == email))
    }

    async fn insert_member(&self, member: &Member) -> member_store::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .members
            .insert(member.member_id, member.clone());
        Ok(())
    }

    async fn update_member(&self, member: &Member) -> member_store::Result<()> {
        self.inner
            .lock()
            .unwrap()
            .members
            .insert(member.member_id, member.clone());
        Ok(())
    }
}

#[async_trait]
impl crate::ports::LoanStore for MemoryCatalogStore {
    async fn get_loan(&self, loan_id: LoanId) -> loan_store::Result<Option<Loan>> {
        Ok(self.inner.lock().unwrap().loans.get(&loan_id).cloned())
    }

    async fn count_open_loans(&self, member_id: MemberId) -> loan_store::Result<u32> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .loans
            .values()
            .filter(|loan| loan.member_id == member_id && loan.is_open())
            .count() as u32)
    }

    async fn count_overdue_open_loans(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> loan_store::Result<u32> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .loans
            .values()
            .filter(|loan| loan.member_id == member_id && loan.is_overdue(as_of))
            .count() as u32)
    }

    async fn count_open_loans_for_book(&self, book_id: BookId) -> loan_store::Result<u32> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.open_loans_for_book(book_id))
    }

    async fn commit_borrow(&self, book: &Book, loan: &Loan) -> loan_store::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.commit(book, loan)?;
        Ok(())
    }

    async fn commit_return(&self, book: &Book, loan: &Loan) -> loan_store::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.commit(book, loan)?;
        Ok(())
    }
}
