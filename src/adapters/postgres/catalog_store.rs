use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::domain::{
    Audit, Book, Isbn, Loan, Member,
    value_objects::{BookId, LoanId, MemberId},
};
use crate::ports::{book_store, loan_store, member_store};

/// PostgreSQL implementation of the catalog store ports.
///
/// Borrow/return commits run inside a single transaction and take
/// `SELECT ... FOR UPDATE` on the book row, so the read-then-write of
/// `available_copies` is serialized at the row level even if another
/// process shares the database. In-process callers are already
/// serialized per book by the engine's lock table.
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Create a new store over a PostgreSQL connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn book_from_row(row: &PgRow) -> Result<Book, sqlx::Error> {
        let total: i32 = row.try_get("total_copies")?;
        let available: i32 = row.try_get("available_copies")?;
        let isbn: String = row.try_get("isbn")?;
        Ok(Book {
            book_id: BookId::from_uuid(row.try_get("id")?),
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            // non-empty enforced at creation time; stored values are trusted
            isbn: Isbn::new(isbn).map_err(|_| sqlx::Error::Decode("empty ISBN in books row".into()))?,
            total_copies: total as u32,
            available_copies: available as u32,
            audit: Self::audit_from_row(row)?,
        })
    }

    fn member_from_row(row: &PgRow) -> Result<Member, sqlx::Error> {
        Ok(Member {
            member_id: MemberId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone_number: row.try_get("phone_number")?,
            audit: Self::audit_from_row(row)?,
        })
    }

    fn loan_from_row(row: &PgRow) -> Result<Loan, sqlx::Error> {
        Ok(Loan {
            loan_id: LoanId::from_uuid(row.try_get("id")?),
            book_id: BookId::from_uuid(row.try_get("book_id")?),
            member_id: MemberId::from_uuid(row.try_get("member_id")?),
            borrowed_at: row.try_get("borrowed_at")?,
            due_date: row.try_get("due_date")?,
            returned_at: row.try_get("returned_at")?,
            audit: Self::audit_from_row(row)?,
        })
    }

    fn audit_from_row(row: &PgRow) -> Result<Audit, sqlx::Error> {
        Ok(Audit {
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            deleted_at: row.try_get("deleted_at")?,
        })
    }
}

#[async_trait]
impl crate::ports::BookStore for PostgresCatalogStore {
    async fn get_book(&self, book_id: BookId) -> book_store::Result<Option<Book>> {
        let row = sqlx::query("SELECT * FROM books WHERE id = $1")
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| Self::book_from_row(&row)).transpose().map_err(Into::into)
    }

    async fn list_active_books(&self) -> book_store::Result<Vec<Book>> {
        // soft-delete filtering is an explicit predicate, not a hidden default
        let rows = sqlx::query("SELECT * FROM books WHERE deleted_at IS NULL ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(Self::book_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn book_exists_with_isbn(&self, isbn: &Isbn) -> book_store::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn.value())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_book(&self, book: &Book) -> book_store::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (
                id, title, author, isbn, total_copies, available_copies,
                is_active, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.value())
        .bind(book.total_copies as i32)
        .bind(book.available_copies as i32)
        .bind(book.audit.is_active)
        .bind(book.audit.created_at)
        .bind(book.audit.updated_at)
        .bind(book.audit.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> book_store::Result<()> {
        sqlx::query(
            r#"
            UPDATE books
            SET title = $2, author = $3, isbn = $4,
                total_copies = $5, available_copies = $6,
                is_active = $7, updated_at = $8, deleted_at = $9
            WHERE id = $1
            "#,
        )
        .bind(book.book_id.value())
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.isbn.value())
        .bind(book.total_copies as i32)
        .bind(book.available_copies as i32)
        .bind(book.audit.is_active)
        .bind(book.audit.updated_at)
        .bind(book.audit.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl crate::ports::MemberStore for PostgresCatalogStore {
    async fn get_member(&self, member_id: MemberId) -> member_store::Result<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE id = $1")
            .bind(member_id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| Self::member_from_row(&row)).transpose().map_err(Into::into)
    }

    async fn list_active_members(&self) -> member_store::Result<Vec<Member>> {
        let rows = sqlx::query("SELECT * FROM members WHERE deleted_at IS NULL ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(Self::member_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    async fn member_exists_with_email(&self, email: &str) -> member_store::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_member(&self, member: &Member) -> member_store::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (
                id, name, email, phone_number,
                is_active, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(member.member_id.value())
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone_number)
        .bind(member.audit.is_active)
        .bind(member.audit.created_at)
        .bind(member.audit.updated_at)
        .bind(member.audit.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_member(&self, member: &Member) -> member_store::Result<()> {
        sqlx::query(
            r#"
            UPDATE members
            SET name = $2, email = $3, phone_number = $4,
                is_active = $5, updated_at = $6, deleted_at = $7
            WHERE id = $1
            "#,
        )
        .bind(member.member_id.value())
        .bind(&member.name)
        .bind(&member.email)
        .bind(&member.phone_number)
        .bind(member.audit.is_active)
        .bind(member.audit.updated_at)
        .bind(member.audit.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl crate::ports::LoanStore for PostgresCatalogStore {
    async fn get_loan(&self, loan_id: LoanId) -> loan_store::Result<Option<Loan>> {
        let row = sqlx::query("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id.value())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| Self::loan_from_row(&row)).transpose().map_err(Into::into)
    }

    async fn count_open_loans(&self, member_id: MemberId) -> loan_store::Result<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE member_id = $1 AND returned_at IS NULL",
        )
        .bind(member_id.value())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u32)
    }

    async fn count_overdue_open_loans(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> loan_store::Result<u32> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE member_id = $1 AND returned_at IS NULL AND due_date < $2
            "#,
        )
        .bind(member_id.value())
        .bind(as_of)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u32)
    }

    async fn count_open_loans_for_book(&self, book_id: BookId) -> loan_store::Result<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM loans WHERE book_id = $1 AND returned_at IS NULL",
        )
        .bind(book_id.value())
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u32)
    }

    /// Insert the loan and write the decremented copy count in one
    /// transaction. The book row is locked first so no concurrent
    /// transaction can interleave its own read-then-write of the count.
    async fn commit_borrow(&self, book: &Book, loan: &Loan) -> loan_store::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book.book_id.value())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET available_copies = $2, updated_at = $3 WHERE id = $1")
            .bind(book.book_id.value())
            .bind(book.available_copies as i32)
            .bind(book.audit.updated_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO loans (
                id, book_id, member_id, borrowed_at, due_date, returned_at,
                is_active, created_at, updated_at, deleted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(loan.loan_id.value())
        .bind(loan.book_id.value())
        .bind(loan.member_id.value())
        .bind(loan.borrowed_at)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(loan.audit.is_active)
        .bind(loan.audit.created_at)
        .bind(loan.audit.updated_at)
        .bind(loan.audit.deleted_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Close the loan and write the incremented copy count in one
    /// transaction, with the same row lock as `commit_borrow`.
    async fn commit_return(&self, book: &Book, loan: &Loan) -> loan_store::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM books WHERE id = $1 FOR UPDATE")
            .bind(book.book_id.value())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE books SET available_copies = $2, updated_at = $3 WHERE id = $1")
            .bind(book.book_id.value())
            .bind(book.available_copies as i32)
            .bind(book.audit.updated_at)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE loans SET returned_at = $2, updated_at = $3 WHERE id = $1")
            .bind(loan.loan_id.value())
            .bind(loan.returned_at)
            .bind(loan.audit.updated_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
