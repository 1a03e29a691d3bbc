use crate::domain::{
    Book, Loan,
    value_objects::{BookId, LoanId, MemberId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Loan store port.
///
/// Point lookups and aggregate counts feed the eligibility checks; the two
/// commit operations are the transactional boundary of the loan engine.
/// A commit persists the loan row and the book's new copy count together,
/// or not at all. Partial application (count changed without the loan, or
/// the loan without the count) must be impossible.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// Look up a loan by id.
    async fn get_loan(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// Count open loans (returned_at IS NULL) for a member.
    ///
    /// Feeds the borrowing-limit check.
    async fn count_open_loans(&self, member_id: MemberId) -> Result<u32>;

    /// Count open loans for a member whose due date is strictly before `as_of`.
    ///
    /// Feeds the overdue lock-out check.
    async fn count_overdue_open_loans(
        &self,
        member_id: MemberId,
        as_of: DateTime<Utc>,
    ) -> Result<u32>;

    /// Count open loans referencing a book.
    ///
    /// Used to verify the ledger invariant
    /// `available_copies = total_copies - open loans`.
    async fn count_open_loans_for_book(&self, book_id: BookId) -> Result<u32>;

    /// Persist a newly opened loan together with the decremented book row,
    /// atomically.
    async fn commit_borrow(&self, book: &Book, loan: &Loan) -> Result<()>;

    /// Persist a closed loan together with the incremented book row,
    /// atomically.
    async fn commit_return(&self, book: &Book, loan: &Loan) -> Result<()>;
}
