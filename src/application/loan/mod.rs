pub mod eligibility;
pub mod errors;
pub mod ledger;
pub mod lock;
pub mod loan_service;

pub use errors::LoanError;
pub use ledger::Reservation;
pub use lock::BookLockTable;
pub use loan_service::{
    LoanPolicy, LoanRecord, ServiceDependencies, borrow_book, get_loan, return_book,
};
