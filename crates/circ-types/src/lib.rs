//! Foundation types for the circulation ledger.
//!
//! This crate provides the identifiers and records shared by the store, the
//! loan policy, and the command-line front end. Every other circ crate
//! depends on `circ-types`.
//!
//! # Key Types
//!
//! - [`BookId`], [`BorrowerId`], [`LoanId`], [`FineId`] -- UUID v7 identifiers
//! - [`Book`] -- catalog entry with total and available copy counts
//! - [`Borrower`] -- a registered member who may take books out
//! - [`Loan`] -- a single borrow event with its due and return dates
//! - [`Fine`] -- a late-return penalty owned by a loan
//! - [`Money`] -- non-negative currency amount with two decimal places

pub mod book;
pub mod borrower;
pub mod error;
pub mod fine;
pub mod id;
pub mod loan;
pub mod money;

pub use book::Book;
pub use borrower::{Borrower, BorrowerRole};
pub use error::TypeError;
pub use fine::{Fine, FineState};
pub use id::{BookId, BorrowerId, FineId, LoanId};
pub use loan::{Loan, LoanState};
pub use money::Money;

/// Calendar date used throughout the ledger. Loans and fines are tracked in
/// whole days, so no time-of-day or zone is carried.
pub type Date = chrono::NaiveDate;
