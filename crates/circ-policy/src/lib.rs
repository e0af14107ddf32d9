//! Loan lifecycle and fine-accrual policy for the circulation ledger.
//!
//! [`Circulation`] is the circulation desk. It owns a store and a
//! [`LoanPolicy`] and offers:
//! - Borrowing, gated by an ordered list of [`BorrowRule`]s
//! - Returning, with a per-day fine issued for late returns
//! - Paying fines one at a time or all at once, and cancelling them
//! - Catalog and borrower administration
//! - Catalog search and borrower, library, overdue and fine reports
//! - An [`InventoryAuditor`] that cross-checks copy counts against the ledger
//!
//! Every operation takes "today" from the caller and runs in a single store
//! transaction: it either commits all of its writes or none of them.

pub mod admin;
pub mod audit;
pub mod circulation;
pub mod config;
pub mod error;
pub mod reports;
pub mod rules;

pub use admin::{BookUpdate, BorrowerUpdate, NewBook, NewBorrower};
pub use audit::{AuditReport, InventoryAuditor, Violation, ViolationKind};
pub use circulation::{Circulation, ReturnOutcome};
pub use config::LoanPolicy;
pub use error::{PolicyError, PolicyResult, RecordRef};
pub use reports::{BorrowerSummary, FineFilter, GenreCount, LibrarySummary, OverdueLoan};
pub use rules::{
    AvailabilityRule, BorrowContext, BorrowRule, Denial, Eligibility, FineBlockRule,
    RuleDecision, SingleCopyRule,
};
