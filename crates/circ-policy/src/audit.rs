//! Inventory consistency audit.
//!
//! Cross-checks the catalog against the loan and fine ledgers. A store only
//! ever written through [`Circulation`] audits clean; violations point at
//! hand-edited snapshots or bugs.

use std::collections::{HashMap, HashSet};
use std::fmt;

use circ_store::{CirculationStore, FineQuery, LoanQuery, StoreResult, StoreTransaction};
use circ_types::{BookId, BorrowerId, LoanId};
use serde::Serialize;
use tracing::warn;

use crate::circulation::Circulation;
use crate::error::PolicyResult;

/// Result of an inventory audit.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub books: usize,
    pub borrowers: usize,
    pub loans: usize,
    pub fines: usize,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    /// Returns `true` if no check failed.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A single failed check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// The offending record, e.g. "book 0192...".
    pub subject: String,
    pub description: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.subject, self.description)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    /// `available_copies` exceeds `total_copies`.
    CopiesOutOfRange,
    /// `total_copies` is zero.
    NoCopies,
    /// `available_copies` differs from total minus open loans.
    CountMismatch,
    /// Loan points at a missing book.
    DanglingBook,
    /// Loan points at a missing borrower.
    DanglingBorrower,
    /// Fine points at a missing loan.
    DanglingLoan,
    /// Fine on a loan that is open or was returned on time.
    UnearnedFine,
    /// More than one fine on the same loan.
    DuplicateFine,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CopiesOutOfRange => "copies-out-of-range",
            Self::NoCopies => "no-copies",
            Self::CountMismatch => "count-mismatch",
            Self::DanglingBook => "dangling-book",
            Self::DanglingBorrower => "dangling-borrower",
            Self::DanglingLoan => "dangling-loan",
            Self::UnearnedFine => "unearned-fine",
            Self::DuplicateFine => "duplicate-fine",
        };
        f.write_str(name)
    }
}

/// Inventory auditor.
pub struct InventoryAuditor;

impl InventoryAuditor {
    /// Audit a store in a read-only transaction.
    pub fn audit<S: CirculationStore>(store: &S) -> StoreResult<AuditReport> {
        let tx = store.begin()?;
        Self::audit_transaction(&tx)
    }

    /// Audit the state visible through an open transaction, including its
    /// uncommitted writes.
    pub fn audit_transaction<T: StoreTransaction>(tx: &T) -> StoreResult<AuditReport> {
        let books = tx.list_books()?;
        let borrowers: HashSet<BorrowerId> =
            tx.list_borrowers()?.into_iter().map(|b| b.id).collect();
        let loans = tx.list_loans(&LoanQuery::all())?;
        let fines = tx.list_fines(&FineQuery::all())?;
        let mut violations = Vec::new();

        let mut open_per_book: HashMap<BookId, u32> = HashMap::new();
        for loan in loans.iter().filter(|l| l.is_open()) {
            *open_per_book.entry(loan.book_id).or_default() += 1;
        }

        let book_ids: HashSet<BookId> = books.iter().map(|b| b.id).collect();
        for book in &books {
            let subject = format!("book {}", book.id);
            if book.total_copies == 0 {
                violations.push(Violation {
                    kind: ViolationKind::NoCopies,
                    subject: subject.clone(),
                    description: "total_copies is zero".into(),
                });
            }
            if book.available_copies > book.total_copies {
                violations.push(Violation {
                    kind: ViolationKind::CopiesOutOfRange,
                    subject: subject.clone(),
                    description: format!(
                        "{} available of {} total",
                        book.available_copies, book.total_copies
                    ),
                });
            }
            let open = open_per_book.get(&book.id).copied().unwrap_or(0);
            let expected = i64::from(book.total_copies) - i64::from(open);
            if i64::from(book.available_copies) != expected {
                violations.push(Violation {
                    kind: ViolationKind::CountMismatch,
                    subject,
                    description: format!(
                        "{} available but {} total with {open} on loan",
                        book.available_copies, book.total_copies
                    ),
                });
            }
        }

        let mut loans_by_id = HashMap::with_capacity(loans.len());
        for loan in &loans {
            let subject = format!("loan {}", loan.id);
            if !book_ids.contains(&loan.book_id) {
                violations.push(Violation {
                    kind: ViolationKind::DanglingBook,
                    subject: subject.clone(),
                    description: format!("book {} does not exist", loan.book_id),
                });
            }
            if !borrowers.contains(&loan.borrower_id) {
                violations.push(Violation {
                    kind: ViolationKind::DanglingBorrower,
                    subject,
                    description: format!("borrower {} does not exist", loan.borrower_id),
                });
            }
            loans_by_id.insert(loan.id, loan);
        }

        let mut fined: HashSet<LoanId> = HashSet::new();
        for fine in &fines {
            let subject = format!("fine {}", fine.id);
            let Some(loan) = loans_by_id.get(&fine.loan_id) else {
                violations.push(Violation {
                    kind: ViolationKind::DanglingLoan,
                    subject,
                    description: format!("loan {} does not exist", fine.loan_id),
                });
                continue;
            };
            let late = loan
                .return_date
                .is_some_and(|returned| loan.days_overdue(returned) > 0);
            if !late {
                violations.push(Violation {
                    kind: ViolationKind::UnearnedFine,
                    subject: subject.clone(),
                    description: format!("loan {} was not returned late", loan.id),
                });
            }
            if !fined.insert(fine.loan_id) {
                violations.push(Violation {
                    kind: ViolationKind::DuplicateFine,
                    subject,
                    description: format!("loan {} already carries a fine", loan.id),
                });
            }
        }

        for v in &violations {
            warn!(kind = %v.kind, subject = %v.subject, "{}", v.description);
        }

        Ok(AuditReport {
            books: books.len(),
            borrowers: borrowers.len(),
            loans: loans.len(),
            fines: fines.len(),
            violations,
        })
    }
}

impl<S: CirculationStore> Circulation<S> {
    /// Run the inventory audit against this desk's store.
    pub fn audit(&self) -> PolicyResult<AuditReport> {
        Ok(InventoryAuditor::audit(self.store())?)
    }
}
