use std::fmt;

use circ_store::StoreError;
use circ_types::{BookId, BorrowerId, FineId, LoanId, Money, TypeError};

/// Reference to a record, used in `NotFound`, `HasOpenLoans` and
/// `HasUnpaidFines` reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordRef {
    Book(BookId),
    Borrower(BorrowerId),
    Loan(LoanId),
    Fine(FineId),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Book(id) => write!(f, "book {id}"),
            Self::Borrower(id) => write!(f, "borrower {id}"),
            Self::Loan(id) => write!(f, "loan {id}"),
            Self::Fine(id) => write!(f, "fine {id}"),
        }
    }
}

/// Errors produced by circulation operations.
///
/// Everything except `Storage` is an expected, recoverable outcome that the
/// presentation layer turns into a message. `Storage` means the whole
/// operation was rolled back and may be retried.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("no copies of book {book} are available")]
    Unavailable { book: BookId },

    #[error("borrower {borrower} already holds a copy of book {book}")]
    AlreadyHeld { book: BookId, borrower: BorrowerId },

    #[error("borrower {borrower} has {outstanding} in unpaid fines")]
    OutstandingFines {
        borrower: BorrowerId,
        outstanding: Money,
    },

    #[error("loan {0} has already been returned")]
    AlreadyReturned(LoanId),

    #[error("fine {0} has already been paid")]
    AlreadyPaid(FineId),

    #[error("{0} not found")]
    NotFound(RecordRef),

    #[error("{record} has {count} open loan(s)")]
    HasOpenLoans { record: RecordRef, count: usize },

    #[error("{record} has {outstanding} in unpaid fines")]
    HasUnpaidFines {
        record: RecordRef,
        outstanding: Money,
    },

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("invalid value: {0}")]
    Type(#[from] TypeError),

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl PolicyError {
    /// Returns `true` for failures caused by the store rather than by the
    /// request. Only these are worth retrying.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

/// Result alias for circulation operations.
pub type PolicyResult<T> = Result<T, PolicyError>;
