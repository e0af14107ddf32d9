use chrono::Days;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{BookId, BorrowerId, LoanId};
use crate::Date;

/// Lifecycle state of a loan. `Returned` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanState {
    Open,
    Returned,
}

/// A single borrow event.
///
/// `return_date` is set exactly once, on return; the loan is immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub book_id: BookId,
    pub borrower_id: BorrowerId,
    pub loan_date: Date,
    pub due_date: Date,
    #[serde(default)]
    pub return_date: Option<Date>,
}

impl Loan {
    /// Open a loan dated `loan_date`, due `period_days` later.
    pub fn open(
        book_id: BookId,
        borrower_id: BorrowerId,
        loan_date: Date,
        period_days: u32,
    ) -> Result<Self, TypeError> {
        let due_date = loan_date
            .checked_add_days(Days::new(u64::from(period_days)))
            .ok_or_else(|| {
                TypeError::DateOutOfRange(format!("{loan_date} + {period_days} days"))
            })?;
        Ok(Self {
            id: LoanId::new(),
            book_id,
            borrower_id,
            loan_date,
            due_date,
            return_date: None,
        })
    }

    pub fn state(&self) -> LoanState {
        match self.return_date {
            None => LoanState::Open,
            Some(_) => LoanState::Returned,
        }
    }

    pub fn is_open(&self) -> bool {
        self.return_date.is_none()
    }

    /// Whole calendar days past the due date as of `on`. Zero on or before
    /// the due date.
    pub fn days_overdue(&self, on: Date) -> u32 {
        let days = (on - self.due_date).num_days();
        u32::try_from(days.max(0)).unwrap_or(u32::MAX)
    }

    /// Returns `true` if the loan is still open and `today` is past due.
    pub fn is_overdue(&self, today: Date) -> bool {
        self.is_open() && today > self.due_date
    }

    /// Open and due within `window_days` of `today` (inclusive), but not yet
    /// overdue.
    pub fn is_due_within(&self, today: Date, window_days: u32) -> bool {
        if !self.is_open() || today > self.due_date {
            return false;
        }
        (self.due_date - today).num_days() <= i64::from(window_days)
    }
}
