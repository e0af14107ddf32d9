use circ_types::Money;
use serde::{Deserialize, Serialize};

use crate::error::{PolicyError, PolicyResult};

/// Default number of days between borrowing and the due date.
pub const DEFAULT_LOAN_PERIOD_DAYS: u32 = 14;

/// Default fine per overdue day, in cents.
pub const DEFAULT_FINE_RATE_CENTS: u64 = 50;

/// Default look-ahead window for "due soon" reporting.
pub const DEFAULT_DUE_SOON_DAYS: u32 = 3;

/// Loan and fine policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanPolicy {
    /// Days from the loan date to the due date.
    pub loan_period_days: u32,
    /// Fine charged for each whole day a loan is returned late.
    pub fine_rate_per_day: Money,
    /// Refuse new loans while the borrower has any unpaid fine.
    pub enforce_fine_block: bool,
    /// A loan counts as "due soon" when its due date is at most this many
    /// days away.
    pub due_soon_days: u32,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            fine_rate_per_day: Money::from_cents(DEFAULT_FINE_RATE_CENTS),
            enforce_fine_block: true,
            due_soon_days: DEFAULT_DUE_SOON_DAYS,
        }
    }
}

impl LoanPolicy {
    /// The default policy with the unpaid-fine block switched off.
    pub fn lenient() -> Self {
        Self {
            enforce_fine_block: false,
            ..Default::default()
        }
    }

    /// Reject configurations that would make every loan due immediately.
    pub fn validate(&self) -> PolicyResult<()> {
        if self.loan_period_days == 0 {
            return Err(PolicyError::Invalid(
                "loan_period_days must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Fine owed for a loan returned `days_overdue` days late.
    pub fn fine_for(&self, days_overdue: u32) -> PolicyResult<Money> {
        self.fine_rate_per_day
            .checked_times(days_overdue)
            .ok_or_else(|| {
                PolicyError::Invalid(format!("fine for {days_overdue} days overflows"))
            })
    }
}
