use serde::{Deserialize, Serialize};

use crate::id::{BorrowerId, FineId, LoanId};
use crate::money::Money;
use crate::Date;

/// Payment state of a fine. A cancelled fine is deleted rather than kept in
/// a third state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineState {
    Unpaid,
    Paid,
}

/// A late-return penalty. Owned by its loan: deleting the loan deletes the
/// fine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fine {
    pub id: FineId,
    pub loan_id: LoanId,
    pub borrower_id: BorrowerId,
    pub amount: Money,
    pub days_overdue: u32,
    pub issued_on: Date,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub payment_date: Option<Date>,
}

impl Fine {
    /// Issue an unpaid fine.
    pub fn issue(
        loan_id: LoanId,
        borrower_id: BorrowerId,
        amount: Money,
        days_overdue: u32,
        issued_on: Date,
    ) -> Self {
        Self {
            id: FineId::new(),
            loan_id,
            borrower_id,
            amount,
            days_overdue,
            issued_on,
            paid: false,
            payment_date: None,
        }
    }

    pub fn state(&self) -> FineState {
        if self.paid {
            FineState::Paid
        } else {
            FineState::Unpaid
        }
    }

    /// Human-readable reason, as shown on fine listings.
    pub fn description(&self) -> String {
        let unit = if self.days_overdue == 1 { "day" } else { "days" };
        format!("Late return: {} {unit}", self.days_overdue)
    }
}
