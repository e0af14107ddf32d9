//! Borrow eligibility rules.
//!
//! A borrow request is checked by an ordered list of rules. The first rule
//! that denies stops evaluation, and its denial is what the caller sees.

use std::fmt;

use circ_types::{Book, BookId, Borrower, BorrowerId, Fine, Loan, Money};

use crate::config::LoanPolicy;
use crate::error::PolicyError;

// ---------------------------------------------------------------------------
// Denial
// ---------------------------------------------------------------------------

/// Why a borrow request was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Denial {
    /// No copies on the shelf.
    Unavailable,
    /// The borrower already has an open loan on this book.
    AlreadyHeld,
    /// The borrower owes unpaid fines.
    OutstandingFines { outstanding: Money },
    /// A custom rule refused the request.
    Other(String),
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("no copies available"),
            Self::AlreadyHeld => f.write_str("borrower already holds this book"),
            Self::OutstandingFines { outstanding } => {
                write!(f, "borrower has {outstanding} in unpaid fines")
            }
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Decision of a single rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleDecision {
    Pass,
    Deny(Denial),
}

// ---------------------------------------------------------------------------
// Eligibility
// ---------------------------------------------------------------------------

/// Outcome of evaluating every rule against a borrow request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Denied {
        /// Name of the rule that refused.
        rule: String,
        denial: Denial,
    },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// The refusal reason, if any.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Eligible => None,
            Self::Denied { denial, .. } => Some(denial.to_string()),
        }
    }

    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Eligible => None,
            Self::Denied { denial, .. } => Some(denial),
        }
    }

    /// Convert a refusal into the error `borrow` reports for it.
    pub fn into_error(self, book: BookId, borrower: BorrowerId) -> Option<PolicyError> {
        let Self::Denied { rule, denial } = self else {
            return None;
        };
        Some(match denial {
            Denial::Unavailable => PolicyError::Unavailable { book },
            Denial::AlreadyHeld => PolicyError::AlreadyHeld { book, borrower },
            Denial::OutstandingFines { outstanding } => PolicyError::OutstandingFines {
                borrower,
                outstanding,
            },
            Denial::Other(reason) => PolicyError::Invalid(format!("{rule}: {reason}")),
        })
    }
}

// ---------------------------------------------------------------------------
// BorrowContext
// ---------------------------------------------------------------------------

/// Everything a rule may look at, read inside the borrow transaction.
pub struct BorrowContext<'a> {
    pub book: &'a Book,
    pub borrower: &'a Borrower,
    /// Open loans for this (book, borrower) pair.
    pub open_loans: &'a [Loan],
    /// The borrower's unpaid fines.
    pub unpaid_fines: &'a [Fine],
    pub policy: &'a LoanPolicy,
}

// ---------------------------------------------------------------------------
// BorrowRule trait
// ---------------------------------------------------------------------------

/// A single eligibility check.
///
/// Object-safe and `Send + Sync` so rules can be stored in a
/// `Vec<Box<dyn BorrowRule>>` inside a shared service.
pub trait BorrowRule: Send + Sync {
    /// Short name reported when this rule denies (e.g. "availability").
    fn name(&self) -> &str;

    fn check(&self, ctx: &BorrowContext<'_>) -> RuleDecision;
}

/// Denies when no copy is on the shelf.
pub struct AvailabilityRule;

impl BorrowRule for AvailabilityRule {
    fn name(&self) -> &str {
        "availability"
    }

    fn check(&self, ctx: &BorrowContext<'_>) -> RuleDecision {
        if ctx.book.available_copies == 0 {
            RuleDecision::Deny(Denial::Unavailable)
        } else {
            RuleDecision::Pass
        }
    }
}

/// Denies a second concurrent loan of the same book to the same borrower.
pub struct SingleCopyRule;

impl BorrowRule for SingleCopyRule {
    fn name(&self) -> &str {
        "single-copy"
    }

    fn check(&self, ctx: &BorrowContext<'_>) -> RuleDecision {
        if ctx.open_loans.is_empty() {
            RuleDecision::Pass
        } else {
            RuleDecision::Deny(Denial::AlreadyHeld)
        }
    }
}

/// Denies while the borrower has unpaid fines, if the policy enforces it.
pub struct FineBlockRule;

impl BorrowRule for FineBlockRule {
    fn name(&self) -> &str {
        "fine-block"
    }

    fn check(&self, ctx: &BorrowContext<'_>) -> RuleDecision {
        if !ctx.policy.enforce_fine_block || ctx.unpaid_fines.is_empty() {
            return RuleDecision::Pass;
        }
        let outstanding: Money = ctx.unpaid_fines.iter().map(|f| f.amount).sum();
        RuleDecision::Deny(Denial::OutstandingFines { outstanding })
    }
}

/// Availability, then single-copy, then fine block.
pub fn default_rules() -> Vec<Box<dyn BorrowRule>> {
    vec![
        Box::new(AvailabilityRule),
        Box::new(SingleCopyRule),
        Box::new(FineBlockRule),
    ]
}

/// Run `rules` in order and stop at the first denial.
pub fn evaluate(rules: &[Box<dyn BorrowRule>], ctx: &BorrowContext<'_>) -> Eligibility {
    for rule in rules {
        if let RuleDecision::Deny(denial) = rule.check(ctx) {
            return Eligibility::Denied {
                rule: rule.name().to_string(),
                denial,
            };
        }
    }
    Eligibility::Eligible
}
