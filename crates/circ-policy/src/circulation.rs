use circ_store::{CirculationStore, FineQuery, StoreTransaction};
use circ_types::{Book, BookId, Borrower, BorrowerId, Date, Fine, FineId, Loan, LoanId, Money};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::LoanPolicy;
use crate::error::{PolicyError, PolicyResult, RecordRef};
use crate::rules::{self, BorrowContext, BorrowRule, Eligibility};

/// Result of returning a loan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReturnOutcome {
    /// The loan with its return date set.
    pub loan: Loan,
    /// The fine issued for a late return, if any.
    pub fine: Option<Fine>,
}

/// The circulation desk: loan policy applied to a store.
///
/// Every operation runs in its own store transaction and either commits all
/// of its writes or none. "Today" is always passed in by the caller.
pub struct Circulation<S> {
    store: S,
    policy: LoanPolicy,
    rules: Vec<Box<dyn BorrowRule>>,
}

impl<S: CirculationStore> Circulation<S> {
    /// Create a desk with the default eligibility rules.
    pub fn new(store: S, policy: LoanPolicy) -> Self {
        Self::with_rules(store, policy, rules::default_rules())
    }

    /// Create a desk with an explicit rule list, evaluated in order.
    pub fn with_rules(store: S, policy: LoanPolicy, rules: Vec<Box<dyn BorrowRule>>) -> Self {
        Self {
            store,
            policy,
            rules,
        }
    }

    /// Append a rule after the existing ones.
    pub fn add_rule(&mut self, rule: Box<dyn BorrowRule>) {
        self.rules.push(rule);
    }

    pub fn policy(&self) -> &LoanPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ---- Borrowing ----

    /// Check whether `borrower` may take out `book` right now.
    ///
    /// Fails with `NotFound` if either record is missing; otherwise reports
    /// eligibility without writing anything.
    pub fn can_borrow(&self, book: &BookId, borrower: &BorrowerId) -> PolicyResult<Eligibility> {
        let tx = self.store.begin()?;
        let (book, borrower) = load_pair(&tx, book, borrower)?;
        self.eligibility(&tx, &book, &borrower)
    }

    /// Lend one copy of `book` to `borrower`, due `loan_period_days` after
    /// `today`.
    pub fn borrow(&self, book: &BookId, borrower: &BorrowerId, today: Date) -> PolicyResult<Loan> {
        let mut tx = self.store.begin()?;
        let (book, borrower) = load_pair(&tx, book, borrower)?;

        let eligibility = self.eligibility(&tx, &book, &borrower)?;
        if !eligibility.is_eligible() {
            warn!(
                book = %book.id,
                borrower = %borrower.id,
                reason = eligibility.reason().unwrap_or_default(),
                "borrow denied"
            );
        }
        if let Some(err) = eligibility.into_error(book.id, borrower.id) {
            return Err(err);
        }

        let loan = Loan::open(book.id, borrower.id, today, self.policy.loan_period_days)?;
        // Conditional decrement: refuses to take the count below zero.
        if !tx.decrement_available(&book.id)? {
            warn!(book = %book.id, "no copy left to decrement");
            return Err(PolicyError::Unavailable { book: book.id });
        }
        tx.save_loan(&loan)?;
        tx.commit()?;

        info!(
            loan = %loan.id,
            book = %book.id,
            borrower = %borrower.id,
            due = %loan.due_date,
            "book borrowed"
        );
        Ok(loan)
    }

    fn eligibility<T: StoreTransaction>(
        &self,
        tx: &T,
        book: &Book,
        borrower: &Borrower,
    ) -> PolicyResult<Eligibility> {
        let open_loans = tx.list_open_loans(&book.id, &borrower.id)?;
        let unpaid_fines = tx.list_fines(&FineQuery::unpaid().borrower(borrower.id))?;
        let ctx = BorrowContext {
            book,
            borrower,
            open_loans: &open_loans,
            unpaid_fines: &unpaid_fines,
            policy: &self.policy,
        };
        Ok(rules::evaluate(&self.rules, &ctx))
    }

    // ---- Returning ----

    /// Close `loan` as of `today`, put the copy back on the shelf, and issue a
    /// fine if it came back after the due date.
    pub fn return_loan(&self, loan: &LoanId, today: Date) -> PolicyResult<ReturnOutcome> {
        let mut tx = self.store.begin()?;
        let mut loan = tx
            .get_loan(loan)?
            .ok_or(PolicyError::NotFound(RecordRef::Loan(*loan)))?;
        if !loan.is_open() {
            return Err(PolicyError::AlreadyReturned(loan.id));
        }
        if today < loan.loan_date {
            return Err(PolicyError::Invalid(format!(
                "return date {today} precedes loan date {}",
                loan.loan_date
            )));
        }

        loan.return_date = Some(today);
        tx.save_loan(&loan)?;
        if !tx.increment_available(&loan.book_id)? {
            warn!(
                loan = %loan.id,
                book = %loan.book_id,
                "book missing or already fully stocked; copy count unchanged"
            );
        }

        let days_overdue = loan.days_overdue(today);
        let fine = if days_overdue > 0 {
            let amount = self.policy.fine_for(days_overdue)?;
            let fine = Fine::issue(loan.id, loan.borrower_id, amount, days_overdue, today);
            tx.save_fine(&fine)?;
            Some(fine)
        } else {
            None
        };
        tx.commit()?;

        match &fine {
            Some(f) => info!(
                loan = %loan.id,
                fine = %f.id,
                days_overdue,
                amount = %f.amount,
                "late return; fine issued"
            ),
            None => info!(loan = %loan.id, "book returned"),
        }
        Ok(ReturnOutcome { loan, fine })
    }

    // ---- Fines ----

    /// Mark a fine paid as of `today`.
    pub fn pay_fine(&self, fine: &FineId, today: Date) -> PolicyResult<Fine> {
        let mut tx = self.store.begin()?;
        let mut fine = tx
            .get_fine(fine)?
            .ok_or(PolicyError::NotFound(RecordRef::Fine(*fine)))?;
        if fine.paid {
            return Err(PolicyError::AlreadyPaid(fine.id));
        }
        fine.paid = true;
        fine.payment_date = Some(today);
        tx.save_fine(&fine)?;
        tx.commit()?;

        info!(fine = %fine.id, amount = %fine.amount, "fine paid");
        Ok(fine)
    }

    /// Administratively delete a fine, paid or not. Irreversible.
    pub fn cancel_fine(&self, fine: &FineId) -> PolicyResult<()> {
        let mut tx = self.store.begin()?;
        if !tx.delete_fine(fine)? {
            return Err(PolicyError::NotFound(RecordRef::Fine(*fine)));
        }
        tx.commit()?;

        info!(fine = %fine, "fine cancelled");
        Ok(())
    }

    /// Settle every unpaid fine of `borrower` as of `today`, all or nothing.
    ///
    /// Fines already paid keep their payment date. Returns the fines settled
    /// by this call, which is empty when nothing was owed.
    pub fn pay_all_fines(&self, borrower: &BorrowerId, today: Date) -> PolicyResult<Vec<Fine>> {
        let mut tx = self.store.begin()?;
        if tx.get_borrower(borrower)?.is_none() {
            return Err(PolicyError::NotFound(RecordRef::Borrower(*borrower)));
        }
        let mut fines = tx.list_fines(&FineQuery::unpaid().borrower(*borrower))?;
        for fine in &mut fines {
            fine.paid = true;
            fine.payment_date = Some(today);
            tx.save_fine(fine)?;
        }
        tx.commit()?;

        let total: Money = fines.iter().map(|f| f.amount).sum();
        info!(borrower = %borrower, count = fines.len(), total = %total, "fines settled");
        Ok(fines)
    }
}

fn load_pair<T: StoreTransaction>(
    tx: &T,
    book: &BookId,
    borrower: &BorrowerId,
) -> PolicyResult<(Book, Borrower)> {
    let book = tx
        .get_book(book)?
        .ok_or(PolicyError::NotFound(RecordRef::Book(*book)))?;
    let borrower = tx
        .get_borrower(borrower)?
        .ok_or(PolicyError::NotFound(RecordRef::Borrower(*borrower)))?;
    Ok((book, borrower))
}

impl<S: std::fmt::Debug> std::fmt::Debug for Circulation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rules: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("Circulation")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .field("rules", &rules)
            .finish()
    }
}
