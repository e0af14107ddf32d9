use std::sync::Mutex;

use crate::error::{StoreError, StoreResult};
use crate::state::{StagedTransaction, StoreState};
use crate::traits::CirculationStore;

/// In-memory, HashMap-based circulation store.
///
/// Intended for tests and embedding. The whole catalog and ledger sits behind
/// one `Mutex`; a transaction holds the lock from `begin` until it is
/// committed or dropped, so transactions never interleave.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CirculationStore for InMemoryStore {
    type Transaction<'a> = StagedTransaction<'a>;

    fn begin(&self) -> StoreResult<Self::Transaction<'_>> {
        let guard = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(StagedTransaction::new(guard, None))
    }
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("InMemoryStore");
        match self.state.try_lock() {
            Ok(state) => {
                let (books, borrowers, loans, fines) = state.counts();
                s.field("books", &books)
                    .field("borrowers", &borrowers)
                    .field("loans", &loans)
                    .field("fines", &fines);
            }
            Err(_) => {
                s.field("state", &"<locked>");
            }
        }
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FineQuery, LoanQuery, StoreTransaction};
    use chrono::NaiveDate;
    use circ_types::{Book, Borrower, Fine, Loan, Money};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn seeded() -> (InMemoryStore, Book, Borrower) {
        let store = InMemoryStore::new();
        let book = Book::new("Middlemarch", "George Eliot", 2).with_isbn("978-0141439549");
        let borrower = Borrower::new("Ada Lovelace", "ada@example.org");
        let mut tx = store.begin().unwrap();
        tx.save_book(&book).unwrap();
        tx.save_borrower(&borrower).unwrap();
        tx.commit().unwrap();
        (store, book, borrower)
    }

    // -----------------------------------------------------------------------
    // Commit / rollback
    // -----------------------------------------------------------------------

    #[test]
    fn committed_writes_are_visible() {
        let (store, book, borrower) = seeded();
        let tx = store.begin().unwrap();
        assert_eq!(tx.get_book(&book.id).unwrap(), Some(book));
        assert_eq!(tx.get_borrower(&borrower.id).unwrap(), Some(borrower));
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let (store, book, _) = seeded();
        {
            let mut tx = store.begin().unwrap();
            assert!(tx.decrement_available(&book.id).unwrap());
            assert!(tx.delete_book(&book.id).unwrap());
            // dropped without commit
        }
        let tx = store.begin().unwrap();
        let stored = tx.get_book(&book.id).unwrap().expect("book should survive rollback");
        assert_eq!(stored.available_copies, 2);
    }

    #[test]
    fn uncommitted_writes_visible_inside_transaction() {
        let (store, book, _) = seeded();
        let mut tx = store.begin().unwrap();
        tx.decrement_available(&book.id).unwrap();
        assert_eq!(tx.get_book(&book.id).unwrap().unwrap().available_copies, 1);
    }

    // -----------------------------------------------------------------------
    // Conditional copy counters
    // -----------------------------------------------------------------------

    #[test]
    fn decrement_refuses_below_zero() {
        let (store, book, _) = seeded();
        let mut tx = store.begin().unwrap();
        assert!(tx.decrement_available(&book.id).unwrap());
        assert!(tx.decrement_available(&book.id).unwrap());
        assert!(!tx.decrement_available(&book.id).unwrap());
        assert_eq!(tx.get_book(&book.id).unwrap().unwrap().available_copies, 0);
    }

    #[test]
    fn increment_caps_at_total() {
        let (store, book, _) = seeded();
        let mut tx = store.begin().unwrap();
        assert!(!tx.increment_available(&book.id).unwrap());
        tx.decrement_available(&book.id).unwrap();
        assert!(tx.increment_available(&book.id).unwrap());
        assert!(!tx.increment_available(&book.id).unwrap());
        assert_eq!(tx.get_book(&book.id).unwrap().unwrap().available_copies, 2);
    }

    #[test]
    fn counters_on_missing_book_report_false() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().unwrap();
        let ghost = circ_types::BookId::new();
        assert!(!tx.decrement_available(&ghost).unwrap());
        assert!(!tx.increment_available(&ghost).unwrap());
    }

    // -----------------------------------------------------------------------
    // Loans and fines
    // -----------------------------------------------------------------------

    #[test]
    fn list_open_loans_filters_by_pair() {
        let (store, book, borrower) = seeded();
        let other = Borrower::new("Grace Hopper", "grace@example.org");
        let mut tx = store.begin().unwrap();
        let mine = Loan::open(book.id, borrower.id, day(1), 14).unwrap();
        let theirs = Loan::open(book.id, other.id, day(2), 14).unwrap();
        let mut returned = Loan::open(book.id, borrower.id, day(3), 14).unwrap();
        returned.return_date = Some(day(4));
        for loan in [&mine, &theirs, &returned] {
            tx.save_loan(loan).unwrap();
        }

        let open = tx.list_open_loans(&book.id, &borrower.id).unwrap();
        assert_eq!(open, vec![mine.clone()]);

        let all_mine = tx
            .list_loans(&LoanQuery::all().borrower(borrower.id))
            .unwrap();
        assert_eq!(all_mine.len(), 2);
        // newest first
        assert_eq!(all_mine[0].id, returned.id);
    }

    #[test]
    fn delete_loan_cascades_to_fine() {
        let (store, book, borrower) = seeded();
        let mut tx = store.begin().unwrap();
        let mut loan = Loan::open(book.id, borrower.id, day(1), 14).unwrap();
        loan.return_date = Some(day(20));
        tx.save_loan(&loan).unwrap();
        let fine = Fine::issue(loan.id, borrower.id, Money::from_cents(250), 5, day(20));
        tx.save_fine(&fine).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        assert_eq!(tx.fine_for_loan(&loan.id).unwrap().map(|f| f.id), Some(fine.id));
        assert!(tx.delete_loan(&loan.id).unwrap());
        assert!(tx.get_fine(&fine.id).unwrap().is_none());
        assert!(!tx.delete_loan(&loan.id).unwrap());
    }

    #[test]
    fn fine_query_filters_paid_state() {
        let (store, _, borrower) = seeded();
        let mut tx = store.begin().unwrap();
        let unpaid = Fine::issue(
            circ_types::LoanId::new(),
            borrower.id,
            Money::from_cents(50),
            1,
            day(10),
        );
        let mut paid = Fine::issue(
            circ_types::LoanId::new(),
            borrower.id,
            Money::from_cents(100),
            2,
            day(11),
        );
        paid.paid = true;
        paid.payment_date = Some(day(12));
        tx.save_fine(&unpaid).unwrap();
        tx.save_fine(&paid).unwrap();

        let open = tx.list_fines(&FineQuery::unpaid()).unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, unpaid.id);
        let settled = tx.list_fines(&FineQuery::paid().borrower(borrower.id)).unwrap();
        assert_eq!(settled.len(), 1);
        assert_eq!(tx.list_fines(&FineQuery::all()).unwrap().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[test]
    fn find_by_isbn_and_email() {
        let (store, book, borrower) = seeded();
        let tx = store.begin().unwrap();
        assert_eq!(
            tx.find_book_by_isbn("978-0141439549").unwrap().map(|b| b.id),
            Some(book.id)
        );
        assert!(tx.find_book_by_isbn("000").unwrap().is_none());
        assert_eq!(
            tx.find_borrower_by_email("ADA@example.org").unwrap().map(|b| b.id),
            Some(borrower.id)
        );
    }

    #[test]
    fn list_books_sorted_by_title() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().unwrap();
        tx.save_book(&Book::new("Walden", "Thoreau", 1)).unwrap();
        tx.save_book(&Book::new("Beloved", "Morrison", 1)).unwrap();
        let titles: Vec<String> = tx.list_books().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Beloved", "Walden"]);
    }

    // -----------------------------------------------------------------------
    // Serialised transactions
    // -----------------------------------------------------------------------

    #[test]
    fn transactions_are_serialised_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let (store, book, _) = seeded();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut tx = store.begin().unwrap();
                    let took = tx.decrement_available(&book.id).unwrap();
                    tx.commit().unwrap();
                    took
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|took| *took)
            .count();
        assert_eq!(successes, 2);

        let tx = store.begin().unwrap();
        assert_eq!(tx.get_book(&book.id).unwrap().unwrap().available_copies, 0);
    }

    #[test]
    fn debug_format() {
        let (store, _, _) = seeded();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryStore"));
        assert!(debug.contains("books: 1"));
    }
}
