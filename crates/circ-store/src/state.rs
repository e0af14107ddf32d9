use std::collections::HashMap;
use std::path::Path;
use std::sync::MutexGuard;

use circ_types::{Book, BookId, Borrower, BorrowerId, Fine, FineId, Loan, LoanId};
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::{FineQuery, LoanQuery, StoreTransaction};

/// The full catalog and ledger, as held in memory by both backends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct StoreState {
    pub(crate) books: HashMap<BookId, Book>,
    pub(crate) borrowers: HashMap<BorrowerId, Borrower>,
    pub(crate) loans: HashMap<LoanId, Loan>,
    pub(crate) fines: HashMap<FineId, Fine>,
}

impl StoreState {
    pub(crate) fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.books.len(),
            self.borrowers.len(),
            self.loans.len(),
            self.fines.len(),
        )
    }
}

/// A transaction over a [`StoreState`] guarded by the store's mutex.
///
/// Reads see the committed state until the first write, which takes a private
/// working copy, so read-only transactions never copy. `commit` first hands the
/// working copy to the backend's durability hook (if any) and only then swaps
/// it in, so a failed write to disk leaves the committed state untouched.
/// Dropping the transaction without committing discards the working copy.
pub struct StagedTransaction<'a> {
    guard: MutexGuard<'a, StoreState>,
    working: Option<StoreState>,
    sink: Option<&'a Path>,
    writes: usize,
    committed: bool,
}

impl<'a> StagedTransaction<'a> {
    pub(crate) fn new(guard: MutexGuard<'a, StoreState>, sink: Option<&'a Path>) -> Self {
        Self {
            guard,
            working: None,
            sink,
            writes: 0,
            committed: false,
        }
    }

    fn view(&self) -> &StoreState {
        self.working.as_ref().unwrap_or(&*self.guard)
    }

    fn edit(&mut self) -> &mut StoreState {
        self.writes += 1;
        let committed = &*self.guard;
        self.working.get_or_insert_with(|| committed.clone())
    }
}

impl StoreTransaction for StagedTransaction<'_> {
    fn get_book(&self, id: &BookId) -> StoreResult<Option<Book>> {
        Ok(self.view().books.get(id).cloned())
    }

    fn save_book(&mut self, book: &Book) -> StoreResult<()> {
        self.edit().books.insert(book.id, book.clone());
        Ok(())
    }

    fn delete_book(&mut self, id: &BookId) -> StoreResult<bool> {
        Ok(self.edit().books.remove(id).is_some())
    }

    fn list_books(&self) -> StoreResult<Vec<Book>> {
        let mut books: Vec<Book> = self.view().books.values().cloned().collect();
        books.sort_by(|a, b| {
            a.title
                .cmp(&b.title)
                .then_with(|| a.author.cmp(&b.author))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(books)
    }

    fn get_borrower(&self, id: &BorrowerId) -> StoreResult<Option<Borrower>> {
        Ok(self.view().borrowers.get(id).cloned())
    }

    fn save_borrower(&mut self, borrower: &Borrower) -> StoreResult<()> {
        self.edit().borrowers.insert(borrower.id, borrower.clone());
        Ok(())
    }

    fn delete_borrower(&mut self, id: &BorrowerId) -> StoreResult<bool> {
        Ok(self.edit().borrowers.remove(id).is_some())
    }

    fn list_borrowers(&self) -> StoreResult<Vec<Borrower>> {
        let mut borrowers: Vec<Borrower> = self.view().borrowers.values().cloned().collect();
        borrowers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(borrowers)
    }

    fn get_loan(&self, id: &LoanId) -> StoreResult<Option<Loan>> {
        Ok(self.view().loans.get(id).cloned())
    }

    fn save_loan(&mut self, loan: &Loan) -> StoreResult<()> {
        self.edit().loans.insert(loan.id, loan.clone());
        Ok(())
    }

    fn delete_loan(&mut self, id: &LoanId) -> StoreResult<bool> {
        let state = self.edit();
        let existed = state.loans.remove(id).is_some();
        state.fines.retain(|_, fine| fine.loan_id != *id);
        Ok(existed)
    }

    fn list_loans(&self, query: &LoanQuery) -> StoreResult<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .view()
            .loans
            .values()
            .filter(|loan| query.matches(loan))
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.loan_date.cmp(&a.loan_date).then_with(|| b.id.cmp(&a.id)));
        Ok(loans)
    }

    fn get_fine(&self, id: &FineId) -> StoreResult<Option<Fine>> {
        Ok(self.view().fines.get(id).cloned())
    }

    fn save_fine(&mut self, fine: &Fine) -> StoreResult<()> {
        self.edit().fines.insert(fine.id, fine.clone());
        Ok(())
    }

    fn delete_fine(&mut self, id: &FineId) -> StoreResult<bool> {
        Ok(self.edit().fines.remove(id).is_some())
    }

    fn list_fines(&self, query: &FineQuery) -> StoreResult<Vec<Fine>> {
        let mut fines: Vec<Fine> = self
            .view()
            .fines
            .values()
            .filter(|fine| query.matches(fine))
            .cloned()
            .collect();
        fines.sort_by(|a, b| b.issued_on.cmp(&a.issued_on).then_with(|| b.id.cmp(&a.id)));
        Ok(fines)
    }

    fn fine_for_loan(&self, loan_id: &LoanId) -> StoreResult<Option<Fine>> {
        Ok(self
            .view()
            .fines
            .values()
            .find(|f| f.loan_id == *loan_id)
            .cloned())
    }

    fn commit(mut self) -> StoreResult<()> {
        let Some(working) = self.working.take() else {
            self.committed = true;
            return Ok(());
        };
        if let Some(path) = self.sink {
            crate::file::write_snapshot(path, &working)?;
        }
        *self.guard = working;
        self.committed = true;
        debug!(writes = self.writes, "transaction committed");
        Ok(())
    }
}

impl Drop for StagedTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed && self.writes > 0 {
            debug!(writes = self.writes, "transaction rolled back");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn seeded() -> Mutex<StoreState> {
        let mut state = StoreState::default();
        let book = Book::new("Kindred", "Octavia E. Butler", 2);
        state.books.insert(book.id, book);
        Mutex::new(state)
    }

    // -----------------------------------------------------------------------
    // Copy-on-write
    // -----------------------------------------------------------------------

    #[test]
    fn reads_do_not_copy_the_state() {
        let store = seeded();
        let tx = StagedTransaction::new(store.lock().unwrap(), None);
        assert_eq!(tx.list_books().unwrap().len(), 1);
        assert!(tx.list_loans(&LoanQuery::all()).unwrap().is_empty());
        assert!(tx.working.is_none());
        assert_eq!(tx.writes, 0);
        tx.commit().unwrap();
        assert_eq!(store.lock().unwrap().counts(), (1, 0, 0, 0));
    }

    #[test]
    fn first_write_copies_and_later_reads_see_it() {
        let store = seeded();
        let mut tx = StagedTransaction::new(store.lock().unwrap(), None);
        let book = Book::new("Dawn", "Octavia E. Butler", 1);
        tx.save_book(&book).unwrap();
        assert!(tx.working.is_some());
        assert_eq!(tx.get_book(&book.id).unwrap(), Some(book.clone()));
        assert_eq!(tx.list_books().unwrap().len(), 2);
        tx.commit().unwrap();

        let state = store.lock().unwrap();
        assert!(state.books.contains_key(&book.id));
    }

    #[test]
    fn dropped_write_leaves_committed_state_alone() {
        let store = seeded();
        {
            let mut tx = StagedTransaction::new(store.lock().unwrap(), None);
            tx.save_book(&Book::new("Dawn", "Octavia E. Butler", 1))
                .unwrap();
        }
        assert_eq!(store.lock().unwrap().counts(), (1, 0, 0, 0));
    }
}
