use circ_types::{Book, BookId, Borrower, BorrowerId, Fine, FineId, Loan, LoanId};

use crate::error::StoreResult;

/// Selects loans for listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoanQuery {
    pub book: Option<BookId>,
    pub borrower: Option<BorrowerId>,
    pub open_only: bool,
}

impl LoanQuery {
    /// Every loan in the ledger.
    pub fn all() -> Self {
        Self::default()
    }

    /// Open loans only.
    pub fn open() -> Self {
        Self {
            open_only: true,
            ..Self::default()
        }
    }

    pub fn book(mut self, book: BookId) -> Self {
        self.book = Some(book);
        self
    }

    pub fn borrower(mut self, borrower: BorrowerId) -> Self {
        self.borrower = Some(borrower);
        self
    }

    pub fn matches(&self, loan: &Loan) -> bool {
        self.book.map_or(true, |id| loan.book_id == id)
            && self.borrower.map_or(true, |id| loan.borrower_id == id)
            && (!self.open_only || loan.is_open())
    }
}

/// Selects fines for listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FineQuery {
    pub borrower: Option<BorrowerId>,
    /// `Some(false)` for unpaid only, `Some(true)` for paid only.
    pub paid: Option<bool>,
}

impl FineQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn unpaid() -> Self {
        Self {
            paid: Some(false),
            ..Self::default()
        }
    }

    pub fn paid() -> Self {
        Self {
            paid: Some(true),
            ..Self::default()
        }
    }

    pub fn borrower(mut self, borrower: BorrowerId) -> Self {
        self.borrower = Some(borrower);
        self
    }

    pub fn matches(&self, fine: &Fine) -> bool {
        self.borrower.map_or(true, |id| fine.borrower_id == id)
            && self.paid.map_or(true, |paid| fine.paid == paid)
    }
}

/// Catalog and ledger store that hands out transactions.
///
/// Every policy operation runs inside exactly one transaction. Implementations
/// must guarantee:
/// - Writes made through a transaction are invisible to other transactions
///   until [`StoreTransaction::commit`] returns `Ok`.
/// - A transaction dropped without commit leaves the store unchanged.
/// - Transactions are serialisable: two transactions racing for the last copy
///   of a book observe each other's effects in some total order.
pub trait CirculationStore: Send + Sync {
    type Transaction<'a>: StoreTransaction
    where
        Self: 'a;

    /// Begin a transaction. Blocks until no other transaction is active.
    fn begin(&self) -> StoreResult<Self::Transaction<'_>>;
}

/// Key-based read/write view of the store inside a transaction.
pub trait StoreTransaction {
    // ---- Books ----

    /// Read a book by ID. Returns `Ok(None)` if it does not exist.
    fn get_book(&self, id: &BookId) -> StoreResult<Option<Book>>;

    /// Insert or replace a book.
    fn save_book(&mut self, book: &Book) -> StoreResult<()>;

    /// Delete a book. Returns `true` if it existed. Loans are not touched.
    fn delete_book(&mut self, id: &BookId) -> StoreResult<bool>;

    /// All books, ordered by title then author.
    fn list_books(&self) -> StoreResult<Vec<Book>>;

    /// Look a book up by ISBN.
    fn find_book_by_isbn(&self, isbn: &str) -> StoreResult<Option<Book>> {
        Ok(self
            .list_books()?
            .into_iter()
            .find(|b| b.isbn.as_deref() == Some(isbn)))
    }

    /// Take one copy off the shelf if any is available.
    ///
    /// Returns `false` (and writes nothing) when the book is missing or has
    /// no available copies. Callers must treat `false` as "unavailable".
    fn decrement_available(&mut self, id: &BookId) -> StoreResult<bool> {
        let Some(mut book) = self.get_book(id)? else {
            return Ok(false);
        };
        if book.available_copies == 0 {
            return Ok(false);
        }
        book.available_copies -= 1;
        self.save_book(&book)?;
        Ok(true)
    }

    /// Put one copy back on the shelf, never exceeding `total_copies`.
    ///
    /// Returns `false` (and writes nothing) when the book is missing or
    /// already fully stocked.
    fn increment_available(&mut self, id: &BookId) -> StoreResult<bool> {
        let Some(mut book) = self.get_book(id)? else {
            return Ok(false);
        };
        if book.available_copies >= book.total_copies {
            return Ok(false);
        }
        book.available_copies += 1;
        self.save_book(&book)?;
        Ok(true)
    }

    // ---- Borrowers ----

    fn get_borrower(&self, id: &BorrowerId) -> StoreResult<Option<Borrower>>;

    fn save_borrower(&mut self, borrower: &Borrower) -> StoreResult<()>;

    /// Delete a borrower record. Returns `true` if it existed.
    fn delete_borrower(&mut self, id: &BorrowerId) -> StoreResult<bool>;

    /// All borrowers, ordered by name.
    fn list_borrowers(&self) -> StoreResult<Vec<Borrower>>;

    fn find_borrower_by_email(&self, email: &str) -> StoreResult<Option<Borrower>> {
        Ok(self
            .list_borrowers()?
            .into_iter()
            .find(|b| b.email.eq_ignore_ascii_case(email)))
    }

    // ---- Loans ----

    fn get_loan(&self, id: &LoanId) -> StoreResult<Option<Loan>>;

    fn save_loan(&mut self, loan: &Loan) -> StoreResult<()>;

    /// Delete a loan and the fine it owns. Returns `true` if the loan existed.
    fn delete_loan(&mut self, id: &LoanId) -> StoreResult<bool>;

    /// Loans matching `query`, ordered by loan date (newest first).
    fn list_loans(&self, query: &LoanQuery) -> StoreResult<Vec<Loan>>;

    /// Open loans for one (book, borrower) pair.
    fn list_open_loans(&self, book_id: &BookId, borrower_id: &BorrowerId) -> StoreResult<Vec<Loan>> {
        self.list_loans(&LoanQuery::open().book(*book_id).borrower(*borrower_id))
    }

    // ---- Fines ----

    fn get_fine(&self, id: &FineId) -> StoreResult<Option<Fine>>;

    fn save_fine(&mut self, fine: &Fine) -> StoreResult<()>;

    /// Delete a fine. Returns `true` if it existed.
    fn delete_fine(&mut self, id: &FineId) -> StoreResult<bool>;

    /// Fines matching `query`, ordered by issue date (newest first).
    fn list_fines(&self, query: &FineQuery) -> StoreResult<Vec<Fine>>;

    /// The fine owned by a loan, if any.
    fn fine_for_loan(&self, loan_id: &LoanId) -> StoreResult<Option<Fine>> {
        Ok(self
            .list_fines(&FineQuery::all())?
            .into_iter()
            .find(|f| f.loan_id == *loan_id))
    }

    // ---- Lifecycle ----

    /// Make every write in this transaction durable and visible.
    fn commit(self) -> StoreResult<()>
    where
        Self: Sized;
}
