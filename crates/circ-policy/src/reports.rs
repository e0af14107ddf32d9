//! Read-only views over the circulation ledger.

use std::collections::BTreeMap;

use circ_store::{CirculationStore, FineQuery, LoanQuery, StoreTransaction};
use circ_types::{Book, BookId, Borrower, BorrowerId, Date, Fine, FineId, Loan, LoanId, Money};
use serde::{Deserialize, Serialize};

use crate::circulation::Circulation;
use crate::error::{PolicyError, PolicyResult, RecordRef};

/// Dashboard numbers for one borrower.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BorrowerSummary {
    pub borrower: Borrower,
    pub open_loans: usize,
    /// Open loans due within the policy's due-soon window, not yet overdue.
    pub due_soon: usize,
    pub overdue: usize,
    pub unpaid_fines: Money,
}

/// An open loan past its due date.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OverdueLoan {
    pub loan: Loan,
    pub book_title: String,
    pub borrower_name: String,
    pub days_overdue: u32,
    /// Fine that would be issued if the loan came back today.
    pub accrued: Money,
}

/// Label used for books without a genre in [`LibrarySummary`].
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Catalog size under one genre.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub titles: usize,
    pub copies: u64,
}

/// Library-wide dashboard numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LibrarySummary {
    pub titles: usize,
    pub total_copies: u64,
    pub available_copies: u64,
    pub active_loans: usize,
    pub borrowers: usize,
    pub unpaid_fines: Money,
    /// Largest genre first, by title count.
    pub genres: Vec<GenreCount>,
}

/// Which fines to list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FineFilter {
    #[default]
    All,
    Unpaid,
    Paid,
}

impl FineFilter {
    fn query(self) -> FineQuery {
        match self {
            Self::All => FineQuery::all(),
            Self::Unpaid => FineQuery::unpaid(),
            Self::Paid => FineQuery::paid(),
        }
    }
}

impl<S: CirculationStore> Circulation<S> {
    // ---- Lookups ----

    pub fn book(&self, id: &BookId) -> PolicyResult<Book> {
        self.store()
            .begin()?
            .get_book(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Book(*id)))
    }

    /// Every catalog entry, by title.
    pub fn books(&self) -> PolicyResult<Vec<Book>> {
        Ok(self.store().begin()?.list_books()?)
    }

    /// Catalog entries matching `term` (title, author, genre or ISBN,
    /// ignoring case) and, if given, exactly in `genre`. By title.
    pub fn search_books(&self, term: Option<&str>, genre: Option<&str>) -> PolicyResult<Vec<Book>> {
        let mut books = self.store().begin()?.list_books()?;
        books.retain(|b| {
            term.map_or(true, |t| b.matches_term(t)) && genre.map_or(true, |g| b.in_genre(g))
        });
        Ok(books)
    }

    pub fn borrower(&self, id: &BorrowerId) -> PolicyResult<Borrower> {
        self.store()
            .begin()?
            .get_borrower(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Borrower(*id)))
    }

    pub fn borrowers(&self) -> PolicyResult<Vec<Borrower>> {
        Ok(self.store().begin()?.list_borrowers()?)
    }

    pub fn loan(&self, id: &LoanId) -> PolicyResult<Loan> {
        self.store()
            .begin()?
            .get_loan(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Loan(*id)))
    }

    pub fn fine(&self, id: &FineId) -> PolicyResult<Fine> {
        self.store()
            .begin()?
            .get_fine(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Fine(*id)))
    }

    // ---- Reports ----

    pub fn borrower_summary(&self, id: &BorrowerId, today: Date) -> PolicyResult<BorrowerSummary> {
        let tx = self.store().begin()?;
        let borrower = tx
            .get_borrower(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Borrower(*id)))?;
        let open = tx.list_loans(&LoanQuery::open().borrower(*id))?;
        let window = self.policy().due_soon_days;
        let unpaid_fines: Money = tx
            .list_fines(&FineQuery::unpaid().borrower(*id))?
            .iter()
            .map(|f| f.amount)
            .sum();

        Ok(BorrowerSummary {
            borrower,
            open_loans: open.len(),
            due_soon: open.iter().filter(|l| l.is_due_within(today, window)).count(),
            overdue: open.iter().filter(|l| l.is_overdue(today)).count(),
            unpaid_fines,
        })
    }

    /// Every loan a borrower has taken out, current loans first, then newest
    /// first.
    pub fn loans_for(&self, id: &BorrowerId) -> PolicyResult<Vec<Loan>> {
        let tx = self.store().begin()?;
        if tx.get_borrower(id)?.is_none() {
            return Err(PolicyError::NotFound(RecordRef::Borrower(*id)));
        }
        let mut loans = tx.list_loans(&LoanQuery::all().borrower(*id))?;
        // Stable: keeps the store's newest-first order within each group.
        loans.sort_by_key(|l| !l.is_open());
        Ok(loans)
    }

    /// Open loans past due as of `today`, most overdue first.
    pub fn overdue_loans(&self, today: Date) -> PolicyResult<Vec<OverdueLoan>> {
        let tx = self.store().begin()?;
        let mut overdue = Vec::new();
        for loan in tx.list_loans(&LoanQuery::open())? {
            if !loan.is_overdue(today) {
                continue;
            }
            let book_title = tx
                .get_book(&loan.book_id)?
                .map(|b| b.title)
                .unwrap_or_default();
            let borrower_name = tx
                .get_borrower(&loan.borrower_id)?
                .map(|b| b.name)
                .unwrap_or_default();
            let days_overdue = loan.days_overdue(today);
            overdue.push(OverdueLoan {
                accrued: self.policy().fine_for(days_overdue)?,
                loan,
                book_title,
                borrower_name,
                days_overdue,
            });
        }
        overdue.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
        Ok(overdue)
    }

    /// Fines matching `filter`, unpaid first, then newest first.
    pub fn fines(&self, filter: FineFilter) -> PolicyResult<Vec<Fine>> {
        let mut fines = self.store().begin()?.list_fines(&filter.query())?;
        fines.sort_by_key(|f| f.paid);
        Ok(fines)
    }

    /// Catalog, circulation and fine totals across the whole library.
    pub fn library_summary(&self) -> PolicyResult<LibrarySummary> {
        let tx = self.store().begin()?;
        let books = tx.list_books()?;
        let unpaid_fines: Money = tx
            .list_fines(&FineQuery::unpaid())?
            .iter()
            .map(|f| f.amount)
            .sum();

        let mut by_genre: BTreeMap<String, GenreCount> = BTreeMap::new();
        for book in &books {
            let genre = book.genre.as_deref().unwrap_or(UNCATEGORIZED);
            let entry = by_genre
                .entry(genre.to_lowercase())
                .or_insert_with(|| GenreCount {
                    genre: genre.to_string(),
                    titles: 0,
                    copies: 0,
                });
            entry.titles += 1;
            entry.copies += u64::from(book.total_copies);
        }
        let mut genres: Vec<GenreCount> = by_genre.into_values().collect();
        // Stable: ties stay in alphabetical order.
        genres.sort_by(|a, b| b.titles.cmp(&a.titles));

        Ok(LibrarySummary {
            titles: books.len(),
            total_copies: books.iter().map(|b| u64::from(b.total_copies)).sum(),
            available_copies: books.iter().map(|b| u64::from(b.available_copies)).sum(),
            active_loans: tx.list_loans(&LoanQuery::open())?.len(),
            borrowers: tx.list_borrowers()?.len(),
            unpaid_fines,
            genres,
        })
    }

    /// Sum of every unpaid fine in the ledger.
    pub fn outstanding_total(&self) -> PolicyResult<Money> {
        let tx = self.store().begin()?;
        Ok(tx
            .list_fines(&FineQuery::unpaid())?
            .iter()
            .map(|f| f.amount)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use circ_store::InMemoryStore;

    use super::*;
    use crate::admin::{NewBook, NewBorrower};
    use crate::config::LoanPolicy;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(n))
            .unwrap()
    }

    struct Fixture {
        desk: Circulation<InMemoryStore>,
        books: Vec<Book>,
        reader: Borrower,
    }

    fn fixture() -> Fixture {
        let desk = Circulation::new(InMemoryStore::new(), LoanPolicy::lenient());
        let books = ["Emma", "Persuasion", "Sanditon"]
            .into_iter()
            .map(|t| desk.add_book(NewBook::new(t, "Jane Austen", 2)).unwrap())
            .collect();
        let reader = desk
            .register_borrower(NewBorrower::new("Anne Elliot", "anne@example.org"))
            .unwrap();
        Fixture {
            desk,
            books,
            reader,
        }
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[test]
    fn lookups_report_not_found() {
        let fx = fixture();
        assert_eq!(fx.desk.books().unwrap().len(), 3);
        assert_eq!(fx.desk.borrowers().unwrap().len(), 1);
        assert!(matches!(
            fx.desk.book(&BookId::new()),
            Err(PolicyError::NotFound(RecordRef::Book(_)))
        ));
        assert!(matches!(
            fx.desk.loan(&LoanId::new()),
            Err(PolicyError::NotFound(RecordRef::Loan(_)))
        ));
        assert!(matches!(
            fx.desk.fine(&FineId::new()),
            Err(PolicyError::NotFound(RecordRef::Fine(_)))
        ));
    }

    #[test]
    fn search_matches_fields_and_filters_genre() {
        let desk = Circulation::new(InMemoryStore::new(), LoanPolicy::default());
        let dracula = desk
            .add_book(NewBook::new("Dracula", "Bram Stoker", 1).with_genre("Gothic"))
            .unwrap();
        let frankenstein = desk
            .add_book(
                NewBook::new("Frankenstein", "Mary Shelley", 1)
                    .with_genre("Gothic")
                    .with_isbn("978-0486282114"),
            )
            .unwrap();
        let emma = desk
            .add_book(NewBook::new("Emma", "Jane Austen", 1).with_genre("Romance"))
            .unwrap();

        let ids = |books: Vec<Book>| books.into_iter().map(|b| b.id).collect::<Vec<_>>();
        assert_eq!(ids(desk.search_books(Some("SHELLEY"), None).unwrap()), vec![frankenstein.id]);
        assert_eq!(ids(desk.search_books(Some("0486"), None).unwrap()), vec![frankenstein.id]);
        assert_eq!(ids(desk.search_books(Some("roman"), None).unwrap()), vec![emma.id]);
        assert_eq!(
            ids(desk.search_books(None, Some("gothic")).unwrap()),
            vec![dracula.id, frankenstein.id]
        );
        assert_eq!(
            ids(desk.search_books(Some("stoker"), Some("Gothic")).unwrap()),
            vec![dracula.id]
        );
        assert!(desk.search_books(Some("emma"), Some("gothic")).unwrap().is_empty());
        assert_eq!(desk.search_books(None, None).unwrap().len(), 3);
    }

    // -----------------------------------------------------------------------
    // Summary
    // -----------------------------------------------------------------------

    #[test]
    fn library_summary_totals_and_genres() {
        let fx = fixture();
        for book in &fx.books[..2] {
            fx.desk
                .update_book(
                    &book.id,
                    crate::admin::BookUpdate {
                        genre: Some("Novel".into()),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        let other = fx
            .desk
            .register_borrower(NewBorrower::new("Frederick", "fw@example.org"))
            .unwrap();
        fx.desk.borrow(&fx.books[0].id, &fx.reader.id, day(0)).unwrap();
        let late = fx.desk.borrow(&fx.books[1].id, &other.id, day(0)).unwrap();
        fx.desk.return_loan(&late.id, day(18)).unwrap();

        let summary = fx.desk.library_summary().unwrap();
        assert_eq!(summary.titles, 3);
        assert_eq!(summary.total_copies, 6);
        assert_eq!(summary.available_copies, 5);
        assert_eq!(summary.active_loans, 1);
        assert_eq!(summary.borrowers, 2);
        assert_eq!(summary.unpaid_fines, Money::from_cents(200));
        assert_eq!(
            summary.genres,
            vec![
                GenreCount {
                    genre: "Novel".into(),
                    titles: 2,
                    copies: 4,
                },
                GenreCount {
                    genre: UNCATEGORIZED.into(),
                    titles: 1,
                    copies: 2,
                },
            ]
        );
    }

    #[test]
    fn summary_counts_due_soon_overdue_and_fines() {
        let fx = fixture();
        let r = fx.reader.id;
        // Due day 14, 17 and 20.
        fx.desk.borrow(&fx.books[0].id, &r, day(0)).unwrap();
        fx.desk.borrow(&fx.books[1].id, &r, day(3)).unwrap();
        let late = fx.desk.borrow(&fx.books[2].id, &r, day(6)).unwrap();
        fx.desk.return_loan(&late.id, day(22)).unwrap();

        let summary = fx.desk.borrower_summary(&r, day(15)).unwrap();
        assert_eq!(summary.open_loans, 2);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.due_soon, 1);
        assert_eq!(summary.unpaid_fines, Money::from_cents(100));
    }

    #[test]
    fn loans_for_lists_current_first() {
        let fx = fixture();
        let r = fx.reader.id;
        let old = fx.desk.borrow(&fx.books[0].id, &r, day(0)).unwrap();
        fx.desk.return_loan(&old.id, day(2)).unwrap();
        let current = fx.desk.borrow(&fx.books[1].id, &r, day(1)).unwrap();
        let newest_returned = fx.desk.borrow(&fx.books[2].id, &r, day(5)).unwrap();
        fx.desk.return_loan(&newest_returned.id, day(6)).unwrap();

        let ids: Vec<LoanId> = fx
            .desk
            .loans_for(&r)
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![current.id, newest_returned.id, old.id]);
    }

    // -----------------------------------------------------------------------
    // Overdue and fines
    // -----------------------------------------------------------------------

    #[test]
    fn overdue_loans_include_accrued_fine() {
        let fx = fixture();
        let r = fx.reader.id;
        fx.desk.borrow(&fx.books[0].id, &r, day(0)).unwrap();
        fx.desk.borrow(&fx.books[1].id, &r, day(4)).unwrap();

        let overdue = fx.desk.overdue_loans(day(20)).unwrap();
        assert_eq!(overdue.len(), 2);
        assert_eq!(overdue[0].book_title, "Emma");
        assert_eq!(overdue[0].days_overdue, 6);
        assert_eq!(overdue[0].accrued, Money::from_cents(300));
        assert_eq!(overdue[1].days_overdue, 2);
        assert_eq!(overdue[1].borrower_name, "Anne Elliot");

        assert!(fx.desk.overdue_loans(day(14)).unwrap().is_empty());
    }

    #[test]
    fn fines_filter_and_order() {
        let fx = fixture();
        let r = fx.reader.id;
        let a = fx.desk.borrow(&fx.books[0].id, &r, day(0)).unwrap();
        let b = fx.desk.borrow(&fx.books[1].id, &r, day(0)).unwrap();
        let paid = fx.desk.return_loan(&a.id, day(15)).unwrap().fine.unwrap();
        fx.desk.return_loan(&b.id, day(17)).unwrap();
        fx.desk.pay_fine(&paid.id, day(18)).unwrap();

        let all = fx.desk.fines(FineFilter::All).unwrap();
        assert_eq!(all.len(), 2);
        assert!(!all[0].paid);
        assert!(all[1].paid);

        assert_eq!(fx.desk.fines(FineFilter::Paid).unwrap().len(), 1);
        let unpaid = fx.desk.fines(FineFilter::Unpaid).unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].amount, Money::from_cents(150));
        assert_eq!(fx.desk.outstanding_total().unwrap(), Money::from_cents(150));
    }
}
