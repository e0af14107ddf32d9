//! Catalog and borrower administration.

use circ_store::{CirculationStore, FineQuery, LoanQuery, StoreTransaction};
use circ_types::{Book, BookId, Borrower, BorrowerId, BorrowerRole, LoanId, Money};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::circulation::Circulation;
use crate::error::{PolicyError, PolicyResult, RecordRef};

/// Request to add a title to the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    pub total_copies: u32,
}

impl NewBook {
    pub fn new(title: impl Into<String>, author: impl Into<String>, total_copies: u32) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: None,
            genre: None,
            publication_year: None,
            description: None,
            total_copies,
        }
    }

    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_publication_year(mut self, year: i32) -> Self {
        self.publication_year = Some(year);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial edit of a catalog entry. `None` leaves a field unchanged.
///
/// An empty `isbn`, `genre` or `description` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub publication_year: Option<i32>,
    pub description: Option<String>,
    pub total_copies: Option<u32>,
}

/// Request to register a borrower.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBorrower {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: BorrowerRole,
}

impl NewBorrower {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: BorrowerRole::default(),
        }
    }

    pub fn with_role(mut self, role: BorrowerRole) -> Self {
        self.role = role;
        self
    }
}

/// Partial edit of a borrower. `None` leaves a field unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowerUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<BorrowerRole>,
}

impl<S: CirculationStore> Circulation<S> {
    // ---- Books ----

    pub fn add_book(&self, request: NewBook) -> PolicyResult<Book> {
        let title = required("title", &request.title)?;
        let author = required("author", &request.author)?;
        if request.total_copies == 0 {
            return Err(PolicyError::Invalid(
                "total_copies must be at least 1".into(),
            ));
        }
        let isbn = request.isbn.as_deref().and_then(non_blank);
        if let Some(year) = request.publication_year {
            check_year(year)?;
        }

        let mut tx = self.store().begin()?;
        if let Some(isbn) = &isbn {
            if tx.find_book_by_isbn(isbn)?.is_some() {
                return Err(PolicyError::Duplicate(format!("isbn {isbn}")));
            }
        }
        let mut book = Book::new(title, author, request.total_copies);
        book.isbn = isbn;
        book.genre = request.genre.as_deref().and_then(non_blank);
        book.publication_year = request.publication_year;
        book.description = request.description.as_deref().and_then(non_blank);
        tx.save_book(&book)?;
        tx.commit()?;

        info!(book = %book.id, title = %book.title, copies = book.total_copies, "book added");
        Ok(book)
    }

    /// Edit a catalog entry. Resizing keeps the on-loan count fixed and
    /// recomputes the shelf count from it.
    pub fn update_book(&self, id: &BookId, update: BookUpdate) -> PolicyResult<Book> {
        let mut tx = self.store().begin()?;
        let mut book = tx
            .get_book(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Book(*id)))?;

        if let Some(title) = &update.title {
            book.title = required("title", title)?;
        }
        if let Some(author) = &update.author {
            book.author = required("author", author)?;
        }
        if let Some(isbn) = &update.isbn {
            let isbn = non_blank(isbn);
            if let Some(isbn) = &isbn {
                if let Some(other) = tx.find_book_by_isbn(isbn)? {
                    if other.id != book.id {
                        return Err(PolicyError::Duplicate(format!("isbn {isbn}")));
                    }
                }
            }
            book.isbn = isbn;
        }
        if let Some(genre) = &update.genre {
            book.genre = non_blank(genre);
        }
        if let Some(year) = update.publication_year {
            book.publication_year = Some(check_year(year)?);
        }
        if let Some(description) = &update.description {
            book.description = non_blank(description);
        }
        if let Some(total) = update.total_copies {
            let on_loan = copy_count(tx.list_loans(&LoanQuery::open().book(book.id))?.len())?;
            if total == 0 {
                return Err(PolicyError::Invalid(
                    "total_copies must be at least 1".into(),
                ));
            }
            if total < on_loan {
                return Err(PolicyError::Invalid(format!(
                    "cannot reduce to {total} copies while {on_loan} are on loan"
                )));
            }
            book.total_copies = total;
            book.available_copies = total - on_loan;
        }

        tx.save_book(&book)?;
        tx.commit()?;

        info!(book = %book.id, copies = book.total_copies, "book updated");
        Ok(book)
    }

    /// Remove a title and its returned-loan history.
    ///
    /// Refused while any copy is on loan or while a late return of this title
    /// still carries an unpaid fine.
    pub fn remove_book(&self, id: &BookId) -> PolicyResult<()> {
        let mut tx = self.store().begin()?;
        if tx.get_book(id)?.is_none() {
            return Err(PolicyError::NotFound(RecordRef::Book(*id)));
        }
        let loans = tx.list_loans(&LoanQuery::all().book(*id))?;
        let open = loans.iter().filter(|l| l.is_open()).count();
        if open > 0 {
            return Err(PolicyError::HasOpenLoans {
                record: RecordRef::Book(*id),
                count: open,
            });
        }
        let mut outstanding = Money::ZERO;
        for loan in &loans {
            if let Some(fine) = tx.fine_for_loan(&loan.id)? {
                if !fine.paid {
                    outstanding = outstanding.checked_add(fine.amount).ok_or_else(|| {
                        PolicyError::Invalid("outstanding fine total overflows".into())
                    })?;
                }
            }
        }
        if !outstanding.is_zero() {
            return Err(PolicyError::HasUnpaidFines {
                record: RecordRef::Book(*id),
                outstanding,
            });
        }
        for loan in &loans {
            tx.delete_loan(&loan.id)?;
        }
        tx.delete_book(id)?;
        tx.commit()?;

        info!(book = %id, history = loans.len(), "book removed");
        Ok(())
    }

    // ---- Borrowers ----

    pub fn register_borrower(&self, request: NewBorrower) -> PolicyResult<Borrower> {
        let name = required("name", &request.name)?;
        let email = valid_email(&request.email)?;

        let mut tx = self.store().begin()?;
        if tx.find_borrower_by_email(&email)?.is_some() {
            return Err(PolicyError::Duplicate(format!("email {email}")));
        }
        let borrower = Borrower::new(name, email).with_role(request.role);
        tx.save_borrower(&borrower)?;
        tx.commit()?;

        info!(borrower = %borrower.id, role = %borrower.role, "borrower registered");
        Ok(borrower)
    }

    /// Edit a borrower's name, email or role.
    ///
    /// The email stays unique, ignoring case; a borrower may change the case
    /// of their own address.
    pub fn update_borrower(&self, id: &BorrowerId, update: BorrowerUpdate) -> PolicyResult<Borrower> {
        let mut tx = self.store().begin()?;
        let mut borrower = tx
            .get_borrower(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Borrower(*id)))?;

        if let Some(name) = &update.name {
            borrower.name = required("name", name)?;
        }
        if let Some(email) = &update.email {
            let email = valid_email(email)?;
            if let Some(other) = tx.find_borrower_by_email(&email)? {
                if other.id != borrower.id {
                    return Err(PolicyError::Duplicate(format!("email {email}")));
                }
            }
            borrower.email = email;
        }
        if let Some(role) = update.role {
            borrower.role = role;
        }

        tx.save_borrower(&borrower)?;
        tx.commit()?;

        info!(borrower = %borrower.id, role = %borrower.role, "borrower updated");
        Ok(borrower)
    }

    /// Remove a borrower together with their fines and loan history.
    pub fn remove_borrower(&self, id: &BorrowerId) -> PolicyResult<()> {
        let mut tx = self.store().begin()?;
        if tx.get_borrower(id)?.is_none() {
            return Err(PolicyError::NotFound(RecordRef::Borrower(*id)));
        }
        let loans = tx.list_loans(&LoanQuery::all().borrower(*id))?;
        let open = loans.iter().filter(|l| l.is_open()).count();
        if open > 0 {
            return Err(PolicyError::HasOpenLoans {
                record: RecordRef::Borrower(*id),
                count: open,
            });
        }
        let fines = tx.list_fines(&FineQuery::all().borrower(*id))?;
        for fine in &fines {
            tx.delete_fine(&fine.id)?;
        }
        for loan in &loans {
            tx.delete_loan(&loan.id)?;
        }
        tx.delete_borrower(id)?;
        tx.commit()?;

        info!(
            borrower = %id,
            loans = loans.len(),
            fines = fines.len(),
            "borrower removed"
        );
        Ok(())
    }

    // ---- Loans ----

    /// Delete a returned loan and the fine it carries.
    pub fn delete_loan(&self, id: &LoanId) -> PolicyResult<()> {
        let mut tx = self.store().begin()?;
        let loan = tx
            .get_loan(id)?
            .ok_or(PolicyError::NotFound(RecordRef::Loan(*id)))?;
        if loan.is_open() {
            return Err(PolicyError::HasOpenLoans {
                record: RecordRef::Loan(*id),
                count: 1,
            });
        }
        tx.delete_loan(id)?;
        tx.commit()?;

        info!(loan = %id, "loan deleted");
        Ok(())
    }
}

fn required(field: &str, value: &str) -> PolicyResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PolicyError::Invalid(format!("{field} must not be blank")));
    }
    Ok(value.to_string())
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn valid_email(email: &str) -> PolicyResult<String> {
    let email = email.trim();
    if !email.contains('@') {
        return Err(PolicyError::Invalid(format!(
            "email {email:?} is not an address"
        )));
    }
    Ok(email.to_string())
}

fn check_year(year: i32) -> PolicyResult<i32> {
    if !(1..=9999).contains(&year) {
        return Err(PolicyError::Invalid(format!(
            "publication_year {year} is out of range"
        )));
    }
    Ok(year)
}

fn copy_count(len: usize) -> PolicyResult<u32> {
    u32::try_from(len)
        .map_err(|_| PolicyError::Invalid(format!("{len} copies exceed the supported count")))
}
