use serde::{Deserialize, Serialize};

use crate::id::BookId;

/// A catalog entry.
///
/// `available_copies` tracks copies on the shelf. The store keeps it equal to
/// `total_copies` minus the number of open loans on this book, and it is
/// never negative or above `total_copies`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl Book {
    /// Create a fully-stocked catalog entry with a fresh identifier.
    pub fn new(title: impl Into<String>, author: impl Into<String>, total_copies: u32) -> Self {
        Self {
            id: BookId::new(),
            title: title.into(),
            author: author.into(),
            isbn: None,
            genre: None,
            publication_year: None,
            description: None,
            total_copies,
            available_copies: total_copies,
        }
    }

    /// Builder-style ISBN setter.
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    /// Case-insensitive substring match against title, author, genre and
    /// ISBN. An empty term matches everything.
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [
            Some(self.title.as_str()),
            Some(self.author.as_str()),
            self.genre.as_deref(),
            self.isbn.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&term))
    }

    /// Returns `true` if the genre equals `genre`, ignoring case.
    pub fn in_genre(&self, genre: &str) -> bool {
        self.genre
            .as_deref()
            .is_some_and(|g| g.trim().to_lowercase() == genre.trim().to_lowercase())
    }

    /// Copies currently out on loan.
    pub fn on_loan(&self) -> u32 {
        self.total_copies.saturating_sub(self.available_copies)
    }

    /// Returns `true` if at least one copy is on the shelf.
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}
