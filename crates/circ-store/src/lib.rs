//! Transactional catalog and ledger storage for the circulation ledger.
//!
//! The loan policy never talks to a database directly. It opens a
//! transaction through [`CirculationStore::begin`], reads and writes books,
//! borrowers, loans and fines through the narrow [`StoreTransaction`]
//! interface, and commits.
//!
//! # Storage Backends
//!
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding
//! - [`JsonFileStore`] -- same working set, persisted as a JSON snapshot that
//!   is replaced atomically on every commit
//!
//! # Design Rules
//!
//! 1. One transaction at a time per store; `begin` blocks while another is live.
//! 2. A transaction dropped without `commit` leaves the store unchanged.
//! 3. `decrement_available` is conditional and reports `false` instead of
//!    going below zero; `increment_available` never exceeds `total_copies`.
//! 4. Deleting a loan deletes the fine it owns.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod state;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use state::StagedTransaction;
pub use traits::{CirculationStore, FineQuery, LoanQuery, StoreTransaction};
