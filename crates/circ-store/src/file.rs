use std::collections::HashMap;
use std::fs::{self, File};
use std::hash::Hash;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use circ_types::{Book, Borrower, Fine, Loan};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::state::{StagedTransaction, StoreState};
use crate::traits::CirculationStore;

/// Current on-disk snapshot format.
pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk form of the whole store.
///
/// Records are stored as sorted arrays rather than maps so the file diffs
/// cleanly and keys never depend on JSON map-key encoding.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    books: Vec<Book>,
    borrowers: Vec<Borrower>,
    loans: Vec<Loan>,
    fines: Vec<Fine>,
}

impl Snapshot {
    fn capture(state: &StoreState) -> Self {
        let mut books: Vec<Book> = state.books.values().cloned().collect();
        books.sort_by_key(|b| b.id);
        let mut borrowers: Vec<Borrower> = state.borrowers.values().cloned().collect();
        borrowers.sort_by_key(|b| b.id);
        let mut loans: Vec<Loan> = state.loans.values().cloned().collect();
        loans.sort_by_key(|l| l.id);
        let mut fines: Vec<Fine> = state.fines.values().cloned().collect();
        fines.sort_by_key(|f| f.id);
        Self {
            version: SNAPSHOT_VERSION,
            books,
            borrowers,
            loans,
            fines,
        }
    }

    fn restore(self, path: &Path) -> StoreResult<StoreState> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(StoreState {
            books: index(path, "book", self.books, |b| b.id)?,
            borrowers: index(path, "borrower", self.borrowers, |b| b.id)?,
            loans: index(path, "loan", self.loans, |l| l.id)?,
            fines: index(path, "fine", self.fines, |f| f.id)?,
        })
    }
}

fn index<K, V>(
    path: &Path,
    kind: &str,
    records: Vec<V>,
    key: impl Fn(&V) -> K,
) -> StoreResult<HashMap<K, V>>
where
    K: Eq + Hash + std::fmt::Display,
{
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        let id = key(&record);
        if map.contains_key(&id) {
            return Err(StoreError::CorruptSnapshot {
                path: path.to_path_buf(),
                reason: format!("duplicate {kind} id {id}"),
            });
        }
        map.insert(id, record);
    }
    Ok(map)
}

/// Serialise `state` next to `path` and atomically rename it into place.
///
/// A crash at any point leaves either the previous snapshot or the new one on
/// disk, never a torn file.
pub(crate) fn write_snapshot(path: &Path, state: &StoreState) -> StoreResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, &Snapshot::capture(state))?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    debug!(path = %path.display(), "snapshot written");
    Ok(())
}

/// File-backed circulation store.
///
/// The working set lives in memory exactly as in
/// [`InMemoryStore`](crate::InMemoryStore); every committed transaction
/// rewrites a JSON snapshot of the whole store through a temp file and an
/// atomic rename. Suitable for a single-process desk application, not for
/// large collections.
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty (and creating the parent
    /// directory) if the file does not exist yet. Nothing is written until
    /// the first commit.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;
            let state = snapshot.restore(&path)?;
            let (books, borrowers, loans, fines) = state.counts();
            info!(
                path = %path.display(),
                books, borrowers, loans, fines,
                "store opened"
            );
            state
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            info!(path = %path.display(), "new store");
            StoreState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Location of the snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CirculationStore for JsonFileStore {
    type Transaction<'a> = StagedTransaction<'a>;

    fn begin(&self) -> StoreResult<Self::Transaction<'_>> {
        let guard = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(StagedTransaction::new(guard, Some(self.path.as_path())))
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}
