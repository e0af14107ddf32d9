use std::path::PathBuf;

use chrono::NaiveDate;
use circ_types::{BookId, BorrowerId, BorrowerRole, FineId, LoanId};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "circ",
    about = "Circulation ledger: catalog, loans, returns and fines",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Directory holding the ledger file and `circ.toml`
    #[arg(long, global = true, default_value = ".circ")]
    pub data_dir: PathBuf,

    /// Explicit configuration file (overrides `<data-dir>/circ.toml`)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Treat this date as today (YYYY-MM-DD)
    #[arg(long, global = true)]
    pub today: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage the catalog
    Book(BookArgs),
    /// Manage borrowers
    Borrower(BorrowerArgs),
    /// Check whether a borrower may take out a book
    Check(CheckArgs),
    /// Lend a book to a borrower
    Borrow(BorrowArgs),
    /// Return a loan, issuing a fine if it is late
    Return(ReturnArgs),
    /// List a borrower's loans, current first
    Loans(LoansArgs),
    /// Delete a returned loan and its fine
    DeleteLoan(DeleteLoanArgs),
    /// List, pay, or cancel fines
    Fine(FineArgs),
    /// Show a borrower's dashboard
    Status(StatusArgs),
    /// List overdue loans with accrued fines
    Overdue,
    /// Show library-wide totals and the catalog by genre
    Summary,
    /// Cross-check copy counts against the loan and fine ledgers
    Audit,
    /// Show the effective configuration
    Config,
}

#[derive(Args)]
pub struct BookArgs {
    #[command(subcommand)]
    pub action: BookAction,
}

#[derive(Subcommand)]
pub enum BookAction {
    /// Add a title to the catalog
    Add {
        title: String,
        author: String,
        #[arg(short, long, default_value = "1")]
        copies: u32,
        #[arg(long)]
        isbn: Option<String>,
        #[arg(long)]
        genre: Option<String>,
        /// Year of publication
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the catalog, optionally filtered
    List {
        /// Match title, author, genre or ISBN (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
        /// Only books in this genre
        #[arg(short, long)]
        genre: Option<String>,
    },
    /// Edit a catalog entry
    Update {
        id: BookId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// New ISBN; pass an empty string to clear it
        #[arg(long)]
        isbn: Option<String>,
        /// New genre; pass an empty string to clear it
        #[arg(long)]
        genre: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        /// New description; pass an empty string to clear it
        #[arg(long)]
        description: Option<String>,
        #[arg(short, long)]
        copies: Option<u32>,
    },
    /// Remove a title with no copies on loan
    Remove { id: BookId },
}

#[derive(Args)]
pub struct BorrowerArgs {
    #[command(subcommand)]
    pub action: BorrowerAction,
}

#[derive(Subcommand)]
pub enum BorrowerAction {
    /// Register a borrower
    Add {
        name: String,
        email: String,
        #[arg(long, default_value = "member")]
        role: BorrowerRole,
    },
    /// List borrowers
    List,
    /// Edit a borrower's name, email or role
    Update {
        id: BorrowerId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        role: Option<BorrowerRole>,
    },
    /// Remove a borrower with no open loans
    Remove { id: BorrowerId },
}

#[derive(Args)]
pub struct CheckArgs {
    pub book: BookId,
    #[arg(short, long)]
    pub borrower: BorrowerId,
}

#[derive(Args)]
pub struct BorrowArgs {
    pub book: BookId,
    #[arg(short, long)]
    pub borrower: BorrowerId,
}

#[derive(Args)]
pub struct ReturnArgs {
    pub loan: LoanId,
}

#[derive(Args)]
pub struct LoansArgs {
    #[arg(short, long)]
    pub borrower: BorrowerId,
}

#[derive(Args)]
pub struct DeleteLoanArgs {
    pub loan: LoanId,
}

#[derive(Args)]
pub struct FineArgs {
    #[command(subcommand)]
    pub action: FineAction,
}

#[derive(Subcommand)]
pub enum FineAction {
    /// List fines, unpaid first
    List {
        #[arg(long, default_value = "all")]
        filter: FineFilterArg,
    },
    /// Mark a fine paid
    Pay { id: FineId },
    /// Pay every unpaid fine of one borrower
    PayAll {
        #[arg(short, long)]
        borrower: BorrowerId,
    },
    /// Delete a fine (irreversible)
    Cancel { id: FineId },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum FineFilterArg {
    All,
    Unpaid,
    Paid,
}

#[derive(Args)]
pub struct StatusArgs {
    #[arg(short, long)]
    pub borrower: BorrowerId,
}
