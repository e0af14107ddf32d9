use std::collections::HashMap;
use std::io::{self, Write};

use anyhow::Context;
use chrono::{Local, NaiveDate};
use circ_policy::{
    BookUpdate, BorrowerUpdate, Circulation, Eligibility, FineFilter, NewBook, NewBorrower,
};
use circ_store::{CirculationStore, JsonFileStore};
use circ_types::Money;
use colored::Colorize;
use serde::Serialize;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = CliConfig::load(cli.config.as_deref(), &cli.data_dir)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Command::Config = cli.command {
        return cmd_config(&mut out, &config, &cli);
    }

    let ledger = config.ledger_path(&cli.data_dir);
    let store = JsonFileStore::open(&ledger)
        .with_context(|| format!("opening ledger {}", ledger.display()))?;
    let desk = Circulation::new(store, config.policy);
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    execute(&desk, cli.command, today, cli.format, &mut out)
}

/// Run one command against `desk`, writing results to `out`.
pub fn execute<S: CirculationStore>(
    desk: &Circulation<S>,
    command: Command,
    today: NaiveDate,
    format: OutputFormat,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut ctx = Ctx { desk, today, format, out };
    match command {
        Command::Book(args) => ctx.book(args.action),
        Command::Borrower(args) => ctx.borrower(args.action),
        Command::Check(args) => ctx.check(args),
        Command::Borrow(args) => ctx.borrow(args),
        Command::Return(args) => ctx.return_loan(args),
        Command::Loans(args) => ctx.loans(args),
        Command::DeleteLoan(args) => {
            desk.delete_loan(&args.loan)
                .with_context(|| format!("deleting loan {}", args.loan))?;
            ctx.done(&format!("Deleted loan {}", args.loan.to_string().yellow()))
        }
        Command::Fine(args) => ctx.fine(args.action),
        Command::Status(args) => ctx.status(args),
        Command::Overdue => ctx.overdue(),
        Command::Summary => ctx.summary(),
        Command::Audit => ctx.audit(),
        Command::Config => anyhow::bail!("config is handled before the ledger is opened"),
    }
}

fn cmd_config(out: &mut dyn Write, config: &CliConfig, cli: &Cli) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Json => emit_json(out, config),
        OutputFormat::Text => {
            writeln!(out, "# ledger: {}", config.ledger_path(&cli.data_dir).display())?;
            write!(out, "{}", toml::to_string_pretty(config)?)?;
            Ok(())
        }
    }
}

fn emit_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

struct Ctx<'a, S> {
    desk: &'a Circulation<S>,
    today: NaiveDate,
    format: OutputFormat,
    out: &'a mut dyn Write,
}

impl<S: CirculationStore> Ctx<'_, S> {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Success line in text mode; nothing in JSON mode.
    fn done(&mut self, message: &str) -> anyhow::Result<()> {
        if !self.json() {
            writeln!(self.out, "{} {message}", "✓".green().bold())?;
        }
        Ok(())
    }

    // ---- Catalog ----

    fn book(&mut self, action: BookAction) -> anyhow::Result<()> {
        match action {
            BookAction::Add {
                title,
                author,
                copies,
                isbn,
                genre,
                year,
                description,
            } => {
                let mut request = NewBook::new(title, author, copies);
                request.isbn = isbn;
                request.genre = genre;
                request.publication_year = year;
                request.description = description;
                let book = self.desk.add_book(request).context("adding book")?;
                if self.json() {
                    return emit_json(self.out, &book);
                }
                self.done(&format!(
                    "Added {} ({} {})",
                    book.title.bold(),
                    book.total_copies,
                    plural(book.total_copies, "copy", "copies")
                ))?;
                writeln!(self.out, "  Id: {}", book.id.to_string().yellow())?;
                Ok(())
            }
            BookAction::List { search, genre } => {
                let filtered = search.is_some() || genre.is_some();
                let books = self
                    .desk
                    .search_books(search.as_deref(), genre.as_deref())?;
                if self.json() {
                    return emit_json(self.out, &books);
                }
                if books.is_empty() {
                    let empty = if filtered { "No matching books." } else { "Catalog is empty." };
                    writeln!(self.out, "{empty}")?;
                }
                for book in &books {
                    let shelf = format!("{}/{}", book.available_copies, book.total_copies);
                    let shelf = if book.is_available() {
                        shelf.green()
                    } else {
                        shelf.red()
                    };
                    let genre = book
                        .genre
                        .as_deref()
                        .map(|g| format!("  {}", g.dimmed()))
                        .unwrap_or_default();
                    writeln!(
                        self.out,
                        "{}  {} by {}  [{}]{}",
                        book.id.to_string().yellow(),
                        book.title.bold(),
                        book.author,
                        shelf,
                        genre
                    )?;
                }
                Ok(())
            }
            BookAction::Update {
                id,
                title,
                author,
                isbn,
                genre,
                year,
                description,
                copies,
            } => {
                let update = BookUpdate {
                    title,
                    author,
                    isbn,
                    genre,
                    publication_year: year,
                    description,
                    total_copies: copies,
                };
                let book = self
                    .desk
                    .update_book(&id, update)
                    .with_context(|| format!("updating book {id}"))?;
                if self.json() {
                    return emit_json(self.out, &book);
                }
                self.done(&format!(
                    "Updated {} ({}/{} on shelf)",
                    book.title.bold(),
                    book.available_copies,
                    book.total_copies
                ))
            }
            BookAction::Remove { id } => {
                self.desk
                    .remove_book(&id)
                    .with_context(|| format!("removing book {id}"))?;
                self.done(&format!("Removed book {}", id.to_string().yellow()))
            }
        }
    }

    // ---- Borrowers ----

    fn borrower(&mut self, action: BorrowerAction) -> anyhow::Result<()> {
        match action {
            BorrowerAction::Add { name, email, role } => {
                let borrower = self
                    .desk
                    .register_borrower(NewBorrower::new(name, email).with_role(role))
                    .context("registering borrower")?;
                if self.json() {
                    return emit_json(self.out, &borrower);
                }
                self.done(&format!(
                    "Registered {} <{}> as {}",
                    borrower.name.bold(),
                    borrower.email,
                    borrower.role
                ))?;
                writeln!(self.out, "  Id: {}", borrower.id.to_string().yellow())?;
                Ok(())
            }
            BorrowerAction::List => {
                let borrowers = self.desk.borrowers()?;
                if self.json() {
                    return emit_json(self.out, &borrowers);
                }
                if borrowers.is_empty() {
                    writeln!(self.out, "No borrowers registered.")?;
                }
                for b in &borrowers {
                    writeln!(
                        self.out,
                        "{}  {} <{}> ({})",
                        b.id.to_string().yellow(),
                        b.name.bold(),
                        b.email,
                        b.role
                    )?;
                }
                Ok(())
            }
            BorrowerAction::Update {
                id,
                name,
                email,
                role,
            } => {
                let update = BorrowerUpdate { name, email, role };
                let borrower = self
                    .desk
                    .update_borrower(&id, update)
                    .with_context(|| format!("updating borrower {id}"))?;
                if self.json() {
                    return emit_json(self.out, &borrower);
                }
                self.done(&format!(
                    "Updated {} <{}> ({})",
                    borrower.name.bold(),
                    borrower.email,
                    borrower.role
                ))
            }
            BorrowerAction::Remove { id } => {
                self.desk
                    .remove_borrower(&id)
                    .with_context(|| format!("removing borrower {id}"))?;
                self.done(&format!("Removed borrower {}", id.to_string().yellow()))
            }
        }
    }

    // ---- Loans ----

    fn check(&mut self, args: CheckArgs) -> anyhow::Result<()> {
        let eligibility = self.desk.can_borrow(&args.book, &args.borrower)?;
        if self.json() {
            let (rule, reason) = match &eligibility {
                Eligibility::Eligible => (None, None),
                Eligibility::Denied { rule, denial } => {
                    (Some(rule.clone()), Some(denial.to_string()))
                }
            };
            return emit_json(
                self.out,
                &serde_json::json!({
                    "eligible": eligibility.is_eligible(),
                    "rule": rule,
                    "reason": reason,
                }),
            );
        }
        match eligibility {
            Eligibility::Eligible => self.done("Eligible to borrow"),
            Eligibility::Denied { rule, denial } => {
                writeln!(self.out, "{} Not eligible: {denial} ({})", "✗".red().bold(), rule.dimmed())?;
                Ok(())
            }
        }
    }

    fn borrow(&mut self, args: BorrowArgs) -> anyhow::Result<()> {
        let loan = self
            .desk
            .borrow(&args.book, &args.borrower, self.today)
            .with_context(|| format!("borrowing book {}", args.book))?;
        if self.json() {
            return emit_json(self.out, &loan);
        }
        self.done(&format!("Loan {}", loan.id.to_string().yellow()))?;
        writeln!(self.out, "  Due: {}", loan.due_date.to_string().bold())?;
        Ok(())
    }

    fn return_loan(&mut self, args: ReturnArgs) -> anyhow::Result<()> {
        let outcome = self
            .desk
            .return_loan(&args.loan, self.today)
            .with_context(|| format!("returning loan {}", args.loan))?;
        if self.json() {
            return emit_json(self.out, &outcome);
        }
        self.done(&format!("Returned loan {}", outcome.loan.id.to_string().yellow()))?;
        match &outcome.fine {
            Some(fine) => writeln!(
                self.out,
                "  {} {} ({})",
                "Fine:".red().bold(),
                fine.amount.to_string().red(),
                fine.description()
            )?,
            None => writeln!(self.out, "  On time, no fine.")?,
        }
        Ok(())
    }

    fn loans(&mut self, args: LoansArgs) -> anyhow::Result<()> {
        let loans = self.desk.loans_for(&args.borrower)?;
        if self.json() {
            return emit_json(self.out, &loans);
        }
        if loans.is_empty() {
            writeln!(self.out, "No loans.")?;
            return Ok(());
        }
        let titles: HashMap<_, _> = self
            .desk
            .books()?
            .into_iter()
            .map(|b| (b.id, b.title))
            .collect();
        for loan in &loans {
            let title = titles
                .get(&loan.book_id)
                .map_or("(removed)", String::as_str);
            let state = match loan.return_date {
                Some(returned) => format!("returned {returned}").dimmed(),
                None if loan.is_overdue(self.today) => format!("overdue since {}", loan.due_date).red(),
                None => format!("due {}", loan.due_date).green(),
            };
            writeln!(self.out, "{}  {}  {}", loan.id.to_string().yellow(), title.bold(), state)?;
        }
        Ok(())
    }

    // ---- Fines ----

    fn fine(&mut self, action: FineAction) -> anyhow::Result<()> {
        match action {
            FineAction::List { filter } => {
                let filter = match filter {
                    FineFilterArg::All => FineFilter::All,
                    FineFilterArg::Unpaid => FineFilter::Unpaid,
                    FineFilterArg::Paid => FineFilter::Paid,
                };
                let fines = self.desk.fines(filter)?;
                if self.json() {
                    return emit_json(self.out, &fines);
                }
                if fines.is_empty() {
                    writeln!(self.out, "No fines.")?;
                }
                for fine in &fines {
                    let state = match fine.payment_date {
                        Some(paid_on) => format!("paid {paid_on}").green(),
                        None => "unpaid".red(),
                    };
                    writeln!(
                        self.out,
                        "{}  {}  {}  {}",
                        fine.id.to_string().yellow(),
                        fine.amount.to_string().bold(),
                        fine.description(),
                        state
                    )?;
                }
                writeln!(
                    self.out,
                    "Outstanding: {}",
                    self.desk.outstanding_total()?.to_string().bold()
                )?;
                Ok(())
            }
            FineAction::Pay { id } => {
                let fine = self
                    .desk
                    .pay_fine(&id, self.today)
                    .with_context(|| format!("paying fine {id}"))?;
                if self.json() {
                    return emit_json(self.out, &fine);
                }
                self.done(&format!("Paid {} on {}", fine.amount.to_string().bold(), self.today))
            }
            FineAction::PayAll { borrower } => {
                let paid = self
                    .desk
                    .pay_all_fines(&borrower, self.today)
                    .with_context(|| format!("paying fines of borrower {borrower}"))?;
                if self.json() {
                    return emit_json(self.out, &paid);
                }
                if paid.is_empty() {
                    return self.done("No unpaid fines");
                }
                let total: Money = paid.iter().map(|f| f.amount).sum();
                self.done(&format!(
                    "Paid {} {} totalling {} on {}",
                    paid.len(),
                    if paid.len() == 1 { "fine" } else { "fines" },
                    total.to_string().bold(),
                    self.today
                ))
            }
            FineAction::Cancel { id } => {
                self.desk
                    .cancel_fine(&id)
                    .with_context(|| format!("cancelling fine {id}"))?;
                self.done(&format!("Cancelled fine {}", id.to_string().yellow()))
            }
        }
    }

    // ---- Reports ----

    fn status(&mut self, args: StatusArgs) -> anyhow::Result<()> {
        let summary = self.desk.borrower_summary(&args.borrower, self.today)?;
        if self.json() {
            return emit_json(self.out, &summary);
        }
        writeln!(self.out, "{} <{}>", summary.borrower.name.bold(), summary.borrower.email)?;
        writeln!(self.out, "  Open loans: {}", summary.open_loans)?;
        writeln!(self.out, "  Due soon:   {}", summary.due_soon.to_string().yellow())?;
        let overdue = summary.overdue.to_string();
        let overdue = if summary.overdue > 0 { overdue.red() } else { overdue.normal() };
        writeln!(self.out, "  Overdue:    {overdue}")?;
        let owed = summary.unpaid_fines.to_string();
        let owed = if summary.unpaid_fines.is_zero() { owed.green() } else { owed.red() };
        writeln!(self.out, "  Unpaid:     {owed}")?;
        Ok(())
    }

    fn overdue(&mut self) -> anyhow::Result<()> {
        let overdue = self.desk.overdue_loans(self.today)?;
        if self.json() {
            return emit_json(self.out, &overdue);
        }
        if overdue.is_empty() {
            return self.done("Nothing overdue");
        }
        for entry in &overdue {
            writeln!(
                self.out,
                "{}  {} / {}  {} {} late, {} accrued",
                entry.loan.id.to_string().yellow(),
                entry.book_title.bold(),
                entry.borrower_name,
                entry.days_overdue,
                plural(entry.days_overdue, "day", "days"),
                entry.accrued.to_string().red()
            )?;
        }
        Ok(())
    }

    fn summary(&mut self) -> anyhow::Result<()> {
        let summary = self.desk.library_summary()?;
        if self.json() {
            return emit_json(self.out, &summary);
        }
        writeln!(self.out, "{}", "Library summary".bold())?;
        writeln!(
            self.out,
            "  Titles:       {} ({} copies, {} on shelf)",
            summary.titles, summary.total_copies, summary.available_copies
        )?;
        writeln!(self.out, "  Active loans: {}", summary.active_loans.to_string().yellow())?;
        writeln!(self.out, "  Borrowers:    {}", summary.borrowers)?;
        let owed = summary.unpaid_fines.to_string();
        let owed = if summary.unpaid_fines.is_zero() { owed.green() } else { owed.red() };
        writeln!(self.out, "  Unpaid fines: {owed}")?;
        if !summary.genres.is_empty() {
            writeln!(self.out, "  By genre:")?;
        }
        for genre in &summary.genres {
            writeln!(
                self.out,
                "    {:<20} {} {}, {} copies",
                genre.genre,
                genre.titles,
                if genre.titles == 1 { "title" } else { "titles" },
                genre.copies
            )?;
        }
        Ok(())
    }

    fn audit(&mut self) -> anyhow::Result<()> {
        let report = self.desk.audit()?;
        if self.json() {
            emit_json(self.out, &report)?;
        } else {
            writeln!(
                self.out,
                "Audited {} books, {} borrowers, {} loans, {} fines",
                report.books, report.borrowers, report.loans, report.fines
            )?;
            for v in &report.violations {
                writeln!(self.out, "  {} {v}", "✗".red().bold())?;
            }
        }
        if !report.is_clean() {
            anyhow::bail!("audit found {} violation(s)", report.violations.len());
        }
        self.done("Inventory consistent")
    }
}

fn plural<'s>(n: u32, one: &'s str, many: &'s str) -> &'s str {
    if n == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use circ_policy::LoanPolicy;
    use circ_store::InMemoryStore;

    use super::*;

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(n))
            .unwrap()
    }

    fn run(
        desk: &Circulation<InMemoryStore>,
        command: Command,
        today: NaiveDate,
        format: OutputFormat,
    ) -> anyhow::Result<String> {
        let mut buf = Vec::new();
        execute(desk, command, today, format, &mut buf)?;
        Ok(String::from_utf8(buf).unwrap())
    }

    fn desk() -> Circulation<InMemoryStore> {
        Circulation::new(InMemoryStore::new(), LoanPolicy::default())
    }

    // -----------------------------------------------------------------------
    // End-to-end through the command layer
    // -----------------------------------------------------------------------

    #[test]
    fn late_return_prints_fine() {
        let desk = desk();
        let book = desk.add_book(NewBook::new("Ficciones", "Borges", 1)).unwrap();
        let reader = desk
            .register_borrower(NewBorrower::new("Pierre Menard", "menard@example.org"))
            .unwrap();

        let json = run(
            &desk,
            Command::Borrow(BorrowArgs {
                book: book.id,
                borrower: reader.id,
            }),
            day(0),
            OutputFormat::Json,
        )
        .unwrap();
        let loan: serde_json::Value = serde_json::from_str(&json).unwrap();
        let loan_id = loan["id"].as_str().unwrap().parse().unwrap();

        let text = run(
            &desk,
            Command::Return(ReturnArgs { loan: loan_id }),
            day(20),
            OutputFormat::Text,
        )
        .unwrap();
        assert!(text.contains("$3.00"));
        assert!(text.contains("Late return: 6 days"));
    }

    #[test]
    fn denied_borrow_is_an_error() {
        let desk = desk();
        let book = desk.add_book(NewBook::new("Ficciones", "Borges", 1)).unwrap();
        let a = desk
            .register_borrower(NewBorrower::new("A", "a@example.org"))
            .unwrap();
        let b = desk
            .register_borrower(NewBorrower::new("B", "b@example.org"))
            .unwrap();
        desk.borrow(&book.id, &a.id, day(0)).unwrap();

        let err = run(
            &desk,
            Command::Borrow(BorrowArgs {
                book: book.id,
                borrower: b.id,
            }),
            day(0),
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("no copies"));
    }

    #[test]
    fn check_reports_rule_in_json() {
        let desk = desk();
        let book = desk.add_book(NewBook::new("Ficciones", "Borges", 1)).unwrap();
        let a = desk
            .register_borrower(NewBorrower::new("A", "a@example.org"))
            .unwrap();
        desk.borrow(&book.id, &a.id, day(0)).unwrap();

        let json = run(
            &desk,
            Command::Check(CheckArgs {
                book: book.id,
                borrower: a.id,
            }),
            day(1),
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["eligible"], false);
        assert_eq!(value["rule"], "availability");
    }

    #[test]
    fn fine_list_shows_outstanding_total() {
        let desk = desk();
        let book = desk.add_book(NewBook::new("Ficciones", "Borges", 1)).unwrap();
        let a = desk
            .register_borrower(NewBorrower::new("A", "a@example.org"))
            .unwrap();
        let loan = desk.borrow(&book.id, &a.id, day(0)).unwrap();
        desk.return_loan(&loan.id, day(16)).unwrap();

        let text = run(
            &desk,
            Command::Fine(FineArgs {
                action: FineAction::List {
                    filter: FineFilterArg::Unpaid,
                },
            }),
            day(16),
            OutputFormat::Text,
        )
        .unwrap();
        assert!(text.contains("Outstanding"));
        assert!(text.contains("$1.00"));
    }

    #[test]
    fn clean_audit_succeeds() {
        let desk = desk();
        desk.add_book(NewBook::new("Ficciones", "Borges", 2)).unwrap();
        let text = run(&desk, Command::Audit, day(0), OutputFormat::Text).unwrap();
        assert!(text.contains("Audited 1 books"));
    }

    #[test]
    fn book_list_json_round_trips() {
        let desk = desk();
        desk.add_book(NewBook::new("Ficciones", "Borges", 2).with_isbn("978-0802130303"))
            .unwrap();
        let json = run(
            &desk,
            Command::Book(BookArgs {
                action: BookAction::List {
                    search: None,
                    genre: None,
                },
            }),
            day(0),
            OutputFormat::Json,
        )
        .unwrap();
        let books: Vec<circ_types::Book> = serde_json::from_str(&json).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].available_copies, 2);
    }

    #[test]
    fn book_list_filters_by_search_and_genre() {
        let desk = desk();
        desk.add_book(NewBook::new("Ficciones", "Borges", 1).with_genre("Fiction"))
            .unwrap();
        desk.add_book(NewBook::new("Labyrinths", "Borges", 1).with_genre("Essays"))
            .unwrap();
        desk.add_book(NewBook::new("Emma", "Jane Austen", 1)).unwrap();

        let list = |search: Option<&str>, genre: Option<&str>| {
            run(
                &desk,
                Command::Book(BookArgs {
                    action: BookAction::List {
                        search: search.map(String::from),
                        genre: genre.map(String::from),
                    },
                }),
                day(0),
                OutputFormat::Text,
            )
            .unwrap()
        };
        let text = list(Some("borges"), Some("essays"));
        assert!(text.contains("Labyrinths"));
        assert!(!text.contains("Ficciones"));
        assert!(!text.contains("Emma"));
        assert!(list(Some("tolstoy"), None).contains("No matching books."));
    }

    #[test]
    fn pay_all_reports_total_and_clears_the_block() {
        let desk = desk();
        let first = desk.add_book(NewBook::new("Ficciones", "Borges", 1)).unwrap();
        let second = desk.add_book(NewBook::new("Aleph", "Borges", 1)).unwrap();
        let a = desk
            .register_borrower(NewBorrower::new("A", "a@example.org"))
            .unwrap();
        let loan = desk.borrow(&first.id, &a.id, day(0)).unwrap();
        desk.return_loan(&loan.id, day(20)).unwrap();

        let text = run(
            &desk,
            Command::Fine(FineArgs {
                action: FineAction::PayAll { borrower: a.id },
            }),
            day(21),
            OutputFormat::Text,
        )
        .unwrap();
        assert!(text.contains("Paid 1 fine totalling"));
        assert!(text.contains("$3.00"));
        desk.borrow(&second.id, &a.id, day(21)).unwrap();
    }

    #[test]
    fn borrower_update_changes_email() {
        let desk = desk();
        let a = desk
            .register_borrower(NewBorrower::new("A", "a@example.org"))
            .unwrap();
        let json = run(
            &desk,
            Command::Borrower(BorrowerArgs {
                action: BorrowerAction::Update {
                    id: a.id,
                    name: None,
                    email: Some("new@example.org".into()),
                    role: None,
                },
            }),
            day(0),
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["email"], "new@example.org");
        assert_eq!(value["name"], "A");
    }

    #[test]
    fn summary_json_lists_genres() {
        let desk = desk();
        desk.add_book(NewBook::new("Ficciones", "Borges", 2).with_genre("Fiction"))
            .unwrap();
        desk.add_book(NewBook::new("Emma", "Jane Austen", 1)).unwrap();
        let json = run(&desk, Command::Summary, day(0), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["titles"], 2);
        assert_eq!(value["total_copies"], 3);
        assert_eq!(value["genres"][0]["genre"], "Fiction");
        assert_eq!(value["genres"][1]["genre"], "Uncategorized");
    }
}
