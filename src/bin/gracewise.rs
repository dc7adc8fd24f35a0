//! CLI binary for tracking credit-card grace periods.

use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use gracewise::error::GraceWiseError;
use gracewise::gracewise::{AnalyzedTransaction, GraceWiseBlocking, MergeSummary};
use gracewise::models::{Card, NaiveDate, Snapshot, StatusCategory, Transaction, TransactionId};
use gracewise::storage::{BlockingStorage, FileStorage};
use gracewise::validation::CardForm;

/// Environment variable naming the ledger owner.
const USER_ENV: &str = "GRACEWISE_USER";
/// Environment variable overriding the data directory.
const DATA_DIR_ENV: &str = "GRACEWISE_DATA_DIR";
/// Currency shown in front of every amount.
const CURRENCY: &str = "EGP";

/// GraceWise CLI: know when every card purchase has to be paid.
#[derive(Debug, Parser)]
#[command(name = "gracewise", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR", env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,
    /// Ledger owner.
    #[arg(long, global = true, env = USER_ENV, default_value = "guest")]
    user: String,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// List stored cards.
    Cards,
    /// Add a card, or update the card with the same name.
    AddCard(CardArgs),
    /// List recorded purchases.
    Purchases,
    /// Record a purchase on a card.
    AddPurchase(PurchaseArgs),
    /// Remove a purchase by id.
    RemovePurchase {
        /// Purchase id as shown by `purchases`.
        id: String,
    },
    /// Show grace status, interest and fines for every purchase.
    Grace {
        /// Evaluate as of this date (YYYY-MM-DD) instead of today.
        #[arg(long, value_parser = parse_date)]
        as_of: Option<NaiveDate>,
    },
    /// Write all cards and purchases to a JSON file.
    Export {
        /// Output path (default: gracewise_<user>.json).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Merge cards and purchases from an exported JSON file.
    Import {
        /// File produced by `export`.
        file: PathBuf,
    },
}

/// Arguments for the `add-card` subcommand.
#[derive(Debug, Args)]
struct CardArgs {
    /// Card name (3+ characters).
    #[arg(long)]
    name: String,
    /// Any date on which the billing cycle closes (YYYY-MM-DD).
    #[arg(long)]
    cycle_end: String,
    /// The matching payment due date (YYYY-MM-DD).
    #[arg(long)]
    due: String,
    /// Annual interest rate in percent.
    #[arg(long, default_value = "")]
    annual_rate: String,
    /// Daily interest rate in percent (derived from the annual rate if omitted).
    #[arg(long, default_value = "")]
    daily_rate: String,
    /// Late fine charged once a purchase is overdue.
    #[arg(long, default_value = "")]
    fine: String,
}

impl From<CardArgs> for CardForm {
    fn from(args: CardArgs) -> Self {
        Self {
            name: args.name,
            cycle_end: args.cycle_end,
            due: args.due,
            annual_rate: args.annual_rate,
            daily_rate: args.daily_rate,
            fine: args.fine,
        }
    }
}

/// Arguments for the `add-purchase` subcommand.
#[derive(Debug, Args)]
struct PurchaseArgs {
    /// Name of the card the purchase was made with (case-insensitive).
    #[arg(long)]
    card: String,
    /// Purchase amount.
    #[arg(long)]
    amount: f64,
    /// Purchase date (YYYY-MM-DD, default: today).
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// What was bought.
    #[arg(long)]
    note: Option<String>,
}

/// Parses a date string in `YYYY-MM-DD` format for clap.
fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|err| format!("{err}"))
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => storage,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to initialize storage: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let ledger = match GraceWiseBlocking::builder()
        .user(cli.user)
        .storage(storage)
        .build()
    {
        Ok(ledger) => ledger,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to open ledger: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    dispatch(&ledger, cli.command)
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> gracewise::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    command: Command,
) -> io::Result<ExitCode> {
    match command {
        Command::Cards => cmd_cards(ledger),
        Command::AddCard(args) => cmd_add_card(ledger, &CardForm::from(args)),
        Command::Purchases => cmd_purchases(ledger),
        Command::AddPurchase(args) => cmd_add_purchase(ledger, args),
        Command::RemovePurchase { id } => cmd_remove_purchase(ledger, id),
        Command::Grace { as_of } => {
            cmd_grace(ledger, as_of.unwrap_or_else(|| Local::now().date_naive()))
        }
        Command::Export { out } => {
            let path = out.unwrap_or_else(|| PathBuf::from(ledger.export_file_name()));
            cmd_export(ledger, &path)
        }
        Command::Import { file } => cmd_import(ledger, &file),
    }
}

/// Prints a failed operation to stderr and returns the failure code.
fn report_failure(action: &str, err: GraceWiseError) -> io::Result<ExitCode> {
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{} {action}: {err}", "error:".red().bold())?;
    if let GraceWiseError::Validation(validation) = err {
        for issue in validation.issues {
            writeln!(stderr, "  {} {}", format_args!("{}:", issue.field).cyan(), issue.message)?;
        }
    }
    Ok(ExitCode::FAILURE)
}

/// Executes the `cards` subcommand.
fn cmd_cards<S: BlockingStorage>(ledger: &GraceWiseBlocking<S>) -> io::Result<ExitCode> {
    match ledger.cards() {
        Ok(cards) => {
            print_cards_table(&cards)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to read cards", err),
    }
}

/// Executes the `add-card` subcommand.
fn cmd_add_card<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    form: &CardForm,
) -> io::Result<ExitCode> {
    match ledger.save_card(form) {
        Ok(card) => {
            writeln!(
                io::stdout().lock(),
                "{} {} {}",
                "Saved card".green().bold(),
                card.name.bold(),
                format_args!("({})", card.id).dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("card not saved", err),
    }
}

/// Executes the `purchases` subcommand.
fn cmd_purchases<S: BlockingStorage>(ledger: &GraceWiseBlocking<S>) -> io::Result<ExitCode> {
    let loaded = ledger
        .card_book()
        .and_then(|book| ledger.transactions().map(|txs| (book, txs)));
    match loaded {
        Ok((book, txs)) => {
            let rows: Vec<(&Transaction, &str)> = txs
                .iter()
                .map(|tx| {
                    let card = book.get(&tx.card_id).map_or("\u{2014}", |card| card.name.as_str());
                    (tx, card)
                })
                .collect();
            print_purchases_table(&rows)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to read purchases", err),
    }
}

/// Executes the `add-purchase` subcommand.
fn cmd_add_purchase<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    args: PurchaseArgs,
) -> io::Result<ExitCode> {
    let book = match ledger.card_book() {
        Ok(book) => book,
        Err(err) => return report_failure("failed to read cards", err),
    };
    let Some(card) = book.find_by_name(&args.card) else {
        writeln!(
            io::stderr().lock(),
            "{} card not found: {}",
            "error:".red().bold(),
            args.card
        )?;
        return Ok(ExitCode::FAILURE);
    };
    if !args.amount.is_finite() || args.amount <= 0.0_f64 {
        writeln!(
            io::stderr().lock(),
            "{} amount must be a positive number",
            "error:".red().bold()
        )?;
        return Ok(ExitCode::FAILURE);
    }

    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    match ledger.record_purchase(card.id.clone(), args.amount, Some(date), args.note) {
        Ok(tx) => {
            writeln!(
                io::stdout().lock(),
                "{} {} on {} {}",
                "Recorded".green().bold(),
                format_money(tx.amount),
                card.name.bold(),
                format_args!("({})", tx.id).dimmed()
            )?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("purchase not recorded", err),
    }
}

/// Executes the `remove-purchase` subcommand.
fn cmd_remove_purchase<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    id: String,
) -> io::Result<ExitCode> {
    let id = TransactionId::new(id);
    let known = match ledger.transactions() {
        Ok(transactions) => transactions.iter().any(|tx| tx.id == id),
        Err(err) => return report_failure("failed to read purchases", err),
    };
    if !known {
        writeln!(
            io::stderr().lock(),
            "{} purchase not found: {id}",
            "error:".red().bold()
        )?;
        return Ok(ExitCode::FAILURE);
    }

    match ledger.remove_transactions(&[id]) {
        Ok(()) => {
            writeln!(io::stdout().lock(), "{}", "Purchase removed.".green())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to remove purchase", err),
    }
}

/// Executes the `grace` subcommand.
fn cmd_grace<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    as_of: NaiveDate,
) -> io::Result<ExitCode> {
    match ledger.analyze_all(as_of) {
        Ok(rows) => {
            print_grace_table(&rows, as_of)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("failed to analyse purchases", err),
    }
}

/// Executes the `export` subcommand.
fn cmd_export<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    path: &Path,
) -> io::Result<ExitCode> {
    let json = ledger
        .export_snapshot(Utc::now())
        .and_then(|snapshot| serde_json::to_string_pretty(&snapshot).map_err(GraceWiseError::from));
    let json = match json {
        Ok(json) => json,
        Err(err) => return report_failure("export failed", err),
    };
    fs::write(path, json)?;
    writeln!(
        io::stdout().lock(),
        "{} {}",
        "Exported to".green().bold(),
        path.display()
    )?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `import` subcommand.
fn cmd_import<S: BlockingStorage>(
    ledger: &GraceWiseBlocking<S>,
    path: &Path,
) -> io::Result<ExitCode> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} cannot read {}: {err}",
                "error:".red().bold(),
                path.display()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };
    let merged = serde_json::from_str::<Snapshot>(&contents)
        .map_err(GraceWiseError::from)
        .and_then(|snapshot| ledger.restore_and_merge(snapshot, Utc::now()));
    match merged {
        Ok(summary) => {
            print_merge_summary(&summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure("import failed", err),
    }
}

// ── Presentation ─────────────────────────────────────────────────────

/// Formats an amount as `EGP 1,234.56`.
fn format_money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0_f64 { "-" } else { "" };
    format!("{sign}{CURRENCY} {grouped}.{cents}")
}

/// Short label and table colour for a status.
const fn status_style(status: StatusCategory) -> (&'static str, Color) {
    match status {
        StatusCategory::InGrace => ("In grace", Color::Green),
        StatusCategory::DueToday => ("Due today", Color::Yellow),
        StatusCategory::Overdue => ("Overdue", Color::Red),
    }
}

/// Human-readable distance to the due date.
fn days_left_label(days_left: i64) -> String {
    match days_left {
        0 => "due today".to_owned(),
        1 => "1 day left".to_owned(),
        -1 => "1 day late".to_owned(),
        left if left > 0 => format!("{left} days left"),
        late => format!("{} days late", late.unsigned_abs()),
    }
}

/// Prints cards in a table.
fn print_cards_table(cards: &[Card]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if cards.is_empty() {
        writeln!(out, "{}", "No cards yet.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Cycle ends").fg(Color::Cyan),
        Cell::new("Due").fg(Color::Cyan),
        Cell::new("Annual %").fg(Color::Cyan),
        Cell::new("Daily %").fg(Color::Cyan),
        Cell::new("Late fine").fg(Color::Cyan),
    ]);

    for card in cards {
        let terms = card.terms();
        _ = table.add_row(vec![
            Cell::new(&card.name),
            Cell::new(format!("day {}", terms.cycle_end_day())),
            Cell::new(format!("day {}", terms.due_day())),
            Cell::new(format!("{:.2}", card.annual_rate_percent)),
            Cell::new(format!("{:.6}", terms.daily_rate_percent())),
            Cell::new(format_money(terms.late_fine())),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Cards".green().bold(),
        format_args!("({})", cards.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints purchases with their card names in a table.
fn print_purchases_table(rows: &[(&Transaction, &str)]) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if rows.is_empty() {
        writeln!(out, "{}", "No purchases yet.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Date").fg(Color::Cyan),
        Cell::new("Card").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Note").fg(Color::Cyan),
        Cell::new("Id").fg(Color::Cyan),
    ]);

    for &(tx, card) in rows {
        let date = tx
            .purchase_date
            .map_or_else(|| "\u{2014}".to_owned(), |date| date.to_string());
        _ = table.add_row(vec![
            Cell::new(date),
            Cell::new(card),
            Cell::new(format_money(tx.amount)),
            Cell::new(tx.note.as_deref().unwrap_or("")),
            Cell::new(&tx.id).fg(Color::DarkGrey),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Purchases".green().bold(),
        format_args!("({})", rows.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the grace report, most urgent first.
fn print_grace_table(rows: &[AnalyzedTransaction], as_of: NaiveDate) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if rows.is_empty() {
        writeln!(out, "{}", "No purchases yet.".dimmed())?;
        return Ok(());
    }

    let mut sorted: Vec<&AnalyzedTransaction> = rows.iter().collect();
    sorted.sort_by_key(|row| row.analysis.days_left);

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Card").fg(Color::Cyan),
        Cell::new("Purchase").fg(Color::Cyan),
        Cell::new("Amount").fg(Color::Cyan),
        Cell::new("Cycle end").fg(Color::Cyan),
        Cell::new("Due").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Grace used").fg(Color::Cyan),
        Cell::new("Interest").fg(Color::Cyan),
        Cell::new("Fine").fg(Color::Cyan),
        Cell::new("Total due").fg(Color::Cyan),
    ]);

    let mut total_owed = 0.0_f64;
    for row in sorted {
        let analysis = &row.analysis;
        let (label, color) = status_style(analysis.status);
        let purchase = row.transaction.note.as_deref().map_or_else(
            || format_purchase_date(row),
            |note| format!("{note} ({})", format_purchase_date(row)),
        );
        total_owed += analysis.total_due;
        _ = table.add_row(vec![
            Cell::new(row.card_name.as_deref().unwrap_or("\u{2014}")),
            Cell::new(purchase),
            Cell::new(format_money(row.transaction.amount)),
            Cell::new(analysis.cycle_end),
            Cell::new(analysis.due_date),
            Cell::new(format!("{label}, {}", days_left_label(analysis.days_left))).fg(color),
            Cell::new(format!("{}%", analysis.progress_percent)),
            Cell::new(format_money(analysis.interest)),
            Cell::new(format_money(analysis.fine)),
            Cell::new(format_money(analysis.total_due)).fg(color),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Grace periods".green().bold(),
        format_args!("(as of {as_of})").dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(out, "{} {}", "Total owed:".bold(), format_money(total_owed))?;
    Ok(())
}

/// Purchase date of a row, or a dash if none was recorded.
fn format_purchase_date(row: &AnalyzedTransaction) -> String {
    row.transaction
        .purchase_date
        .map_or_else(|| "\u{2014}".to_owned(), |date| date.to_string())
}

/// Prints the outcome of an import.
fn print_merge_summary(summary: &MergeSummary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Import complete!".green().bold())?;
    writeln!(out)?;

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Records").fg(Color::Cyan),
        Cell::new("Stored").fg(Color::Cyan),
        Cell::new("Restored").fg(Color::Cyan),
    ]);

    let rows: &[(&str, usize, usize)] = &[
        ("Cards", summary.cards, summary.restored_cards),
        (
            "Purchases",
            summary.transactions,
            summary.restored_transactions,
        ),
    ];
    for &(name, stored, restored) in rows {
        let restored_cell = if restored > 0 {
            Cell::new(restored).fg(Color::Green)
        } else {
            Cell::new(restored).fg(Color::DarkGrey)
        };
        _ = table.add_row(vec![Cell::new(name), Cell::new(stored), restored_cell]);
    }

    writeln!(out, "{table}")?;
    Ok(())
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // stderr itself may be gone; nothing left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use gracewise::models::CardId;
    use gracewise::storage::InMemoryStorage;

    /// Creates a ledger backed by in-memory storage.
    fn mock_ledger() -> GraceWiseBlocking<InMemoryStorage> {
        GraceWiseBlocking::builder()
            .user("tester")
            .storage(InMemoryStorage::new())
            .build()
            .unwrap()
    }

    fn card_form(name: &str) -> CardForm {
        CardForm {
            name: name.to_owned(),
            cycle_end: "2024-01-21".to_owned(),
            due: "2024-02-15".to_owned(),
            annual_rate: "36".to_owned(),
            daily_rate: String::new(),
            fine: "100".to_owned(),
        }
    }

    // ── parse_date tests ──────────────────────────────────────────────

    #[test]
    fn parse_date_valid() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn parse_date_invalid() {
        assert!(parse_date("not-a-date").is_err());
        assert!(parse_date("01-15-2024").is_err());
    }

    // ── presentation tests ────────────────────────────────────────────

    #[test]
    fn format_money_groups_thousands() {
        assert_eq!(format_money(0.0), "EGP 0.00");
        assert_eq!(format_money(12.5), "EGP 12.50");
        assert_eq!(format_money(1234.567), "EGP 1,234.57");
        assert_eq!(format_money(1_000_000.0), "EGP 1,000,000.00");
        assert_eq!(format_money(-950.0), "-EGP 950.00");
    }

    #[test]
    fn status_styles() {
        assert_eq!(status_style(StatusCategory::InGrace).0, "In grace");
        assert_eq!(status_style(StatusCategory::DueToday).0, "Due today");
        assert_eq!(status_style(StatusCategory::Overdue).0, "Overdue");
    }

    #[test]
    fn days_left_labels() {
        assert_eq!(days_left_label(0), "due today");
        assert_eq!(days_left_label(1), "1 day left");
        assert_eq!(days_left_label(12), "12 days left");
        assert_eq!(days_left_label(-1), "1 day late");
        assert_eq!(days_left_label(-20), "20 days late");
    }

    // ── argument parsing tests ────────────────────────────────────────

    #[test]
    fn cli_parses_grace_with_as_of() {
        let cli = Cli::try_parse_from([
            "gracewise",
            "--user",
            "ana",
            "grace",
            "--as-of",
            "2024-02-20",
        ])
        .unwrap();
        assert_eq!(cli.user, "ana");
        assert!(matches!(
            cli.command,
            Command::Grace { as_of: Some(date) } if date == NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
        ));
    }

    #[test]
    fn cli_rejects_bad_date() {
        let result = Cli::try_parse_from(["gracewise", "grace", "--as-of", "20-02-2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn card_args_become_form() {
        let cli = Cli::try_parse_from([
            "gracewise",
            "add-card",
            "--name",
            "Visa Gold",
            "--cycle-end",
            "2024-01-21",
            "--due",
            "2024-02-15",
            "--annual-rate",
            "36",
        ])
        .unwrap();
        let Command::AddCard(args) = cli.command else {
            panic!("expected add-card");
        };
        let form = CardForm::from(args);
        assert_eq!(form.name, "Visa Gold");
        assert_eq!(form.annual_rate, "36");
        assert!(form.daily_rate.is_empty());
    }

    // ── create_storage tests ──────────────────────────────────────────

    #[test]
    fn create_storage_with_custom_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = create_storage(Some(dir.path().to_path_buf()));
        assert!(storage.is_ok());
    }

    // ── command tests ─────────────────────────────────────────────────

    #[test]
    fn add_card_then_purchase_by_name() {
        let ledger = mock_ledger();
        let code = cmd_add_card(&ledger, &card_form("Visa Gold")).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);

        let args = PurchaseArgs {
            card: "visa gold".to_owned(),
            amount: 250.0,
            date: NaiveDate::from_ymd_opt(2024, 1, 10),
            note: Some("Groceries".to_owned()),
        };
        let code = cmd_add_purchase(&ledger, args).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(ledger.transactions().unwrap().len(), 1);
    }

    #[test]
    fn add_card_with_invalid_form_fails() {
        let ledger = mock_ledger();
        let code = cmd_add_card(&ledger, &card_form("ab")).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert!(ledger.cards().unwrap().is_empty());
    }

    #[test]
    fn add_purchase_unknown_card_fails() {
        let ledger = mock_ledger();
        let args = PurchaseArgs {
            card: "Nope".to_owned(),
            amount: 10.0,
            date: None,
            note: None,
        };
        assert_eq!(cmd_add_purchase(&ledger, args).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn add_purchase_rejects_non_positive_amount() {
        let ledger = mock_ledger();
        let _code = cmd_add_card(&ledger, &card_form("Visa Gold")).unwrap();
        let args = PurchaseArgs {
            card: "Visa Gold".to_owned(),
            amount: 0.0,
            date: None,
            note: None,
        };
        assert_eq!(cmd_add_purchase(&ledger, args).unwrap(), ExitCode::FAILURE);
        assert!(ledger.transactions().unwrap().is_empty());
    }

    #[test]
    fn grace_and_listings_succeed() {
        let ledger = mock_ledger();
        let card = ledger.save_card(&card_form("Visa Gold")).unwrap();
        let _tx = ledger
            .record_purchase(card.id, 1000.0, NaiveDate::from_ymd_opt(2024, 1, 25), None)
            .unwrap();
        let _orphan = ledger
            .record_purchase(CardId::new("gone".to_owned()), 50.0, None, None)
            .unwrap();

        let as_of = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        assert_eq!(cmd_grace(&ledger, as_of).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_cards(&ledger).unwrap(), ExitCode::SUCCESS);
        assert_eq!(cmd_purchases(&ledger).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn remove_purchase_by_id() {
        let ledger = mock_ledger();
        let tx = ledger
            .record_purchase(CardId::new("c-1".to_owned()), 5.0, None, None)
            .unwrap();
        let code = cmd_remove_purchase(&ledger, tx.id.into_inner()).unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert!(ledger.transactions().unwrap().is_empty());
    }

    #[test]
    fn remove_unknown_purchase_fails_and_keeps_records() {
        let ledger = mock_ledger();
        let _tx = ledger
            .record_purchase(CardId::new("c-1".to_owned()), 5.0, None, None)
            .unwrap();
        let code = cmd_remove_purchase(&ledger, "no-such-id".to_owned()).unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(ledger.transactions().unwrap().len(), 1);
    }

    #[test]
    fn export_then_import_into_other_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let ledger = mock_ledger();
        let _card = ledger.save_card(&card_form("Visa Gold")).unwrap();
        assert_eq!(cmd_export(&ledger, &path).unwrap(), ExitCode::SUCCESS);

        let other = GraceWiseBlocking::builder()
            .user("other")
            .storage(InMemoryStorage::new())
            .build()
            .unwrap();
        assert_eq!(cmd_import(&other, &path).unwrap(), ExitCode::SUCCESS);
        assert_eq!(other.cards().unwrap().len(), 1);
    }

    #[test]
    fn import_missing_or_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = mock_ledger();
        let missing = dir.path().join("missing.json");
        assert_eq!(cmd_import(&ledger, &missing).unwrap(), ExitCode::FAILURE);

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{oops").unwrap();
        assert_eq!(cmd_import(&ledger, &corrupt).unwrap(), ExitCode::FAILURE);
    }
}
