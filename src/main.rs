// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use expense_tracker::csv_codec::parse_amount;
use expense_tracker::filter::{parse_date, FilterMode};
use expense_tracker::logging::init_logging;
use expense_tracker::{
    format_amount, Config, EntryType, ImportReport, RecurringDraft, SqliteStore, Summary,
    Tracker, TransactionDraft, ViewState,
};

#[derive(Parser, Debug)]
#[command(name = "expense-tracker", version, about = "Personal income and expense ledger")]
struct Cli {
    /// SQLite ledger file
    #[arg(long, global = true, env = "EXPENSE_TRACKER_DB")]
    db: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "EXPENSE_TRACKER_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a dated income or expense
    Add {
        #[arg(value_enum)]
        kind: KindArg,
        category: String,
        #[arg(value_parser = parse_amount_arg, allow_negative_numbers = true)]
        amount: f64,
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record an income or expense that applies every period
    AddRecurring {
        #[arg(value_enum)]
        kind: KindArg,
        name: String,
        #[arg(value_parser = parse_amount_arg, allow_negative_numbers = true)]
        amount: f64,
    },

    /// Change a transaction; omitted fields keep their value
    Edit {
        /// Id or unambiguous id prefix
        id: String,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        amount: Option<f64>,
    },

    /// Change a recurring item; omitted fields keep their value
    EditRecurring {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long, value_parser = parse_amount_arg, allow_negative_numbers = true)]
        amount: Option<f64>,
    },

    /// Delete a transaction
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Delete a recurring item
    DeleteRecurring {
        id: String,
        #[arg(long, short)]
        yes: bool,
    },

    /// Show transactions for a period, newest first, with totals
    List(FilterArgs),

    /// Show recurring items
    Recurring,

    /// Show totals for a period
    Summary(FilterArgs),

    /// Write expense_data_<date>.csv
    Export {
        /// Target directory
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    /// Merge a previously exported CSV into the ledger
    Import { file: PathBuf },

    /// Interactive dashboard (default)
    Ui,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// all, daily, weekly, monthly, yearly
    #[arg(long, default_value = "all")]
    filter: FilterMode,

    /// Reference date for daily/weekly/monthly (default: today)
    #[arg(long)]
    date: Option<String>,

    /// Reference year for yearly (default: this year)
    #[arg(long)]
    year: Option<String>,
}

impl FilterArgs {
    fn view(&self, today: NaiveDate) -> ViewState {
        let mut view = ViewState::new();
        view.set_filter_date(self.date.clone());
        view.set_filter_year(self.year.clone());
        view.set_filter_mode(self.filter, today);
        view
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Income,
    Expense,
}

impl From<KindArg> for EntryType {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Income => EntryType::Income,
            KindArg::Expense => EntryType::Expense,
        }
    }
}

fn parse_amount_arg(raw: &str) -> Result<f64, String> {
    parse_amount(raw).ok_or_else(|| format!("`{}` is not a finite number", raw))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Ui);

    let mut config = Config::resolve(cli.db, cli.log_level);
    if matches!(command, Command::Ui) {
        config = config.with_log_beside_db();
    }
    init_logging(&config.log_level, config.log_file.as_deref())?;

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open ledger at {}", config.db_path.display()))?;
    let mut tracker = Tracker::open(store)?;
    let today = Local::now().date_naive();

    match command {
        Command::Add {
            kind,
            category,
            amount,
            date,
        } => {
            let date = match date {
                Some(date) => checked_date(&date)?,
                None => today.format("%Y-%m-%d").to_string(),
            };
            let id = tracker.add_transaction(TransactionDraft {
                date,
                entry_type: kind.into(),
                category,
                amount,
            })?;
            println!("✓ Added transaction {}", id.short());
        }

        Command::AddRecurring { kind, name, amount } => {
            let id = tracker.add_recurring(RecurringDraft {
                name,
                entry_type: kind.into(),
                amount,
            })?;
            println!("✓ Added recurring item {}", id.short());
        }

        Command::Edit {
            id,
            date,
            kind,
            category,
            amount,
        } => {
            let id = tracker.records().resolve_transaction_id(&id)?;
            let current = tracker
                .records()
                .transaction(id)
                .context("Transaction disappeared while editing")?;
            let mut draft = TransactionDraft::from(current);
            if let Some(date) = date {
                draft.date = checked_date(&date)?;
            }
            if let Some(kind) = kind {
                draft.entry_type = kind.into();
            }
            if let Some(category) = category {
                draft.category = category;
            }
            if let Some(amount) = amount {
                draft.amount = amount;
            }
            tracker.update_transaction(id, draft)?;
            println!("✓ Updated transaction {}", id.short());
        }

        Command::EditRecurring {
            id,
            name,
            kind,
            amount,
        } => {
            let id = tracker.records().resolve_recurring_id(&id)?;
            let current = tracker
                .records()
                .recurring_item(id)
                .context("Recurring item disappeared while editing")?;
            let mut draft = RecurringDraft::from(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(kind) = kind {
                draft.entry_type = kind.into();
            }
            if let Some(amount) = amount {
                draft.amount = amount;
            }
            tracker.update_recurring(id, draft)?;
            println!("✓ Updated recurring item {}", id.short());
        }

        Command::Delete { id, yes } => {
            let id = tracker.records().resolve_transaction_id(&id)?;
            if let Some(tx) = tracker.records().transaction(id) {
                let prompt = format!(
                    "Delete {} {} {} {}?",
                    tx.date,
                    tx.entry_type.label(),
                    tx.category,
                    format_amount(tx.amount)
                );
                if !yes && !confirm(&prompt)? {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            tracker.remove_transaction(id)?;
            println!("🗑️  Deleted transaction {}", id.short());
        }

        Command::DeleteRecurring { id, yes } => {
            let id = tracker.records().resolve_recurring_id(&id)?;
            if let Some(item) = tracker.records().recurring_item(id) {
                let prompt = format!(
                    "Delete recurring {} {} {}?",
                    item.name,
                    item.entry_type.label(),
                    format_amount(item.amount)
                );
                if !yes && !confirm(&prompt)? {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            tracker.remove_recurring(id)?;
            println!("🗑️  Deleted recurring item {}", id.short());
        }

        Command::List(args) => {
            let view = args.view(today);
            let snapshot = tracker.snapshot(&view, today);

            println!("📋 Transactions ({})", view.describe());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            if snapshot.rows.is_empty() {
                println!("   (none)");
            }
            for tx in &snapshot.rows {
                println!(
                    "{:<8}  {:<10}  {:<7}  {:<24}  {:>12}",
                    tx.id.short(),
                    tx.date,
                    tx.entry_type.label(),
                    tx.category,
                    format_amount(tx.amount)
                );
            }
            println!();
            print_summary(&snapshot.summary);
        }

        Command::Recurring => {
            println!("🔁 Recurring items");
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            let items = tracker.records().recurring();
            if items.is_empty() {
                println!("   (none)");
            }
            for item in items {
                println!(
                    "{:<8}  {:<24}  {:<7}  {:>12}",
                    item.id.short(),
                    item.name,
                    item.entry_type.label(),
                    format_amount(item.amount)
                );
            }
        }

        Command::Summary(args) => {
            let view = args.view(today);
            let snapshot = tracker.snapshot(&view, today);
            println!("📊 Summary ({})", view.describe());
            println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            print_summary(&snapshot.summary);
        }

        Command::Export { out } => {
            let path = tracker.export_to_dir(&out, today)?;
            println!(
                "📤 Exported {} transactions and {} recurring items to {}",
                tracker.records().transactions().len(),
                tracker.records().recurring().len(),
                path.display()
            );
        }

        Command::Import { file } => {
            let report = tracker.import_file(&file)?;
            print_import_report(&report);
        }

        Command::Ui => {
            run_ui_mode(tracker, today)?;
        }
    }

    Ok(())
}

/// Reject anything that is not a calendar date
fn checked_date(raw: &str) -> Result<String> {
    match parse_date(raw) {
        Some(date) => Ok(date.format("%Y-%m-%d").to_string()),
        None => bail!("`{}` is not a YYYY-MM-DD date", raw),
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_summary(summary: &Summary) {
    println!("💵 Income:  {:>12}", format_amount(summary.total_income));
    println!("💸 Expense: {:>12}", format_amount(summary.total_expense));
    if summary.is_deficit() {
        println!("🔻 Balance: {:>12}", format_amount(summary.balance));
    } else {
        println!("✅ Balance: {:>12}", format_amount(summary.balance));
    }
}

fn print_import_report(report: &ImportReport) {
    println!("📥 Imported {} records", report.imported_count);
    if report.collapsed > 0 {
        println!("   {} merged into existing entries", report.collapsed);
    }
    if !report.skipped.is_empty() {
        println!("⚠️  Skipped {} rows:", report.skipped.len());
        for row in &report.skipped {
            println!("   line {}: {}", row.line, row.reason);
        }
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(tracker: Tracker<SqliteStore>, today: NaiveDate) -> Result<()> {
    let mut app = ui::App::new(tracker, today);
    ui::run_ui(&mut app)?;

    println!("✅ UI closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_tracker: Tracker<SqliteStore>, _today: NaiveDate) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the subcommands: expense-tracker --help");
    std::process::exit(1);
}
