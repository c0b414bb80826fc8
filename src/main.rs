// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufWriter};
use std::path::PathBuf;

use transfer_ledger::config::{DEFAULT_DB_PATH, DEFAULT_LOG_FILTER, ENV_DB_PATH, ENV_LOG_FILTER};
use transfer_ledger::{export, logging, AccountType, Recipient, Session, SqliteStore};

/// Track accounts and distribute transfers between them
#[derive(Debug, Parser)]
#[command(name = "transfer-ledger", version, about)]
struct Cli {
    /// SQLite file holding the ledger snapshot
    #[arg(long, global = true, env = ENV_DB_PATH, default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = ENV_LOG_FILTER, default_value = DEFAULT_LOG_FILTER)]
    log: String,

    /// Defaults to the dashboard
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Manage accounts
    #[command(subcommand)]
    Accounts(AccountsCommand),

    /// Move funds from one account to one or more recipients
    Transfer {
        /// Source account id
        #[arg(long)]
        from: String,

        /// Transfer date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Recipient line as <account-id>=<amount>; repeatable
        #[arg(long = "to", required = true)]
        recipients: Vec<Recipient>,
    },

    /// Monthly volume received per recipient account
    Report,

    /// Compare stored balances against a replay of the transfer log
    Audit,

    /// Write accounts or transfers as CSV to stdout
    Export {
        #[arg(value_enum)]
        what: ExportKind,
    },

    /// Interactive terminal dashboard
    Dashboard,
}

#[derive(Debug, Subcommand)]
enum AccountsCommand {
    /// Create an account with zero balance
    Add {
        name: String,
        #[arg(long = "type", default_value = "savings")]
        account_type: AccountType,
    },

    /// List accounts, optionally of one type
    List {
        #[arg(long = "type")]
        account_type: Option<AccountType>,
    },

    /// Rename and/or retype an account
    Update {
        id: String,
        name: String,
        #[arg(long = "type")]
        account_type: AccountType,
    },

    /// Delete an account (its transfer history is kept)
    Delete { id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExportKind {
    Accounts,
    Transfers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let store = SqliteStore::open(&cli.db)?;
    let mut session = Session::open(store);

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Accounts(cmd) => run_accounts(&mut session, cmd)?,
        Command::Transfer {
            from,
            date,
            recipients,
        } => {
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let transfer = session.apply_transfer(&from, date, recipients);
            println!(
                "✓ Transfer {} on {}: {:.2} from {}",
                transfer.id(),
                transfer.date(),
                transfer.total_amount(),
                transfer.source_account_id()
            );
        }
        Command::Report => print_report(&session),
        Command::Audit => {
            let drift = session.audit();
            if drift.is_empty() {
                println!("✓ All balances match the transfer history");
            } else {
                for d in &drift {
                    println!(
                        "✗ {} ({}): stored {:.2}, replayed {:.2}, off by {:.2}",
                        d.name,
                        d.account_id,
                        d.stored,
                        d.replayed,
                        d.difference()
                    );
                }
                session.close();
                bail!("{} account(s) out of balance", drift.len());
            }
        }
        Command::Export { what } => {
            let out = BufWriter::new(io::stdout().lock());
            match what {
                ExportKind::Accounts => export::write_accounts(out, session.ledger().accounts())?,
                ExportKind::Transfers => {
                    export::write_transfers(out, session.ledger().transfers().as_slice())?
                }
            }
        }
        Command::Dashboard => run_ui_mode(&session)?,
    }

    session.close();
    Ok(())
}

fn run_accounts(session: &mut Session<SqliteStore>, cmd: AccountsCommand) -> Result<()> {
    match cmd {
        AccountsCommand::Add { name, account_type } => {
            let account = session.add_account(name, account_type);
            println!("✓ Created {} [{}]", account.label(), account.id());
        }
        AccountsCommand::List { account_type } => {
            let accounts = session.ledger().accounts_of_type(account_type);
            println!("Accounts ({})", accounts.len());
            for account in accounts {
                let marker = if account.is_overdrawn() { "✗" } else { " " };
                println!(
                    "{} {:<38} {:<24} {:>12.2}",
                    marker,
                    account.id(),
                    account.label(),
                    account.balance()
                );
            }
        }
        AccountsCommand::Update {
            id,
            name,
            account_type,
        } => {
            if session.update_account(&id, name, account_type) {
                println!("✓ Updated {}", id);
            } else {
                println!("No account with id {}; nothing changed", id);
            }
        }
        AccountsCommand::Delete { id } => match session.delete_account(&id) {
            Some(account) => println!("✓ Deleted {}", account.label()),
            None => println!("No account with id {}; nothing changed", id),
        },
    }

    Ok(())
}

fn print_report(session: &Session<SqliteStore>) {
    let report = session.monthly_volume();
    if report.months.is_empty() {
        println!("No transfers recorded yet");
        return;
    }

    print!("{:<24}", "Account");
    for month in &report.months {
        print!(" {:>12}", month);
    }
    println!();

    for series in &report.series {
        print!("{:<24}", series.name);
        for amount in &series.data {
            print!(" {:>12.2}", amount);
        }
        println!();
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(session: &Session<SqliteStore>) -> Result<()> {
    let mut app = ui::App::new(session.ledger());
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_session: &Session<SqliteStore>) -> Result<()> {
    bail!("TUI mode not available; rebuild with `--features tui` or use the CLI subcommands")
}
