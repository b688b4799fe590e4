//! Command implementations for the `mledger` binary.
//!
//! Every subcommand runs against a [`Session`], which owns the loaded
//! inventory, the store it came from and the settings document. The
//! interactive shell reuses the same [`Command`] parser and [`execute`].

pub mod completions;
pub mod data_cmd;
pub mod expense_cmd;
pub mod history_cmd;
pub mod party_cmd;
pub mod report_cmd;
pub mod shell;
pub mod trade;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDateTime, Timelike};
use clap::{Parser, Subcommand};
use metalledger_booking::BookingOptions;
use metalledger_core::{timestamp, InventoryRepository};
use metalledger_loader::{LoadError, Settings, SharedInventory, Store};
use parking_lot::{Mutex, MutexGuard};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Track metal stock by purchase lot, book sales, keep party balances.
#[derive(Parser, Debug)]
#[command(name = "mledger")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Options shared by every subcommand
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Inventory data file
    #[arg(long, global = true, value_name = "FILE", default_value = "data.json")]
    pub data: PathBuf,

    /// Settings file
    #[arg(long, global = true, value_name = "FILE", default_value = "settings.json")]
    pub settings: PathBuf,

    /// Directory for timestamped backups
    #[arg(long, global = true, value_name = "DIR", default_value = "backups")]
    pub backup_dir: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a purchase as a new lot
    Buy(trade::BuyArgs),
    /// Sell stock, oldest lots first unless a lot is chosen
    Sell(trade::SellArgs),
    /// Show stock on hand per commodity
    Stock,
    /// Show the lots of one commodity
    Lots {
        /// Commodity name
        commodity: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or set default buy and sale prices
    Prices(data_cmd::PricesArgs),
    /// Delete a commodity and all its lots
    Remove {
        /// Commodity name
        commodity: String,
    },
    /// List or correct history entries
    #[command(subcommand)]
    History(history_cmd::HistoryCommand),
    /// Manage suppliers and customers
    #[command(subcommand)]
    Party(party_cmd::PartyCommand),
    /// Manage expenses
    #[command(subcommand)]
    Expense(expense_cmd::ExpenseCommand),
    /// Show stock value, profit and balances
    Summary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write data to JSON or CSV files
    #[command(subcommand)]
    Export(data_cmd::ExportCommand),
    /// Replace all data with the contents of a JSON document
    Import {
        /// Document to import
        file: PathBuf,
        /// Confirm that current data will be replaced
        #[arg(long)]
        yes: bool,
    },
    /// Write a timestamped backup now
    Backup,
    /// Replace all data with the newest backup
    Restore {
        /// Confirm that current data will be replaced
        #[arg(long)]
        yes: bool,
    },
    /// Show or change settings
    #[command(subcommand)]
    Settings(data_cmd::SettingsCommand),
    /// Start an interactive session
    Shell,
    /// Print shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}

/// The loaded inventory together with where it lives.
pub struct Session {
    store: Store,
    settings_path: PathBuf,
    settings: Settings,
    inventory: SharedInventory,
}

impl Session {
    /// Load settings and data for the given options.
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let settings = Settings::load(&global.settings)
            .with_context(|| format!("failed to load settings {}", global.settings.display()))?;
        let store = Store::new(&global.data, &global.backup_dir);
        let repo = store
            .load()
            .with_context(|| format!("failed to load {}", global.data.display()))?;
        if !global.data.exists() {
            if let Some(newest) = store.backups().ok().and_then(|b| b.last().cloned()) {
                warn!(
                    backup = %newest.display(),
                    "data file missing; `restore --yes` loads the newest backup"
                );
            }
        }
        debug!(commodities = repo.commodities().len(), "session opened");
        Ok(Self {
            store,
            settings_path: global.settings.clone(),
            settings,
            inventory: Arc::new(Mutex::new(repo)),
        })
    }

    /// The store backing this session.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Path of the settings document.
    #[must_use]
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Change one setting and write the settings document.
    pub fn update_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.settings.set(key, value)?;
        self.settings
            .save(&self.settings_path)
            .context("setting changed for this session but not saved")
    }

    /// A handle to the inventory for background workers.
    #[must_use]
    pub fn shared(&self) -> SharedInventory {
        Arc::clone(&self.inventory)
    }

    /// Lock the inventory.
    pub fn inventory(&self) -> MutexGuard<'_, InventoryRepository> {
        self.inventory.lock()
    }

    /// Engine options taken from the settings.
    #[must_use]
    pub fn options(&self) -> BookingOptions {
        BookingOptions::with_profit_base(self.settings.profit_base)
    }

    /// Persist after a mutation: save, then back up when enabled.
    ///
    /// A failure here leaves the in-memory change in place.
    pub fn commit(&self) -> Result<()> {
        let repo = self.inventory.lock();
        self.store
            .save(&repo)
            .context("change applied but not saved")?;
        if self.settings.auto_backup {
            let path = self
                .store
                .backup(&repo)
                .context("change saved but backup failed")?;
            debug!(path = %path.display(), "backup written");
            self.store
                .prune_backups(self.settings.backup_retention_days)
                .context("change saved but pruning old backups failed")?;
        }
        Ok(())
    }
}

/// Main entry point for `mledger`.
pub fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.global.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug,rustyline=info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Persistence failures exit with 2, rejected operations with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(load) = cause.downcast_ref::<LoadError>() {
            return match load {
                LoadError::InvalidSetting { .. } => 1,
                _ => 2,
            };
        }
        if cause.downcast_ref::<io::Error>().is_some() {
            return 2;
        }
    }
    1
}

fn run(args: &Args) -> Result<()> {
    if let Command::Completions { shell } = &args.command {
        completions::generate_completions::<Args>(*shell, "mledger");
        return Ok(());
    }

    let mut session = Session::open(&args.global)?;
    if matches!(args.command, Command::Shell) {
        return shell::run(&mut session);
    }
    let mut stdout = io::stdout().lock();
    execute(&args.command, &mut session, &mut stdout)
}

/// Run one subcommand against an open session.
pub fn execute<W: Write>(command: &Command, session: &mut Session, out: &mut W) -> Result<()> {
    match command {
        Command::Buy(args) => trade::buy(args, session, out),
        Command::Sell(args) => trade::sell(args, session, out),
        Command::Stock => report_cmd::stock(&session.inventory(), out),
        Command::Lots { commodity, json } => {
            report_cmd::lots(&session.inventory(), commodity, *json, out)
        }
        Command::Prices(args) => data_cmd::prices(args, session, out),
        Command::Remove { commodity } => data_cmd::remove(commodity, session, out),
        Command::History(cmd) => history_cmd::run(cmd, session, out),
        Command::Party(cmd) => party_cmd::run(cmd, session, out),
        Command::Expense(cmd) => expense_cmd::run(cmd, session, out),
        Command::Summary { json } => report_cmd::summary(&session.inventory(), *json, out),
        Command::Export(cmd) => data_cmd::export(cmd, session, out),
        Command::Import { file, yes } => data_cmd::import(file, *yes, session, out),
        Command::Backup => data_cmd::backup(session, out),
        Command::Restore { yes } => data_cmd::restore(*yes, session, out),
        Command::Settings(cmd) => data_cmd::settings(cmd, session, out),
        Command::Shell | Command::Completions { .. } => {
            bail!("this command is only available from the command line")
        }
    }
}

/// The current local time, to the second.
pub(crate) fn now() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Parse an optional `--date` value, defaulting to now.
pub(crate) fn date_arg(value: Option<&str>) -> Result<NaiveDateTime> {
    match value {
        None => Ok(now()),
        Some(raw) => match timestamp::parse(raw) {
            Some(at) => Ok(at),
            None => bail!("invalid date: {raw} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_are_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["mledger", "stock", "--data", "inv.json", "-v"]).unwrap();
        assert_eq!(args.global.data, PathBuf::from("inv.json"));
        assert!(args.global.verbose);
        assert!(matches!(args.command, Command::Stock));
    }

    #[test]
    fn test_exit_code_for_engine_error() {
        let err = anyhow::Error::new(metalledger_core::EngineError::InvalidQuantity {
            field: "quantity",
            value: "0".to_string(),
        });
        assert_eq!(exit_code(&err), 1);
    }

    #[test]
    fn test_exit_code_for_io_error() {
        let err = anyhow::Error::new(io::Error::other("disk full")).context("failed to save");
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_date_arg() {
        let at = date_arg(Some("2024-05-01")).unwrap();
        assert_eq!(timestamp::format(&at), "2024-05-01T00:00:00");
        assert!(date_arg(Some("yesterday")).is_err());
    }
}
