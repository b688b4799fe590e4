//! Commodity maintenance and data file management.

use super::Session;
use crate::format::{money, number};
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use metalledger_core::parse_decimal;
use metalledger_loader::{export, export_json, import as import_document, Settings};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Arguments for `mledger prices`.
#[derive(clap::Args, Debug)]
pub struct PricesArgs {
    /// Commodity name
    pub commodity: String,

    /// New default buy price per kg
    #[arg(long, allow_hyphen_values = true)]
    pub buy: Option<String>,

    /// New default sale price per kg
    #[arg(long, allow_hyphen_values = true)]
    pub sell: Option<String>,
}

/// Export targets.
#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    /// The whole data document as JSON
    Json {
        /// Output file
        path: PathBuf,
    },
    /// History entries as CSV
    HistoryCsv {
        /// Output file
        path: PathBuf,
    },
    /// Party balances as CSV
    PartiesCsv {
        /// Output file
        path: PathBuf,
    },
    /// Expenses as CSV
    ExpensesCsv {
        /// Output file
        path: PathBuf,
    },
    /// Lots of one commodity as CSV
    LotsCsv {
        /// Commodity name
        commodity: String,
        /// Output file
        path: PathBuf,
    },
}

/// Settings subcommands.
#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Print every setting
    Show,
    /// Change one setting
    Set {
        /// Setting name
        #[arg(value_parser = clap::builder::PossibleValuesParser::new(Settings::KEYS))]
        key: String,
        /// New value
        value: String,
    },
}

/// Show or change the default prices of a commodity.
pub fn prices<W: Write>(args: &PricesArgs, session: &mut Session, out: &mut W) -> Result<()> {
    let changed = args.buy.is_some() || args.sell.is_some();
    let (buy, sale) = {
        let mut repo = session.inventory();
        let current = repo.require_commodity(&args.commodity)?;
        let buy = match args.buy.as_deref() {
            Some(raw) => parse_decimal("buy price", raw)?,
            None => current.default_buy_price(),
        };
        let sale = match args.sell.as_deref() {
            Some(raw) => parse_decimal("sale price", raw)?,
            None => current.default_sale_price(),
        };
        if changed {
            repo.set_prices(&args.commodity, buy, sale)?;
        }
        (buy, sale)
    };

    writeln!(
        out,
        "{}: buy {}/kg, sell {}/kg",
        args.commodity,
        number(buy),
        number(sale)
    )?;
    if changed {
        session.commit()?;
    }
    Ok(())
}

/// Delete a commodity. History and balances are left as they are.
pub fn remove<W: Write>(name: &str, session: &mut Session, out: &mut W) -> Result<()> {
    let removed = session.inventory().remove_commodity(name)?;
    writeln!(
        out,
        "Removed {} ({} kg in {} lots).",
        removed.name(),
        number(removed.total_quantity()),
        removed.lots().len()
    )?;
    session.commit()
}

/// Write the data or one of its tables to a file.
pub fn export<W: Write>(cmd: &ExportCommand, session: &mut Session, out: &mut W) -> Result<()> {
    let repo = session.inventory();
    let (path, rows) = match cmd {
        ExportCommand::Json { path } => {
            export_json(&repo, path)?;
            (path, None)
        }
        ExportCommand::HistoryCsv { path } => (path, Some(export::history_csv(&repo, path)?)),
        ExportCommand::PartiesCsv { path } => (path, Some(export::parties_csv(&repo, path)?)),
        ExportCommand::ExpensesCsv { path } => (path, Some(export::expenses_csv(&repo, path)?)),
        ExportCommand::LotsCsv { commodity, path } => {
            repo.require_commodity(commodity)?;
            (path, Some(export::lots_csv(&repo, commodity, path)?))
        }
    };
    match rows {
        Some(rows) => writeln!(out, "Wrote {rows} rows to {}.", path.display())?,
        None => writeln!(out, "Wrote {}.", path.display())?,
    }
    Ok(())
}

/// Replace all data with an imported document.
pub fn import<W: Write>(file: &Path, yes: bool, session: &mut Session, out: &mut W) -> Result<()> {
    if !yes {
        bail!(
            "importing {} replaces all current data; re-run with --yes to confirm",
            file.display()
        );
    }
    replace_from(file, "Imported", session, out)
}

/// Replace all data with the newest backup.
pub fn restore<W: Write>(yes: bool, session: &mut Session, out: &mut W) -> Result<()> {
    let backups = session.store().backups()?;
    let Some(newest) = backups.last() else {
        bail!("no backups in {}", session.store().backup_dir().display());
    };
    if !yes {
        bail!(
            "restoring {} replaces all current data; re-run with --yes to confirm",
            newest.display()
        );
    }
    replace_from(newest, "Restored", session, out)
}

fn replace_from<W: Write>(file: &Path, verb: &str, session: &mut Session, out: &mut W) -> Result<()> {
    let imported = import_document(file)?;
    let commodities = imported.commodities().len();
    let entries = imported.history().len();
    *session.inventory() = imported;
    info!(path = %file.display(), "current data replaced");
    writeln!(
        out,
        "{verb} {commodities} commodities and {entries} history entries from {}.",
        file.display()
    )?;
    session.commit()
}

/// Write a backup now, whatever the auto-backup setting says.
pub fn backup<W: Write>(session: &mut Session, out: &mut W) -> Result<()> {
    let path = {
        let repo = session.inventory();
        session.store().backup(&repo)?
    };
    let pruned = session
        .store()
        .prune_backups(session.settings().backup_retention_days)
        .context("backup written but pruning old backups failed")?;
    writeln!(out, "Backup written to {}.", path.display())?;
    if pruned > 0 {
        writeln!(out, "Removed {pruned} backups older than {} days.", session.settings().backup_retention_days)?;
    }
    Ok(())
}

/// Show or change settings.
pub fn settings<W: Write>(cmd: &SettingsCommand, session: &mut Session, out: &mut W) -> Result<()> {
    if let SettingsCommand::Set { key, value } = cmd {
        session.update_setting(key, value)?;
    }
    let settings = session.settings();
    writeln!(out, "auto_backup = {}", settings.auto_backup)?;
    writeln!(out, "backup_interval_minutes = {}", settings.backup_interval_minutes)?;
    writeln!(out, "backup_retention_days = {}", settings.backup_retention_days)?;
    writeln!(out, "profit_base = {}", settings.profit_base)?;
    writeln!(out, "dark_mode = {}", settings.dark_mode)?;
    if matches!(cmd, SettingsCommand::Show) {
        writeln!(out, "({})", session.settings_path().display())?;
    }
    Ok(())
}
