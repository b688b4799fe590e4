//! `mledger history`: list entries and correct them in place.

use super::Session;
use crate::format::{heading, money, number, when, Align, Table};
use anyhow::{Context, Result};
use clap::Subcommand;
use metalledger_core::{
    parse_decimal, timestamp, Decimal, EngineError, HistoryEntry, HistoryPatch, Operation,
    TransactionKind,
};
use std::io::Write;

/// History subcommands.
#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    /// List history entries, oldest first
    List(ListArgs),
    /// Overwrite fields of one entry; nothing else is recalculated
    Edit(EditArgs),
}

/// Filters for `mledger history list`.
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only entries for this person
    #[arg(long)]
    pub person: Option<String>,

    /// Only entries for this commodity
    #[arg(long)]
    pub commodity: Option<String>,

    /// Only entries of this kind (purchase, sale, expense)
    #[arg(long, value_parser = parse_kind)]
    pub kind: Option<TransactionKind>,

    /// Show only the most recent N entries
    #[arg(long, value_name = "N")]
    pub last: Option<usize>,
}

/// Fields accepted by `mledger history edit`.
#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Entry index as shown by `history list`
    pub index: usize,

    /// New timestamp
    #[arg(long)]
    pub date: Option<String>,

    /// New operation label
    #[arg(long, value_parser = parse_operation)]
    pub operation: Option<Operation>,

    /// New commodity name
    #[arg(long)]
    pub commodity: Option<String>,

    /// New quantity
    #[arg(long, allow_hyphen_values = true)]
    pub quantity: Option<String>,

    /// New price per kg
    #[arg(long, allow_hyphen_values = true)]
    pub price: Option<String>,

    /// New total price
    #[arg(long, allow_hyphen_values = true)]
    pub total: Option<String>,

    /// New person
    #[arg(long)]
    pub person: Option<String>,

    /// New paid amount
    #[arg(long, allow_hyphen_values = true)]
    pub paid: Option<String>,

    /// New due amount
    #[arg(long, allow_hyphen_values = true)]
    pub due: Option<String>,

    /// New cost basis
    #[arg(long, allow_hyphen_values = true)]
    pub cost: Option<String>,

    /// New profit
    #[arg(long, allow_hyphen_values = true)]
    pub profit: Option<String>,

    /// New profit percentage
    #[arg(long, allow_hyphen_values = true)]
    pub percentage: Option<String>,
}

fn parse_kind(raw: &str) -> Result<TransactionKind, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown kind: {raw}"))
}

fn parse_operation(raw: &str) -> Result<Operation, String> {
    serde_json::from_value(serde_json::Value::String(raw.replace(' ', "_")))
        .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.to_string())))
        .map_err(|_| format!("unknown operation: {raw}"))
}

/// Run a history subcommand.
pub fn run<W: Write>(cmd: &HistoryCommand, session: &mut Session, out: &mut W) -> Result<()> {
    match cmd {
        HistoryCommand::List(args) => list(args, session, out),
        HistoryCommand::Edit(args) => edit(args, session, out),
    }
}

fn list<W: Write>(args: &ListArgs, session: &Session, out: &mut W) -> Result<()> {
    let repo = session.inventory();
    let matches: Vec<(usize, &HistoryEntry)> = repo
        .history()
        .entries()
        .iter()
        .enumerate()
        .filter(|(_, e)| args.person.as_deref().map_or(true, |p| e.person == p))
        .filter(|(_, e)| args.commodity.as_deref().map_or(true, |c| e.commodity == c))
        .filter(|(_, e)| args.kind.map_or(true, |k| e.kind == k))
        .collect();
    let skip = args.last.map_or(0, |n| matches.len().saturating_sub(n));

    heading(out, "History")?;
    if matches.is_empty() {
        writeln!(out, "No entries.")?;
        return Ok(());
    }
    write_entries(matches.into_iter().skip(skip), out)
}

/// Write entries with their log index.
pub(crate) fn write_entries<'a, W: Write>(
    entries: impl Iterator<Item = (usize, &'a HistoryEntry)>,
    out: &mut W,
) -> Result<()> {
    let mut table = Table::new(&[
        ("#", Align::Right),
        ("Date", Align::Left),
        ("Operation", Align::Left),
        ("Commodity", Align::Left),
        ("Qty", Align::Right),
        ("Price", Align::Right),
        ("Total", Align::Right),
        ("Person", Align::Left),
        ("Paid", Align::Right),
        ("Due", Align::Right),
        ("Profit", Align::Right),
    ]);
    for (index, entry) in entries {
        table.row(vec![
            index.to_string(),
            when(&entry.timestamp),
            entry.operation.to_string(),
            entry.commodity.clone(),
            number(entry.quantity),
            number(entry.unit_price),
            money(entry.total_price),
            entry.person.clone(),
            money(entry.paid_amount),
            money(entry.due_amount),
            money(entry.profit),
        ]);
    }
    table.write(out).context("failed to write history")
}

fn edit<W: Write>(args: &EditArgs, session: &mut Session, out: &mut W) -> Result<()> {
    let patch = patch_from(args)?;
    if patch.is_empty() {
        anyhow::bail!("nothing to change; pass at least one field such as --total");
    }
    {
        let mut repo = session.inventory();
        let entry = repo.history_mut().edit(args.index, patch)?;
        write_entries(std::iter::once((args.index, entry)), out)?;
    }
    writeln!(out, "Entry updated. Stock, balances and profit totals were not recalculated.")?;
    session.commit()
}

fn patch_from(args: &EditArgs) -> Result<HistoryPatch, EngineError> {
    let amount = |field: &'static str, raw: Option<&str>| -> Result<Option<Decimal>, EngineError> {
        raw.map(|r| parse_decimal(field, r)).transpose()
    };
    let timestamp = args
        .date
        .as_deref()
        .map(|raw| {
            timestamp::parse(raw).ok_or_else(|| EngineError::InvalidQuantity {
                field: "date",
                value: raw.to_string(),
            })
        })
        .transpose()?;
    Ok(HistoryPatch {
        timestamp,
        operation: args.operation,
        commodity: args.commodity.clone(),
        quantity: amount("quantity", args.quantity.as_deref())?,
        unit_price: amount("price", args.price.as_deref())?,
        total_price: amount("total", args.total.as_deref())?,
        person: args.person.clone(),
        paid_amount: amount("paid", args.paid.as_deref())?,
        due_amount: amount("due", args.due.as_deref())?,
        cost_basis: amount("cost", args.cost.as_deref())?,
        profit: amount("profit", args.profit.as_deref())?,
        profit_percentage: amount("percentage", args.percentage.as_deref())?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operation_forms() {
        assert_eq!(parse_operation("add stock"), Ok(Operation::AddStock));
        assert_eq!(parse_operation("new_commodity"), Ok(Operation::NewCommodity));
        assert_eq!(parse_operation("بيع / سحب كمية"), Ok(Operation::Sale));
        assert!(parse_operation("refund").is_err());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("sale"), Ok(TransactionKind::Sale));
        assert!(parse_kind("loan").is_err());
    }
}
