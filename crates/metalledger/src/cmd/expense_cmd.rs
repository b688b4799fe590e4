//! `mledger expense`: costs outside the lot ledger.

use super::{date_arg, Session};
use crate::format::{heading, money, when, Align, Table};
use anyhow::Result;
use clap::Subcommand;
use metalledger_booking::record_expense;
use metalledger_core::{parse_decimal, Decimal, Expense};
use std::io::Write;

/// Expense subcommands.
#[derive(Subcommand, Debug)]
pub enum ExpenseCommand {
    /// List expenses
    List,
    /// Record an expense
    Add(AddArgs),
    /// Delete an expense by index; its history entry and balance are kept
    Delete {
        /// Expense index as shown by `expense list`
        index: usize,
    },
}

/// Arguments for `mledger expense add`.
#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// What the money was spent on
    pub description: String,

    /// Amount spent
    #[arg(allow_hyphen_values = true)]
    pub amount: String,

    /// Who was paid
    #[arg(long)]
    pub person: Option<String>,

    /// Amount paid now (defaults to the amount less any due amount)
    #[arg(long, allow_hyphen_values = true)]
    pub paid: Option<String>,

    /// Amount still owed
    #[arg(long, allow_hyphen_values = true)]
    pub due: Option<String>,

    /// When the expense happened
    #[arg(long)]
    pub date: Option<String>,
}

/// Run an expense subcommand.
pub fn run<W: Write>(cmd: &ExpenseCommand, session: &mut Session, out: &mut W) -> Result<()> {
    match cmd {
        ExpenseCommand::List => list(session, out),
        ExpenseCommand::Add(args) => add(args, session, out),
        ExpenseCommand::Delete { index } => {
            let expense = session.inventory().delete_expense(*index)?;
            writeln!(
                out,
                "Deleted expense {index}: {} ({}).",
                expense.description,
                money(expense.amount)
            )?;
            session.commit()
        }
    }
}

fn add<W: Write>(args: &AddArgs, session: &mut Session, out: &mut W) -> Result<()> {
    let amount = parse_decimal("amount", &args.amount)?;
    let due = args
        .due
        .as_deref()
        .map(|raw| parse_decimal("due", raw))
        .transpose()?;
    let paid = match args.paid.as_deref() {
        Some(raw) => parse_decimal("paid", raw)?,
        None => (amount - due.unwrap_or_default()).max(Decimal::ZERO),
    };
    let due = due.unwrap_or_else(|| (amount - paid).max(Decimal::ZERO));

    let expense = Expense::new(
        date_arg(args.date.as_deref())?,
        &args.description,
        amount,
        args.person.as_deref().unwrap_or_default(),
        paid,
        due,
    )?;
    let entry = record_expense(&mut session.inventory(), expense)?;
    writeln!(
        out,
        "Recorded expense {} of {} for {} (paid {}, due {}).",
        entry.commodity,
        money(entry.total_price),
        entry.person,
        money(entry.paid_amount),
        money(entry.due_amount),
    )?;
    session.commit()
}

fn list<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let repo = session.inventory();
    heading(out, "Expenses")?;
    if repo.expenses().is_empty() {
        writeln!(out, "No expenses.")?;
        return Ok(());
    }

    let mut table = Table::new(&[
        ("#", Align::Right),
        ("Date", Align::Left),
        ("Description", Align::Left),
        ("Person", Align::Left),
        ("Amount", Align::Right),
        ("Paid", Align::Right),
        ("Due", Align::Right),
    ]);
    for (index, expense) in repo.expenses().iter().enumerate() {
        table.row(vec![
            index.to_string(),
            when(&expense.date),
            expense.description.clone(),
            expense.person.clone(),
            money(expense.amount),
            money(expense.paid_amount),
            money(expense.due_amount),
        ]);
    }
    table.write(out)?;
    writeln!(out)?;
    writeln!(out, "Total: {}", money(repo.total_expenses()))?;
    Ok(())
}
