//! `mledger party`: suppliers, customers and their balances.

use super::history_cmd::write_entries;
use super::Session;
use crate::format::{heading, money, Align, Table};
use anyhow::Result;
use clap::Subcommand;
use metalledger_core::{Counterparty, Entity, EngineError, Role};
use std::io::Write;

/// Party subcommands.
#[derive(Subcommand, Debug)]
pub enum PartyCommand {
    /// List parties with their balances
    List,
    /// Show one party and its transactions
    Show {
        /// Party name
        name: String,
    },
    /// Register a party before its first transaction
    Add {
        /// Party name
        name: String,
        /// supplier or customer
        #[arg(long, default_value = "customer")]
        role: Role,
    },
    /// Delete a party; history entries are kept
    Delete {
        /// Party name
        name: String,
    },
}

/// Run a party subcommand.
pub fn run<W: Write>(cmd: &PartyCommand, session: &mut Session, out: &mut W) -> Result<()> {
    match cmd {
        PartyCommand::List => list(session, out),
        PartyCommand::Show { name } => show(session, name, out),
        PartyCommand::Add { name, role } => {
            {
                let mut repo = session.inventory();
                let party = repo.parties_mut().add(name, *role)?;
                writeln!(out, "Added {} {name}.", party.role)?;
            }
            session.commit()
        }
        PartyCommand::Delete { name } => {
            let party = session.inventory().parties_mut().delete(name)?;
            writeln!(
                out,
                "Deleted {} {name} with balance {}.",
                party.role,
                money(party.balance)
            )?;
            session.commit()
        }
    }
}

fn standing(party: &Counterparty) -> &'static str {
    if party.is_receivable() {
        "owes us"
    } else if party.is_payable() {
        "we owe"
    } else {
        "settled"
    }
}

fn list<W: Write>(session: &Session, out: &mut W) -> Result<()> {
    let repo = session.inventory();
    let parties = repo.parties();
    heading(out, "Parties")?;
    if parties.is_empty() {
        writeln!(out, "No parties yet.")?;
        return Ok(());
    }

    let mut table = Table::new(&[
        ("Name", Align::Left),
        ("Role", Align::Left),
        ("Balance", Align::Right),
        ("Standing", Align::Left),
        ("Entries", Align::Right),
    ]);
    for (name, party) in parties.iter() {
        table.row(vec![
            name.to_string(),
            party.role.to_string(),
            money(party.balance),
            standing(party).to_string(),
            party.transactions.len().to_string(),
        ]);
    }
    table.write(out)?;
    writeln!(out)?;
    writeln!(out, "Receivable: {}", money(parties.total_receivable()))?;
    writeln!(out, "Payable:    {}", money(parties.total_payable()))?;
    Ok(())
}

fn show<W: Write>(session: &Session, name: &str, out: &mut W) -> Result<()> {
    let repo = session.inventory();
    let party = repo
        .parties()
        .get(name)
        .ok_or_else(|| EngineError::NotFound {
            entity: Entity::Party,
            name: name.to_string(),
        })?;

    heading(out, &format!("{name} ({})", party.role))?;
    writeln!(out, "Balance: {} ({})", money(party.balance), standing(party))?;
    writeln!(out)?;
    if party.transactions.is_empty() {
        writeln!(out, "No transactions.")?;
        return Ok(());
    }
    write_entries(party.transactions.iter().enumerate(), out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_standing() {
        let mut party = Counterparty::new(Role::Customer);
        assert_eq!(standing(&party), "settled");
        party.balance = dec!(35.5);
        assert_eq!(standing(&party), "owes us");
        party.balance = dec!(-10);
        assert_eq!(standing(&party), "we owe");
    }
}
