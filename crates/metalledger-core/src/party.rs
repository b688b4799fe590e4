//! Running balances per supplier and customer.
//!
//! # Sign convention
//!
//! A balance is seen from the business's side: positive means the party
//! owes us (receivable), negative means we owe the party (payable). Dues
//! booked in the [`Role::Customer`] role add to the balance, dues booked in
//! the [`Role::Supplier`] role subtract from it. The sign follows the role of
//! each transaction, so a party that both sells to us and buys from us nets
//! out.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::amount::round_money;
use crate::error::{Entity, EngineError};
use crate::HistoryEntry;

/// Which side of a trade a party is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// We buy from them.
    #[serde(alias = "مورد")]
    Supplier,
    /// We sell to them.
    #[serde(alias = "عميل")]
    Customer,
}

impl Role {
    /// Balance change caused by booking `due` in this role.
    #[must_use]
    pub fn signed(self, due: Decimal) -> Decimal {
        match self {
            Self::Supplier if !due.is_zero() => -due,
            Self::Supplier => Decimal::ZERO,
            Self::Customer => due,
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "supplier" => Ok(Self::Supplier),
            "customer" => Ok(Self::Customer),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Supplier => write!(f, "supplier"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

/// A supplier or customer with its running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// Role fixed at creation.
    #[serde(rename = "type")]
    pub role: Role,
    /// Signed running balance.
    #[serde(default)]
    pub balance: Decimal,
    /// Every transaction booked against this party.
    #[serde(default)]
    pub transactions: Vec<HistoryEntry>,
}

impl Counterparty {
    /// Create a party with a zero balance.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            balance: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }

    /// True when the party owes us.
    #[must_use]
    pub fn is_receivable(&self) -> bool {
        self.balance > Decimal::ZERO
    }

    /// True when we owe the party.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.balance < Decimal::ZERO
    }
}

/// All counterparties, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterpartyLedger {
    parties: BTreeMap<String, Counterparty>,
}

impl CounterpartyLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Party named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Counterparty> {
        self.parties.get(name)
    }

    /// Iterate parties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Counterparty)> {
        self.parties.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parties.len()
    }

    /// Check if there are no parties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    /// Return the party, creating it with `role` if absent. An existing
    /// party keeps its original role.
    pub fn upsert(&mut self, name: &str, role: Role) -> &mut Counterparty {
        self.parties
            .entry(name.to_string())
            .or_insert_with(|| Counterparty::new(role))
    }

    /// Create a party explicitly.
    pub fn add(&mut self, name: &str, role: Role) -> Result<&Counterparty, EngineError> {
        if self.parties.contains_key(name) {
            return Err(EngineError::AlreadyExists {
                entity: Entity::Party,
                name: name.to_string(),
            });
        }
        Ok(self.upsert(name, role))
    }

    /// Record a transaction against `name` and move its balance by `due`
    /// according to `role`.
    pub fn apply_transaction(
        &mut self,
        name: &str,
        role: Role,
        due: Decimal,
        details: HistoryEntry,
    ) -> &Counterparty {
        let party = self.upsert(name, role);
        party.transactions.push(details);
        party.balance = round_money(party.balance + role.signed(due));
        party
    }

    /// Remove a party and its transaction list.
    pub fn delete(&mut self, name: &str) -> Result<Counterparty, EngineError> {
        self.parties
            .remove(name)
            .ok_or_else(|| EngineError::not_found(Entity::Party, name))
    }

    /// Sum of positive balances.
    #[must_use]
    pub fn total_receivable(&self) -> Decimal {
        self.parties
            .values()
            .map(|p| p.balance)
            .filter(|b| *b > Decimal::ZERO)
            .sum()
    }

    /// Sum of negative balances, as a positive figure.
    #[must_use]
    pub fn total_payable(&self) -> Decimal {
        self.parties
            .values()
            .map(|p| p.balance)
            .filter(|b| *b < Decimal::ZERO)
            .map(|b| b.abs())
            .sum()
    }
}
