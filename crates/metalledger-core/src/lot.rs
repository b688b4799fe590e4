//! A single acquisition batch.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Source recorded when a purchase names no counterparty.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Normalise a counterparty name, substituting [`UNKNOWN_SOURCE`] for blanks.
#[must_use]
pub fn party_or_unknown(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() {
        UNKNOWN_SOURCE.to_string()
    } else {
        name.to_string()
    }
}

fn unknown_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

/// One batch of a commodity bought at a single unit cost.
///
/// Lots live inside a [`LotLedger`](crate::LotLedger); outside code refers
/// to them only by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    /// Units remaining in the batch.
    pub quantity: Decimal,
    /// Cost per unit paid for the batch.
    #[serde(rename = "price_per_kg")]
    pub unit_cost: Decimal,
    /// Counterparty the batch was bought from.
    #[serde(default = "unknown_source")]
    pub source: String,
    /// When the batch was acquired.
    #[serde(rename = "date_added", with = "crate::timestamp")]
    pub acquired_at: NaiveDateTime,
}

impl Lot {
    /// Create a lot.
    #[must_use]
    pub fn new(
        quantity: Decimal,
        unit_cost: Decimal,
        source: &str,
        acquired_at: NaiveDateTime,
    ) -> Self {
        Self {
            quantity,
            unit_cost,
            source: party_or_unknown(source),
            acquired_at,
        }
    }

    /// Book value of the remaining units.
    #[must_use]
    pub fn book_value(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}

/// Units taken from one lot while serving a withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotDraw {
    /// Index of the lot at the time the withdrawal was planned.
    pub lot_index: usize,
    /// Source of the lot.
    pub source: String,
    /// Units taken.
    pub quantity: Decimal,
    /// Unit cost of the lot.
    pub unit_cost: Decimal,
}

impl LotDraw {
    /// Cost contributed by this draw, unrounded.
    #[must_use]
    pub fn cost(&self) -> Decimal {
        self.quantity * self.unit_cost
    }
}
