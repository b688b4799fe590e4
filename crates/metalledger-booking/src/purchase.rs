//! Purchases: stock coming in.

use chrono::NaiveDateTime;
use metalledger_core::{
    ensure_non_negative, ensure_positive, party_or_unknown, round_money, Commodity, EngineError,
    HistoryEntry, InventoryRepository, Lot, Operation, Role, TransactionKind,
};
use rust_decimal::Decimal;
use tracing::debug;

/// A purchase to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    /// Commodity bought. Created if unknown.
    pub commodity: String,
    /// Units bought.
    pub quantity: Decimal,
    /// Cost per unit.
    pub unit_cost: Decimal,
    /// Supplier. Blank means unknown.
    pub source: String,
    /// Amount paid now.
    pub paid: Decimal,
    /// Amount still owed to the supplier.
    pub due: Decimal,
    /// When the purchase happened.
    pub timestamp: NaiveDateTime,
}

impl Purchase {
    /// A fully paid-for purchase with no amounts recorded.
    #[must_use]
    pub fn new(
        commodity: &str,
        quantity: Decimal,
        unit_cost: Decimal,
        source: &str,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            commodity: commodity.to_string(),
            quantity,
            unit_cost,
            source: source.to_string(),
            paid: Decimal::ZERO,
            due: Decimal::ZERO,
            timestamp,
        }
    }

    /// Set the paid and due amounts.
    #[must_use]
    pub fn with_payment(mut self, paid: Decimal, due: Decimal) -> Self {
        self.paid = paid;
        self.due = due;
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        if self.commodity.trim().is_empty() {
            return Err(EngineError::InvalidQuantity {
                field: "commodity",
                value: self.commodity.clone(),
            });
        }
        ensure_positive("quantity", self.quantity)?;
        ensure_non_negative("unit cost", self.unit_cost)?;
        ensure_non_negative("paid amount", self.paid)?;
        ensure_non_negative("due amount", self.due)?;
        Ok(())
    }
}

/// Result of [`record_purchase`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseReceipt {
    /// True when this purchase created the commodity.
    pub created: bool,
    /// Buy price after the purchase (weighted average of all lots).
    pub buy_price: Decimal,
    /// History entry that was appended.
    pub entry: HistoryEntry,
}

/// Record a purchase.
///
/// Appends a lot (creating the commodity on first purchase), appends a
/// `purchase` history entry that realizes no profit, and books `due` against
/// the supplier as a payable.
pub fn record_purchase(
    repo: &mut InventoryRepository,
    purchase: Purchase,
) -> Result<PurchaseReceipt, EngineError> {
    purchase.validate()?;

    let name = purchase.commodity.trim();
    let source = party_or_unknown(&purchase.source);
    let lot = Lot::new(purchase.quantity, purchase.unit_cost, &source, purchase.timestamp);

    let (created, buy_price) = if repo.commodity(name).is_some() {
        let commodity = repo.commodity_mut(name)?;
        commodity.add_lot(lot)?;
        (false, commodity.default_buy_price())
    } else {
        let commodity = repo.insert_commodity(Commodity::new(name, lot)?)?;
        (true, commodity.default_buy_price())
    };

    let entry = HistoryEntry {
        timestamp: purchase.timestamp,
        operation: if created {
            Operation::NewCommodity
        } else {
            Operation::AddStock
        },
        commodity: name.to_string(),
        quantity: purchase.quantity,
        unit_price: purchase.unit_cost,
        total_price: round_money(purchase.quantity * purchase.unit_cost),
        person: source.clone(),
        paid_amount: purchase.paid,
        due_amount: purchase.due,
        cost_basis: Decimal::ZERO,
        profit: Decimal::ZERO,
        profit_percentage: Decimal::ZERO,
        kind: TransactionKind::Purchase,
    };

    repo.history_mut().append(entry.clone());
    repo.parties_mut()
        .apply_transaction(&source, Role::Supplier, purchase.due, entry.clone());

    debug!(
        commodity = name,
        quantity = %purchase.quantity,
        unit_cost = %purchase.unit_cost,
        supplier = %source,
        created,
        "recorded purchase"
    );

    Ok(PurchaseReceipt {
        created,
        buy_price,
        entry,
    })
}
