//! Append-only audit trail of operations.
//!
//! Entries are written once by the booking layer. A user may later
//! overwrite fields of a single entry via [`HistoryLog::edit`]; such edits
//! are notes on the record and never re-derive lot, profit or balance state.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Entity, EngineError};

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// First purchase of a commodity.
    #[serde(alias = "إضافة معدن جديد")]
    NewCommodity,
    /// Purchase into an existing commodity.
    #[serde(alias = "إضافة كمية")]
    AddStock,
    /// Sale or withdrawal.
    #[serde(alias = "بيع / سحب كمية")]
    Sale,
    /// Operating expense.
    #[serde(alias = "مصروف")]
    Expense,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NewCommodity => "new commodity",
            Self::AddStock => "add stock",
            Self::Sale => "sale",
            Self::Expense => "expense",
        };
        f.write_str(label)
    }
}

/// Direction of the money flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Stock bought.
    Purchase,
    /// Stock sold.
    Sale,
    /// Expense paid or owed.
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Purchase => write!(f, "purchase"),
            Self::Sale => write!(f, "sale"),
            Self::Expense => write!(f, "expense"),
        }
    }
}

/// One recorded operation.
///
/// The same shape is stored in the counterparty's own transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the operation happened.
    #[serde(rename = "date", with = "crate::timestamp")]
    pub timestamp: NaiveDateTime,
    /// Operation performed.
    pub operation: Operation,
    /// Commodity name, or the description for an expense.
    #[serde(rename = "metal", default)]
    pub commodity: String,
    /// Units moved.
    #[serde(default)]
    pub quantity: Decimal,
    /// Price per unit (cost for purchases, sale price for sales).
    #[serde(rename = "price_per_kg", default)]
    pub unit_price: Decimal,
    /// `quantity * unit_price`, or the expense amount.
    #[serde(default)]
    pub total_price: Decimal,
    /// Counterparty.
    #[serde(default)]
    pub person: String,
    /// Amount settled immediately.
    #[serde(default)]
    pub paid_amount: Decimal,
    /// Amount left outstanding.
    #[serde(default)]
    pub due_amount: Decimal,
    /// Cost of the units sold. Zero for purchases.
    #[serde(default)]
    pub cost_basis: Decimal,
    /// Realised profit. Zero for purchases.
    #[serde(default)]
    pub profit: Decimal,
    /// Profit as a percentage.
    #[serde(default)]
    pub profit_percentage: Decimal,
    /// Purchase, sale or expense.
    #[serde(rename = "transaction_type")]
    pub kind: TransactionKind,
}

/// Field overwrites for [`HistoryLog::edit`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPatch {
    /// New timestamp.
    pub timestamp: Option<NaiveDateTime>,
    /// New operation.
    pub operation: Option<Operation>,
    /// New commodity name.
    pub commodity: Option<String>,
    /// New quantity.
    pub quantity: Option<Decimal>,
    /// New unit price.
    pub unit_price: Option<Decimal>,
    /// New total price.
    pub total_price: Option<Decimal>,
    /// New counterparty.
    pub person: Option<String>,
    /// New paid amount.
    pub paid_amount: Option<Decimal>,
    /// New due amount.
    pub due_amount: Option<Decimal>,
    /// New cost basis.
    pub cost_basis: Option<Decimal>,
    /// New profit.
    pub profit: Option<Decimal>,
    /// New profit percentage.
    pub profit_percentage: Option<Decimal>,
}

impl HistoryPatch {
    /// Check if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn apply_to(self, entry: &mut HistoryEntry) {
        macro_rules! overwrite {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field {
                    entry.$field = value;
                })*
            };
        }
        overwrite!(
            timestamp,
            operation,
            commodity,
            quantity,
            unit_price,
            total_price,
            person,
            paid_amount,
            due_amount,
            cost_basis,
            profit,
            profit_percentage
        );
    }
}

/// The audit trail, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// All entries.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overwrite fields of the entry at `index`.
    pub fn edit(&mut self, index: usize, patch: HistoryPatch) -> Result<&HistoryEntry, EngineError> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| EngineError::not_found(Entity::HistoryEntry, index))?;
        patch.apply_to(entry);
        Ok(entry)
    }

    /// Entries involving `person`.
    pub fn by_person<'a>(&'a self, person: &'a str) -> impl Iterator<Item = &'a HistoryEntry> {
        self.entries.iter().filter(move |e| e.person == person)
    }

    /// Entries for `commodity`.
    pub fn by_commodity<'a>(
        &'a self,
        commodity: &'a str,
    ) -> impl Iterator<Item = &'a HistoryEntry> {
        self.entries.iter().filter(move |e| e.commodity == commodity)
    }

    /// Sale entries only.
    pub fn sales(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries
            .iter()
            .filter(|e| e.kind == TransactionKind::Sale)
    }

    /// Sum of `total_price` over sales.
    #[must_use]
    pub fn sales_revenue(&self) -> Decimal {
        self.sales().map(|e| e.total_price).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sale(person: &str, quantity: Decimal) -> HistoryEntry {
        HistoryEntry {
            timestamp: date(2024, 2, 1),
            operation: Operation::Sale,
            commodity: "Copper".to_string(),
            quantity,
            unit_price: dec!(15),
            total_price: quantity * dec!(15),
            person: person.to_string(),
            paid_amount: Decimal::ZERO,
            due_amount: Decimal::ZERO,
            cost_basis: quantity * dec!(10),
            profit: quantity * dec!(5),
            profit_percentage: dec!(50),
            kind: TransactionKind::Sale,
        }
    }

    #[test]
    fn test_edit_is_raw_overwrite() {
        let mut log = HistoryLog::new();
        log.append(sale("Bob", dec!(10)));

        let patch = HistoryPatch {
            quantity: Some(dec!(12)),
            person: Some("Robert".to_string()),
            ..HistoryPatch::default()
        };
        let edited = log.edit(0, patch).unwrap();

        assert_eq!(edited.quantity, dec!(12));
        assert_eq!(edited.person, "Robert");
        // Derived figures are left as recorded
        assert_eq!(edited.total_price, dec!(150));
        assert_eq!(edited.profit, dec!(50));
    }

    #[test]
    fn test_edit_out_of_range() {
        let mut log = HistoryLog::new();
        let err = log.edit(3, HistoryPatch::default()).unwrap_err();
        assert_eq!(err.to_string(), "history entry not found: 3");
    }

    #[test]
    fn test_queries() {
        let mut log = HistoryLog::new();
        log.append(sale("Bob", dec!(10)));
        log.append(sale("Ann", dec!(2)));
        let mut purchase = sale("Acme", dec!(100));
        purchase.kind = TransactionKind::Purchase;
        purchase.operation = Operation::NewCommodity;
        log.append(purchase);

        assert_eq!(log.by_person("Bob").count(), 1);
        assert_eq!(log.by_commodity("Copper").count(), 3);
        assert_eq!(log.sales().count(), 2);
        assert_eq!(log.sales_revenue(), dec!(180));
    }

    #[test]
    fn test_legacy_labels_and_missing_fields() {
        let json = r#"{
            "date": "2024-01-05T10:15:00 AM",
            "operation": "إضافة كمية",
            "metal": "Copper",
            "quantity": 5,
            "price_per_kg": 9.5,
            "total_price": 47.5,
            "person": "Acme",
            "transaction_type": "purchase"
        }"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.operation, Operation::AddStock);
        assert_eq!(entry.kind, TransactionKind::Purchase);
        assert_eq!(entry.cost_basis, Decimal::ZERO);
        assert_eq!(entry.paid_amount, Decimal::ZERO);
        assert_eq!(entry.total_price, dec!(47.5));
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_value(sale("Bob", dec!(1))).unwrap();
        assert_eq!(json["operation"], "sale");
        assert_eq!(json["transaction_type"], "sale");
        assert_eq!(json["metal"], "Copper");
        assert_eq!(json["date"], "2024-02-01T12:00:00");
    }
}
