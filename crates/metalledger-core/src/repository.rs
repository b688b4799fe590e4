//! The inventory aggregate: everything that is persisted together.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::round_money;
use crate::error::{Entity, EngineError};
use crate::{Commodity, CounterpartyLedger, Expense, HistoryLog, ProfitBase};

/// Aggregate root owning commodities, history, counterparties and expenses.
///
/// Callers change state only through these methods or the booking
/// functions built on them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRepository {
    #[serde(default)]
    metals: Vec<Commodity>,
    #[serde(default)]
    history: HistoryLog,
    #[serde(default)]
    parties: CounterpartyLedger,
    #[serde(default)]
    expenses: Vec<Expense>,
}

impl InventoryRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a repository from loaded parts, rejecting duplicate
    /// commodity names.
    pub fn from_parts(
        metals: Vec<Commodity>,
        history: HistoryLog,
        parties: CounterpartyLedger,
        expenses: Vec<Expense>,
    ) -> Result<Self, EngineError> {
        let mut repo = Self {
            metals: Vec::with_capacity(metals.len()),
            history,
            parties,
            expenses,
        };
        for commodity in metals {
            repo.insert_commodity(commodity)?;
        }
        Ok(repo)
    }

    /// Commodities in creation order.
    #[must_use]
    pub fn commodities(&self) -> &[Commodity] {
        &self.metals
    }

    /// Commodity named `name`.
    #[must_use]
    pub fn commodity(&self, name: &str) -> Option<&Commodity> {
        self.metals.iter().find(|c| c.name() == name)
    }

    /// Commodity named `name`, or [`EngineError::NotFound`].
    pub fn require_commodity(&self, name: &str) -> Result<&Commodity, EngineError> {
        self.commodity(name)
            .ok_or_else(|| EngineError::not_found(Entity::Commodity, name))
    }

    /// Mutable commodity named `name`, or [`EngineError::NotFound`].
    pub fn commodity_mut(&mut self, name: &str) -> Result<&mut Commodity, EngineError> {
        self.metals
            .iter_mut()
            .find(|c| c.name() == name)
            .ok_or_else(|| EngineError::not_found(Entity::Commodity, name))
    }

    /// Add a new commodity.
    pub fn insert_commodity(&mut self, commodity: Commodity) -> Result<&mut Commodity, EngineError> {
        if self.commodity(commodity.name()).is_some() {
            return Err(EngineError::AlreadyExists {
                entity: Entity::Commodity,
                name: commodity.name().to_string(),
            });
        }
        self.metals.push(commodity);
        let last = self.metals.len() - 1;
        Ok(&mut self.metals[last])
    }

    /// Remove a commodity. History and counterparties are left untouched.
    pub fn remove_commodity(&mut self, name: &str) -> Result<Commodity, EngineError> {
        let index = self
            .metals
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| EngineError::not_found(Entity::Commodity, name))?;
        Ok(self.metals.remove(index))
    }

    /// Overwrite a commodity's reference prices.
    pub fn set_prices(&mut self, name: &str, buy: Decimal, sale: Decimal) -> Result<(), EngineError> {
        self.commodity_mut(name)?.set_prices(buy, sale)
    }

    /// The audit trail.
    #[must_use]
    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Mutable audit trail.
    pub fn history_mut(&mut self) -> &mut HistoryLog {
        &mut self.history
    }

    /// Counterparty balances.
    #[must_use]
    pub fn parties(&self) -> &CounterpartyLedger {
        &self.parties
    }

    /// Mutable counterparty balances.
    pub fn parties_mut(&mut self) -> &mut CounterpartyLedger {
        &mut self.parties
    }

    /// Recorded expenses.
    #[must_use]
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Append an expense record.
    pub fn push_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    /// Remove the expense at `index`. Balances and history are left as is.
    pub fn delete_expense(&mut self, index: usize) -> Result<Expense, EngineError> {
        if index >= self.expenses.len() {
            return Err(EngineError::not_found(Entity::Expense, index));
        }
        Ok(self.expenses.remove(index))
    }

    /// Sum of expense amounts.
    #[must_use]
    pub fn total_expenses(&self) -> Decimal {
        round_money(self.expenses.iter().map(|e| e.amount).sum())
    }

    /// Aggregate figures for reporting.
    #[must_use]
    pub fn summary(&self) -> InventorySummary {
        let commodities: Vec<CommoditySummary> = self
            .metals
            .iter()
            .map(|c| CommoditySummary {
                name: c.name().to_string(),
                quantity: c.total_quantity(),
                buy_price: c.default_buy_price(),
                sale_price: c.default_sale_price(),
                stock_value: c.stock_value(),
                lot_count: c.lots().len(),
                profit_total: c.profit_total(),
            })
            .collect();

        let stock_value = round_money(commodities.iter().map(|c| c.stock_value).sum());
        let realized_profit = round_money(commodities.iter().map(|c| c.profit_total).sum());
        let total_expenses = self.total_expenses();
        let sales_revenue = round_money(self.history.sales_revenue());
        let net_profit = realized_profit - total_expenses;

        InventorySummary {
            commodities,
            stock_value,
            realized_profit,
            total_expenses,
            sales_revenue,
            net_profit,
            net_percentage: ProfitBase::Revenue.percentage(net_profit, Decimal::ZERO, sales_revenue),
            receivable: self.parties.total_receivable(),
            payable: self.parties.total_payable(),
        }
    }
}

/// Per-commodity line of an [`InventorySummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommoditySummary {
    /// Commodity name.
    pub name: String,
    /// Units held.
    pub quantity: Decimal,
    /// Reference buy price.
    pub buy_price: Decimal,
    /// Reference sale price.
    pub sale_price: Decimal,
    /// `quantity * buy_price`.
    pub stock_value: Decimal,
    /// Number of lots.
    pub lot_count: usize,
    /// Realized profit.
    pub profit_total: Decimal,
}

/// Totals across the whole inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    /// One line per commodity.
    pub commodities: Vec<CommoditySummary>,
    /// Stock value at reference buy prices.
    pub stock_value: Decimal,
    /// Sum of realized profit.
    pub realized_profit: Decimal,
    /// Sum of expenses.
    pub total_expenses: Decimal,
    /// Sum of sale revenue in the history.
    pub sales_revenue: Decimal,
    /// `realized_profit - total_expenses`.
    pub net_profit: Decimal,
    /// Net profit over sales revenue, in percent.
    pub net_percentage: Decimal,
    /// Sum owed to us.
    pub receivable: Decimal,
    /// Sum we owe.
    pub payable: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lot, Role};
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;

    fn date() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn commodity(name: &str, qty: Decimal, cost: Decimal) -> Commodity {
        Commodity::new(name, Lot::new(qty, cost, "Acme", date())).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut repo = InventoryRepository::new();
        repo.insert_commodity(commodity("Copper", dec!(10), dec!(5))).unwrap();
        repo.insert_commodity(commodity("Tin", dec!(1), dec!(2))).unwrap();

        let names: Vec<&str> = repo.commodities().iter().map(Commodity::name).collect();
        assert_eq!(names, vec!["Copper", "Tin"]);
        assert!(repo.require_commodity("Lead").is_err());
        assert!(repo
            .insert_commodity(commodity("Copper", dec!(1), dec!(1)))
            .is_err());
    }

    #[test]
    fn test_remove_commodity_keeps_history_and_parties() {
        let mut repo = InventoryRepository::new();
        repo.insert_commodity(commodity("Copper", dec!(10), dec!(5))).unwrap();
        repo.parties_mut().add("Acme", Role::Supplier).unwrap();
        let parties = repo.parties().clone();
        let history = repo.history().clone();

        repo.remove_commodity("Copper").unwrap();

        assert!(repo.commodities().is_empty());
        assert_eq!(repo.parties(), &parties);
        assert_eq!(repo.history(), &history);
        assert!(repo.remove_commodity("Copper").is_err());
    }

    #[test]
    fn test_from_parts_rejects_duplicates() {
        let err = InventoryRepository::from_parts(
            vec![
                commodity("Copper", dec!(1), dec!(1)),
                commodity("Copper", dec!(2), dec!(2)),
            ],
            HistoryLog::new(),
            CounterpartyLedger::new(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists { .. }));
    }

    #[test]
    fn test_expenses() {
        let mut repo = InventoryRepository::new();
        repo.push_expense(Expense::new(date(), "Rent", dec!(300), "", dec!(300), dec!(0)).unwrap());
        repo.push_expense(Expense::new(date(), "Fuel", dec!(20.5), "", dec!(0), dec!(20.5)).unwrap());
        assert_eq!(repo.total_expenses(), dec!(320.5));

        let removed = repo.delete_expense(0).unwrap();
        assert_eq!(removed.description, "Rent");
        assert!(repo.delete_expense(5).is_err());
    }

    #[test]
    fn test_summary() {
        let mut repo = InventoryRepository::new();
        repo.insert_commodity(commodity("Copper", dec!(30), dec!(12))).unwrap();
        repo.commodity_mut("Copper").unwrap().record_profit(dec!(560));
        repo.push_expense(Expense::new(date(), "Rent", dec!(60), "", dec!(60), dec!(0)).unwrap());

        let summary = repo.summary();
        assert_eq!(summary.commodities.len(), 1);
        assert_eq!(summary.stock_value, dec!(360));
        assert_eq!(summary.realized_profit, dec!(560));
        assert_eq!(summary.net_profit, dec!(500));
        // No sales recorded in history
        assert_eq!(summary.net_percentage, Decimal::ZERO);
    }
}
