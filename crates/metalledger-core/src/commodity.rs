//! A tracked commodity and its lot-level operations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{round_money, EPSILON};
use crate::error::{ensure_non_negative, ensure_positive, Entity, EngineError};
use crate::inventory::{Consumption, LotLedger};
use crate::Lot;

/// A tracked material with its lots and reference prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    name: String,
    #[serde(rename = "price_per_kg")]
    default_buy_price: Decimal,
    #[serde(rename = "sale_price_per_kg")]
    default_sale_price: Decimal,
    #[serde(default)]
    profit_total: Decimal,
    #[serde(default)]
    lots: LotLedger,
}

impl Commodity {
    /// Create a commodity from its first lot.
    ///
    /// Both reference prices start at the lot's unit cost.
    pub fn new(name: impl Into<String>, first: Lot) -> Result<Self, EngineError> {
        validate_lot(&first)?;
        let price = first.unit_cost;
        Ok(Self {
            name: name.into(),
            default_buy_price: price,
            default_sale_price: price,
            profit_total: Decimal::ZERO,
            lots: LotLedger::from_lots(vec![first]),
        })
    }

    /// Rebuild a commodity from stored parts.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        default_buy_price: Decimal,
        default_sale_price: Decimal,
        profit_total: Decimal,
        lots: LotLedger,
    ) -> Self {
        Self {
            name: name.into(),
            default_buy_price,
            default_sale_price,
            profit_total,
            lots,
        }
    }

    /// Unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference buy price per unit.
    #[must_use]
    pub fn default_buy_price(&self) -> Decimal {
        self.default_buy_price
    }

    /// Reference sale price per unit.
    #[must_use]
    pub fn default_sale_price(&self) -> Decimal {
        self.default_sale_price
    }

    /// Cumulative realized profit.
    #[must_use]
    pub fn profit_total(&self) -> Decimal {
        self.profit_total
    }

    /// The lots backing this commodity.
    #[must_use]
    pub fn lots(&self) -> &LotLedger {
        &self.lots
    }

    /// Units currently held.
    #[must_use]
    pub fn total_quantity(&self) -> Decimal {
        self.lots.total_quantity()
    }

    /// Stock value at the reference buy price.
    #[must_use]
    pub fn stock_value(&self) -> Decimal {
        round_money(self.total_quantity() * self.default_buy_price)
    }

    /// Overwrite both reference prices.
    pub fn set_prices(&mut self, buy: Decimal, sale: Decimal) -> Result<(), EngineError> {
        ensure_non_negative("buy price", buy)?;
        ensure_non_negative("sale price", sale)?;
        self.default_buy_price = buy;
        self.default_sale_price = sale;
        Ok(())
    }

    /// Append a lot and recompute the buy price as the weighted average of
    /// every remaining lot.
    pub fn add_lot(&mut self, lot: Lot) -> Result<(), EngineError> {
        validate_lot(&lot)?;
        self.lots.push(lot);
        if let Some(average) = self.lots.weighted_average() {
            self.default_buy_price = average;
        }
        Ok(())
    }

    /// Plan a withdrawal without touching any lot.
    ///
    /// Fails with [`EngineError::InsufficientStock`] when the whole stock
    /// cannot cover `quantity`, and with [`EngineError::NotFound`] when
    /// `preferred` does not name an existing lot.
    pub fn plan_consumption(
        &self,
        quantity: Decimal,
        preferred: Option<usize>,
    ) -> Result<Consumption, EngineError> {
        ensure_positive("quantity", quantity)?;
        if let Some(index) = preferred {
            if self.lots.get(index).is_none() {
                return Err(EngineError::not_found(
                    Entity::Lot,
                    format!("{}#{index}", self.name),
                ));
            }
        }

        let available = self.total_quantity();
        if quantity - available > EPSILON {
            return Err(EngineError::InsufficientStock {
                commodity: self.name.clone(),
                requested: quantity,
                available,
            });
        }

        let plan = self.lots.select(quantity, preferred);
        if plan.is_filled() {
            Ok(plan)
        } else {
            Err(EngineError::InsufficientStock {
                commodity: self.name.clone(),
                requested: quantity,
                available: plan.quantity_taken(),
            })
        }
    }

    /// Apply a plan from [`plan_consumption`](Self::plan_consumption).
    ///
    /// When the withdrawal empties the commodity, both reference prices snap
    /// to the unit cost of the newest lot held before it.
    pub fn apply_consumption(&mut self, plan: &Consumption) {
        let last_cost = self.lots.newest().map(|l| l.unit_cost);
        self.lots.apply(plan);
        if self.lots.is_empty() {
            if let Some(cost) = last_cost {
                self.default_buy_price = cost;
                self.default_sale_price = cost;
            }
        }
    }

    /// Withdraw `quantity` units, returning the cost basis and the draws.
    pub fn consume(
        &mut self,
        quantity: Decimal,
        preferred: Option<usize>,
    ) -> Result<Consumption, EngineError> {
        let plan = self.plan_consumption(quantity, preferred)?;
        self.apply_consumption(&plan);
        Ok(plan)
    }

    /// Add realized profit (negative for a loss).
    pub fn record_profit(&mut self, profit: Decimal) {
        self.profit_total = round_money(self.profit_total + profit);
    }
}

fn validate_lot(lot: &Lot) -> Result<(), EngineError> {
    ensure_positive("quantity", lot.quantity)?;
    ensure_non_negative("unit cost", lot.unit_cost)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;

    fn date(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn copper() -> Commodity {
        let mut copper =
            Commodity::new("Copper", Lot::new(dec!(100), dec!(10), "Acme", date(2024, 1, 1)))
                .unwrap();
        copper
            .add_lot(Lot::new(dec!(50), dec!(12), "Acme", date(2024, 1, 2)))
            .unwrap();
        copper
    }

    #[test]
    fn test_new_sets_both_prices() {
        let tin = Commodity::new("Tin", Lot::new(dec!(5), dec!(7), "", date(2024, 1, 1))).unwrap();
        assert_eq!(tin.default_buy_price(), dec!(7));
        assert_eq!(tin.default_sale_price(), dec!(7));
        assert_eq!(tin.lots().lots()[0].source, "unknown");
    }

    #[test]
    fn test_add_lot_recomputes_buy_price_only() {
        let copper = copper();
        assert_eq!(copper.default_buy_price(), dec!(10.666667));
        assert_eq!(copper.default_sale_price(), dec!(10));
        assert_eq!(copper.total_quantity(), dec!(150));
    }

    #[test]
    fn test_add_lot_rejects_bad_input() {
        let mut copper = copper();
        let err = copper
            .add_lot(Lot::new(Decimal::ZERO, dec!(10), "Acme", date(2024, 1, 3)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity { field: "quantity", .. }));

        let err = copper
            .add_lot(Lot::new(dec!(1), dec!(-1), "Acme", date(2024, 1, 3)))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity { field: "unit cost", .. }));
        assert_eq!(copper.lots().len(), 2);
    }

    #[test]
    fn test_consume_fifo() {
        let mut copper = copper();
        let plan = copper.consume(dec!(120), None).unwrap();
        assert_eq!(plan.cost_basis(), dec!(1240));
        assert_eq!(copper.lots().len(), 1);
        assert_eq!(copper.total_quantity(), dec!(30));
    }

    #[test]
    fn test_consume_insufficient_leaves_state() {
        let mut copper = copper();
        let before = copper.clone();
        let err = copper.consume(dec!(200), None).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientStock {
                commodity: "Copper".to_string(),
                requested: dec!(200),
                available: dec!(150),
            }
        );
        assert_eq!(copper, before);
    }

    #[test]
    fn test_consume_unknown_lot() {
        let mut copper = copper();
        let err = copper.consume(dec!(1), Some(5)).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { entity: Entity::Lot, .. }));
    }

    #[test]
    fn test_consume_all_snaps_prices_to_newest_lot() {
        let mut copper = copper();
        copper.set_prices(dec!(11), dec!(16)).unwrap();
        copper.consume(dec!(150), None).unwrap();

        assert!(copper.lots().is_empty());
        assert_eq!(copper.default_buy_price(), dec!(12));
        assert_eq!(copper.default_sale_price(), dec!(12));
        assert_eq!(copper.total_quantity(), Decimal::ZERO);
    }

    #[test]
    fn test_record_profit_accumulates() {
        let mut copper = copper();
        copper.record_profit(dec!(560));
        copper.record_profit(dec!(-10.254));
        assert_eq!(copper.profit_total(), dec!(549.75));
    }

    #[test]
    fn test_set_prices_rejects_negative() {
        let mut copper = copper();
        assert!(copper.set_prices(dec!(-1), dec!(2)).is_err());
        assert_eq!(copper.default_buy_price(), dec!(10.666667));
    }
}
