//! Ordered lot collection backing one commodity's stock.
//!
//! A [`LotLedger`] keeps lots in acquisition order, which is also FIFO
//! order. Withdrawals are planned first with [`LotLedger::select`] and only
//! then applied, so a plan that cannot be filled never touches a lot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::amount::{is_dust, round_money, round_price, round_quantity, EPSILON};
use crate::{Lot, LotDraw};

/// A planned (or applied) withdrawal across one or more lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consumption {
    /// Quantity the caller asked for.
    pub requested: Decimal,
    /// Draws in the order they are taken.
    pub draws: Vec<LotDraw>,
    /// Quantity no lot could serve.
    pub unfilled: Decimal,
}

impl Consumption {
    /// Cost basis of the draws, rounded to money precision.
    #[must_use]
    pub fn cost_basis(&self) -> Decimal {
        round_money(self.draws.iter().map(LotDraw::cost).sum())
    }

    /// Total quantity taken.
    #[must_use]
    pub fn quantity_taken(&self) -> Decimal {
        self.draws.iter().map(|d| d.quantity).sum()
    }

    /// True when the draws cover the request within [`EPSILON`].
    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.unfilled <= EPSILON
    }

    /// True when more than one lot is touched.
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.draws.len() > 1
    }
}

/// Lots of a single commodity, oldest first.
///
/// # Examples
///
/// ```
/// use metalledger_core::{Lot, LotLedger};
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let mut ledger = LotLedger::new();
/// ledger.push(Lot::new(dec!(100), dec!(10), "Acme", at));
/// ledger.push(Lot::new(dec!(50), dec!(12), "Acme", at));
///
/// let plan = ledger.select(dec!(120), None);
/// assert_eq!(plan.cost_basis(), dec!(1240));
/// ledger.apply(&plan);
/// assert_eq!(ledger.total_quantity(), dec!(30));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotLedger {
    lots: Vec<Lot>,
}

impl LotLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from existing lots, dropping exhausted ones.
    #[must_use]
    pub fn from_lots(lots: Vec<Lot>) -> Self {
        let mut ledger = Self { lots };
        ledger.prune();
        ledger
    }

    /// All lots in acquisition order.
    #[must_use]
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Lot at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Lot> {
        self.lots.get(index)
    }

    /// The most recently acquired lot.
    #[must_use]
    pub fn newest(&self) -> Option<&Lot> {
        self.lots.last()
    }

    /// Number of lots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    /// Check if no lots remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// Sum of remaining quantities.
    #[must_use]
    pub fn total_quantity(&self) -> Decimal {
        self.lots.iter().map(|l| l.quantity).sum()
    }

    /// Book value of all lots at their own unit costs.
    #[must_use]
    pub fn total_cost(&self) -> Decimal {
        round_money(self.lots.iter().map(Lot::book_value).sum())
    }

    /// Quantity-weighted average unit cost, or `None` when empty.
    #[must_use]
    pub fn weighted_average(&self) -> Option<Decimal> {
        let quantity = self.total_quantity();
        if is_dust(quantity) {
            return None;
        }
        let value: Decimal = self.lots.iter().map(Lot::book_value).sum();
        Some(round_price(value / quantity))
    }

    /// Append a lot.
    pub fn push(&mut self, lot: Lot) {
        self.lots.push(lot);
    }

    /// Plan a withdrawal of `quantity` units.
    ///
    /// The lot at `preferred` (if it exists) is drawn from first, then every
    /// other lot in FIFO order. The plan reports any quantity left unserved in
    /// [`Consumption::unfilled`]; nothing is mutated.
    #[must_use]
    pub fn select(&self, quantity: Decimal, preferred: Option<usize>) -> Consumption {
        let preferred = preferred.filter(|&i| i < self.lots.len());
        let order = preferred
            .into_iter()
            .chain((0..self.lots.len()).filter(|&i| Some(i) != preferred));

        let mut remaining = quantity;
        let mut draws = Vec::new();

        for index in order {
            if remaining <= EPSILON {
                break;
            }
            let lot = &self.lots[index];
            if is_dust(lot.quantity) {
                continue;
            }
            // Treat a near-exact remainder as the whole lot
            let taken = if remaining <= lot.quantity + EPSILON {
                remaining.min(lot.quantity)
            } else {
                lot.quantity
            };
            draws.push(LotDraw {
                lot_index: index,
                source: lot.source.clone(),
                quantity: taken,
                unit_cost: lot.unit_cost,
            });
            remaining -= taken;
        }

        Consumption {
            requested: quantity,
            draws,
            unfilled: remaining.max(Decimal::ZERO),
        }
    }

    /// Apply a plan produced by [`select`](Self::select) on this ledger, then
    /// prune exhausted lots.
    pub fn apply(&mut self, plan: &Consumption) {
        for draw in &plan.draws {
            if let Some(lot) = self.lots.get_mut(draw.lot_index) {
                lot.quantity = round_quantity(lot.quantity - draw.quantity);
            }
        }
        self.prune();
    }

    /// Remove lots whose quantity is within [`EPSILON`] of zero.
    pub fn prune(&mut self) {
        self.lots.retain(|l| !is_dust(l.quantity));
    }
}
