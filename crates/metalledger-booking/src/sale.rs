//! Sales: stock going out.
//!
//! A sale is planned against the commodity's lots before anything changes.
//! Without a split, the whole sale is one transaction whose cost basis is the
//! sum of every lot drawn. With a split, each lot drawn becomes its own
//! transaction carrying a proportional share of the paid and due amounts.

use chrono::NaiveDateTime;
use metalledger_core::{
    ensure_non_negative, ensure_positive, party_or_unknown, round_money, truncate_money,
    Consumption, EngineError, HistoryEntry, InventoryRepository, LotDraw, Operation, Role,
    TransactionKind, EPSILON,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::BookingOptions;

/// A sale to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    /// Commodity sold.
    pub commodity: String,
    /// Units sold.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Customer. Blank means unknown.
    pub buyer: String,
    /// Amount received now.
    pub paid: Decimal,
    /// Amount still owed by the customer.
    pub due: Decimal,
    /// Lot to draw from first.
    pub preferred_lot: Option<usize>,
    /// Allow the sale to span lots beyond the preferred one, emitting one
    /// transaction per lot.
    pub split: bool,
    /// When the sale happened.
    pub timestamp: NaiveDateTime,
}

impl SaleRequest {
    /// A FIFO sale with no amounts recorded.
    #[must_use]
    pub fn new(
        commodity: &str,
        quantity: Decimal,
        unit_price: Decimal,
        buyer: &str,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            commodity: commodity.to_string(),
            quantity,
            unit_price,
            buyer: buyer.to_string(),
            paid: Decimal::ZERO,
            due: Decimal::ZERO,
            preferred_lot: None,
            split: false,
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

    /// Draw from `index` first.
    #[must_use]
    pub fn from_lot(mut self, index: usize) -> Self {
        self.preferred_lot = Some(index);
        self
    }

    /// Confirm a multi-lot split.
    #[must_use]
    pub fn split(mut self) -> Self {
        self.split = true;
        self
    }

    fn validate(&self) -> Result<(), EngineError> {
        ensure_positive("quantity", self.quantity)?;
        ensure_positive("unit price", self.unit_price)?;
        ensure_non_negative("paid amount", self.paid)?;
        ensure_non_negative("due amount", self.due)?;
        Ok(())
    }
}

/// One recorded sale transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleTransaction {
    /// Lots drawn for this transaction.
    pub draws: Vec<LotDraw>,
    /// Units sold.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub revenue: Decimal,
    /// Cost of the units drawn.
    pub cost_basis: Decimal,
    /// `revenue - cost_basis`.
    pub profit: Decimal,
    /// Profit as a percentage, per [`BookingOptions::profit_base`].
    pub profit_percentage: Decimal,
    /// Share of the paid amount.
    pub paid: Decimal,
    /// Share of the due amount.
    pub due: Decimal,
}

/// Transactions produced by one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleOutcome {
    /// Commodity sold.
    pub commodity: String,
    /// Customer.
    pub buyer: String,
    /// One entry per transaction, in draw order.
    pub transactions: Vec<SaleTransaction>,
}

impl SaleOutcome {
    /// True when the sale produced more than one transaction.
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.transactions.len() > 1
    }

    /// Units sold across all transactions.
    #[must_use]
    pub fn quantity(&self) -> Decimal {
        self.transactions.iter().map(|t| t.quantity).sum()
    }

    /// Revenue across all transactions.
    #[must_use]
    pub fn revenue(&self) -> Decimal {
        self.transactions.iter().map(|t| t.revenue).sum()
    }

    /// Cost basis across all transactions.
    #[must_use]
    pub fn cost_basis(&self) -> Decimal {
        self.transactions.iter().map(|t| t.cost_basis).sum()
    }

    /// Profit across all transactions.
    #[must_use]
    pub fn profit(&self) -> Decimal {
        self.transactions.iter().map(|t| t.profit).sum()
    }
}

/// Work out what [`record_sale`] would do, without changing anything.
pub fn preview_sale(
    repo: &InventoryRepository,
    request: &SaleRequest,
    options: &BookingOptions,
) -> Result<SaleOutcome, EngineError> {
    plan_sale(repo, request, options).map(|(_, outcome)| outcome)
}

/// Record a sale.
///
/// Fails with [`EngineError::InsufficientStock`] when the commodity cannot
/// cover the quantity, or when the preferred lot cannot and no split was
/// requested. On success the lots are drawn, profit is added to the
/// commodity, one `sale` history entry is appended per transaction, and each
/// transaction's due amount is booked against the buyer as a receivable.
pub fn record_sale(
    repo: &mut InventoryRepository,
    request: &SaleRequest,
    options: &BookingOptions,
) -> Result<SaleOutcome, EngineError> {
    let (plan, outcome) = plan_sale(repo, request, options)?;

    let commodity = repo.commodity_mut(&outcome.commodity)?;
    commodity.apply_consumption(&plan);
    commodity.record_profit(outcome.profit());

    for txn in &outcome.transactions {
        let entry = HistoryEntry {
            timestamp: request.timestamp,
            operation: Operation::Sale,
            commodity: outcome.commodity.clone(),
            quantity: txn.quantity,
            unit_price: txn.unit_price,
            total_price: txn.revenue,
            person: outcome.buyer.clone(),
            paid_amount: txn.paid,
            due_amount: txn.due,
            cost_basis: txn.cost_basis,
            profit: txn.profit,
            profit_percentage: txn.profit_percentage,
            kind: TransactionKind::Sale,
        };
        repo.history_mut().append(entry.clone());
        repo.parties_mut()
            .apply_transaction(&outcome.buyer, Role::Customer, txn.due, entry);
    }

    debug!(
        commodity = %outcome.commodity,
        quantity = %request.quantity,
        buyer = %outcome.buyer,
        transactions = outcome.transactions.len(),
        profit = %outcome.profit(),
        "recorded sale"
    );

    Ok(outcome)
}

fn plan_sale(
    repo: &InventoryRepository,
    request: &SaleRequest,
    options: &BookingOptions,
) -> Result<(Consumption, SaleOutcome), EngineError> {
    request.validate()?;
    let commodity = repo.require_commodity(request.commodity.trim())?;

    // The whole-stock check comes first so an oversell is always reported
    // against the total.
    let available = commodity.total_quantity();
    if request.quantity - available > EPSILON {
        return Err(EngineError::InsufficientStock {
            commodity: commodity.name().to_string(),
            requested: request.quantity,
            available,
        });
    }

    if let (Some(index), false) = (request.preferred_lot, request.split) {
        if let Some(lot) = commodity.lots().get(index) {
            if request.quantity - lot.quantity > EPSILON {
                return Err(EngineError::InsufficientStock {
                    commodity: commodity.name().to_string(),
                    requested: request.quantity,
                    available: lot.quantity,
                });
            }
        }
    }

    let plan = commodity.plan_consumption(request.quantity, request.preferred_lot)?;

    let transactions = if request.split && plan.is_split() {
        split_transactions(&plan, request, options)
    } else {
        let revenue = round_money(request.quantity * request.unit_price);
        vec![transaction(
            plan.draws.clone(),
            request.quantity,
            request.unit_price,
            revenue,
            plan.cost_basis(),
            request.paid,
            request.due,
            options,
        )]
    };

    let outcome = SaleOutcome {
        commodity: commodity.name().to_string(),
        buyer: party_or_unknown(&request.buyer),
        transactions,
    };
    Ok((plan, outcome))
}

fn split_transactions(
    plan: &Consumption,
    request: &SaleRequest,
    options: &BookingOptions,
) -> Vec<SaleTransaction> {
    let mut paid_left = request.paid;
    let mut due_left = request.due;
    let last = plan.draws.len() - 1;

    plan.draws
        .iter()
        .enumerate()
        .map(|(n, draw)| {
            // Earlier legs are cut toward zero and the last leg takes the
            // remainder, so every share is non-negative and they add up exactly
            let (paid, due) = if n == last {
                (paid_left, due_left)
            } else {
                let share = draw.quantity / request.quantity;
                let paid = truncate_money(request.paid * share);
                let due = truncate_money(request.due * share);
                paid_left -= paid;
                due_left -= due;
                (paid, due)
            };
            transaction(
                vec![draw.clone()],
                draw.quantity,
                request.unit_price,
                round_money(draw.quantity * request.unit_price),
                round_money(draw.cost()),
                paid,
                due,
                options,
            )
        })
        .collect()
}

fn transaction(
    draws: Vec<LotDraw>,
    quantity: Decimal,
    unit_price: Decimal,
    revenue: Decimal,
    cost_basis: Decimal,
    paid: Decimal,
    due: Decimal,
    options: &BookingOptions,
) -> SaleTransaction {
    let profit = revenue - cost_basis;
    SaleTransaction {
        draws,
        quantity,
        unit_price,
        revenue,
        cost_basis,
        profit,
        profit_percentage: options
            .profit_base
            .percentage(profit, cost_basis, revenue),
        paid,
        due,
    }
}
