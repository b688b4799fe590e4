//! Core types for metalledger
//!
//! This crate provides the fundamental types used throughout the metalledger project:
//!
//! - [`Lot`] - One acquisition batch at a single unit cost
//! - [`LotLedger`] - Ordered lots of one commodity with FIFO/preferred selection
//! - [`Commodity`] - A tracked material with reference prices and realized profit
//! - [`CounterpartyLedger`] - Running balances for suppliers and customers
//! - [`HistoryLog`] - The audit trail of every operation
//! - [`InventoryRepository`] - The aggregate that is loaded and saved as a whole
//!
//! # Example
//!
//! ```
//! use metalledger_core::{Commodity, Lot};
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let at = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
//!
//! // First purchase creates the commodity
//! let mut copper = Commodity::new("Copper", Lot::new(dec!(100), dec!(10), "Acme", at)).unwrap();
//!
//! // A second lot moves the buy price to the weighted average
//! copper.add_lot(Lot::new(dec!(50), dec!(12), "Acme", at)).unwrap();
//! assert_eq!(copper.default_buy_price(), dec!(10.666667));
//!
//! // Selling 120 drains the oldest lot first
//! let used = copper.consume(dec!(120), None).unwrap();
//! assert_eq!(used.cost_basis(), dec!(1240)); // 100 * 10 + 20 * 12
//! assert_eq!(copper.total_quantity(), dec!(30));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod amount;
pub mod commodity;
pub mod error;
pub mod expense;
pub mod history;
pub mod inventory;
pub mod lot;
pub mod party;
pub mod repository;
pub mod timestamp;

pub use amount::{
    approx_eq, is_dust, parse_decimal, round_money, round_price, round_quantity, truncate_money,
    ProfitBase, EPSILON,
};
pub use commodity::Commodity;
pub use error::{ensure_non_negative, ensure_positive, Entity, EngineError};
pub use expense::{Expense, GENERAL_PARTY};
pub use history::{HistoryEntry, HistoryLog, HistoryPatch, Operation, TransactionKind};
pub use inventory::{Consumption, LotLedger};
pub use lot::{party_or_unknown, Lot, LotDraw, UNKNOWN_SOURCE};
pub use party::{Counterparty, CounterpartyLedger, Role};
pub use repository::{CommoditySummary, InventoryRepository, InventorySummary};

// Re-export commonly used external types
pub use chrono::{NaiveDate, NaiveDateTime};
pub use rust_decimal::Decimal;
