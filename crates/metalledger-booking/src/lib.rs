//! Transaction processing for metalledger.
//!
//! This crate turns a user's intent into changes on an
//! [`InventoryRepository`](metalledger_core::InventoryRepository):
//! - Purchases append a lot and book a payable against the supplier
//! - Sales draw lots (preferred lot first, then FIFO), compute cost basis and
//!   profit, and book a receivable against the buyer
//! - Expenses are recorded and booked against the attributed party
//!
//! Every operation validates and plans before it mutates, so a rejected
//! operation leaves the repository exactly as it was.
//!
//! # Example
//!
//! ```
//! use metalledger_booking::{record_purchase, record_sale, BookingOptions, Purchase, SaleRequest};
//! use metalledger_core::InventoryRepository;
//! use rust_decimal_macros::dec;
//! use chrono::NaiveDate;
//!
//! let at = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let mut repo = InventoryRepository::new();
//!
//! record_purchase(&mut repo, Purchase::new("Copper", dec!(100), dec!(10), "Acme", at)).unwrap();
//! record_purchase(&mut repo, Purchase::new("Copper", dec!(50), dec!(12), "Acme", at)).unwrap();
//!
//! let sale = SaleRequest::new("Copper", dec!(120), dec!(15), "Bob", at);
//! let outcome = record_sale(&mut repo, &sale, &BookingOptions::default()).unwrap();
//!
//! assert_eq!(outcome.cost_basis(), dec!(1240));
//! assert_eq!(outcome.profit(), dec!(560));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod expense;
mod purchase;
mod sale;

pub use expense::record_expense;
pub use purchase::{record_purchase, Purchase, PurchaseReceipt};
pub use sale::{preview_sale, record_sale, SaleOutcome, SaleRequest, SaleTransaction};

use metalledger_core::ProfitBase;
use serde::{Deserialize, Serialize};

/// Options that change how figures are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingOptions {
    /// Denominator for profit percentages.
    pub profit_base: ProfitBase,
}

impl BookingOptions {
    /// Options with the given profit base.
    #[must_use]
    pub const fn with_profit_base(profit_base: ProfitBase) -> Self {
        Self { profit_base }
    }
}
