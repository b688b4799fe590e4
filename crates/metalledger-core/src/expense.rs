//! Operating expenses, independent of stock.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, EngineError};

/// Party recorded when an expense is not attributed to anyone.
pub const GENERAL_PARTY: &str = "general";

fn general() -> String {
    GENERAL_PARTY.to_string()
}

/// An incidental cost, optionally attributed to a counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// When the expense was incurred.
    #[serde(with = "crate::timestamp")]
    pub date: NaiveDateTime,
    /// What it was for.
    pub description: String,
    /// Full amount.
    pub amount: Decimal,
    /// Attributed counterparty.
    #[serde(default = "general")]
    pub person: String,
    /// Amount settled.
    #[serde(default)]
    pub paid_amount: Decimal,
    /// Amount outstanding.
    #[serde(default)]
    pub due_amount: Decimal,
}

impl Expense {
    /// Create a validated expense. A blank `person` becomes [`GENERAL_PARTY`].
    pub fn new(
        date: NaiveDateTime,
        description: &str,
        amount: Decimal,
        person: &str,
        paid_amount: Decimal,
        due_amount: Decimal,
    ) -> Result<Self, EngineError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(EngineError::InvalidQuantity {
                field: "description",
                value: String::new(),
            });
        }
        ensure_positive("amount", amount)?;
        ensure_non_negative("paid amount", paid_amount)?;
        ensure_non_negative("due amount", due_amount)?;

        let person = person.trim();
        Ok(Self {
            date,
            description: description.to_string(),
            amount,
            person: if person.is_empty() {
                general()
            } else {
                person.to_string()
            },
            paid_amount,
            due_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_defaults_person() {
        let e = Expense::new(today(), "Rent", dec!(500), "", dec!(500), Decimal::ZERO).unwrap();
        assert_eq!(e.person, GENERAL_PARTY);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let err = Expense::new(today(), "Rent", Decimal::ZERO, "", dec!(0), dec!(0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuantity { field: "amount", .. }));
        assert!(Expense::new(today(), "  ", dec!(1), "", dec!(0), dec!(0)).is_err());
    }

    #[test]
    fn test_loads_date_only() {
        let e: Expense =
            serde_json::from_str(r#"{"date": "2024-05-01", "description": "Fuel", "amount": 40}"#)
                .unwrap();
        assert_eq!(e.date, today());
        assert_eq!(e.person, GENERAL_PARTY);
        assert_eq!(e.due_amount, Decimal::ZERO);
    }
}
