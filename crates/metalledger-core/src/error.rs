//! Errors raised by engine operations.

use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Kind of record an operation looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// A tracked commodity.
    Commodity,
    /// A supplier or customer.
    Party,
    /// A lot, addressed by index within its commodity.
    Lot,
    /// A history entry, addressed by index.
    HistoryEntry,
    /// An expense, addressed by index.
    Expense,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Commodity => "commodity",
            Self::Party => "party",
            Self::Lot => "lot",
            Self::HistoryEntry => "history entry",
            Self::Expense => "expense",
        };
        f.write_str(name)
    }
}

/// Error returned when an engine operation is rejected.
///
/// A rejected operation leaves the inventory untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A numeric input was out of range or could not be parsed.
    #[error("invalid {field}: {value}")]
    InvalidQuantity {
        /// Name of the offending input.
        field: &'static str,
        /// The value as supplied.
        value: String,
    },

    /// The requested quantity exceeds the stock that can serve it.
    #[error("insufficient stock of {commodity}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Commodity being withdrawn.
        commodity: String,
        /// Quantity requested.
        requested: Decimal,
        /// Quantity available to the request.
        available: Decimal,
    },

    /// No record with that name or index exists.
    #[error("{entity} not found: {name}")]
    NotFound {
        /// Kind of record.
        entity: Entity,
        /// Name or index that was looked up.
        name: String,
    },

    /// A record with that name already exists.
    #[error("{entity} already exists: {name}")]
    AlreadyExists {
        /// Kind of record.
        entity: Entity,
        /// Conflicting name.
        name: String,
    },
}

impl EngineError {
    /// Shorthand for an out-of-range numeric input.
    pub(crate) fn invalid(field: &'static str, value: impl fmt::Display) -> Self {
        Self::InvalidQuantity {
            field,
            value: value.to_string(),
        }
    }

    /// Shorthand for a failed lookup.
    pub(crate) fn not_found(entity: Entity, name: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            name: name.to_string(),
        }
    }
}

/// Require `value > 0`.
pub fn ensure_positive(field: &'static str, value: Decimal) -> Result<Decimal, EngineError> {
    if value > Decimal::ZERO {
        Ok(value)
    } else {
        Err(EngineError::invalid(field, value))
    }
}

/// Require `value >= 0`.
pub fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<Decimal, EngineError> {
    if value >= Decimal::ZERO {
        Ok(value)
    } else {
        Err(EngineError::invalid(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display() {
        let err = EngineError::InsufficientStock {
            commodity: "Copper".to_string(),
            requested: dec!(200),
            available: dec!(30),
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock of Copper: requested 200, available 30"
        );

        let err = EngineError::not_found(Entity::HistoryEntry, 7);
        assert_eq!(err.to_string(), "history entry not found: 7");
    }

    #[test]
    fn test_guards() {
        assert!(ensure_positive("quantity", dec!(0.1)).is_ok());
        assert!(ensure_positive("quantity", Decimal::ZERO).is_err());
        assert!(ensure_non_negative("paid", Decimal::ZERO).is_ok());
        assert_eq!(
            ensure_non_negative("paid", dec!(-1)),
            Err(EngineError::InvalidQuantity {
                field: "paid",
                value: "-1".to_string()
            })
        );
    }
}
