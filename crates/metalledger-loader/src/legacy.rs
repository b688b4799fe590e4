//! One-time upgrade of older data layouts.
//!
//! Documents written by earlier versions may lack whole top-level keys,
//! keep a metal's stock as flat `quantity`/`price_per_kg`/`source` fields
//! instead of lots, or store lots as `{quantity, total_paid, date}`. The raw
//! shapes here accept all of those and [`upgrade`] turns them into the typed
//! aggregate.

use chrono::NaiveDateTime;
use metalledger_core::{
    is_dust, round_price, timestamp, Commodity, CounterpartyLedger, EngineError, Expense,
    HistoryLog, InventoryRepository, Lot, LotLedger, UNKNOWN_SOURCE,
};
use rust_decimal::Decimal;
use serde::Deserialize;

/// What [`upgrade`] had to fill in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    /// Top-level keys that were absent and defaulted to empty.
    pub missing_keys: Vec<&'static str>,
    /// Metals whose lots were synthesised from flat fields.
    pub synthesized_lots: usize,
    /// Lots whose unit cost was derived from `total_paid`.
    pub derived_unit_costs: usize,
    /// Metals missing `sale_price_per_kg` or `profit_total`.
    pub defaulted_fields: usize,
}

impl UpgradeReport {
    /// True when the document was already in the current layout.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug)]
pub(crate) enum UpgradeError {
    Json(serde_json::Error),
    Engine(EngineError),
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    metals: Option<Vec<RawMetal>>,
    history: Option<HistoryLog>,
    parties: Option<CounterpartyLedger>,
    expenses: Option<Vec<Expense>>,
}

#[derive(Debug, Deserialize)]
struct RawMetal {
    name: String,
    quantity: Option<Decimal>,
    price_per_kg: Option<Decimal>,
    sale_price_per_kg: Option<Decimal>,
    profit_total: Option<Decimal>,
    source: Option<String>,
    last_updated: Option<String>,
    lots: Option<Vec<RawLot>>,
}

#[derive(Debug, Deserialize)]
struct RawLot {
    quantity: Decimal,
    price_per_kg: Option<Decimal>,
    total_paid: Option<Decimal>,
    source: Option<String>,
    date_added: Option<String>,
    date: Option<String>,
}

/// Convert a parsed document into a repository. `now` stamps lots that
/// carry no date.
pub(crate) fn upgrade(
    value: serde_json::Value,
    now: NaiveDateTime,
) -> Result<(InventoryRepository, UpgradeReport), UpgradeError> {
    let raw: RawDocument = serde_json::from_value(value).map_err(UpgradeError::Json)?;
    let mut report = UpgradeReport::default();

    let metals = match raw.metals {
        Some(metals) => metals,
        None => {
            report.missing_keys.push("metals");
            Vec::new()
        }
    };
    let history = raw.history.unwrap_or_else(|| {
        report.missing_keys.push("history");
        HistoryLog::new()
    });
    let parties = raw.parties.unwrap_or_else(|| {
        report.missing_keys.push("parties");
        CounterpartyLedger::new()
    });
    let expenses = raw.expenses.unwrap_or_else(|| {
        report.missing_keys.push("expenses");
        Vec::new()
    });

    let metals = metals
        .into_iter()
        .map(|m| upgrade_metal(m, now, &mut report))
        .collect();

    let repo = InventoryRepository::from_parts(metals, history, parties, expenses)
        .map_err(UpgradeError::Engine)?;
    Ok((repo, report))
}

fn upgrade_metal(raw: RawMetal, now: NaiveDateTime, report: &mut UpgradeReport) -> Commodity {
    let lots = if let Some(lots) = raw.lots {
        lots.into_iter()
            .map(|lot| upgrade_lot(lot, raw.price_per_kg, now, report))
            .collect()
    } else {
        report.synthesized_lots += 1;
        let quantity = raw.quantity.unwrap_or_default();
        if is_dust(quantity) {
            Vec::new()
        } else {
            let acquired_at = raw
                .last_updated
                .as_deref()
                .and_then(timestamp::parse)
                .unwrap_or(now);
            vec![Lot::new(
                quantity,
                raw.price_per_kg.unwrap_or_default(),
                raw.source.as_deref().unwrap_or(UNKNOWN_SOURCE),
                acquired_at,
            )]
        }
    };
    let lots = LotLedger::from_lots(lots);

    if raw.sale_price_per_kg.is_none() || raw.profit_total.is_none() {
        report.defaulted_fields += 1;
    }
    let buy_price = raw
        .price_per_kg
        .or_else(|| lots.weighted_average())
        .unwrap_or_default();
    let sale_price = raw.sale_price_per_kg.unwrap_or(buy_price);

    Commodity::from_parts(
        raw.name,
        buy_price,
        sale_price,
        raw.profit_total.unwrap_or_default(),
        lots,
    )
}

fn upgrade_lot(
    raw: RawLot,
    metal_price: Option<Decimal>,
    now: NaiveDateTime,
    report: &mut UpgradeReport,
) -> Lot {
    let unit_cost = match (raw.price_per_kg, raw.total_paid) {
        (Some(price), _) => price,
        (None, Some(total)) if !is_dust(raw.quantity) => {
            report.derived_unit_costs += 1;
            round_price(total / raw.quantity)
        }
        _ => metal_price.unwrap_or_default(),
    };
    let acquired_at = raw
        .date_added
        .or(raw.date)
        .as_deref()
        .and_then(timestamp::parse)
        .unwrap_or(now);
    Lot::new(
        raw.quantity,
        unit_cost,
        raw.source.as_deref().unwrap_or(UNKNOWN_SOURCE),
        acquired_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_empty_object_gets_every_key() {
        let (repo, report) = upgrade(json!({}), now()).unwrap();
        assert_eq!(repo, InventoryRepository::new());
        assert_eq!(
            report.missing_keys,
            vec!["metals", "history", "parties", "expenses"]
        );
    }

    #[test]
    fn test_flat_metal_gets_single_lot() {
        let doc = json!({
            "metals": [{"name": "Copper", "quantity": 40, "price_per_kg": 9.5, "source": "Acme"}]
        });
        let (repo, report) = upgrade(doc, now()).unwrap();
        let copper = repo.commodity("Copper").unwrap();

        assert_eq!(report.synthesized_lots, 1);
        assert_eq!(report.defaulted_fields, 1);
        assert_eq!(copper.lots().len(), 1);
        assert_eq!(copper.lots().lots()[0].quantity, dec!(40));
        assert_eq!(copper.lots().lots()[0].unit_cost, dec!(9.5));
        assert_eq!(copper.lots().lots()[0].acquired_at, now());
        assert_eq!(copper.default_sale_price(), dec!(9.5));
        assert_eq!(copper.profit_total(), Decimal::ZERO);
    }

    #[test]
    fn test_flat_metal_without_stock_has_no_lots() {
        let doc = json!({"metals": [{"name": "Tin", "quantity": 0, "price_per_kg": 3}]});
        let (repo, _) = upgrade(doc, now()).unwrap();
        assert!(repo.commodity("Tin").unwrap().lots().is_empty());
    }

    #[test]
    fn test_total_paid_lots() {
        let doc = json!({
            "metals": [{
                "name": "Brass",
                "price_per_kg": 7,
                "sale_price_per_kg": 9,
                "profit_total": 12.5,
                "lots": [
                    {"source": "Acme", "quantity": 20, "total_paid": 150, "date": "2024-01-05T10:00:00 AM"},
                    {"quantity": 0, "total_paid": 0}
                ]
            }]
        });
        let (repo, report) = upgrade(doc, now()).unwrap();
        let brass = repo.commodity("Brass").unwrap();

        assert_eq!(report.derived_unit_costs, 1);
        assert_eq!(brass.lots().len(), 1);
        assert_eq!(brass.lots().lots()[0].unit_cost, dec!(7.5));
        assert_eq!(
            brass.lots().lots()[0].acquired_at,
            NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        );
        assert_eq!(brass.default_sale_price(), dec!(9));
        assert_eq!(brass.profit_total(), dec!(12.5));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let doc = json!({"metals": [{"name": "Tin", "lots": []}, {"name": "Tin", "lots": []}]});
        assert!(matches!(upgrade(doc, now()), Err(UpgradeError::Engine(_))));
    }

    #[test]
    fn test_current_layout_is_clean() {
        let doc = json!({
            "metals": [{
                "name": "Copper",
                "price_per_kg": 10,
                "sale_price_per_kg": 10,
                "profit_total": 0,
                "lots": [{"quantity": 5, "price_per_kg": 10, "source": "Acme", "date_added": "2024-01-01T00:00:00"}]
            }],
            "history": [],
            "parties": {},
            "expenses": []
        });
        let (_, report) = upgrade(doc, now()).unwrap();
        assert!(report.is_clean());
    }
}
