//! CSV exports of the repository's tables.

use metalledger_core::{timestamp, EngineError, InventoryRepository};
use std::path::Path;

use crate::LoadError;

fn csv_error(path: &Path, source: csv::Error) -> LoadError {
    LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn write_rows<I>(path: &Path, header: &[&str], rows: I) -> Result<usize, LoadError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer.write_record(header).map_err(|e| csv_error(path, e))?;
    let mut count = 0;
    for row in rows {
        writer.write_record(&row).map_err(|e| csv_error(path, e))?;
        count += 1;
    }
    writer.flush().map_err(|e| LoadError::io(path, e))?;
    Ok(count)
}

/// Write the history log. Returns the number of rows.
pub fn history_csv(repo: &InventoryRepository, path: &Path) -> Result<usize, LoadError> {
    write_rows(
        path,
        &[
            "date",
            "operation",
            "metal",
            "quantity",
            "price_per_kg",
            "total_price",
            "person",
            "paid_amount",
            "due_amount",
            "cost_basis",
            "profit",
            "profit_percentage",
            "transaction_type",
        ],
        repo.history().entries().iter().map(|e| {
            vec![
                timestamp::format(&e.timestamp),
                e.operation.to_string(),
                e.commodity.clone(),
                e.quantity.to_string(),
                e.unit_price.to_string(),
                e.total_price.to_string(),
                e.person.clone(),
                e.paid_amount.to_string(),
                e.due_amount.to_string(),
                e.cost_basis.to_string(),
                e.profit.to_string(),
                e.profit_percentage.to_string(),
                e.kind.to_string(),
            ]
        }),
    )
}

/// Write one row per counterparty.
pub fn parties_csv(repo: &InventoryRepository, path: &Path) -> Result<usize, LoadError> {
    write_rows(
        path,
        &["name", "type", "balance", "transactions"],
        repo.parties().iter().map(|(name, party)| {
            vec![
                name.to_string(),
                party.role.to_string(),
                party.balance.to_string(),
                party.transactions.len().to_string(),
            ]
        }),
    )
}

/// Write the expense list.
pub fn expenses_csv(repo: &InventoryRepository, path: &Path) -> Result<usize, LoadError> {
    write_rows(
        path,
        &[
            "date",
            "description",
            "amount",
            "person",
            "paid_amount",
            "due_amount",
        ],
        repo.expenses().iter().map(|e| {
            vec![
                timestamp::format(&e.date),
                e.description.clone(),
                e.amount.to_string(),
                e.person.clone(),
                e.paid_amount.to_string(),
                e.due_amount.to_string(),
            ]
        }),
    )
}

/// Write the lots of one commodity.
pub fn lots_csv(
    repo: &InventoryRepository,
    commodity: &str,
    path: &Path,
) -> Result<usize, LoadError> {
    let commodity = repo
        .require_commodity(commodity)
        .map_err(|source: EngineError| LoadError::Inconsistent {
            path: path.to_path_buf(),
            source,
        })?;
    write_rows(
        path,
        &["index", "quantity", "price_per_kg", "source", "date_added"],
        commodity.lots().lots().iter().enumerate().map(|(i, lot)| {
            vec![
                i.to_string(),
                lot.quantity.to_string(),
                lot.unit_cost.to_string(),
                lot.source.clone(),
                timestamp::format(&lot.acquired_at),
            ]
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use metalledger_booking::{record_purchase, record_sale, BookingOptions, Purchase, SaleRequest};
    use rust_decimal_macros::dec;
    use std::fs;
    use tempfile::TempDir;

    fn repo() -> InventoryRepository {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let mut repo = InventoryRepository::new();
        record_purchase(&mut repo, Purchase::new("Copper", dec!(100), dec!(10), "Acme", at)).unwrap();
        record_purchase(&mut repo, Purchase::new("Copper", dec!(50), dec!(12), "Acme", at)).unwrap();
        record_sale(
            &mut repo,
            &SaleRequest::new("Copper", dec!(120), dec!(15), "Bob", at).with_payment(dec!(1800), dec!(0)),
            &BookingOptions::default(),
        )
        .unwrap();
        repo
    }

    #[test]
    fn test_history_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.csv");
        assert_eq!(history_csv(&repo(), &path).unwrap(), 3);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("date,operation,metal"));
        assert!(lines.next().unwrap().starts_with("2024-01-02T03:04:05,new commodity,Copper,100"));
        let sale = text.lines().last().unwrap();
        assert!(sale.contains(",Bob,"));
        assert!(sale.ends_with(",560,45.16,sale"));
    }

    #[test]
    fn test_parties_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("parties.csv");
        assert_eq!(parties_csv(&repo(), &path).unwrap(), 2);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Acme,supplier,0,2"));
        assert!(text.contains("Bob,customer,0,1"));
    }

    #[test]
    fn test_lots_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lots.csv");
        assert_eq!(lots_csv(&repo(), "Copper", &path).unwrap(), 1);
        assert!(lots_csv(&repo(), "Gold", &path).is_err());
    }

    #[test]
    fn test_expenses_csv_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("expenses.csv");
        assert_eq!(expenses_csv(&repo(), &path).unwrap(), 0);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim(), "date,description,amount,person,paid_amount,due_amount");
    }
}
