//! Property-based tests for split sales.
//!
//! Run with: cargo test -p metalledger-booking --test `property_tests`

use chrono::{NaiveDate, NaiveDateTime};
use metalledger_booking::{record_purchase, record_sale, BookingOptions, Purchase, SaleRequest};
use metalledger_core::{InventoryRepository, TransactionKind};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn at(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1 + day % 28)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn arb_lots() -> impl Strategy<Value = Vec<(Decimal, Decimal)>> {
    // 0.001 .. 500.000 units at 0.00 .. 999.99
    prop::collection::vec(
        (
            (1i64..500_000i64).prop_map(|n| Decimal::new(n, 3)),
            (0i64..100_000i64).prop_map(|n| Decimal::new(n, 2)),
        ),
        1..12,
    )
}

fn arb_money() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::ZERO),
        (1i64..100i64).prop_map(|n| Decimal::new(n, 2)),
        (0i64..10_000_000i64).prop_map(|n| Decimal::new(n, 2)),
    ]
}

fn stocked(lots: &[(Decimal, Decimal)]) -> InventoryRepository {
    let mut repo = InventoryRepository::new();
    for (i, (qty, cost)) in lots.iter().enumerate() {
        record_purchase(
            &mut repo,
            Purchase::new("Tin", *qty, *cost, "Acme", at(i as u32)),
        )
        .unwrap();
    }
    repo
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// A split sale divides quantity, paid and due across its legs exactly,
    /// with no negative share.
    #[test]
    fn prop_split_shares_are_exact_and_non_negative(
        lots in arb_lots(),
        preferred in any::<prop::sample::Index>(),
        percent in 1u32..=100,
        paid in arb_money(),
        due in arb_money(),
        price in (1i64..200_000i64).prop_map(|n| Decimal::new(n, 2)),
    ) {
        let mut repo = stocked(&lots);
        let total: Decimal = lots.iter().map(|(q, _)| *q).sum();
        let quantity = total * Decimal::from(percent) / Decimal::from(100);
        let index = preferred.index(lots.len());

        let request = SaleRequest::new("Tin", quantity, price, "Bob", at(0))
            .with_payment(paid, due)
            .from_lot(index)
            .split();
        let outcome = record_sale(&mut repo, &request, &BookingOptions::default()).unwrap();

        prop_assert_eq!(outcome.quantity(), quantity);
        prop_assert_eq!(outcome.transactions.iter().map(|t| t.paid).sum::<Decimal>(), paid);
        prop_assert_eq!(outcome.transactions.iter().map(|t| t.due).sum::<Decimal>(), due);
        prop_assert_eq!(outcome.transactions[0].draws[0].lot_index, index);

        let legs = outcome.transactions.len();
        for (n, txn) in outcome.transactions.iter().enumerate() {
            prop_assert!(txn.paid >= Decimal::ZERO, "paid {} at leg {}", txn.paid, n);
            prop_assert!(txn.due >= Decimal::ZERO, "due {} at leg {}", txn.due, n);
            prop_assert_eq!(txn.profit, txn.revenue - txn.cost_basis);
            if n + 1 < legs {
                let exact = due * txn.quantity / quantity;
                prop_assert!((exact - txn.due).abs() < Decimal::new(1, 2));
            }
        }

        let sales: Vec<_> = repo
            .history()
            .entries()
            .iter()
            .filter(|e| e.kind == TransactionKind::Sale)
            .collect();
        prop_assert_eq!(sales.len(), legs);
        prop_assert!(sales.iter().all(|e| e.due_amount >= Decimal::ZERO));
        prop_assert_eq!(repo.parties().get("Bob").unwrap().balance, due);
    }
}
