//! Expenses: costs outside the lot ledger.

use metalledger_core::{
    EngineError, Expense, HistoryEntry, InventoryRepository, Operation, Role, TransactionKind,
};
use rust_decimal::Decimal;
use tracing::debug;

/// Record an expense.
///
/// The expense is stored, an `expense` history entry is appended, and its
/// due amount is booked against the attributed party as a payable.
pub fn record_expense(
    repo: &mut InventoryRepository,
    expense: Expense,
) -> Result<HistoryEntry, EngineError> {
    let entry = HistoryEntry {
        timestamp: expense.date,
        operation: Operation::Expense,
        commodity: expense.description.clone(),
        quantity: Decimal::ZERO,
        unit_price: Decimal::ZERO,
        total_price: expense.amount,
        person: expense.person.clone(),
        paid_amount: expense.paid_amount,
        due_amount: expense.due_amount,
        cost_basis: Decimal::ZERO,
        profit: Decimal::ZERO,
        profit_percentage: Decimal::ZERO,
        kind: TransactionKind::Expense,
    };

    repo.history_mut().append(entry.clone());
    repo.parties_mut().apply_transaction(
        &expense.person,
        Role::Supplier,
        expense.due_amount,
        entry.clone(),
    );
    debug!(
        description = %expense.description,
        amount = %expense.amount,
        person = %expense.person,
        "recorded expense"
    );
    repo.push_expense(expense);

    Ok(entry)
}
