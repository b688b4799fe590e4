//! Read-only reports: stock, lots and the overall summary.

use crate::format::{heading, money, number, percent, when, Align, Table};
use anyhow::Result;
use metalledger_core::{round_money, Commodity, InventoryRepository};
use serde::Serialize;
use std::io::Write;

/// Stock on hand per commodity.
pub fn stock<W: Write>(repo: &InventoryRepository, out: &mut W) -> Result<()> {
    heading(out, "Stock")?;
    if repo.commodities().is_empty() {
        writeln!(out, "No commodities yet.")?;
        return Ok(());
    }

    let mut table = Table::new(&[
        ("Commodity", Align::Left),
        ("Qty (kg)", Align::Right),
        ("Buy/kg", Align::Right),
        ("Sale/kg", Align::Right),
        ("Value", Align::Right),
        ("Lots", Align::Right),
    ]);
    for commodity in repo.commodities() {
        table.row(vec![
            commodity.name().to_string(),
            number(commodity.total_quantity()),
            number(commodity.default_buy_price()),
            number(commodity.default_sale_price()),
            money(commodity.stock_value()),
            commodity.lots().len().to_string(),
        ]);
    }
    table.write(out)?;
    writeln!(out)?;
    writeln!(out, "Stock value: {}", money(repo.summary().stock_value))?;
    Ok(())
}

#[derive(Serialize)]
struct LotRow<'a> {
    index: usize,
    quantity: String,
    unit_cost: String,
    value: String,
    source: &'a str,
    acquired_at: String,
}

fn lot_rows(commodity: &Commodity) -> Vec<LotRow<'_>> {
    commodity
        .lots()
        .lots()
        .iter()
        .enumerate()
        .map(|(index, lot)| LotRow {
            index,
            quantity: number(lot.quantity),
            unit_cost: number(lot.unit_cost),
            value: money(round_money(lot.book_value())),
            source: &lot.source,
            acquired_at: when(&lot.acquired_at),
        })
        .collect()
}

/// The lots of one commodity, oldest first.
pub fn lots<W: Write>(
    repo: &InventoryRepository,
    name: &str,
    json: bool,
    out: &mut W,
) -> Result<()> {
    let commodity = repo.require_commodity(name)?;
    let rows = lot_rows(commodity);
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    heading(out, &format!("Lots of {}", commodity.name()))?;
    if rows.is_empty() {
        writeln!(out, "No stock left.")?;
    } else {
        let mut table = Table::new(&[
            ("#", Align::Right),
            ("Qty (kg)", Align::Right),
            ("Cost/kg", Align::Right),
            ("Value", Align::Right),
            ("Source", Align::Left),
            ("Acquired", Align::Left),
        ]);
        for row in rows {
            table.row(vec![
                row.index.to_string(),
                row.quantity,
                row.unit_cost,
                row.value,
                row.source.to_string(),
                row.acquired_at,
            ]);
        }
        table.write(out)?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Total {} kg, average cost {}/kg",
        number(commodity.total_quantity()),
        commodity
            .lots()
            .weighted_average()
            .map_or_else(|| "-".to_string(), number),
    )?;
    Ok(())
}

/// Stock value, realized profit, expenses and balances.
pub fn summary<W: Write>(repo: &InventoryRepository, json: bool, out: &mut W) -> Result<()> {
    let summary = repo.summary();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }

    heading(out, "Summary")?;
    if !summary.commodities.is_empty() {
        let mut table = Table::new(&[
            ("Commodity", Align::Left),
            ("Qty (kg)", Align::Right),
            ("Value", Align::Right),
            ("Profit", Align::Right),
        ]);
        for line in &summary.commodities {
            table.row(vec![
                line.name.clone(),
                number(line.quantity),
                money(line.stock_value),
                money(line.profit_total),
            ]);
        }
        table.write(out)?;
        writeln!(out)?;
    }

    let figures = [
        ("Stock value", money(summary.stock_value)),
        ("Sales revenue", money(summary.sales_revenue)),
        ("Realized profit", money(summary.realized_profit)),
        ("Expenses", money(summary.total_expenses)),
        ("Net profit", money(summary.net_profit)),
        ("Net margin", percent(summary.net_percentage)),
        ("Receivable", money(summary.receivable)),
        ("Payable", money(summary.payable)),
    ];
    for (label, value) in figures {
        writeln!(out, "{label:<16} {value:>14}")?;
    }
    Ok(())
}
