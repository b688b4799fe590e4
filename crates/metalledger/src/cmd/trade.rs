//! `mledger buy` and `mledger sell`.

use super::{date_arg, Session};
use crate::format::{money, number, percent, Align, Table};
use anyhow::{Context, Result};
use metalledger_booking::{
    preview_sale, record_purchase, record_sale, Purchase, SaleOutcome, SaleRequest,
};
use metalledger_core::{parse_decimal, round_money, Decimal, EngineError};
use std::io::Write;

/// Arguments for `mledger buy`.
#[derive(clap::Args, Debug)]
pub struct BuyArgs {
    /// Commodity name; created on first purchase
    pub commodity: String,

    /// Quantity in kg
    #[arg(allow_hyphen_values = true)]
    pub quantity: String,

    /// Cost per kg
    #[arg(allow_hyphen_values = true)]
    pub price: String,

    /// Supplier the lot came from
    #[arg(long)]
    pub source: Option<String>,

    /// Amount paid now (defaults to the total less any due amount)
    #[arg(long, allow_hyphen_values = true)]
    pub paid: Option<String>,

    /// Amount still owed to the supplier
    #[arg(long, allow_hyphen_values = true)]
    pub due: Option<String>,

    /// When the purchase happened
    #[arg(long)]
    pub date: Option<String>,
}

/// Arguments for `mledger sell`.
#[derive(clap::Args, Debug)]
pub struct SellArgs {
    /// Commodity name
    pub commodity: String,

    /// Quantity in kg
    #[arg(allow_hyphen_values = true)]
    pub quantity: String,

    /// Price per kg (defaults to the commodity's sale price)
    #[arg(allow_hyphen_values = true)]
    pub price: Option<String>,

    /// Customer buying the stock
    #[arg(long)]
    pub buyer: Option<String>,

    /// Amount received now (defaults to the total less any due amount)
    #[arg(long, allow_hyphen_values = true)]
    pub paid: Option<String>,

    /// Amount the customer still owes
    #[arg(long, allow_hyphen_values = true)]
    pub due: Option<String>,

    /// Draw from this lot first (see `mledger lots`)
    #[arg(long, value_name = "INDEX")]
    pub lot: Option<usize>,

    /// Take whatever the chosen lot cannot cover from the other lots
    #[arg(long, requires = "lot")]
    pub split: bool,

    /// Show the result without recording anything
    #[arg(long)]
    pub preview: bool,

    /// When the sale happened
    #[arg(long)]
    pub date: Option<String>,
}

/// Record a purchase.
pub fn buy<W: Write>(args: &BuyArgs, session: &mut Session, out: &mut W) -> Result<()> {
    let quantity = parse_decimal("quantity", &args.quantity)?;
    let unit_cost = parse_decimal("price", &args.price)?;
    let (paid, due) = settle(
        round_money(quantity * unit_cost),
        args.paid.as_deref(),
        args.due.as_deref(),
    )?;
    let purchase = Purchase::new(
        &args.commodity,
        quantity,
        unit_cost,
        args.source.as_deref().unwrap_or_default(),
        date_arg(args.date.as_deref())?,
    )
    .with_payment(paid, due);

    let receipt = record_purchase(&mut session.inventory(), purchase)?;
    let entry = &receipt.entry;
    writeln!(
        out,
        "{} {} kg of {} from {} at {}/kg (total {})",
        if receipt.created { "Created" } else { "Added" },
        number(entry.quantity),
        entry.commodity,
        entry.person,
        number(entry.unit_price),
        money(entry.total_price),
    )?;
    writeln!(
        out,
        "Paid {}, due {}. Average buy price now {}/kg.",
        money(entry.paid_amount),
        money(entry.due_amount),
        number(receipt.buy_price),
    )?;
    session.commit()
}

/// Record or preview a sale.
pub fn sell<W: Write>(args: &SellArgs, session: &mut Session, out: &mut W) -> Result<()> {
    let quantity = parse_decimal("quantity", &args.quantity)?;
    let unit_price = match &args.price {
        Some(raw) => parse_decimal("price", raw)?,
        None => session
            .inventory()
            .require_commodity(&args.commodity)?
            .default_sale_price(),
    };
    let (paid, due) = settle(
        round_money(quantity * unit_price),
        args.paid.as_deref(),
        args.due.as_deref(),
    )?;

    let mut request = SaleRequest::new(
        &args.commodity,
        quantity,
        unit_price,
        args.buyer.as_deref().unwrap_or_default(),
        date_arg(args.date.as_deref())?,
    )
    .with_payment(paid, due);
    if let Some(index) = args.lot {
        request = request.from_lot(index);
    }
    if args.split {
        request = request.split();
    }

    let options = session.options();
    let stock = session
        .inventory()
        .commodity(args.commodity.trim())
        .map(|c| c.total_quantity());
    if args.preview {
        let outcome = preview_sale(&session.inventory(), &request, &options)
            .map_err(|e| split_hint(e, &request, stock))?;
        writeln!(out, "Preview, nothing recorded:")?;
        return write_outcome(&outcome, out);
    }

    let outcome = record_sale(&mut session.inventory(), &request, &options)
        .map_err(|e| split_hint(e, &request, stock))?;
    write_outcome(&outcome, out)?;
    session.commit()
}

/// Fill in whichever of paid and due was left out.
fn settle(
    total: Decimal,
    paid: Option<&str>,
    due: Option<&str>,
) -> Result<(Decimal, Decimal), EngineError> {
    let paid = paid.map(|raw| parse_decimal("paid", raw)).transpose()?;
    let due = due.map(|raw| parse_decimal("due", raw)).transpose()?;
    Ok(match (paid, due) {
        (None, None) => (total, Decimal::ZERO),
        (Some(paid), None) => (paid, (total - paid).max(Decimal::ZERO)),
        (None, Some(due)) => ((total - due).max(Decimal::ZERO), due),
        (Some(paid), Some(due)) => (paid, due),
    })
}

/// Point at `--split` when only the chosen lot is short, not the whole stock.
fn split_hint(err: EngineError, request: &SaleRequest, stock: Option<Decimal>) -> anyhow::Error {
    let chosen_lot_short = match (&err, stock) {
        (EngineError::InsufficientStock { available, .. }, Some(stock)) => {
            request.preferred_lot.is_some() && !request.split && *available < stock
        }
        _ => false,
    };
    let err = anyhow::Error::new(err);
    if chosen_lot_short {
        err.context("the chosen lot cannot cover the sale; add --split to take the rest from other lots")
    } else {
        err
    }
}

fn write_outcome<W: Write>(outcome: &SaleOutcome, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "Sale of {} kg of {} to {}",
        number(outcome.quantity()),
        outcome.commodity,
        outcome.buyer,
    )?;

    let mut table = Table::new(&[
        ("Lots", Align::Left),
        ("Qty", Align::Right),
        ("Price", Align::Right),
        ("Revenue", Align::Right),
        ("Cost", Align::Right),
        ("Profit", Align::Right),
        ("%", Align::Right),
        ("Paid", Align::Right),
        ("Due", Align::Right),
    ]);
    for tx in &outcome.transactions {
        let lots: Vec<String> = tx.draws.iter().map(|d| format!("#{}", d.lot_index)).collect();
        table.row(vec![
            lots.join(","),
            number(tx.quantity),
            number(tx.unit_price),
            money(tx.revenue),
            money(tx.cost_basis),
            money(tx.profit),
            percent(tx.profit_percentage),
            money(tx.paid),
            money(tx.due),
        ]);
    }
    table.write(out).context("failed to write sale")?;

    if outcome.is_split() {
        writeln!(
            out,
            "Total: revenue {}, cost {}, profit {}",
            money(outcome.revenue()),
            money(outcome.cost_basis()),
            money(outcome.profit()),
        )?;
    }
    Ok(())
}
