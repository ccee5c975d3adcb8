//! Money and total calculation for invoices
//!
//! Every place that derives invoice figures (creation, update, public preview)
//! goes through [`compute_totals`], so the three call sites always agree.
//! The evaluation order is fixed: per-line products, then the sum, then
//! `× tax_rate / 100`, then `+ delivery_fee`. Every step is checked; a figure
//! that does not fit a decimal is reported as [`AmountOverflow`].

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Derived financial figures of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Totals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invoice amounts are too large")]
pub struct AmountOverflow;

/// Total of a single line: `quantity × unit_price`
pub fn line_total(quantity: i32, unit_price: Decimal) -> Result<Decimal, AmountOverflow> {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .ok_or(AmountOverflow)
}

/// Compute subtotal, tax and total for an ordered sequence of
/// `(quantity, unit_price)` lines.
///
/// Inputs are expected to be non-negative; request validation rejects
/// anything else before it reaches this point. A negative figure is logged
/// because it can only come from a bypassed validation.
pub fn compute_totals<I>(
    lines: I,
    tax_rate: Decimal,
    delivery_fee: Decimal,
) -> Result<Totals, AmountOverflow>
where
    I: IntoIterator<Item = (i32, Decimal)>,
{
    let mut subtotal = Decimal::ZERO;
    for (quantity, unit_price) in lines {
        subtotal = subtotal
            .checked_add(line_total(quantity, unit_price)?)
            .ok_or(AmountOverflow)?;
    }
    let tax = subtotal
        .checked_mul(tax_rate)
        .and_then(|tax| tax.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(AmountOverflow)?;
    let total = subtotal
        .checked_add(tax)
        .and_then(|total| total.checked_add(delivery_fee))
        .ok_or(AmountOverflow)?;

    let totals = Totals {
        subtotal,
        tax,
        total,
    };

    if [subtotal, tax, total].iter().any(Decimal::is_sign_negative) {
        error!(
            subtotal = %totals.subtotal,
            tax = %totals.tax,
            total = %totals.total,
            "Computed negative invoice totals"
        );
    }

    Ok(totals)
}
