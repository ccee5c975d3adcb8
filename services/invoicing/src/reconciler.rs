//! Item reconciliation for invoice updates
//!
//! Diffs the requested item list against the persisted items of one invoice
//! and produces the writes needed to get from one to the other, together with
//! the totals of the resulting item set. Nothing is written here; the caller
//! applies the plan inside its transaction, so a rejected plan leaves storage
//! untouched.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    calculator::{AmountOverflow, Totals, compute_totals, line_total},
    models::{InvoiceItem, ItemChanges, ItemInput, NewInvoiceItem},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("invoice item {0} not found")]
    ItemNotFound(Uuid),

    #[error("invoice item {0} is listed more than once")]
    DuplicateItem(Uuid),

    #[error(transparent)]
    Amount(#[from] AmountOverflow),
}

/// Outcome of a successful reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub changes: ItemChanges,
    pub totals: Totals,
}

/// Plan the item writes that turn `persisted` into `targets`.
///
/// Targets keep their input order; a target's index becomes its position.
/// A target with an id must name an item of `persisted`, at most once.
/// Persisted items no target refers to are deleted. Kept items are only
/// rewritten when a field actually changed.
pub fn reconcile(
    persisted: &[InvoiceItem],
    targets: &[ItemInput],
    tax_rate: Decimal,
    delivery_fee: Decimal,
) -> Result<Reconciliation, ReconcileError> {
    let index: HashMap<Uuid, &InvoiceItem> = persisted.iter().map(|item| (item.id, item)).collect();
    let mut kept = HashSet::with_capacity(targets.len());
    let mut changes = ItemChanges::default();

    for (position, target) in targets.iter().enumerate() {
        let position = position as i32;
        let total = line_total(target.quantity, target.unit_price)?;

        match target.id {
            Some(id) => {
                let existing = index.get(&id).ok_or(ReconcileError::ItemNotFound(id))?;
                if !kept.insert(id) {
                    return Err(ReconcileError::DuplicateItem(id));
                }

                let updated = InvoiceItem {
                    id,
                    invoice_id: existing.invoice_id,
                    position,
                    description: target.description.clone(),
                    quantity: target.quantity,
                    unit_price: target.unit_price,
                    total,
                };
                if updated != **existing {
                    changes.updates.push(updated);
                }
            }
            None => changes.inserts.push(NewInvoiceItem {
                position,
                description: target.description.clone(),
                quantity: target.quantity,
                unit_price: target.unit_price,
                total,
            }),
        }
    }

    changes.deletes = persisted
        .iter()
        .filter(|item| !kept.contains(&item.id))
        .map(|item| item.id)
        .collect();

    let totals = compute_totals(
        targets.iter().map(|target| (target.quantity, target.unit_price)),
        tax_rate,
        delivery_fee,
    )?;

    Ok(Reconciliation { changes, totals })
}
