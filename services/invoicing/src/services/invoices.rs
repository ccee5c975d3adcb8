//! Invoice operations

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    calculator::{AmountOverflow, Totals, compute_totals, line_total},
    error::{ServiceError, ServiceResult},
    models::{
        Invoice, InvoiceDraft, InvoiceHeader, InvoiceQuery, InvoiceSummary, ItemInput, NewInvoice,
        NewInvoiceItem, Page, Pagination, Recipient,
    },
    reconciler::reconcile,
    repositories::{ClientRepository, InvoiceRepository, Store, UnitOfWork},
    status::InvoiceStatus,
};

/// Line of an unsaved invoice with its computed total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewLine {
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Figures of an unsaved invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicePreview {
    pub items: Vec<PreviewLine>,
    #[serde(flatten)]
    pub totals: Totals,
}

#[derive(Clone)]
pub struct InvoiceService<S> {
    store: S,
}

/// The linked client must be an active client of the same user
async fn check_recipient<U>(tx: &mut U, recipient: &Recipient, user_id: Uuid) -> ServiceResult<()>
where
    U: ClientRepository,
{
    if let Recipient::Client(client_id) = recipient {
        tx.find_client(*client_id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("client"))?;
    }
    Ok(())
}

impl<S: Store> InvoiceService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Store a new invoice in `DRAFT` with computed totals
    pub async fn create(&self, user_id: Uuid, draft: InvoiceDraft) -> ServiceResult<Invoice> {
        if draft.items.iter().any(|item| item.id.is_some()) {
            return Err(ServiceError::InvalidInput(
                "items of a new invoice cannot reference an id".to_string(),
            ));
        }

        let mut tx = self.store.begin().await?;
        check_recipient(&mut tx, &draft.header.recipient, user_id).await?;

        let totals = compute_totals(
            draft.items.iter().map(|item| (item.quantity, item.unit_price)),
            draft.header.tax_rate,
            draft.header.delivery_fee,
        )?;
        let items = draft
            .items
            .into_iter()
            .enumerate()
            .map(|(position, item)| {
                line_total(item.quantity, item.unit_price).map(|total| NewInvoiceItem {
                    position: position as i32,
                    total,
                    description: item.description,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
            })
            .collect::<Result<Vec<_>, AmountOverflow>>()?;

        let new_invoice = NewInvoice {
            header: draft.header,
            status: InvoiceStatus::default(),
            totals,
            items,
        };
        let invoice = tx.create_invoice(user_id, &new_invoice).await?;
        tx.commit().await?;

        info!(%user_id, invoice_id = %invoice.id, total = %invoice.totals.total, "Invoice created");
        Ok(invoice)
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> ServiceResult<Invoice> {
        let mut tx = self.store.begin().await?;
        tx.find_invoice(id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("invoice"))
    }

    pub async fn list(&self, user_id: Uuid, query: &InvoiceQuery) -> ServiceResult<Page<Invoice>> {
        let mut tx = self.store.begin().await?;
        let (data, total) = tx.list_invoices(user_id, query).await?;
        Ok(Page {
            data,
            pagination: Pagination::new(&query.pages(), total),
        })
    }

    /// Replace the header and reconcile the items against `items`.
    ///
    /// Header, item writes and totals are committed together. An unknown
    /// item id rejects the whole update.
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        header: InvoiceHeader,
        items: Vec<ItemInput>,
    ) -> ServiceResult<Invoice> {
        let mut tx = self.store.begin().await?;
        let mut invoice = tx
            .find_invoice(id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("invoice"))?;
        check_recipient(&mut tx, &header.recipient, user_id).await?;

        let plan = reconcile(&invoice.items, &items, header.tax_rate, header.delivery_fee)?;
        invoice.apply_header(header);
        invoice.totals = plan.totals;

        tx.save_invoice(&invoice, &plan.changes).await?;
        let updated = tx
            .find_invoice(id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("invoice"))?;
        tx.commit().await?;

        info!(
            %user_id,
            invoice_id = %id,
            updated = plan.changes.updates.len(),
            inserted = plan.changes.inserts.len(),
            deleted = plan.changes.deletes.len(),
            "Invoice updated"
        );
        Ok(updated)
    }

    /// Move an invoice to `status`, one of `DRAFT`, `SENT`, `PAID`
    pub async fn update_status(&self, id: Uuid, user_id: Uuid, status: &str) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let invoice = tx
            .find_invoice(id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("invoice"))?;

        let next = invoice.status.transition(status)?;
        tx.update_invoice_status(id, user_id, next).await?;
        tx.commit().await?;

        info!(
            %user_id,
            invoice_id = %id,
            from = %invoice.status,
            to = %next,
            "Invoice status changed"
        );
        Ok(())
    }

    /// Soft-delete an invoice. Its items stay attached to the hidden row.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_invoice(id, user_id).await? {
            return Err(ServiceError::NotFound("invoice"));
        }
        tx.commit().await?;

        info!(%user_id, invoice_id = %id, "Invoice deleted");
        Ok(())
    }

    /// Paid and overall totals of the user's active invoices
    pub async fn summary(&self, user_id: Uuid) -> ServiceResult<InvoiceSummary> {
        let mut tx = self.store.begin().await?;
        let paid_total = tx
            .sum_invoice_totals(user_id, Some(InvoiceStatus::Paid))
            .await?;
        let revenue_total = tx.sum_invoice_totals(user_id, None).await?;

        Ok(InvoiceSummary {
            paid_total,
            revenue_total,
        })
    }
}

/// Figures of an invoice that is not stored
pub fn preview_invoice(
    items: &[ItemInput],
    tax_rate: Decimal,
    delivery_fee: Decimal,
) -> ServiceResult<InvoicePreview> {
    let lines = items
        .iter()
        .map(|item| {
            line_total(item.quantity, item.unit_price).map(|total| PreviewLine {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total,
            })
        })
        .collect::<Result<Vec<_>, AmountOverflow>>()?;
    let totals = compute_totals(
        items.iter().map(|item| (item.quantity, item.unit_price)),
        tax_rate,
        delivery_fee,
    )?;

    Ok(InvoicePreview {
        items: lines,
        totals,
    })
}
