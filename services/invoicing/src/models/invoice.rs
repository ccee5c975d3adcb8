//! Invoice aggregate: header, recipient and line items

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PageRequest;
use crate::{calculator::Totals, status::InvoiceStatus};

/// Contact data of an invoice recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSnapshot {
    pub name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
}

/// Who an invoice is addressed to: a stored client of the same user, or
/// contact data kept on the invoice itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Client(Uuid),
    Inline(ClientSnapshot),
}

impl Recipient {
    /// Build a recipient from the flat request fields.
    ///
    /// Exactly one of `client_id` or the complete set of inline fields must be
    /// given.
    pub fn from_parts(
        client_id: Option<Uuid>,
        name: Option<String>,
        email: Option<String>,
        address: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, String> {
        let inline = [&name, &email, &address, &phone];

        if let Some(client_id) = client_id {
            if inline.iter().any(|field| field.is_some()) {
                return Err(
                    "client_id cannot be combined with inline client fields".to_string(),
                );
            }
            return Ok(Recipient::Client(client_id));
        }

        let required = |value: Option<String>, field: &str| -> Result<String, String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| format!("{field} is required when client_id is not set"))
        };

        Ok(Recipient::Inline(ClientSnapshot {
            name: required(name, "client_name")?,
            email: required(email, "client_email")?,
            address: required(address, "client_address")?,
            phone: required(phone, "client_phone")?,
        }))
    }
}

/// Line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceItem {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub invoice_id: Uuid,
    pub position: i32,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Requested line; `id` refers to an already persisted item of the invoice
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ItemInput {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Line to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceItem {
    pub position: i32,
    pub description: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Writes needed to bring the persisted items of an invoice to a target list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    /// Kept items whose fields changed
    pub updates: Vec<InvoiceItem>,
    pub inserts: Vec<NewInvoiceItem>,
    pub deletes: Vec<Uuid>,
}

impl ItemChanges {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty() && self.deletes.is_empty()
    }
}

/// Caller-controlled invoice fields, replaced as a whole on update
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceHeader {
    pub recipient: Recipient,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: String,
    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
}

/// Unsaved invoice as submitted by its owner
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    pub header: InvoiceHeader,
    pub items: Vec<ItemInput>,
}

/// Fully computed invoice ready to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub header: InvoiceHeader,
    pub status: InvoiceStatus,
    pub totals: Totals,
    pub items: Vec<NewInvoiceItem>,
}

/// Stored invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Option<Uuid>,
    /// Inline recipient, or the current contact data of the linked client
    pub client: Option<ClientSnapshot>,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub notes: String,
    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
    #[serde(flatten)]
    pub totals: Totals,
    pub items: Vec<InvoiceItem>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Overwrite the caller-controlled fields
    pub fn apply_header(&mut self, header: InvoiceHeader) {
        match header.recipient {
            Recipient::Client(client_id) => {
                if self.client_id != Some(client_id) {
                    self.client = None;
                }
                self.client_id = Some(client_id);
            }
            Recipient::Inline(snapshot) => {
                self.client_id = None;
                self.client = Some(snapshot);
            }
        }
        self.invoice_number = header.invoice_number;
        self.issue_date = header.issue_date;
        self.due_date = header.due_date;
        self.notes = header.notes;
        self.tax_rate = header.tax_rate;
        self.delivery_fee = header.delivery_fee;
    }
}

/// Query parameters for invoice listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvoiceQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<InvoiceStatus>,
    /// Case-insensitive match on number, recipient name or notes
    pub search: Option<String>,
}

impl InvoiceQuery {
    pub fn pages(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Revenue figures of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InvoiceSummary {
    /// Sum of active PAID invoice totals
    pub paid_total: Decimal,
    /// Sum of all active invoice totals
    pub revenue_total: Decimal,
}
