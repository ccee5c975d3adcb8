use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use rust_decimal::Decimal;
use sqlx::{Row, postgres::PgRow};
use std::collections::HashMap;
use uuid::Uuid;

use super::PgUnitOfWork;
use crate::{
    calculator::Totals,
    models::{
        Client, ClientSnapshot, Invoice, InvoiceItem, InvoiceQuery, ItemChanges, NewInvoice,
        NewInvoiceItem, Recipient,
    },
    repositories::InvoiceRepository,
    status::InvoiceStatus,
};

/// Invoice columns, with the recipient resolved through the linked client
const INVOICE_SELECT: &str = r#"
    SELECT i.id, i.user_id, i.client_id, i.invoice_number, i.issue_date, i.due_date,
           i.status, i.notes, i.tax_rate, i.delivery_fee, i.subtotal, i.tax, i.total,
           i.deleted_at, i.created_at, i.updated_at,
           COALESCE(c.name, i.client_name) AS recipient_name,
           COALESCE(c.email, i.client_email) AS recipient_email,
           COALESCE(c.address, i.client_address) AS recipient_address,
           COALESCE(c.phone, i.client_phone) AS recipient_phone
    FROM invoices i
    LEFT JOIN clients c ON c.id = i.client_id
"#;

/// Filters shared by the list and count queries
const INVOICE_FILTER: &str = r#"
    WHERE i.user_id = $1 AND i.deleted_at IS NULL
      AND ($2::text IS NULL OR i.status = $2)
      AND ($3::text IS NULL
           OR i.invoice_number ILIKE '%' || $3 || '%'
           OR i.notes ILIKE '%' || $3 || '%'
           OR COALESCE(c.name, i.client_name) ILIKE '%' || $3 || '%')
"#;

fn invoice_from_row(row: &PgRow) -> DatabaseResult<Invoice> {
    let status: String = row.get("status");
    let status: InvoiceStatus = status
        .parse()
        .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(Box::new(e))))?;

    let client = row
        .get::<Option<String>, _>("recipient_name")
        .map(|name| ClientSnapshot {
            name,
            email: row.get::<Option<String>, _>("recipient_email").unwrap_or_default(),
            address: row.get::<Option<String>, _>("recipient_address").unwrap_or_default(),
            phone: row.get::<Option<String>, _>("recipient_phone").unwrap_or_default(),
        });

    Ok(Invoice {
        id: row.get("id"),
        user_id: row.get("user_id"),
        client_id: row.get("client_id"),
        client,
        invoice_number: row.get("invoice_number"),
        issue_date: row.get("issue_date"),
        due_date: row.get("due_date"),
        status,
        notes: row.get("notes"),
        tax_rate: row.get("tax_rate"),
        delivery_fee: row.get("delivery_fee"),
        totals: Totals {
            subtotal: row.get("subtotal"),
            tax: row.get("tax"),
            total: row.get("total"),
        },
        items: Vec::new(),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn item_from_row(row: &PgRow) -> InvoiceItem {
    InvoiceItem {
        id: row.get("id"),
        invoice_id: row.get("invoice_id"),
        position: row.get("position"),
        description: row.get("description"),
        quantity: row.get("quantity"),
        unit_price: row.get("unit_price"),
        total: row.get("total"),
    }
}

/// Inline recipient columns; empty for invoices linked to a client
fn inline_columns(client_id: Option<Uuid>, client: Option<&ClientSnapshot>) -> [Option<&str>; 4] {
    match (client_id, client) {
        (None, Some(c)) => [
            Some(c.name.as_str()),
            Some(c.email.as_str()),
            Some(c.address.as_str()),
            Some(c.phone.as_str()),
        ],
        _ => [None; 4],
    }
}

impl PgUnitOfWork {
    /// Attach items, ordered by position, to freshly loaded invoices
    async fn load_items(&mut self, invoices: &mut [Invoice]) -> DatabaseResult<()> {
        if invoices.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = invoices.iter().map(|invoice| invoice.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT * FROM invoice_items
            WHERE invoice_id = ANY($1)
            ORDER BY invoice_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut by_invoice: HashMap<Uuid, Vec<InvoiceItem>> = HashMap::new();
        for row in &rows {
            let item = item_from_row(row);
            by_invoice.entry(item.invoice_id).or_default().push(item);
        }
        for invoice in invoices.iter_mut() {
            invoice.items = by_invoice.remove(&invoice.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn insert_item(&mut self, invoice_id: Uuid, item: &NewInvoiceItem) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO invoice_items
                (invoice_id, position, description, quantity, unit_price, total)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(invoice_id)
        .bind(item.position)
        .bind(&item.description)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for PgUnitOfWork {
    async fn create_invoice(
        &mut self,
        user_id: Uuid,
        invoice: &NewInvoice,
    ) -> DatabaseResult<Invoice> {
        let header = &invoice.header;
        let (client_id, snapshot) = match &header.recipient {
            Recipient::Client(id) => (Some(*id), None),
            Recipient::Inline(snapshot) => (None, Some(snapshot)),
        };
        let [name, email, address, phone] = inline_columns(client_id, snapshot);

        let id: Uuid = sqlx::query(
            r#"
            INSERT INTO invoices (user_id, client_id, client_name, client_email, client_address,
                                  client_phone, invoice_number, issue_date, due_date, status, notes,
                                  tax_rate, delivery_fee, subtotal, tax, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(client_id)
        .bind(name)
        .bind(email)
        .bind(address)
        .bind(phone)
        .bind(&header.invoice_number)
        .bind(header.issue_date)
        .bind(header.due_date)
        .bind(invoice.status.as_str())
        .bind(&header.notes)
        .bind(header.tax_rate)
        .bind(header.delivery_fee)
        .bind(invoice.totals.subtotal)
        .bind(invoice.totals.tax)
        .bind(invoice.totals.total)
        .fetch_one(&mut *self.tx)
        .await?
        .get("id");

        for item in &invoice.items {
            self.insert_item(id, item).await?;
        }

        self.find_invoice(id, user_id)
            .await?
            .ok_or(DatabaseError::Query(sqlx::Error::RowNotFound))
    }

    async fn find_invoice(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<Option<Invoice>> {
        let sql = format!(
            "{INVOICE_SELECT} WHERE i.id = $1 AND i.user_id = $2 AND i.deleted_at IS NULL"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut invoices = [invoice_from_row(&row)?];
        self.load_items(&mut invoices).await?;
        let [invoice] = invoices;
        Ok(Some(invoice))
    }

    async fn list_invoices(
        &mut self,
        user_id: Uuid,
        query: &InvoiceQuery,
    ) -> DatabaseResult<(Vec<Invoice>, i64)> {
        let pages = query.pages();
        let status = query.status.map(InvoiceStatus::as_str);
        let search = query.search.as_deref().filter(|s| !s.is_empty());

        let count_sql = format!(
            "SELECT COUNT(*) AS total FROM invoices i \
             LEFT JOIN clients c ON c.id = i.client_id {INVOICE_FILTER}"
        );
        let total: i64 = sqlx::query(&count_sql)
            .bind(user_id)
            .bind(status)
            .bind(search)
            .fetch_one(&mut *self.tx)
            .await?
            .get("total");

        let list_sql = format!(
            "{INVOICE_SELECT} {INVOICE_FILTER} ORDER BY i.created_at DESC LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query(&list_sql)
            .bind(user_id)
            .bind(status)
            .bind(search)
            .bind(pages.page_size())
            .bind(pages.offset())
            .fetch_all(&mut *self.tx)
            .await?;

        let mut invoices = rows
            .iter()
            .map(invoice_from_row)
            .collect::<DatabaseResult<Vec<_>>>()?;
        self.load_items(&mut invoices).await?;

        Ok((invoices, total))
    }

    async fn save_invoice(&mut self, invoice: &Invoice, items: &ItemChanges) -> DatabaseResult<()> {
        let [name, email, address, phone] =
            inline_columns(invoice.client_id, invoice.client.as_ref());

        sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = $3, client_name = $4, client_email = $5, client_address = $6,
                client_phone = $7, invoice_number = $8, issue_date = $9, due_date = $10,
                notes = $11, tax_rate = $12, delivery_fee = $13, subtotal = $14, tax = $15,
                total = $16, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.user_id)
        .bind(invoice.client_id)
        .bind(name)
        .bind(email)
        .bind(address)
        .bind(phone)
        .bind(&invoice.invoice_number)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(&invoice.notes)
        .bind(invoice.tax_rate)
        .bind(invoice.delivery_fee)
        .bind(invoice.totals.subtotal)
        .bind(invoice.totals.tax)
        .bind(invoice.totals.total)
        .execute(&mut *self.tx)
        .await?;

        if items.is_empty() {
            return Ok(());
        }

        if !items.deletes.is_empty() {
            sqlx::query("DELETE FROM invoice_items WHERE invoice_id = $1 AND id = ANY($2)")
                .bind(invoice.id)
                .bind(&items.deletes)
                .execute(&mut *self.tx)
                .await?;
        }

        for item in &items.updates {
            sqlx::query(
                r#"
                UPDATE invoice_items
                SET position = $3, description = $4, quantity = $5, unit_price = $6, total = $7
                WHERE id = $1 AND invoice_id = $2
                "#,
            )
            .bind(item.id)
            .bind(invoice.id)
            .bind(item.position)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total)
            .execute(&mut *self.tx)
            .await?;
        }

        for item in &items.inserts {
            self.insert_item(invoice.id, item).await?;
        }

        Ok(())
    }

    async fn update_invoice_status(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        status: InvoiceStatus,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET status = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(status.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_invoice(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn detach_client(&mut self, client: &Client) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET client_id = NULL, client_name = $3, client_email = $4, client_address = $5,
                client_phone = $6, updated_at = NOW()
            WHERE user_id = $1 AND client_id = $2
            "#,
        )
        .bind(client.user_id)
        .bind(client.id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.phone)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn soft_delete_invoices(
        &mut self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET deleted_at = $2, updated_at = NOW()
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn restore_invoices(
        &mut self,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET deleted_at = NULL, updated_at = NOW()
            WHERE user_id = $1 AND deleted_at = $2
            "#,
        )
        .bind(user_id)
        .bind(deleted_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn sum_invoice_totals(
        &mut self,
        user_id: Uuid,
        status: Option<InvoiceStatus>,
    ) -> DatabaseResult<Decimal> {
        let total: Decimal = sqlx::query(
            r#"
            SELECT COALESCE(SUM(total), 0) AS total FROM invoices
            WHERE user_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status.map(InvoiceStatus::as_str))
        .fetch_one(&mut *self.tx)
        .await?
        .get("total");

        Ok(total)
    }
}
