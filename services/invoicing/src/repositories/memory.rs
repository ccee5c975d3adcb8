//! In-memory store for tests
//!
//! A unit of work holds the store lock for its whole lifetime and edits a
//! private copy of the state, which replaces the shared state on commit.
//! Single operations can be made to fail to exercise rollback paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use rust_decimal::Decimal;
use std::{
    cmp::Reverse,
    sync::{Arc, Mutex as StdMutex},
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{ClientRepository, InvoiceRepository, Store, UnitOfWork, UserRepository};
use crate::{
    models::{
        BankingDetails, Client, ClientDetails, ClientQuery, Invoice, InvoiceItem, InvoiceQuery,
        ItemChanges, NewInvoice, NewUser, Recipient, UpdateProfile, User,
    },
    status::InvoiceStatus,
};

/// Raw stored rows. Linked invoices keep `client` empty, as the database does.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub users: Vec<User>,
    pub clients: Vec<Client>,
    pub invoices: Vec<Invoice>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    fail_on: Arc<StdMutex<Option<&'static str>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named repository operation fail in every later unit of work
    pub fn fail_on(&self, operation: &'static str) {
        *self.fail_on.lock().unwrap() = Some(operation);
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    /// Copy of the committed state
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryUnitOfWork;

    async fn begin(&self) -> DatabaseResult<MemoryUnitOfWork> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        let fail_on = *self.fail_on.lock().unwrap();
        Ok(MemoryUnitOfWork {
            guard,
            working,
            fail_on,
        })
    }

    async fn ping(&self) -> bool {
        true
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_on: Option<&'static str>,
}

impl MemoryUnitOfWork {
    fn check(&self, operation: &'static str) -> DatabaseResult<()> {
        if self.fail_on == Some(operation) {
            return Err(DatabaseError::Query(sqlx::Error::Protocol(format!(
                "injected failure in {operation}"
            ))));
        }
        Ok(())
    }

    fn active_user_mut(&mut self, id: Uuid) -> Option<&mut User> {
        self.working
            .users
            .iter_mut()
            .find(|user| user.id == id && user.is_active())
    }

    fn active_client_mut(&mut self, id: Uuid, user_id: Uuid) -> Option<&mut Client> {
        self.working
            .clients
            .iter_mut()
            .find(|client| client.id == id && client.user_id == user_id && client.is_active())
    }

    fn active_invoice_mut(&mut self, id: Uuid, user_id: Uuid) -> Option<&mut Invoice> {
        self.working
            .invoices
            .iter_mut()
            .find(|invoice| invoice.id == id && invoice.user_id == user_id && invoice.is_active())
    }

    /// Fill in the contact data of a linked client, as the database join does
    fn present(&self, invoice: &Invoice) -> Invoice {
        let mut invoice = invoice.clone();
        if let Some(client_id) = invoice.client_id {
            invoice.client = self
                .working
                .clients
                .iter()
                .find(|client| client.id == client_id)
                .map(Client::snapshot);
        }
        invoice.items.sort_by_key(|item| item.position);
        invoice
    }

    fn recipient_name(&self, invoice: &Invoice) -> String {
        self.present(invoice)
            .client
            .map(|client| client.name)
            .unwrap_or_default()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T>(rows: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self) -> DatabaseResult<()> {
        self.check("commit")?;
        let MemoryUnitOfWork {
            mut guard, working, ..
        } = self;
        *guard = working;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryUnitOfWork {
    async fn create_user(&mut self, user: &NewUser) -> DatabaseResult<User> {
        self.check("create_user")?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            address: user.address.clone(),
            phone: user.phone.clone(),
            bank_name: user.banking.bank_name.clone(),
            bank_account_name: user.banking.bank_account_name.clone(),
            bank_account_number: user.banking.bank_account_number.clone(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &str) -> DatabaseResult<Option<User>> {
        self.check("find_user_by_email")?;
        let email = email.to_lowercase();
        let mut matches: Vec<&User> = self
            .working
            .users
            .iter()
            .filter(|user| user.email.to_lowercase() == email)
            .collect();
        matches.sort_by_key(|user| (user.deleted_at.is_some(), Reverse(user.deleted_at)));
        Ok(matches.first().map(|user| (*user).clone()))
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> DatabaseResult<Option<User>> {
        self.check("find_user_by_id")?;
        Ok(self.working.users.iter().find(|user| user.id == id).cloned())
    }

    async fn update_user_profile(
        &mut self,
        id: Uuid,
        profile: &UpdateProfile,
    ) -> DatabaseResult<Option<User>> {
        self.check("update_user_profile")?;
        Ok(self.active_user_mut(id).map(|user| {
            user.name = profile.name.clone();
            user.email = profile.email.clone();
            user.address = profile.address.clone();
            user.phone = profile.phone.clone();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_user_banking(
        &mut self,
        id: Uuid,
        banking: &BankingDetails,
    ) -> DatabaseResult<Option<User>> {
        self.check("update_user_banking")?;
        Ok(self.active_user_mut(id).map(|user| {
            user.bank_name = banking.bank_name.clone();
            user.bank_account_name = banking.bank_account_name.clone();
            user.bank_account_number = banking.bank_account_number.clone();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_user_password(
        &mut self,
        id: Uuid,
        password_hash: &str,
    ) -> DatabaseResult<bool> {
        self.check("update_user_password")?;
        Ok(self
            .active_user_mut(id)
            .map(|user| {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn soft_delete_user(&mut self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<bool> {
        self.check("soft_delete_user")?;
        Ok(self
            .active_user_mut(id)
            .map(|user| user.deleted_at = Some(at))
            .is_some())
    }

    async fn restore_user(&mut self, id: Uuid, profile: &NewUser) -> DatabaseResult<Option<User>> {
        self.check("restore_user")?;
        let now = Utc::now();
        Ok(self
            .working
            .users
            .iter_mut()
            .find(|user| user.id == id && !user.is_active())
            .map(|user| {
                user.name = profile.name.clone();
                user.email = profile.email.clone();
                user.password_hash = profile.password_hash.clone();
                user.address = profile.address.clone();
                user.phone = profile.phone.clone();
                user.bank_name = profile.banking.bank_name.clone();
                user.bank_account_name = profile.banking.bank_account_name.clone();
                user.bank_account_number = profile.banking.bank_account_number.clone();
                user.deleted_at = None;
                user.updated_at = now;
                user.clone()
            }))
    }
}

#[async_trait]
impl ClientRepository for MemoryUnitOfWork {
    async fn create_client(
        &mut self,
        user_id: Uuid,
        details: &ClientDetails,
    ) -> DatabaseResult<Client> {
        self.check("create_client")?;
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            user_id,
            name: details.name.clone(),
            email: details.email.clone(),
            phone: details.phone.clone(),
            address: details.address.clone(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.clients.push(client.clone());
        Ok(client)
    }

    async fn find_client(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<Option<Client>> {
        self.check("find_client")?;
        Ok(self.active_client_mut(id, user_id).map(|client| client.clone()))
    }

    async fn list_clients(
        &mut self,
        user_id: Uuid,
        query: &ClientQuery,
    ) -> DatabaseResult<(Vec<Client>, i64)> {
        self.check("list_clients")?;
        let search = query.search.as_deref().unwrap_or_default();
        let rows: Vec<Client> = self
            .working
            .clients
            .iter()
            .rev()
            .filter(|client| client.user_id == user_id && client.is_active())
            .filter(|client| contains_ignore_case(&client.name, search))
            .cloned()
            .collect();
        let total = rows.len() as i64;
        let pages = query.pages();
        Ok((paginate(rows, pages.offset(), pages.page_size()), total))
    }

    async fn update_client(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        details: &ClientDetails,
    ) -> DatabaseResult<Option<Client>> {
        self.check("update_client")?;
        Ok(self.active_client_mut(id, user_id).map(|client| {
            client.name = details.name.clone();
            client.email = details.email.clone();
            client.phone = details.phone.clone();
            client.address = details.address.clone();
            client.updated_at = Utc::now();
            client.clone()
        }))
    }

    async fn delete_client(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
        self.check("delete_client")?;
        let now = Utc::now();
        Ok(self
            .working
            .clients
            .iter_mut()
            .find(|client| client.id == id && client.user_id == user_id && client.is_active())
            .map(|client| {
                client.deleted_at = Some(now);
                client.updated_at = now;
            })
            .is_some())
    }

    async fn soft_delete_clients(
        &mut self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        self.check("soft_delete_clients")?;
        let mut count = 0;
        for client in self.working.clients.iter_mut() {
            if client.user_id == user_id && client.is_active() {
                client.deleted_at = Some(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn restore_clients(
        &mut self,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        self.check("restore_clients")?;
        let mut count = 0;
        for client in self.working.clients.iter_mut() {
            if client.user_id == user_id && client.deleted_at == Some(deleted_at) {
                client.deleted_at = None;
                count += 1;
            }
        }
        Ok(count)
    }
}

#[async_trait]
impl InvoiceRepository for MemoryUnitOfWork {
    async fn create_invoice(
        &mut self,
        user_id: Uuid,
        invoice: &NewInvoice,
    ) -> DatabaseResult<Invoice> {
        self.check("create_invoice")?;
        let now = Utc::now();
        let id = Uuid::new_v4();
        let header = &invoice.header;
        let (client_id, client) = match &header.recipient {
            Recipient::Client(client_id) => (Some(*client_id), None),
            Recipient::Inline(snapshot) => (None, Some(snapshot.clone())),
        };

        let stored = Invoice {
            id,
            user_id,
            client_id,
            client,
            invoice_number: header.invoice_number.clone(),
            issue_date: header.issue_date,
            due_date: header.due_date,
            status: invoice.status,
            notes: header.notes.clone(),
            tax_rate: header.tax_rate,
            delivery_fee: header.delivery_fee,
            totals: invoice.totals,
            items: invoice
                .items
                .iter()
                .map(|item| InvoiceItem {
                    id: Uuid::new_v4(),
                    invoice_id: id,
                    position: item.position,
                    description: item.description.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    total: item.total,
                })
                .collect(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        self.working.invoices.push(stored.clone());
        Ok(self.present(&stored))
    }

    async fn find_invoice(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<Option<Invoice>> {
        self.check("find_invoice")?;
        let found = self
            .working
            .invoices
            .iter()
            .find(|invoice| invoice.id == id && invoice.user_id == user_id && invoice.is_active());
        Ok(found.map(|invoice| self.present(invoice)))
    }

    async fn list_invoices(
        &mut self,
        user_id: Uuid,
        query: &InvoiceQuery,
    ) -> DatabaseResult<(Vec<Invoice>, i64)> {
        self.check("list_invoices")?;
        let search = query.search.as_deref().unwrap_or_default();
        let rows: Vec<Invoice> = self
            .working
            .invoices
            .iter()
            .rev()
            .filter(|invoice| invoice.user_id == user_id && invoice.is_active())
            .filter(|invoice| query.status.is_none_or(|status| invoice.status == status))
            .filter(|invoice| {
                contains_ignore_case(&invoice.invoice_number, search)
                    || contains_ignore_case(&invoice.notes, search)
                    || contains_ignore_case(&self.recipient_name(invoice), search)
            })
            .map(|invoice| self.present(invoice))
            .collect();
        let total = rows.len() as i64;
        let pages = query.pages();
        Ok((paginate(rows, pages.offset(), pages.page_size()), total))
    }

    async fn save_invoice(&mut self, invoice: &Invoice, items: &ItemChanges) -> DatabaseResult<()> {
        self.check("save_invoice")?;
        let Some(stored) = self.active_invoice_mut(invoice.id, invoice.user_id) else {
            return Ok(());
        };

        stored.client_id = invoice.client_id;
        stored.client = match invoice.client_id {
            Some(_) => None,
            None => invoice.client.clone(),
        };
        stored.invoice_number = invoice.invoice_number.clone();
        stored.issue_date = invoice.issue_date;
        stored.due_date = invoice.due_date;
        stored.notes = invoice.notes.clone();
        stored.tax_rate = invoice.tax_rate;
        stored.delivery_fee = invoice.delivery_fee;
        stored.totals = invoice.totals;
        stored.updated_at = Utc::now();

        stored.items.retain(|item| !items.deletes.contains(&item.id));
        for update in &items.updates {
            if let Some(item) = stored.items.iter_mut().find(|item| item.id == update.id) {
                *item = update.clone();
            }
        }
        let invoice_id = stored.id;
        stored.items.extend(items.inserts.iter().map(|item| InvoiceItem {
            id: Uuid::new_v4(),
            invoice_id,
            position: item.position,
            description: item.description.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total: item.total,
        }));
        stored.items.sort_by_key(|item| item.position);
        Ok(())
    }

    async fn update_invoice_status(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        status: InvoiceStatus,
    ) -> DatabaseResult<bool> {
        self.check("update_invoice_status")?;
        Ok(self
            .active_invoice_mut(id, user_id)
            .map(|invoice| {
                invoice.status = status;
                invoice.updated_at = Utc::now();
            })
            .is_some())
    }

    async fn delete_invoice(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
        self.check("delete_invoice")?;
        let now = Utc::now();
        Ok(self
            .active_invoice_mut(id, user_id)
            .map(|invoice| {
                invoice.deleted_at = Some(now);
                invoice.updated_at = now;
            })
            .is_some())
    }

    async fn detach_client(&mut self, client: &Client) -> DatabaseResult<u64> {
        self.check("detach_client")?;
        let mut count = 0;
        for invoice in self.working.invoices.iter_mut() {
            if invoice.user_id == client.user_id && invoice.client_id == Some(client.id) {
                invoice.client_id = None;
                invoice.client = Some(client.snapshot());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn soft_delete_invoices(
        &mut self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        self.check("soft_delete_invoices")?;
        let mut count = 0;
        for invoice in self.working.invoices.iter_mut() {
            if invoice.user_id == user_id && invoice.is_active() {
                invoice.deleted_at = Some(at);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn restore_invoices(
        &mut self,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        self.check("restore_invoices")?;
        let mut count = 0;
        for invoice in self.working.invoices.iter_mut() {
            if invoice.user_id == user_id && invoice.deleted_at == Some(deleted_at) {
                invoice.deleted_at = None;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn sum_invoice_totals(
        &mut self,
        user_id: Uuid,
        status: Option<InvoiceStatus>,
    ) -> DatabaseResult<Decimal> {
        self.check("sum_invoice_totals")?;
        Ok(self
            .working
            .invoices
            .iter()
            .filter(|invoice| invoice.user_id == user_id && invoice.is_active())
            .filter(|invoice| status.is_none_or(|status| invoice.status == status))
            .map(|invoice| invoice.totals.total)
            .sum())
    }
}
