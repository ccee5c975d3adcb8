//! Storage interfaces
//!
//! Every write goes through a [`UnitOfWork`] opened with [`Store::begin`].
//! Work becomes visible only on [`UnitOfWork::commit`]; dropping a unit of
//! work without committing discards it. Reads that must see earlier writes of
//! the same operation use the same unit of work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    models::{
        BankingDetails, Client, ClientDetails, ClientQuery, Invoice, InvoiceQuery, ItemChanges,
        NewInvoice, NewUser, UpdateProfile, User,
    },
    status::InvoiceStatus,
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Entry point of a storage backend
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    /// Open a unit of work
    async fn begin(&self) -> DatabaseResult<Self::Tx>;

    /// True when the backend answers
    async fn ping(&self) -> bool;
}

/// Transactional view over every repository
#[async_trait]
pub trait UnitOfWork: UserRepository + ClientRepository + InvoiceRepository + Send {
    async fn commit(self) -> DatabaseResult<()>;
}

#[async_trait]
pub trait UserRepository: Send {
    async fn create_user(&mut self, user: &NewUser) -> DatabaseResult<User>;

    /// Look up by email, case-insensitively, deactivated accounts included.
    /// An active account wins over a deactivated one with the same email.
    async fn find_user_by_email(&mut self, email: &str) -> DatabaseResult<Option<User>>;

    /// Look up by id, deactivated accounts included
    async fn find_user_by_id(&mut self, id: Uuid) -> DatabaseResult<Option<User>>;

    async fn find_active_user(&mut self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.find_user_by_id(id).await?.filter(User::is_active))
    }

    async fn update_user_profile(
        &mut self,
        id: Uuid,
        profile: &UpdateProfile,
    ) -> DatabaseResult<Option<User>>;

    async fn update_user_banking(
        &mut self,
        id: Uuid,
        banking: &BankingDetails,
    ) -> DatabaseResult<Option<User>>;

    async fn update_user_password(&mut self, id: Uuid, password_hash: &str) -> DatabaseResult<bool>;

    /// Mark an active user deleted at `at`; false when there was nothing to do
    async fn soft_delete_user(&mut self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<bool>;

    /// Clear the deletion marker of a deactivated user and overwrite its
    /// profile; `None` when no deactivated user has this id
    async fn restore_user(&mut self, id: Uuid, profile: &NewUser) -> DatabaseResult<Option<User>>;
}

#[async_trait]
pub trait ClientRepository: Send {
    async fn create_client(&mut self, user_id: Uuid, details: &ClientDetails)
    -> DatabaseResult<Client>;

    /// Active client owned by `user_id`
    async fn find_client(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<Option<Client>>;

    /// Page of active clients and the total count matching the query
    async fn list_clients(
        &mut self,
        user_id: Uuid,
        query: &ClientQuery,
    ) -> DatabaseResult<(Vec<Client>, i64)>;

    async fn update_client(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        details: &ClientDetails,
    ) -> DatabaseResult<Option<Client>>;

    /// Mark one active client deleted. The row is kept.
    async fn delete_client(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<bool>;

    /// Mark every active client of the user deleted at `at`
    async fn soft_delete_clients(&mut self, user_id: Uuid, at: DateTime<Utc>)
    -> DatabaseResult<u64>;

    /// Clear the marker of the user's clients deleted exactly at `deleted_at`.
    /// Clients deleted on their own keep their marker.
    async fn restore_clients(
        &mut self,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> DatabaseResult<u64>;
}

#[async_trait]
pub trait InvoiceRepository: Send {
    async fn create_invoice(&mut self, user_id: Uuid, invoice: &NewInvoice)
    -> DatabaseResult<Invoice>;

    /// Active invoice owned by `user_id`, items ordered by position
    async fn find_invoice(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<Option<Invoice>>;

    /// Page of active invoices, newest first, and the total count matching
    /// the query
    async fn list_invoices(
        &mut self,
        user_id: Uuid,
        query: &InvoiceQuery,
    ) -> DatabaseResult<(Vec<Invoice>, i64)>;

    /// Write the header and totals of `invoice` and apply the item changes
    async fn save_invoice(&mut self, invoice: &Invoice, items: &ItemChanges) -> DatabaseResult<()>;

    async fn update_invoice_status(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        status: InvoiceStatus,
    ) -> DatabaseResult<bool>;

    /// Mark one active invoice deleted. The row and its items are kept.
    async fn delete_invoice(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<bool>;

    /// Copy the client's contact data onto every invoice linked to it and
    /// unlink them
    async fn detach_client(&mut self, client: &Client) -> DatabaseResult<u64>;

    /// Mark every active invoice of the user deleted at `at`
    async fn soft_delete_invoices(
        &mut self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DatabaseResult<u64>;

    /// Clear the marker of the user's invoices deleted exactly at
    /// `deleted_at`
    async fn restore_invoices(
        &mut self,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> DatabaseResult<u64>;

    /// Sum of active invoice totals, optionally restricted to one status
    async fn sum_invoice_totals(
        &mut self,
        user_id: Uuid,
        status: Option<InvoiceStatus>,
    ) -> DatabaseResult<Decimal>;
}
