//! Service operations
//!
//! Every operation takes the caller's user id explicitly and runs in a single
//! unit of work.

use common::error::DatabaseError;

use crate::{error::ServiceError, password::PasswordHasher, repositories::Store};

pub mod accounts;
pub mod clients;
pub mod invoices;

pub use accounts::{AccountService, Registration};
pub use clients::ClientService;
pub use invoices::{InvoicePreview, InvoiceService, preview_invoice};

/// Operations grouped by aggregate
#[derive(Clone)]
pub struct Services<S: Store> {
    pub accounts: AccountService<S>,
    pub clients: ClientService<S>,
    pub invoices: InvoiceService<S>,
}

impl<S: Store> Services<S> {
    pub fn new(store: S, hasher: PasswordHasher) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), hasher),
            clients: ClientService::new(store.clone()),
            invoices: InvoiceService::new(store),
        }
    }
}

/// Report a unique index hit as a conflict rather than a storage failure
pub(crate) fn conflict_on_duplicate(err: DatabaseError, message: &str) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::AlreadyExists(message.to_string())
    } else {
        ServiceError::Storage(err)
    }
}
