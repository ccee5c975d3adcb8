//! Domain models for the invoicing service

use serde::Serialize;

pub mod client;
pub mod invoice;
pub mod user;

pub use client::{Client, ClientDetails, ClientQuery};
pub use invoice::{
    ClientSnapshot, Invoice, InvoiceDraft, InvoiceHeader, InvoiceItem, InvoiceQuery, InvoiceSummary,
    ItemChanges, ItemInput, NewInvoice, NewInvoiceItem, Recipient,
};
pub use user::{BankingDetails, NewUser, UpdateProfile, User};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Page selection shared by the list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageRequest {
    /// Page number (1-based)
    pub page: Option<i64>,
    /// Number of items per page
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p > 0).unwrap_or(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE)
    }

    /// Rows to skip; pages past the end of `i64` clamp to the largest offset
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }
}

/// Pagination block returned next to list data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub total_items: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: &PageRequest, total_items: i64) -> Self {
        let page_size = request.page_size();
        Self {
            total_items,
            page: request.page(),
            page_size,
            total_pages: (total_items + page_size - 1) / page_size,
        }
    }
}

/// A page of results
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
