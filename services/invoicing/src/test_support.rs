//! Fixtures shared by the unit tests

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    calculator::compute_totals,
    models::{
        BankingDetails, Client, ClientDetails, ClientSnapshot, Invoice, InvoiceHeader, ItemInput,
        NewInvoice, NewInvoiceItem, NewUser, Recipient, User,
    },
    repositories::{
        ClientRepository, InvoiceRepository, Store, UnitOfWork, UserRepository,
        memory::MemoryStore,
    },
    status::InvoiceStatus,
};

pub struct Seeded {
    pub user: User,
    pub client: Client,
    /// Linked to `client`
    pub invoice: Invoice,
    /// Addressed to an inline recipient
    pub inline_invoice: Invoice,
}

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        name: "Ada Owner".to_string(),
        email: email.to_string(),
        password_hash: "not-a-real-hash".to_string(),
        address: "1 Ledger Lane".to_string(),
        phone: "555-0100".to_string(),
        banking: BankingDetails {
            bank_name: "First Bank".to_string(),
            bank_account_name: "Ada Owner".to_string(),
            bank_account_number: "0012345678".to_string(),
        },
    }
}

pub fn client_details(name: &str) -> ClientDetails {
    ClientDetails {
        name: name.to_string(),
        email: format!("{}@clients.test", name.to_lowercase()),
        phone: "555-0199".to_string(),
        address: "9 Customer Road".to_string(),
    }
}

pub fn inline_recipient() -> Recipient {
    Recipient::Inline(ClientSnapshot {
        name: "Walk-in Customer".to_string(),
        email: "walkin@example.com".to_string(),
        address: "Somewhere 12".to_string(),
        phone: "555-0123".to_string(),
    })
}

pub fn item(description: &str, quantity: i32, unit_price: Decimal) -> ItemInput {
    ItemInput {
        id: None,
        description: description.to_string(),
        quantity,
        unit_price,
    }
}

pub fn header(recipient: Recipient, number: &str) -> InvoiceHeader {
    InvoiceHeader {
        recipient,
        invoice_number: number.to_string(),
        issue_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
        notes: "Thanks for your business".to_string(),
        tax_rate: dec!(10),
        delivery_fee: dec!(5),
    }
}

pub fn new_invoice(header: InvoiceHeader, items: &[ItemInput]) -> NewInvoice {
    let totals = compute_totals(
        items.iter().map(|i| (i.quantity, i.unit_price)),
        header.tax_rate,
        header.delivery_fee,
    )
    .unwrap();
    NewInvoice {
        header,
        status: InvoiceStatus::Draft,
        totals,
        items: items
            .iter()
            .enumerate()
            .map(|(position, i)| NewInvoiceItem {
                position: position as i32,
                description: i.description.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                total: Decimal::from(i.quantity) * i.unit_price,
            })
            .collect(),
    }
}

/// A user with one client, one invoice linked to it and one inline invoice
pub async fn seed_account(store: &MemoryStore, email: &str) -> Seeded {
    let mut tx = store.begin().await.unwrap();
    let user = tx.create_user(&new_user(email)).await.unwrap();
    let client = tx.create_client(user.id, &client_details("Acme")).await.unwrap();
    let invoice = tx
        .create_invoice(
            user.id,
            &new_invoice(
                header(Recipient::Client(client.id), "INV-001"),
                &[item("Design", 2, dec!(50.00)), item("Hosting", 1, dec!(30.00))],
            ),
        )
        .await
        .unwrap();
    let inline_invoice = tx
        .create_invoice(
            user.id,
            &new_invoice(header(inline_recipient(), "INV-002"), &[item("Repair", 1, dec!(20))]),
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();

    Seeded {
        user,
        client,
        invoice,
        inline_invoice,
    }
}
