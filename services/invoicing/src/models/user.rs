//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account owner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub address: String,
    pub phone: String,
    pub bank_name: String,
    pub bank_account_name: String,
    pub bank_account_number: String,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Profile written on signup, and over a deactivated account when it is
/// reactivated by a new signup
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub phone: String,
    pub banking: BankingDetails,
}

/// Editable contact fields of a user
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateProfile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

/// Banking fields printed on invoices
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BankingDetails {
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub bank_account_name: String,
    #[serde(default)]
    pub bank_account_number: String,
}
