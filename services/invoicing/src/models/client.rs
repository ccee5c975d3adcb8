//! Client model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PageRequest, invoice::ClientSnapshot};

/// Customer of a user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Contact data as copied onto an invoice
    pub fn snapshot(&self) -> ClientSnapshot {
        ClientSnapshot {
            name: self.name.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Client create and update payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientDetails {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Query parameters for client listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    /// Case-insensitive match on the client name
    pub search: Option<String>,
}

impl ClientQuery {
    pub fn pages(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            page_size: self.page_size,
        }
    }
}
