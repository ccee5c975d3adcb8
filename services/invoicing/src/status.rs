//! Invoice status machine

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::trace;

/// Lifecycle state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Paid,
}

/// Rejected status literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid invoice status '{0}', expected one of DRAFT, SENT, PAID")]
pub struct InvalidStatus(pub String);

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 3] = [Self::Draft, Self::Sent, Self::Paid];

    /// Wire and storage literal
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Sent => "SENT",
            Self::Paid => "PAID",
        }
    }

    /// Move from `self` to the requested status.
    ///
    /// Every state may move to every other state, including itself, so the
    /// current status never rejects a move; only the literal is checked. On
    /// error the current status is left as it was.
    pub fn transition(self, requested: &str) -> Result<InvoiceStatus, InvalidStatus> {
        let next: InvoiceStatus = requested.parse()?;
        trace!(from = %self, to = %next, "Status transition accepted");
        Ok(next)
    }
}

impl FromStr for InvoiceStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
