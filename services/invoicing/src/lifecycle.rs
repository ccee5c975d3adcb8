//! Account deactivation and reactivation
//!
//! Both cascades run on a unit of work supplied by the caller, who commits
//! it. An error part-way leaves the unit of work uncommitted, so nothing of
//! the cascade becomes visible.
//!
//! A deactivation stamps the user and everything it soft-deletes with the
//! same instant. Reactivation restores only rows carrying that instant, so a
//! client or invoice deleted on its own stays deleted.

use chrono::{SubsecRound, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    models::{NewUser, User},
    repositories::{ClientRepository, InvoiceRepository, UserRepository},
};

/// Rows touched by a cascade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub clients: u64,
    pub invoices: u64,
}

/// Soft-delete the user's clients, then its invoices, then the user.
///
/// An already deactivated account is left as it is.
pub async fn deactivate<U>(uow: &mut U, user_id: Uuid) -> ServiceResult<CascadeReport>
where
    U: UserRepository + ClientRepository + InvoiceRepository,
{
    let user = uow
        .find_user_by_id(user_id)
        .await?
        .ok_or(ServiceError::NotFound("user"))?;

    if !user.is_active() {
        info!(%user_id, "Account already deactivated");
        return Ok(CascadeReport::default());
    }

    // microseconds, as stored by PostgreSQL
    let at = Utc::now().trunc_subsecs(6);
    let clients = uow.soft_delete_clients(user_id, at).await?;
    let invoices = uow.soft_delete_invoices(user_id, at).await?;
    uow.soft_delete_user(user_id, at).await?;

    info!(%user_id, clients, invoices, "Account deactivated");
    Ok(CascadeReport { clients, invoices })
}

/// Bring a deactivated user back with a new profile, then restore its
/// clients and invoices.
pub async fn reactivate<U>(uow: &mut U, user: &User, profile: &NewUser) -> ServiceResult<User>
where
    U: UserRepository + ClientRepository + InvoiceRepository,
{
    let deleted_at = user.deleted_at.ok_or(ServiceError::NotFound("user"))?;
    let restored = uow
        .restore_user(user.id, profile)
        .await?
        .ok_or(ServiceError::NotFound("user"))?;
    let clients = uow.restore_clients(user.id, deleted_at).await?;
    let invoices = uow.restore_invoices(user.id, deleted_at).await?;

    info!(user_id = %user.id, clients, invoices, "Account reactivated");
    Ok(restored)
}
