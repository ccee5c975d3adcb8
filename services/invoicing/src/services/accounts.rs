//! Account operations: signup, sign-in, profile and deactivation

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::conflict_on_duplicate;
use crate::{
    error::{ServiceError, ServiceResult},
    lifecycle,
    models::{BankingDetails, NewUser, UpdateProfile, User},
    password::PasswordHasher,
    repositories::{Store, UnitOfWork, UserRepository},
};

const EMAIL_TAKEN: &str = "email already in use";

/// Signup profile with the plain-text password
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub password: String,
    pub address: String,
    pub phone: String,
    pub banking: BankingDetails,
}

#[derive(Clone)]
pub struct AccountService<S> {
    store: S,
    hasher: PasswordHasher,
}

impl<S: Store> AccountService<S> {
    pub fn new(store: S, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    /// Register `email`.
    ///
    /// An email held by an active account is rejected. An email held only by
    /// a deactivated account brings that account back, with its clients and
    /// invoices, under the new profile.
    pub async fn sign_up(&self, email: &str, registration: &Registration) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;

        let existing = tx.find_user_by_email(email).await?;
        if existing.as_ref().is_some_and(User::is_active) {
            warn!("Signup rejected, email already in use");
            return Err(ServiceError::AlreadyExists(EMAIL_TAKEN.to_string()));
        }

        let profile = NewUser {
            name: registration.name.clone(),
            email: email.to_string(),
            password_hash: self.hasher.hash(&registration.password)?,
            address: registration.address.clone(),
            phone: registration.phone.clone(),
            banking: registration.banking.clone(),
        };

        let user = match existing {
            Some(deactivated) => lifecycle::reactivate(&mut tx, &deactivated, &profile).await?,
            None => tx
                .create_user(&profile)
                .await
                .map_err(|e| conflict_on_duplicate(e, EMAIL_TAKEN))?,
        };
        tx.commit().await?;

        info!(user_id = %user.id, "User signed up");
        Ok(user)
    }

    /// Check credentials. A deactivated account is reported as such once the
    /// password matched.
    pub async fn sign_in(&self, email: &str, password: &str) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user_by_email(email)
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !self.hasher.verify(&user.password_hash, password) {
            return Err(ServiceError::InvalidCredentials);
        }
        if !user.is_active() {
            return Err(ServiceError::AccountDeactivated);
        }

        info!(user_id = %user.id, "User signed in");
        Ok(user)
    }

    /// Active user by id
    pub async fn me(&self, user_id: Uuid) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        tx.find_active_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        profile: &UpdateProfile,
    ) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;

        if let Some(other) = tx.find_user_by_email(&profile.email).await? {
            if other.is_active() && other.id != user_id {
                return Err(ServiceError::AlreadyExists(EMAIL_TAKEN.to_string()));
            }
        }

        let user = tx
            .update_user_profile(user_id, profile)
            .await
            .map_err(|e| conflict_on_duplicate(e, EMAIL_TAKEN))?
            .ok_or(ServiceError::NotFound("user"))?;
        tx.commit().await?;

        info!(%user_id, "Profile updated");
        Ok(user)
    }

    pub async fn update_banking(
        &self,
        user_id: Uuid,
        banking: &BankingDetails,
    ) -> ServiceResult<User> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .update_user_banking(user_id, banking)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;
        tx.commit().await?;

        info!(%user_id, "Banking details updated");
        Ok(user)
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_active_user(user_id)
            .await?
            .ok_or(ServiceError::NotFound("user"))?;

        if !self.hasher.verify(&user.password_hash, old_password) {
            return Err(ServiceError::InvalidCredentials);
        }

        let hash = self.hasher.hash(new_password)?;
        tx.update_user_password(user_id, &hash).await?;
        tx.commit().await?;

        info!(%user_id, "Password changed");
        Ok(())
    }

    /// Soft-delete the account with its clients and invoices
    pub async fn deactivate(&self, user_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let report = lifecycle::deactivate(&mut tx, user_id).await?;
        tx.commit().await?;

        debug!(
            %user_id,
            clients = report.clients,
            invoices = report.invoices,
            "Deactivation committed"
        );
        Ok(())
    }
}
