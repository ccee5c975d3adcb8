//! Client operations

use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ServiceError, ServiceResult},
    models::{Client, ClientDetails, ClientQuery, Page, Pagination},
    repositories::{ClientRepository, InvoiceRepository, Store, UnitOfWork},
};

#[derive(Clone)]
pub struct ClientService<S> {
    store: S,
}

impl<S: Store> ClientService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create(&self, user_id: Uuid, details: &ClientDetails) -> ServiceResult<Client> {
        let mut tx = self.store.begin().await?;
        let client = tx.create_client(user_id, details).await?;
        tx.commit().await?;

        info!(%user_id, client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn get(&self, id: Uuid, user_id: Uuid) -> ServiceResult<Client> {
        let mut tx = self.store.begin().await?;
        tx.find_client(id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("client"))
    }

    pub async fn list(&self, user_id: Uuid, query: &ClientQuery) -> ServiceResult<Page<Client>> {
        let mut tx = self.store.begin().await?;
        let (data, total) = tx.list_clients(user_id, query).await?;
        Ok(Page {
            data,
            pagination: Pagination::new(&query.pages(), total),
        })
    }

    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        details: &ClientDetails,
    ) -> ServiceResult<Client> {
        let mut tx = self.store.begin().await?;
        let client = tx
            .update_client(id, user_id, details)
            .await?
            .ok_or(ServiceError::NotFound("client"))?;
        tx.commit().await?;
        Ok(client)
    }

    /// Soft-delete a client. Invoices addressed to it are detached and keep
    /// a copy of its contact data.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.store.begin().await?;
        let client = tx
            .find_client(id, user_id)
            .await?
            .ok_or(ServiceError::NotFound("client"))?;

        let detached = tx.detach_client(&client).await?;
        tx.delete_client(id, user_id).await?;
        tx.commit().await?;

        info!(%user_id, client_id = %id, detached, "Client deleted");
        Ok(())
    }
}
