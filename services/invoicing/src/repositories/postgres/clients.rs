use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::PgUnitOfWork;
use crate::{
    models::{Client, ClientDetails, ClientQuery},
    repositories::ClientRepository,
};

fn client_from_row(row: &PgRow) -> Client {
    Client {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        address: row.get("address"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ClientRepository for PgUnitOfWork {
    async fn create_client(
        &mut self,
        user_id: Uuid,
        details: &ClientDetails,
    ) -> DatabaseResult<Client> {
        let row = sqlx::query(
            r#"
            INSERT INTO clients (user_id, name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(client_from_row(&row))
    }

    async fn find_client(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<Option<Client>> {
        let row = sqlx::query(
            "SELECT * FROM clients WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(client_from_row))
    }

    async fn list_clients(
        &mut self,
        user_id: Uuid,
        query: &ClientQuery,
    ) -> DatabaseResult<(Vec<Client>, i64)> {
        let pages = query.pages();
        let search = query.search.as_deref().filter(|s| !s.is_empty());

        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM clients
            WHERE user_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(user_id)
        .bind(search)
        .fetch_one(&mut *self.tx)
        .await?
        .get("total");

        let rows = sqlx::query(
            r#"
            SELECT * FROM clients
            WHERE user_id = $1 AND deleted_at IS NULL
              AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%')
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(search)
        .bind(pages.page_size())
        .bind(pages.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok((rows.iter().map(client_from_row).collect(), total))
    }

    async fn update_client(
        &mut self,
        id: Uuid,
        user_id: Uuid,
        details: &ClientDetails,
    ) -> DatabaseResult<Option<Client>> {
        let row = sqlx::query(
            r#"
            UPDATE clients
            SET name = $3, email = $4, phone = $5, address = $6, updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&details.name)
        .bind(&details.email)
        .bind(&details.phone)
        .bind(&details.address)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(client_from_row))
    }

    async fn delete_client(&mut self, id: Uuid, user_id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE clients SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_clients(
        &mut self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE clients SET deleted_at = $2, updated_at = NOW()
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }

    async fn restore_clients(
        &mut self,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE clients SET deleted_at = NULL, updated_at = NOW()
            WHERE user_id = $1 AND deleted_at = $2
            "#,
        )
        .bind(user_id)
        .bind(deleted_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected())
    }
}
