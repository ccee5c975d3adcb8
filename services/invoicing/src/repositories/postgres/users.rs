use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::DatabaseResult;
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use super::PgUnitOfWork;
use crate::{
    models::{BankingDetails, NewUser, UpdateProfile, User},
    repositories::UserRepository,
};

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        address: row.get("address"),
        phone: row.get("phone"),
        bank_name: row.get("bank_name"),
        bank_account_name: row.get("bank_account_name"),
        bank_account_number: row.get("bank_account_number"),
        deleted_at: row.get("deleted_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepository for PgUnitOfWork {
    async fn create_user(&mut self, user: &NewUser) -> DatabaseResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, address, phone,
                               bank_name, bank_account_name, bank_account_number)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.address)
        .bind(&user.phone)
        .bind(&user.banking.bank_name)
        .bind(&user.banking.bank_account_name)
        .bind(&user.banking.bank_account_number)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(user_from_row(&row))
    }

    async fn find_user_by_email(&mut self, email: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE lower(email) = lower($1)
            ORDER BY (deleted_at IS NULL) DESC, deleted_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_id(&mut self, id: Uuid) -> DatabaseResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user_profile(
        &mut self,
        id: Uuid,
        profile: &UpdateProfile,
    ) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, address = $4, phone = $5, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.address)
        .bind(&profile.phone)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user_banking(
        &mut self,
        id: Uuid,
        banking: &BankingDetails,
    ) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET bank_name = $2, bank_account_name = $3, bank_account_number = $4,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&banking.bank_name)
        .bind(&banking.bank_account_name)
        .bind(&banking.bank_account_number)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_user_password(
        &mut self,
        id: Uuid,
        password_hash: &str,
    ) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete_user(&mut self, id: Uuid, at: DateTime<Utc>) -> DatabaseResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET deleted_at = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn restore_user(&mut self, id: Uuid, profile: &NewUser) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, address = $5, phone = $6,
                bank_name = $7, bank_account_name = $8, bank_account_number = $9,
                deleted_at = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NOT NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.password_hash)
        .bind(&profile.address)
        .bind(&profile.phone)
        .bind(&profile.banking.bank_name)
        .bind(&profile.banking.bank_account_name)
        .bind(&profile.banking.bank_account_number)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}
