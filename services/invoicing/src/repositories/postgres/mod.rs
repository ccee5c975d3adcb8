//! PostgreSQL store
//!
//! Each unit of work wraps one database transaction. Queries are plain
//! `sqlx::query` calls with rows mapped by hand.

use async_trait::async_trait;
use common::{
    database::health_check,
    error::{DatabaseError, DatabaseResult},
};
use sqlx::{PgPool, Postgres, Transaction};

use super::{Store, UnitOfWork};

mod clients;
mod invoices;
mod users;

/// Embedded schema migrations
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgUnitOfWork;

    async fn begin(&self) -> DatabaseResult<PgUnitOfWork> {
        let tx = self.pool.begin().await?;
        Ok(PgUnitOfWork { tx })
    }

    async fn ping(&self) -> bool {
        health_check(&self.pool).await
    }
}

/// Open PostgreSQL transaction; rolled back when dropped uncommitted
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self) -> DatabaseResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
