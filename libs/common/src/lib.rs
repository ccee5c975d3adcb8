//! Shared PostgreSQL plumbing for the Ledgerly services
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool};
//!
//! # async fn run() -> Result<(), common::error::DatabaseError> {
//! let pool = init_pool(&DatabaseConfig::new("postgresql://localhost/ledgerly")).await?;
//! assert!(health_check(&pool).await);
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod error;
