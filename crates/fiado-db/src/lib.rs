//! # fiado-db: Database Layer for Fiado
//!
//! This crate provides database access for the Fiado system: inventory,
//! customers, sales, and the customer running-account ledger. It uses
//! SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Fiado Data Flow                              │
//! │                                                                     │
//! │  GUI / reports (external)                                          │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                   fiado-db (THIS CRATE)                     │   │
//! │  │                                                             │   │
//! │  │   ┌─────────────┐   ┌───────────────┐   ┌──────────────┐   │   │
//! │  │   │  Database   │   │ Repositories  │   │  Migrations  │   │   │
//! │  │   │  (pool.rs)  │◄──│ account, sale │   │  (embedded)  │   │   │
//! │  │   │ SqlitePool  │   │ product, ...  │   │ 001_init.sql │   │   │
//! │  │   └─────────────┘   └───────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite Database (WAL mode, foreign keys ON)                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fiado_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/fiado.db")).await?;
//!
//! // A credit sale: stock, sale rows, and the account charge commit
//! // together or not at all
//! let sale = db
//!     .sales()
//!     .create_sale(Some(&customer_id), &lines, None)
//!     .await?;
//!
//! // A payment against the running account
//! let receipt = fiado_db::repository::receipt::next_receipt_number(db.pool()).await?;
//! db.accounts()
//!     .pay(&customer_id, 3000, PaymentMethod::Cash, None, &receipt)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::account::AccountRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::receipt::next_receipt_number;
pub use repository::sale::SaleRepository;
