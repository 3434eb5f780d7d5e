//! # Repository Module
//!
//! Database repository implementations for Fiado.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                   Repository Pattern Explained                      │
//! │                                                                     │
//! │  The Repository pattern abstracts database access behind a clean   │
//! │  API.                                                               │
//! │                                                                     │
//! │  Caller                                                             │
//! │       │  db.accounts().pay(customer, 3000, Cash, None, receipt)    │
//! │       ▼                                                             │
//! │  AccountRepository                                                 │
//! │  ├── one transaction per compound operation                        │
//! │  ├── domain rules checked before any write                         │
//! │  └── SQL isolated in one place                                     │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite Database                                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product lookups, stock, reorder list
//! - [`customer::CustomerRepository`] - Customer lookups
//! - [`account::AccountRepository`] - The account ledger: charges,
//!   payments, balances, movements, cleanup
//! - [`sale::SaleRepository`] - Atomic sale creation and full reversal
//! - [`receipt`] - Receipt number generation

pub mod account;
pub mod customer;
pub mod product;
pub mod receipt;
pub mod sale;
