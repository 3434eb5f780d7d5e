//! # fiado-core: Pure Business Logic for Fiado
//!
//! This crate is the **heart** of Fiado, a small-business management
//! core: inventory, customers, sales, and customer running accounts
//! (store credit). It contains all business logic as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Fiado Architecture                            │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │              GUI / Reporting (external)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │              ★ fiado-core (THIS CRATE) ★                    │   │
//! │  │                                                             │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌───────────┐  │   │
//! │  │   │  types   │  │  money   │  │  error   │  │validation │  │   │
//! │  │   │ Account  │  │  Money   │  │CoreError │  │sale rules │  │   │
//! │  │   │ Movement │  │ (cents)  │  │LineIssue │  │  checks   │  │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └───────────┘  │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────┬───────────────────────────────┘   │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼───────────────────────────────┐   │
//! │  │                 fiado-db (Database Layer)                   │   │
//! │  │     SQLite transactions, ledger + sale repositories         │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Account, Movement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use fiado_core::Money` instead of
// `use fiado_core::money::Money`

pub use error::{CoreError, CoreResult, LineIssue, LineIssueKind};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed in a single sale
///
/// ## Business Reason
/// Prevents runaway requests and keeps a sale within a printable ticket.
pub const MAX_SALE_LINES: usize = 100;

/// Prefix for payment receipt numbers: `ABO-YYYYMMDD-NNNN`
///
/// "ABO" for abono, the store-credit payment the receipt documents.
pub const RECEIPT_PREFIX: &str = "ABO";
