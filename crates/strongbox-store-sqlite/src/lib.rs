// crates/strongbox-store-sqlite/src/lib.rs
// ============================================================================
// Module: Strongbox SQLite Store Library
// Description: SQLite-backed physical key/value backend.
// Purpose: Expose the table backend, its configuration, and error types.
// Dependencies: strongbox-core, rusqlite, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! `strongbox-store-sqlite` stores every entry as one row of a two-column
//! table (`Path`, `Value`) and serves hierarchical listing by prefix scan.
//! Construction bootstraps the database, schema, and table; after that the
//! backend only runs a fixed set of prepared statements.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod bootstrap;
pub mod config;
pub mod identifiers;
mod statements;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::DEFAULT_APP_NAME;
pub use config::DEFAULT_BUSY_TIMEOUT_SECS;
pub use config::DEFAULT_DATABASE;
pub use config::DEFAULT_SCHEMA;
pub use config::DEFAULT_TABLE;
pub use config::DatabaseTarget;
pub use config::MAX_POOL_CONNECTIONS;
pub use config::SqlTableConfig;
pub use identifiers::SqlIdentifier;
pub use store::BootstrapStep;
pub use store::SqlTableError;
pub use store::SqliteTableBackend;
