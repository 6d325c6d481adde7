// chronovault-store-sqlite/src/lib.rs
// ============================================================================
// Module: Chronovault SQLite Store
// Description: Durable ArchiveStore backend using SQLite.
// Purpose: Provide production-grade persistence for the attribute archive.
// Dependencies: chronovault-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides the SQLite-backed [`chronovault_core::ArchiveStore`]
//! implementation: a normalized schema with deduplicated dimension tables,
//! one data fact table per traits combination, write-through identifier
//! caches, and per-operation transactions. Statement naming is
//! deterministic so independent gateways agree on the physical layout.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod encoding;
pub mod gateway;
pub mod query;
pub mod schema;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use encoding::EncodingError;
pub use gateway::SqliteArchiveGateway;
pub use gateway::SqliteGatewayConfig;
pub use gateway::SqliteJournalMode;
pub use gateway::SqliteSyncMode;
pub use query::QueryCatalog;
pub use query::StatementDef;
