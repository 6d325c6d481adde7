// chronovault-store-sqlite/src/gateway.rs
// ============================================================================
// Module: SQLite Archive Gateway
// Description: Durable ArchiveStore implementation backed by SQLite.
// Purpose: Coordinate caches, statements, and transactions per operation.
// Dependencies: chronovault-core, rusqlite, serde, crate::{encoding, query, schema}
// ============================================================================

//! ## Overview
//! The gateway owns one SQLite connection, the three dimension caches, and
//! the query catalog. Every operation verifies connectivity first, resolves
//! attribute and dimension ids through the caches with a single
//! read-through query on miss, and executes its fact insert in its own
//! transaction. Reconnecting replaces the connection, clears every cache,
//! and forgets all statement registrations. Dimension insert-or-create
//! absorbs uniqueness conflicts from concurrent writers by re-reading the
//! winning row inside the same transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use chronovault_core::ArchiveError;
use chronovault_core::ArchiveStore;
use chronovault_core::AttributeId;
use chronovault_core::AttributeName;
use chronovault_core::AttributeTraits;
use chronovault_core::IdentifierCache;
use chronovault_core::ParameterMetadata;
use chronovault_core::Quality;
use chronovault_core::SharedDiagnosticSink;
use chronovault_core::ValueBatch;
use chronovault_core::ValueShape;
use rusqlite::CachedStatement;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;

use crate::encoding;
use crate::query::QueryCatalog;
use crate::query::StatementDef;
use crate::schema;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` archive gateway.
///
/// The database path is not part of the configuration; it is the argument
/// of [`ArchiveStore::connect`].
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteGatewayConfig {
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for SqliteGatewayConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteJournalMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Gateway State
// ============================================================================

/// Mutable state guarded by the gateway mutex.
struct GatewayState {
    /// Open connection, `None` while disconnected.
    connection: Option<Connection>,
    /// Statement naming and per-connection registration set.
    catalog: QueryCatalog,
    /// Attribute catalog id cache keyed by fully-qualified name.
    attribute_cache: IdentifierCache,
    /// Error string id cache keyed by message text.
    error_cache: IdentifierCache,
    /// Event string id cache keyed by event name.
    event_cache: IdentifierCache,
}

impl GatewayState {
    /// Creates the disconnected initial state.
    fn new() -> Self {
        Self {
            connection: None,
            catalog: QueryCatalog::new(),
            attribute_cache: IdentifierCache::new("attribute"),
            error_cache: IdentifierCache::new("error message"),
            event_cache: IdentifierCache::new("event type"),
        }
    }
}

/// `SQLite`-backed archive gateway.
///
/// One gateway owns one connection and one set of dimension caches.
/// Operations serialize on an internal mutex; statements never overlap on
/// the connection.
pub struct SqliteArchiveGateway {
    /// Gateway configuration.
    config: SqliteGatewayConfig,
    /// Diagnostic sink supplied at construction.
    diagnostics: SharedDiagnosticSink,
    /// Connection, catalog, and caches.
    inner: Mutex<GatewayState>,
}

impl SqliteArchiveGateway {
    /// Creates a disconnected gateway.
    #[must_use]
    pub fn new(config: SqliteGatewayConfig, diagnostics: SharedDiagnosticSink) -> Self {
        Self {
            config,
            diagnostics,
            inner: Mutex::new(GatewayState::new()),
        }
    }

    /// Locks the gateway state.
    fn lock(&self) -> Result<MutexGuard<'_, GatewayState>, ArchiveError> {
        self.inner
            .lock()
            .map_err(|_| ArchiveError::storage("gateway_state", "state mutex poisoned"))
    }
}

// ============================================================================
// SECTION: Connection Helpers
// ============================================================================

/// Returns the error for operations attempted while disconnected.
fn connection_closed() -> ArchiveError {
    ArchiveError::Connection(
        "connection to storage is closed; open it before using store operations".to_string(),
    )
}

/// Opens a connection with the configured pragmas applied.
fn open_connection(
    path: &str,
    config: &SqliteGatewayConfig,
) -> Result<Connection, rusqlite::Error> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)?;
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    Ok(connection)
}

/// Initializes or validates the versioned schema.
fn initialize_schema(connection: &mut Connection) -> Result<(), ArchiveError> {
    let db_error =
        |err: rusqlite::Error| ArchiveError::Connection(format!("schema bootstrap failed: {err}"));
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch(&schema::meta_ddl()).map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row(&format!("SELECT version FROM {} LIMIT 1", schema::META_TABLE), [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute(
                &format!("INSERT INTO {} (version) VALUES (?1)", schema::META_TABLE),
                params![schema::SCHEMA_VERSION],
            )
            .map_err(db_error)?;
            tx.execute_batch(&schema::bootstrap_ddl()).map_err(db_error)?;
        }
        Some(value) if value == schema::SCHEMA_VERSION => {}
        Some(value) => {
            return Err(ArchiveError::Connection(format!(
                "unsupported archive schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)
}

/// Returns the current unix epoch as fractional seconds.
fn unix_seconds() -> f64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs_f64()
}

// ============================================================================
// SECTION: Statement Helpers
// ============================================================================

/// Prepares a named statement, registering it on first use per connection.
///
/// Registration is idempotent: the catalog tracks names seen since the last
/// reconnect, and the connection's statement cache keyed by SQL text does
/// the actual reuse.
fn prepare<'conn>(
    catalog: &mut QueryCatalog,
    connection: &'conn Connection,
    statement: &StatementDef,
    diagnostics: &SharedDiagnosticSink,
) -> Result<CachedStatement<'conn>, rusqlite::Error> {
    if catalog.note_prepared(&statement.name) {
        diagnostics.statement_trace(&statement.name, "registered prepared statement");
    }
    connection.prepare_cached(&statement.sql)
}

/// Resolves an attribute id through the cache with one read-through query
/// on miss. Returns `None` when the identity is not archived.
fn resolve_attribute_id(
    catalog: &mut QueryCatalog,
    connection: &Connection,
    cache: &mut IdentifierCache,
    diagnostics: &SharedDiagnosticSink,
    full_name: &str,
) -> Result<Option<i64>, ArchiveError> {
    if cache.exists(full_name) {
        return cache
            .value(full_name)
            .map(Some)
            .map_err(|err| ArchiveError::Consistency(err.to_string()));
    }
    let statement = QueryCatalog::fetch_attribute_id();
    let id: Option<i64> = {
        let mut stmt = prepare(catalog, connection, &statement, diagnostics)
            .map_err(|err| ArchiveError::storage(&statement.name, err.to_string()))?;
        stmt.query_row(params![full_name], |row| row.get(0))
            .optional()
            .map_err(|err| ArchiveError::storage(&statement.name, err.to_string()))?
    };
    if let Some(id) = id {
        cache
            .insert(id, full_name)
            .map_err(|err| ArchiveError::Consistency(err.to_string()))?;
    }
    Ok(id)
}

/// Resolves an attribute id or fails with a consistency error.
fn require_attribute_id(
    catalog: &mut QueryCatalog,
    connection: &Connection,
    cache: &mut IdentifierCache,
    diagnostics: &SharedDiagnosticSink,
    full_name: &str,
) -> Result<i64, ArchiveError> {
    resolve_attribute_id(catalog, connection, cache, diagnostics, full_name)?.ok_or_else(|| {
        diagnostics.error(format!(
            "attribute [{full_name}] does not exist in the archive; store it before use"
        ));
        ArchiveError::Consistency(format!(
            "attribute [{full_name}] is not archived; store it before use"
        ))
    })
}

/// Insert-or-create for one dimension key, filling the cache on success.
///
/// The insert ignores uniqueness conflicts and the winning row is re-read
/// inside the same transaction, so a concurrent writer racing on the same
/// previously-unseen key is absorbed instead of surfacing an error.
fn resolve_dimension_id(
    catalog: &mut QueryCatalog,
    connection: &mut Connection,
    cache: &mut IdentifierCache,
    diagnostics: &SharedDiagnosticSink,
    store_statement: &StatementDef,
    fetch_statement: &StatementDef,
    key: &str,
) -> Result<(), ArchiveError> {
    if cache.exists(key) {
        return Ok(());
    }
    diagnostics
        .debug(format!("{} [{key}] needs resolving against the archive", cache.dimension()));
    let tx = connection
        .transaction()
        .map_err(|err| ArchiveError::storage(&store_statement.name, err.to_string()))?;
    let id: i64 = {
        let mut store_stmt = prepare(catalog, &tx, store_statement, diagnostics)
            .map_err(|err| ArchiveError::storage(&store_statement.name, err.to_string()))?;
        store_stmt
            .execute(params![key])
            .map_err(|err| ArchiveError::storage(&store_statement.name, err.to_string()))?;
        drop(store_stmt);
        let mut fetch_stmt = prepare(catalog, &tx, fetch_statement, diagnostics)
            .map_err(|err| ArchiveError::storage(&fetch_statement.name, err.to_string()))?;
        fetch_stmt
            .query_row(params![key], |row| row.get(0))
            .map_err(|err| ArchiveError::storage(&fetch_statement.name, err.to_string()))?
    };
    tx.commit().map_err(|err| ArchiveError::storage(&store_statement.name, err.to_string()))?;
    cache.insert(id, key).map_err(|err| ArchiveError::Consistency(err.to_string()))?;
    diagnostics.debug(format!("resolved {} [{key}] to id {id}", cache.dimension()));
    Ok(())
}

// ============================================================================
// SECTION: Value Binding
// ============================================================================

/// Rejects a batch whose kind contradicts the attribute traits.
fn check_kind(
    side: &str,
    batch: Option<&ValueBatch>,
    traits: AttributeTraits,
) -> Result<(), ArchiveError> {
    if let Some(batch) = batch
        && batch.kind() != traits.kind()
    {
        return Err(ArchiveError::Consistency(format!(
            "{side} value kind {} does not match attribute traits {traits}",
            batch.kind()
        )));
    }
    Ok(())
}

/// Binds one value column: NULL for absent or empty batches, a native value
/// for scalars, and delimited-sequence text for arrays.
fn value_param(
    statement_name: &str,
    batch: Option<&ValueBatch>,
    traits: AttributeTraits,
) -> Result<Value, ArchiveError> {
    let Some(batch) = batch else {
        return Ok(Value::Null);
    };
    if batch.is_empty() {
        return Ok(Value::Null);
    }
    match traits.shape() {
        ValueShape::Scalar => encoding::scalar_value(batch)
            .map_err(|err| ArchiveError::storage(statement_name, err.to_string())),
        ValueShape::Array => Ok(Value::Text(encoding::array_text(batch))),
    }
}

// ============================================================================
// SECTION: ArchiveStore Implementation
// ============================================================================

impl ArchiveStore for SqliteArchiveGateway {
    fn connect(&self, connection: &str) -> Result<(), ArchiveError> {
        self.diagnostics.trace(format!("connecting to sqlite database at: {connection}"));
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if state.connection.take().is_some() {
            self.diagnostics.debug("closed previous connection before reconnect");
        }
        let mut conn = open_connection(connection, &self.config).map_err(|err| {
            self.diagnostics
                .error(format!("failed to open sqlite database at {connection}: {err}"));
            ArchiveError::Connection(format!("failed to open database at {connection}: {err}"))
        })?;
        initialize_schema(&mut conn)?;
        // A fresh connection starts a fresh cache generation: prepared
        // statements are connection-scoped and cached ids may be stale.
        state.catalog.reset();
        state.attribute_cache.clear();
        state.error_cache.clear();
        state.event_cache.clear();
        state.connection = Some(conn);
        self.diagnostics.debug("connected to sqlite database");
        Ok(())
    }

    fn disconnect(&self) -> Result<(), ArchiveError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if state.connection.take().is_some() {
            state.catalog.reset();
            self.diagnostics.debug("disconnected from sqlite database");
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().map(|state| state.connection.is_some()).unwrap_or(false)
    }

    fn store_attribute(
        &self,
        name: &AttributeName,
        traits: AttributeTraits,
    ) -> Result<AttributeId, ArchiveError> {
        self.diagnostics.trace(format!("storing new attribute {name} of type {traits}"));
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        if !name.is_complete() {
            return Err(ArchiveError::Consistency(format!(
                "attribute identity [{name}] has empty fields"
            )));
        }
        let existing = resolve_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            &name.full_name,
        )?;
        if existing.is_some() {
            self.diagnostics.error(format!(
                "attribute [{name}] already exists in the archive and can not be added again"
            ));
            return Err(ArchiveError::Consistency(format!(
                "attribute [{name}] already exists in the archive; unable to add it again"
            )));
        }
        let statement = QueryCatalog::store_attribute();
        let storage = |err: rusqlite::Error| {
            self.diagnostics
                .statement_error(&statement.name, format!("attribute [{name}] was not saved: {err}"));
            ArchiveError::storage(&statement.name, err.to_string())
        };
        let tx = conn.transaction().map_err(storage)?;
        let id = {
            let mut stmt =
                prepare(&mut state.catalog, &tx, &statement, &self.diagnostics).map_err(storage)?;
            stmt.execute(params![
                name.full_name,
                QueryCatalog::table_name(traits),
                name.control_system,
                name.domain,
                name.family,
                name.member,
                name.name,
                traits.kind().type_id(),
                traits.shape().format_id(),
                traits.access().access_id(),
            ])
            .map_err(storage)?;
            drop(stmt);
            tx.last_insert_rowid()
        };
        tx.commit().map_err(storage)?;
        state
            .attribute_cache
            .insert(id, &name.full_name)
            .map_err(|err| ArchiveError::Consistency(err.to_string()))?;
        self.diagnostics
            .debug(format!("stored new attribute {name} of type {traits} with id: {id}"));
        Ok(AttributeId::new(id))
    }

    fn store_history_event(&self, full_name: &str, event: &str) -> Result<(), ArchiveError> {
        self.diagnostics.trace(format!("storing history event {event} for attribute {full_name}"));
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let attribute_id = require_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            full_name,
        )?;
        if !state.event_cache.exists(event) {
            resolve_dimension_id(
                &mut state.catalog,
                conn,
                &mut state.event_cache,
                &self.diagnostics,
                &QueryCatalog::store_event_type(),
                &QueryCatalog::fetch_event_type_id(),
                event,
            )?;
        }
        if !state.event_cache.exists(event) {
            self.diagnostics.error(format!(
                "event [{event}] is missing from both the cache and the archive while storing \
                 history for attribute {full_name}"
            ));
            return Err(ArchiveError::Consistency(format!(
                "event [{event}] is missing in both the cache and the archive; this is an \
                 unrecoverable divergence"
            )));
        }
        let event_id = state
            .event_cache
            .value(event)
            .map_err(|err| ArchiveError::Consistency(err.to_string()))?;
        let statement = QueryCatalog::store_history_event();
        let storage = |err: rusqlite::Error| {
            self.diagnostics.statement_error(
                &statement.name,
                format!("history event [{event}] for attribute [{full_name}] was not saved: {err}"),
            );
            ArchiveError::storage(&statement.name, err.to_string())
        };
        let tx = conn.transaction().map_err(storage)?;
        {
            let mut stmt =
                prepare(&mut state.catalog, &tx, &statement, &self.diagnostics).map_err(storage)?;
            stmt.execute(params![attribute_id, event_id, unix_seconds()]).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;
        self.diagnostics.debug(format!("stored event {event} for attribute {full_name}"));
        Ok(())
    }

    fn store_parameter_event(
        &self,
        full_name: &str,
        event_time: f64,
        metadata: &ParameterMetadata,
    ) -> Result<(), ArchiveError> {
        self.diagnostics.trace(format!("storing parameter event for attribute {full_name}"));
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let attribute_id = require_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            full_name,
        )?;
        let statement = QueryCatalog::store_parameter_event();
        let storage = |err: rusqlite::Error| {
            self.diagnostics.statement_error(
                &statement.name,
                format!("parameter event for attribute [{full_name}] was not saved: {err}"),
            );
            ArchiveError::storage(&statement.name, err.to_string())
        };
        let tx = conn.transaction().map_err(storage)?;
        {
            let mut stmt =
                prepare(&mut state.catalog, &tx, &statement, &self.diagnostics).map_err(storage)?;
            stmt.execute(params![
                attribute_id,
                event_time,
                metadata.label,
                metadata.unit,
                metadata.standard_unit,
                metadata.display_unit,
                metadata.format,
                metadata.archive_rel_change,
                metadata.archive_abs_change,
                metadata.archive_period,
                metadata.description,
            ])
            .map_err(storage)?;
        }
        tx.commit().map_err(storage)?;
        self.diagnostics.debug(format!("stored parameter event for attribute {full_name}"));
        Ok(())
    }

    fn store_data_event(
        &self,
        full_name: &str,
        event_time: f64,
        quality: Quality,
        read: Option<ValueBatch>,
        write: Option<ValueBatch>,
        traits: AttributeTraits,
    ) -> Result<(), ArchiveError> {
        self.diagnostics.trace(format!("storing data event for attribute {full_name}"));
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let attribute_id = require_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            full_name,
        )?;
        check_kind("read", read.as_ref(), traits)?;
        check_kind("write", write.as_ref(), traits)?;
        let statement = QueryCatalog::store_data_event(traits);
        let mut columns: Vec<Value> = vec![
            Value::Integer(attribute_id),
            Value::Real(event_time),
            Value::Integer(quality.code()),
        ];
        if traits.has_read_data() {
            columns.push(value_param(&statement.name, read.as_ref(), traits)?);
        }
        if traits.has_write_data() {
            columns.push(value_param(&statement.name, write.as_ref(), traits)?);
        }
        let storage = |err: rusqlite::Error| {
            self.diagnostics.statement_error(
                &statement.name,
                format!("data event for attribute [{full_name}] was not saved: {err}"),
            );
            ArchiveError::storage(&statement.name, err.to_string())
        };
        let tx = conn.transaction().map_err(storage)?;
        {
            let mut stmt =
                prepare(&mut state.catalog, &tx, &statement, &self.diagnostics).map_err(storage)?;
            stmt.execute(params_from_iter(columns)).map_err(storage)?;
        }
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn store_data_event_error(
        &self,
        full_name: &str,
        event_time: f64,
        quality: Quality,
        error_message: &str,
        traits: AttributeTraits,
    ) -> Result<(), ArchiveError> {
        self.diagnostics.trace(format!(
            "storing error event for attribute {full_name} with message: \"{error_message}\""
        ));
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let attribute_id = require_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            full_name,
        )?;
        if !state.error_cache.exists(error_message) {
            resolve_dimension_id(
                &mut state.catalog,
                conn,
                &mut state.error_cache,
                &self.diagnostics,
                &QueryCatalog::store_error_message(),
                &QueryCatalog::fetch_error_message_id(),
                error_message,
            )?;
        }
        if !state.error_cache.exists(error_message) {
            self.diagnostics.error(format!(
                "error message \"{error_message}\" is missing from both the cache and the \
                 archive while storing data for attribute {full_name}"
            ));
            return Err(ArchiveError::Consistency(format!(
                "error message [{error_message}] is missing in both the cache and the archive; \
                 this is an unrecoverable divergence"
            )));
        }
        let error_id = state
            .error_cache
            .value(error_message)
            .map_err(|err| ArchiveError::Consistency(err.to_string()))?;
        let statement = QueryCatalog::store_data_event_error(traits);
        let storage = |err: rusqlite::Error| {
            self.diagnostics.statement_error(
                &statement.name,
                format!(
                    "error event [{error_message}] for attribute [{full_name}] was not saved: \
                     {err}"
                ),
            );
            ArchiveError::storage(&statement.name, err.to_string())
        };
        let tx = conn.transaction().map_err(storage)?;
        {
            let mut stmt =
                prepare(&mut state.catalog, &tx, &statement, &self.diagnostics).map_err(storage)?;
            stmt.execute(params![attribute_id, event_time, quality.code(), error_id])
                .map_err(storage)?;
        }
        tx.commit().map_err(storage)?;
        Ok(())
    }

    fn fetch_last_history_event(&self, full_name: &str) -> Result<Option<String>, ArchiveError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let attribute_id = require_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            full_name,
        )?;
        let statement = QueryCatalog::fetch_last_history_event();
        let mut stmt = prepare(&mut state.catalog, conn, &statement, &self.diagnostics)
            .map_err(|err| ArchiveError::storage(&statement.name, err.to_string()))?;
        stmt.query_row(params![attribute_id], |row| row.get(0))
            .optional()
            .map_err(|err| ArchiveError::storage(&statement.name, err.to_string()))
    }

    fn fetch_attribute_archived(&self, full_name: &str) -> Result<bool, ArchiveError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let id = resolve_attribute_id(
            &mut state.catalog,
            conn,
            &mut state.attribute_cache,
            &self.diagnostics,
            full_name,
        )?;
        Ok(id.is_some())
    }

    fn fetch_attribute_traits(&self, full_name: &str) -> Result<AttributeTraits, ArchiveError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let conn = state.connection.as_mut().ok_or_else(connection_closed)?;
        let statement = QueryCatalog::fetch_attribute_traits();
        let codes: Option<(u32, u32, u32)> = {
            let mut stmt = prepare(&mut state.catalog, conn, &statement, &self.diagnostics)
                .map_err(|err| ArchiveError::storage(&statement.name, err.to_string()))?;
            stmt.query_row(params![full_name], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .optional()
            .map_err(|err| ArchiveError::storage(&statement.name, err.to_string()))?
        };
        let Some((type_id, format_id, access_id)) = codes else {
            return Err(ArchiveError::Consistency(format!(
                "attribute [{full_name}] is not archived; store it before use"
            )));
        };
        AttributeTraits::from_codes(type_id, format_id, access_id).ok_or_else(|| {
            ArchiveError::Consistency(format!(
                "attribute [{full_name}] carries undecodable traits codes: type {type_id}, \
                 format {format_id}, access {access_id}"
            ))
        })
    }
}
