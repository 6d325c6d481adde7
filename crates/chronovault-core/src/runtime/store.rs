// chronovault-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Archive Store
// Description: Deterministic in-memory archive store for tests and examples.
// Purpose: Pin the ArchiveStore contract without an external engine.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of
//! [`ArchiveStore`] for tests and local demos. It enforces the same guard
//! order and error contract as the durable gateways but keeps dimension and
//! fact rows in process memory. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::attribute::AttributeId;
use crate::core::attribute::AttributeName;
use crate::core::sample::ParameterMetadata;
use crate::core::sample::Quality;
use crate::core::sample::ValueBatch;
use crate::core::traits::AttributeTraits;
use crate::interfaces::ArchiveError;
use crate::interfaces::ArchiveStore;

// ============================================================================
// SECTION: Row Types
// ============================================================================

/// Catalog entry for one archived attribute.
#[derive(Debug, Clone)]
struct AttributeRecord {
    /// Surrogate id assigned on first insert.
    id: i64,
    /// Immutable traits fixed at registration time.
    traits: AttributeTraits,
}

/// One stored history row, exposed for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredHistoryEvent {
    /// Surrogate id of the deduplicated event name.
    pub event_id: i64,
    /// Event name at insert time.
    pub event: String,
}

/// One stored data fact row, exposed for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDataEvent {
    /// Event timestamp supplied by the caller.
    pub event_time: f64,
    /// Quality flag.
    pub quality: Quality,
    /// Read value, `None` when absent or empty.
    pub read: Option<ValueBatch>,
    /// Write value, `None` when absent or empty.
    pub write: Option<ValueBatch>,
    /// Surrogate id of the deduplicated error string, when errored.
    pub error_id: Option<i64>,
}

/// One stored parameter snapshot row.
#[derive(Debug, Clone)]
struct ParameterRow {
    /// Owning attribute id.
    attribute_id: i64,
    /// Event timestamp supplied by the caller.
    event_time: f64,
    /// Captured metadata strings.
    metadata: ParameterMetadata,
}

/// Mutable state behind the store mutex.
#[derive(Debug, Default)]
struct MemoryState {
    /// Connection flag toggled by connect/disconnect.
    connected: bool,
    /// Attribute catalog keyed by fully-qualified name.
    attributes: BTreeMap<String, AttributeRecord>,
    /// Error string dimension keyed by message text.
    error_ids: BTreeMap<String, i64>,
    /// Event string dimension keyed by event name.
    event_ids: BTreeMap<String, i64>,
    /// Append-only history facts keyed by attribute id.
    history: Vec<(i64, StoredHistoryEvent)>,
    /// Append-only parameter snapshots.
    parameters: Vec<ParameterRow>,
    /// Append-only data facts keyed by attribute id.
    data: Vec<(i64, StoredDataEvent)>,
    /// Next attribute surrogate id.
    next_attribute_id: i64,
    /// Next error surrogate id.
    next_error_id: i64,
    /// Next event surrogate id.
    next_event_id: i64,
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// In-memory archive store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryArchiveStore {
    /// Shared state guarded by a mutex.
    inner: Arc<Mutex<MemoryState>>,
}

impl InMemoryArchiveStore {
    /// Creates a new disconnected in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored data event for the attribute, oldest first.
    #[must_use]
    pub fn data_events(&self, full_name: &str) -> Vec<StoredDataEvent> {
        self.inner
            .lock()
            .map(|state| {
                let Some(record) = state.attributes.get(full_name) else {
                    return Vec::new();
                };
                state
                    .data
                    .iter()
                    .filter(|(id, _)| *id == record.id)
                    .map(|(_, event)| event.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns every stored history event for the attribute, oldest first.
    #[must_use]
    pub fn history_events(&self, full_name: &str) -> Vec<StoredHistoryEvent> {
        self.inner
            .lock()
            .map(|state| {
                let Some(record) = state.attributes.get(full_name) else {
                    return Vec::new();
                };
                state
                    .history
                    .iter()
                    .filter(|(id, _)| *id == record.id)
                    .map(|(_, event)| event.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns every stored parameter snapshot for the attribute as
    /// `(event_time, metadata)` pairs, oldest first.
    #[must_use]
    pub fn parameter_events(&self, full_name: &str) -> Vec<(f64, ParameterMetadata)> {
        self.inner
            .lock()
            .map(|state| {
                let Some(record) = state.attributes.get(full_name) else {
                    return Vec::new();
                };
                state
                    .parameters
                    .iter()
                    .filter(|row| row.attribute_id == record.id)
                    .map(|row| (row.event_time, row.metadata.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Locks the state, mapping a poisoned mutex to a storage error.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, ArchiveError> {
        self.inner
            .lock()
            .map_err(|_| ArchiveError::storage("memory_store", "state mutex poisoned"))
    }
}

/// Verifies the connection flag, the first guard of every operation.
fn check_connection(state: &MemoryState) -> Result<(), ArchiveError> {
    if state.connected {
        return Ok(());
    }
    Err(ArchiveError::Connection(
        "connection to storage is closed; open it before using store operations".to_string(),
    ))
}

/// Resolves an archived attribute or fails with a consistency error.
fn resolve_attribute(state: &MemoryState, full_name: &str) -> Result<AttributeRecord, ArchiveError> {
    state.attributes.get(full_name).cloned().ok_or_else(|| {
        ArchiveError::Consistency(format!(
            "attribute [{full_name}] is not archived; store it before use"
        ))
    })
}

/// Normalizes an optional batch: empty sequences are stored as absent.
fn normalize(batch: Option<ValueBatch>) -> Option<ValueBatch> {
    batch.filter(|values| !values.is_empty())
}

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

impl ArchiveStore for InMemoryArchiveStore {
    fn connect(&self, _connection: &str) -> Result<(), ArchiveError> {
        // The connection string is accepted for interface parity and ignored.
        let mut state = self.lock()?;
        state.connected = true;
        Ok(())
    }

    fn disconnect(&self) -> Result<(), ArchiveError> {
        let mut state = self.lock()?;
        state.connected = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().map(|state| state.connected).unwrap_or(false)
    }

    fn store_attribute(
        &self,
        name: &AttributeName,
        traits: AttributeTraits,
    ) -> Result<AttributeId, ArchiveError> {
        let mut state = self.lock()?;
        check_connection(&state)?;
        if !name.is_complete() {
            return Err(ArchiveError::Consistency(format!(
                "attribute identity [{name}] has empty fields"
            )));
        }
        if state.attributes.contains_key(&name.full_name) {
            return Err(ArchiveError::Consistency(format!(
                "attribute [{name}] already exists in the archive; unable to add it again"
            )));
        }
        state.next_attribute_id += 1;
        let id = state.next_attribute_id;
        state.attributes.insert(name.full_name.clone(), AttributeRecord {
            id,
            traits,
        });
        Ok(AttributeId::new(id))
    }

    fn store_history_event(&self, full_name: &str, event: &str) -> Result<(), ArchiveError> {
        let mut state = self.lock()?;
        check_connection(&state)?;
        let record = resolve_attribute(&state, full_name)?;
        let event_id = match state.event_ids.get(event) {
            Some(id) => *id,
            None => {
                state.next_event_id += 1;
                let id = state.next_event_id;
                state.event_ids.insert(event.to_string(), id);
                id
            }
        };
        state.history.push((record.id, StoredHistoryEvent {
            event_id,
            event: event.to_string(),
        }));
        Ok(())
    }

    fn store_parameter_event(
        &self,
        full_name: &str,
        event_time: f64,
        metadata: &ParameterMetadata,
    ) -> Result<(), ArchiveError> {
        let mut state = self.lock()?;
        check_connection(&state)?;
        let record = resolve_attribute(&state, full_name)?;
        state.parameters.push(ParameterRow {
            attribute_id: record.id,
            event_time,
            metadata: metadata.clone(),
        });
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
        let mut state = self.lock()?;
        check_connection(&state)?;
        let record = resolve_attribute(&state, full_name)?;
        check_kind("read", read.as_ref(), traits)?;
        check_kind("write", write.as_ref(), traits)?;
        let read = normalize(read).filter(|_| traits.has_read_data());
        let write = normalize(write).filter(|_| traits.has_write_data());
        state.data.push((record.id, StoredDataEvent {
            event_time,
            quality,
            read,
            write,
            error_id: None,
        }));
        Ok(())
    }

    fn store_data_event_error(
        &self,
        full_name: &str,
        event_time: f64,
        quality: Quality,
        error_message: &str,
        _traits: AttributeTraits,
    ) -> Result<(), ArchiveError> {
        let mut state = self.lock()?;
        check_connection(&state)?;
        let record = resolve_attribute(&state, full_name)?;
        let error_id = match state.error_ids.get(error_message) {
            Some(id) => *id,
            None => {
                state.next_error_id += 1;
                let id = state.next_error_id;
                state.error_ids.insert(error_message.to_string(), id);
                id
            }
        };
        state.data.push((record.id, StoredDataEvent {
            event_time,
            quality,
            read: None,
            write: None,
            error_id: Some(error_id),
        }));
        Ok(())
    }

    fn fetch_last_history_event(&self, full_name: &str) -> Result<Option<String>, ArchiveError> {
        let state = self.lock()?;
        check_connection(&state)?;
        let record = resolve_attribute(&state, full_name)?;
        Ok(state
            .history
            .iter()
            .rev()
            .find(|(id, _)| *id == record.id)
            .map(|(_, event)| event.event.clone()))
    }

    fn fetch_attribute_archived(&self, full_name: &str) -> Result<bool, ArchiveError> {
        let state = self.lock()?;
        check_connection(&state)?;
        Ok(state.attributes.contains_key(full_name))
    }

    fn fetch_attribute_traits(&self, full_name: &str) -> Result<AttributeTraits, ArchiveError> {
        let state = self.lock()?;
        check_connection(&state)?;
        Ok(resolve_attribute(&state, full_name)?.traits)
    }
}
