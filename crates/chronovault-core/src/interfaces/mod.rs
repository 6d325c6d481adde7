// chronovault-core/src/interfaces/mod.rs
// ============================================================================
// Module: Archive Interfaces
// Description: Backend-agnostic operation surface of the attribute archive.
// Purpose: Define the store/fetch contract used by event-source adaptors.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The [`ArchiveStore`] trait is the complete public surface exposed to the
//! external event-source adaptor: connection lifecycle plus the eight
//! store/fetch operations. Implementations must fail fast with a typed
//! [`ArchiveError`] on every guard violation; expected conditions are error
//! returns, never panics. No operation partially commits.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::attribute::AttributeId;
use crate::core::attribute::AttributeName;
use crate::core::sample::ParameterMetadata;
use crate::core::sample::Quality;
use crate::core::sample::ValueBatch;
use crate::core::traits::AttributeTraits;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Archive operation errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// No open connection while an operation requires one.
    #[error("archive connection error: {0}")]
    Connection(String),
    /// Duplicate attribute identity, or a referenced attribute/error/event
    /// that cannot be resolved even after insert-or-create.
    #[error("archive consistency error: {0}")]
    Consistency(String),
    /// The underlying transaction failed; carries the statement name and the
    /// engine diagnostic so the caller can log and decide on retry policy.
    #[error("archive storage error in statement {statement}: {message}")]
    Storage {
        /// Name of the failing statement.
        statement: String,
        /// Diagnostic reported by the storage engine.
        message: String,
    },
}

impl ArchiveError {
    /// Builds a storage error from a statement name and engine diagnostic.
    #[must_use]
    pub fn storage(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            statement: statement.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// SECTION: Archive Store
// ============================================================================

/// Attribute archive store: connection lifecycle plus store/fetch operations.
///
/// One store instance owns one logical connection and one set of dimension
/// caches. Operations are synchronous and never overlap statements on the
/// underlying connection. Instances never share mutable state; concurrent
/// writers against the same physical schema are only coordinated through the
/// storage engine itself.
pub trait ArchiveStore {
    /// Opens (or replaces) the underlying connection.
    ///
    /// Reconnecting invalidates all prepared-statement registrations and
    /// clears every dimension cache.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when the connection cannot be
    /// established.
    fn connect(&self, connection: &str) -> Result<(), ArchiveError>;

    /// Closes the underlying connection. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when teardown fails.
    fn disconnect(&self) -> Result<(), ArchiveError>;

    /// Returns true while a connection is open.
    fn is_open(&self) -> bool;

    /// Returns true while no connection is open.
    fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Registers a new attribute and returns its surrogate id.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Consistency`] when the identity is incomplete
    /// or already archived, [`ArchiveError::Connection`] when closed, and
    /// [`ArchiveError::Storage`] when the insert fails.
    fn store_attribute(
        &self,
        name: &AttributeName,
        traits: AttributeTraits,
    ) -> Result<AttributeId, ArchiveError>;

    /// Appends a lifecycle history event for an archived attribute.
    ///
    /// Repeated identical events are legal and produce distinct rows.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed,
    /// [`ArchiveError::Consistency`] when the attribute is not archived or
    /// the event name cannot be resolved, and [`ArchiveError::Storage`] when
    /// the insert fails.
    fn store_history_event(&self, full_name: &str, event: &str) -> Result<(), ArchiveError>;

    /// Appends a parameter metadata snapshot for an archived attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed,
    /// [`ArchiveError::Consistency`] when the attribute is not archived, and
    /// [`ArchiveError::Storage`] when the insert fails.
    fn store_parameter_event(
        &self,
        full_name: &str,
        event_time: f64,
        metadata: &ParameterMetadata,
    ) -> Result<(), ArchiveError>;

    /// Appends a data event into the fact table selected by the traits.
    ///
    /// Absent or empty value batches are stored as NULL columns, never as
    /// empty sequences.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed,
    /// [`ArchiveError::Consistency`] when the attribute is not archived or a
    /// batch kind contradicts the traits, and [`ArchiveError::Storage`] when
    /// the insert fails.
    fn store_data_event(
        &self,
        full_name: &str,
        event_time: f64,
        quality: Quality,
        read: Option<ValueBatch>,
        write: Option<ValueBatch>,
        traits: AttributeTraits,
    ) -> Result<(), ArchiveError>;

    /// Appends an errored data event referencing a deduplicated error string.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed,
    /// [`ArchiveError::Consistency`] when the attribute is not archived or
    /// the error message cannot be resolved, and [`ArchiveError::Storage`]
    /// when the insert fails.
    fn store_data_event_error(
        &self,
        full_name: &str,
        event_time: f64,
        quality: Quality,
        error_message: &str,
        traits: AttributeTraits,
    ) -> Result<(), ArchiveError>;

    /// Returns the most recent history event name, or `None` when the
    /// attribute has no history yet.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed,
    /// [`ArchiveError::Consistency`] when the attribute is not archived, and
    /// [`ArchiveError::Storage`] when the query fails.
    fn fetch_last_history_event(&self, full_name: &str) -> Result<Option<String>, ArchiveError>;

    /// Returns true when the identity exists in the attribute catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed and
    /// [`ArchiveError::Storage`] when the lookup fails.
    fn fetch_attribute_archived(&self, full_name: &str) -> Result<bool, ArchiveError>;

    /// Returns the stored traits of an archived attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Connection`] when closed,
    /// [`ArchiveError::Consistency`] when the attribute is unknown or its
    /// stored codes cannot be decoded, and [`ArchiveError::Storage`] when
    /// the query fails.
    fn fetch_attribute_traits(&self, full_name: &str) -> Result<AttributeTraits, ArchiveError>;
}
