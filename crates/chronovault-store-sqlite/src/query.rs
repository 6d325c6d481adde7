// chronovault-store-sqlite/src/query.rs
// ============================================================================
// Module: Query Catalog
// Description: Deterministic statement naming and text generation.
// Purpose: Map traits and dimension roles onto prepared statements.
// Dependencies: chronovault-core, crate::schema
// ============================================================================

//! ## Overview
//! Statement and table names are pure functions of the traits triple (or a
//! fixed dimension role), so independently created gateways referring to
//! the same schema agree without coordination. The catalog additionally
//! tracks which statement names have been registered on the current
//! connection: registration is idempotent per connection and must be
//! [`QueryCatalog::reset`] after every reconnect, because prepared
//! statements are connection-scoped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;

use chronovault_core::AttributeTraits;

use crate::schema;
use crate::schema::ATTRIBUTES_TABLE;
use crate::schema::COL_ATTRIBUTE_ID;
use crate::schema::COL_ERROR_ID;
use crate::schema::COL_FULL_NAME;
use crate::schema::COL_ID;
use crate::schema::COL_QUALITY;
use crate::schema::COL_RECORDED_AT;
use crate::schema::COL_VALUE_R;
use crate::schema::COL_VALUE_W;
use crate::schema::ERROR_MESSAGES_TABLE;
use crate::schema::EVENT_TYPES_TABLE;
use crate::schema::HISTORY_EVENTS_TABLE;
use crate::schema::PARAMETER_EVENTS_TABLE;

// ============================================================================
// SECTION: Statement Definition
// ============================================================================

/// A named statement with its SQL text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementDef {
    /// Canonical statement name, stable across gateway instances.
    pub name: String,
    /// Statement text.
    pub sql: String,
}

impl StatementDef {
    /// Creates a statement definition.
    fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql: sql.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Statement generator plus the per-connection registration set.
#[derive(Debug, Default)]
pub struct QueryCatalog {
    /// Names already registered on the current connection.
    registered: HashSet<String>,
}

impl QueryCatalog {
    /// Creates a catalog with an empty registration set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the data fact table selected by the traits.
    #[must_use]
    pub fn table_name(traits: AttributeTraits) -> String {
        schema::data_table_name(traits)
    }

    /// Statement inserting one attribute catalog row.
    #[must_use]
    pub fn store_attribute() -> StatementDef {
        StatementDef::new(
            "store_attribute",
            format!(
                "INSERT INTO {ATTRIBUTES_TABLE} ({COL_FULL_NAME}, table_name, control_system, \
                 domain, family, member, name, type_id, format_id, access_id) VALUES (?1, ?2, \
                 ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ),
        )
    }

    /// Statement looking up an attribute id by identity.
    #[must_use]
    pub fn fetch_attribute_id() -> StatementDef {
        StatementDef::new(
            "fetch_attribute_id",
            format!("SELECT {COL_ID} FROM {ATTRIBUTES_TABLE} WHERE {COL_FULL_NAME} = ?1"),
        )
    }

    /// Statement looking up the stored traits codes of an attribute.
    #[must_use]
    pub fn fetch_attribute_traits() -> StatementDef {
        StatementDef::new(
            "fetch_attribute_traits",
            format!(
                "SELECT type_id, format_id, access_id FROM {ATTRIBUTES_TABLE} WHERE \
                 {COL_FULL_NAME} = ?1"
            ),
        )
    }

    /// Statement inserting an event string unless it already exists.
    #[must_use]
    pub fn store_event_type() -> StatementDef {
        StatementDef::new(
            "store_event_type",
            format!(
                "INSERT INTO {EVENT_TYPES_TABLE} (name) VALUES (?1) ON CONFLICT(name) DO NOTHING"
            ),
        )
    }

    /// Statement looking up an event string id.
    #[must_use]
    pub fn fetch_event_type_id() -> StatementDef {
        StatementDef::new(
            "fetch_event_type_id",
            format!("SELECT {COL_ID} FROM {EVENT_TYPES_TABLE} WHERE name = ?1"),
        )
    }

    /// Statement inserting an error string unless it already exists.
    #[must_use]
    pub fn store_error_message() -> StatementDef {
        StatementDef::new(
            "store_error_message",
            format!(
                "INSERT INTO {ERROR_MESSAGES_TABLE} (message) VALUES (?1) ON CONFLICT(message) \
                 DO NOTHING"
            ),
        )
    }

    /// Statement looking up an error string id.
    #[must_use]
    pub fn fetch_error_message_id() -> StatementDef {
        StatementDef::new(
            "fetch_error_message_id",
            format!("SELECT {COL_ID} FROM {ERROR_MESSAGES_TABLE} WHERE message = ?1"),
        )
    }

    /// Statement appending one history fact row.
    #[must_use]
    pub fn store_history_event() -> StatementDef {
        StatementDef::new(
            "store_history_event",
            format!(
                "INSERT INTO {HISTORY_EVENTS_TABLE} ({COL_ATTRIBUTE_ID}, event_type_id, \
                 {COL_RECORDED_AT}) VALUES (?1, ?2, ?3)"
            ),
        )
    }

    /// Statement fetching the most recent history event name.
    #[must_use]
    pub fn fetch_last_history_event() -> StatementDef {
        StatementDef::new(
            "fetch_last_history_event",
            format!(
                "SELECT et.name FROM {HISTORY_EVENTS_TABLE} he JOIN {EVENT_TYPES_TABLE} et ON \
                 et.{COL_ID} = he.event_type_id WHERE he.{COL_ATTRIBUTE_ID} = ?1 ORDER BY \
                 he.{COL_RECORDED_AT} DESC, he.rowid DESC LIMIT 1"
            ),
        )
    }

    /// Statement appending one parameter snapshot row.
    #[must_use]
    pub fn store_parameter_event() -> StatementDef {
        StatementDef::new(
            "store_parameter_event",
            format!(
                "INSERT INTO {PARAMETER_EVENTS_TABLE} ({COL_ATTRIBUTE_ID}, {COL_RECORDED_AT}, \
                 label, unit, standard_unit, display_unit, format, archive_rel_change, \
                 archive_abs_change, archive_period, description) VALUES (?1, ?2, ?3, ?4, ?5, \
                 ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
        )
    }

    /// Statement appending one data fact row for the traits.
    ///
    /// The column list follows the access direction: read-only traits bind
    /// no write column and vice versa.
    #[must_use]
    pub fn store_data_event(traits: AttributeTraits) -> StatementDef {
        let mut columns = vec![COL_ATTRIBUTE_ID, COL_RECORDED_AT, COL_QUALITY];
        if traits.has_read_data() {
            columns.push(COL_VALUE_R);
        }
        if traits.has_write_data() {
            columns.push(COL_VALUE_W);
        }
        let placeholders: Vec<String> =
            (1..=columns.len()).map(|index| format!("?{index}")).collect();
        StatementDef::new(
            format!(
                "store_data_event_{}_{}",
                traits.storage_id(),
                traits.access().storage_name()
            ),
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                schema::data_table_name(traits),
                columns.join(", "),
                placeholders.join(", ")
            ),
        )
    }

    /// Statement appending one errored data fact row for the traits.
    ///
    /// References the error dimension id and omits the value columns.
    #[must_use]
    pub fn store_data_event_error(traits: AttributeTraits) -> StatementDef {
        StatementDef::new(
            format!("store_data_event_error_{}", traits.storage_id()),
            format!(
                "INSERT INTO {} ({COL_ATTRIBUTE_ID}, {COL_RECORDED_AT}, {COL_QUALITY}, \
                 {COL_ERROR_ID}) VALUES (?1, ?2, ?3, ?4)",
                schema::data_table_name(traits)
            ),
        )
    }

    /// Marks a statement name as registered on the current connection.
    ///
    /// Returns true the first time the name is seen since the last
    /// [`QueryCatalog::reset`]; callers prepare the statement exactly then.
    pub fn note_prepared(&mut self, name: &str) -> bool {
        self.registered.insert(name.to_string())
    }

    /// Returns true when the name is registered on the current connection.
    #[must_use]
    pub fn is_prepared(&self, name: &str) -> bool {
        self.registered.contains(name)
    }

    /// Forgets every registration. Required after reconnect: prepared
    /// statements are connection-scoped.
    pub fn reset(&mut self) {
        self.registered.clear();
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use chronovault_core::AccessMode;
    use chronovault_core::AttributeTraits;
    use chronovault_core::ValueKind;
    use chronovault_core::ValueShape;

    use super::QueryCatalog;

    fn traits(access: AccessMode) -> AttributeTraits {
        AttributeTraits::new(ValueKind::Double, ValueShape::Scalar, access)
    }

    #[test]
    fn statement_names_are_deterministic_across_catalogs() {
        let first = QueryCatalog::store_data_event(traits(AccessMode::ReadWrite));
        let second = QueryCatalog::store_data_event(traits(AccessMode::ReadWrite));
        assert_eq!(first, second);
        assert_eq!(first.name, "store_data_event_scalar_double_read_write");
    }

    #[test]
    fn data_event_columns_follow_access_direction() {
        let read = QueryCatalog::store_data_event(traits(AccessMode::Read));
        assert!(read.sql.contains("value_r"));
        assert!(!read.sql.contains("value_w"));
        let write = QueryCatalog::store_data_event(traits(AccessMode::Write));
        assert!(!write.sql.contains("value_r"));
        assert!(write.sql.contains("value_w"));
        let both = QueryCatalog::store_data_event(traits(AccessMode::ReadWithWrite));
        assert!(both.sql.contains("value_r"));
        assert!(both.sql.contains("value_w"));
    }

    #[test]
    fn error_statement_references_the_error_dimension_only() {
        let statement = QueryCatalog::store_data_event_error(traits(AccessMode::ReadWrite));
        assert!(statement.sql.contains("error_id"));
        assert!(!statement.sql.contains("value_r"));
        assert!(!statement.sql.contains("value_w"));
    }

    #[test]
    fn registration_is_idempotent_until_reset() {
        let mut catalog = QueryCatalog::new();
        assert!(catalog.note_prepared("store_attribute"));
        assert!(!catalog.note_prepared("store_attribute"));
        assert!(catalog.is_prepared("store_attribute"));
        catalog.reset();
        assert!(!catalog.is_prepared("store_attribute"));
        assert!(catalog.note_prepared("store_attribute"));
    }
}
