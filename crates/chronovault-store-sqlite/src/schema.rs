// chronovault-store-sqlite/src/schema.rs
// ============================================================================
// Module: Physical Schema
// Description: Table and column names plus versioned DDL bootstrap.
// Purpose: Define the normalized layout shared by every gateway instance.
// Dependencies: chronovault-core
// ============================================================================

//! ## Overview
//! The physical schema is a pure function of the closed traits
//! classification: three dimension tables, two fixed fact tables, and one
//! data fact table per shape-kind combination. Names are deterministic so
//! independently created gateways agree on the layout without coordination.
//! Bootstrap is guarded by a schema version row; an unknown version fails
//! closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;

use chronovault_core::AttributeTraits;
use chronovault_core::ValueKind;
use chronovault_core::ValueShape;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Schema version recorded in the metadata table.
pub const SCHEMA_VERSION: i64 = 1;

/// Metadata table guarding the schema version.
pub const META_TABLE: &str = "archive_meta";
/// Attribute catalog dimension table.
pub const ATTRIBUTES_TABLE: &str = "attributes";
/// Error string dimension table.
pub const ERROR_MESSAGES_TABLE: &str = "error_messages";
/// Event string dimension table.
pub const EVENT_TYPES_TABLE: &str = "event_types";
/// History fact table.
pub const HISTORY_EVENTS_TABLE: &str = "history_events";
/// Parameter snapshot fact table.
pub const PARAMETER_EVENTS_TABLE: &str = "parameter_events";

/// Surrogate id column of the dimension tables.
pub const COL_ID: &str = "id";
/// Unique identity column of the attribute catalog.
pub const COL_FULL_NAME: &str = "full_name";
/// Attribute foreign key column of every fact table.
pub const COL_ATTRIBUTE_ID: &str = "attribute_id";
/// Event timestamp column of every fact table.
pub const COL_RECORDED_AT: &str = "recorded_at";
/// Quality flag column of the data fact tables.
pub const COL_QUALITY: &str = "quality";
/// Read value column of the data fact tables.
pub const COL_VALUE_R: &str = "value_r";
/// Write value column of the data fact tables.
pub const COL_VALUE_W: &str = "value_w";
/// Error reference column of the data fact tables.
pub const COL_ERROR_ID: &str = "error_id";

// ============================================================================
// SECTION: Naming
// ============================================================================

/// Returns the data fact table selected by the traits.
///
/// The access direction does not contribute: it selects statement variants,
/// not the physical table.
#[must_use]
pub fn data_table_name(traits: AttributeTraits) -> String {
    format!("data_{}", traits.storage_id())
}

/// Returns the SQL column type holding one value of the given kind and
/// shape. Array columns hold a delimited-sequence text encoding.
#[must_use]
pub const fn value_column_type(kind: ValueKind, shape: ValueShape) -> &'static str {
    match shape {
        ValueShape::Array => "TEXT",
        ValueShape::Scalar => match kind {
            ValueKind::Boolean
            | ValueKind::UChar
            | ValueKind::Short
            | ValueKind::UShort
            | ValueKind::Long
            | ValueKind::ULong
            | ValueKind::Long64
            | ValueKind::ULong64
            | ValueKind::State => "INTEGER",
            ValueKind::Float | ValueKind::Double => "REAL",
            ValueKind::Str => "TEXT",
        },
    }
}

// ============================================================================
// SECTION: DDL
// ============================================================================

/// Returns the metadata table DDL.
#[must_use]
pub fn meta_ddl() -> String {
    format!("CREATE TABLE IF NOT EXISTS {META_TABLE} (version INTEGER NOT NULL);")
}

/// Returns the DDL for one data fact table and its lookup index.
fn data_table_ddl(kind: ValueKind, shape: ValueShape) -> String {
    let table = format!("data_{}_{}", shape.storage_name(), kind.storage_name());
    let value_type = value_column_type(kind, shape);
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            {COL_ATTRIBUTE_ID} INTEGER NOT NULL REFERENCES {ATTRIBUTES_TABLE}({COL_ID}),
            {COL_RECORDED_AT} REAL NOT NULL,
            {COL_QUALITY} INTEGER NOT NULL,
            {COL_VALUE_R} {value_type},
            {COL_VALUE_W} {value_type},
            {COL_ERROR_ID} INTEGER REFERENCES {ERROR_MESSAGES_TABLE}({COL_ID})
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_attribute_time
            ON {table} ({COL_ATTRIBUTE_ID}, {COL_RECORDED_AT});\n"
    )
}

/// Returns the DDL batch for every dimension and fact table.
///
/// The batch enumerates the full shape-kind cross product so a fresh
/// database can store any archivable attribute without further DDL.
#[must_use]
pub fn bootstrap_ddl() -> String {
    let mut ddl = format!(
        "CREATE TABLE IF NOT EXISTS {ATTRIBUTES_TABLE} (
            {COL_ID} INTEGER PRIMARY KEY,
            {COL_FULL_NAME} TEXT NOT NULL UNIQUE,
            table_name TEXT NOT NULL,
            control_system TEXT NOT NULL,
            domain TEXT NOT NULL,
            family TEXT NOT NULL,
            member TEXT NOT NULL,
            name TEXT NOT NULL,
            type_id INTEGER NOT NULL,
            format_id INTEGER NOT NULL,
            access_id INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS {ERROR_MESSAGES_TABLE} (
            {COL_ID} INTEGER PRIMARY KEY,
            message TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS {EVENT_TYPES_TABLE} (
            {COL_ID} INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS {HISTORY_EVENTS_TABLE} (
            {COL_ATTRIBUTE_ID} INTEGER NOT NULL REFERENCES {ATTRIBUTES_TABLE}({COL_ID}),
            event_type_id INTEGER NOT NULL REFERENCES {EVENT_TYPES_TABLE}({COL_ID}),
            {COL_RECORDED_AT} REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{HISTORY_EVENTS_TABLE}_attribute_time
            ON {HISTORY_EVENTS_TABLE} ({COL_ATTRIBUTE_ID}, {COL_RECORDED_AT});
        CREATE TABLE IF NOT EXISTS {PARAMETER_EVENTS_TABLE} (
            {COL_ATTRIBUTE_ID} INTEGER NOT NULL REFERENCES {ATTRIBUTES_TABLE}({COL_ID}),
            {COL_RECORDED_AT} REAL NOT NULL,
            label TEXT NOT NULL,
            unit TEXT NOT NULL,
            standard_unit TEXT NOT NULL,
            display_unit TEXT NOT NULL,
            format TEXT NOT NULL,
            archive_rel_change TEXT NOT NULL,
            archive_abs_change TEXT NOT NULL,
            archive_period TEXT NOT NULL,
            description TEXT NOT NULL
        );\n"
    );
    for kind in ValueKind::ALL {
        for shape in ValueShape::ALL {
            let _ = write!(ddl, "{}", data_table_ddl(kind, shape));
        }
    }
    ddl
}

// ============================================================================
// SECTION: Tests
// ============================================================================
