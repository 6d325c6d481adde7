// chronovault-store-sqlite/tests/sqlite_gateway.rs
// ============================================================================
// Module: SQLite Gateway Tests
// Description: Validate the SQLite ArchiveStore end to end.
// Purpose: Ensure guard checks, dedup, and value round-trips hold on disk.
// Dependencies: chronovault-store-sqlite, chronovault-core, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Conformance tests for the SQLite archive gateway. Fact and dimension
//! rows are verified through an independent raw connection so the tests do
//! not trust the gateway's own read paths.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;

use chronovault_core::AccessMode;
use chronovault_core::ArchiveError;
use chronovault_core::ArchiveStore;
use chronovault_core::AttributeName;
use chronovault_core::AttributeTraits;
use chronovault_core::DiagnosticLevel;
use chronovault_core::MemoryDiagnosticSink;
use chronovault_core::ParameterMetadata;
use chronovault_core::Quality;
use chronovault_core::SharedDiagnosticSink;
use chronovault_core::ValueBatch;
use chronovault_core::ValueKind;
use chronovault_core::ValueShape;
use chronovault_store_sqlite::SqliteArchiveGateway;
use chronovault_store_sqlite::SqliteGatewayConfig;
use chronovault_store_sqlite::encoding::decode_array;
use rusqlite::Connection;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn test_attribute() -> AttributeName {
    AttributeName::from_parts("cs1", "sector", "vacuum", "pump-01", "pressure")
}

fn scalar_double_read() -> AttributeTraits {
    AttributeTraits::new(ValueKind::Double, ValueShape::Scalar, AccessMode::Read)
}

fn gateway() -> SqliteArchiveGateway {
    SqliteArchiveGateway::new(SqliteGatewayConfig::default(), SharedDiagnosticSink::disabled())
}

fn connected_gateway(path: &Path) -> SqliteArchiveGateway {
    let gateway = gateway();
    gateway.connect(&path.display().to_string()).unwrap();
    gateway
}

fn raw_connection(path: &Path) -> Connection {
    Connection::open(path).unwrap()
}

fn sample_metadata() -> ParameterMetadata {
    ParameterMetadata {
        label: "Pressure".to_string(),
        unit: "mbar".to_string(),
        standard_unit: "1.0".to_string(),
        display_unit: "1.0".to_string(),
        format: "%6.2f".to_string(),
        archive_rel_change: "1".to_string(),
        archive_abs_change: "0.1".to_string(),
        archive_period: "10000".to_string(),
        description: "Chamber pressure".to_string(),
    }
}

// ============================================================================
// SECTION: Connection Tests
// ============================================================================

#[test]
fn connect_opens_and_disconnect_closes() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = gateway();
    assert!(gateway.is_closed());
    gateway.connect(&path.display().to_string()).unwrap();
    assert!(gateway.is_open());
    gateway.disconnect().unwrap();
    assert!(gateway.is_closed());
    gateway.disconnect().unwrap();
}

#[test]
fn invalid_path_fails_with_a_connection_error() {
    let gateway = gateway();
    let err = gateway.connect("/nonexistent-directory/archive.sqlite").unwrap_err();
    assert!(matches!(err, ArchiveError::Connection(_)));
    assert!(gateway.is_closed());
}

#[test]
fn every_operation_fails_on_a_disconnected_gateway() {
    let gateway = gateway();
    let name = test_attribute();
    let traits = scalar_double_read();
    let check = |result: Result<(), ArchiveError>| {
        assert!(matches!(result, Err(ArchiveError::Connection(_))));
    };
    check(gateway.store_attribute(&name, traits).map(drop));
    check(gateway.store_history_event(&name.full_name, "started"));
    check(gateway.store_parameter_event(&name.full_name, 1.0, &sample_metadata()));
    check(gateway.store_data_event(&name.full_name, 1.0, Quality::Valid, None, None, traits));
    check(gateway.store_data_event_error(&name.full_name, 1.0, Quality::Invalid, "boom", traits));
    check(gateway.fetch_last_history_event(&name.full_name).map(drop));
    check(gateway.fetch_attribute_archived(&name.full_name).map(drop));
    check(gateway.fetch_attribute_traits(&name.full_name).map(drop));
}

#[test]
fn unsupported_schema_version_fails_closed() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    {
        let conn = raw_connection(&path);
        conn.execute_batch(
            "CREATE TABLE archive_meta (version INTEGER NOT NULL);
             INSERT INTO archive_meta (version) VALUES (99);",
        )
        .unwrap();
    }
    let gateway = gateway();
    let err = gateway.connect(&path.display().to_string()).unwrap_err();
    assert!(matches!(err, ArchiveError::Connection(_)));
}

// ============================================================================
// SECTION: Attribute Tests
// ============================================================================

#[test]
fn stored_attribute_is_archived_and_unique() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    let id = gateway.store_attribute(&name, scalar_double_read()).unwrap();
    assert!(gateway.fetch_attribute_archived(&name.full_name).unwrap());
    assert!(!gateway.fetch_attribute_archived("cs1/a/b/c/d").unwrap());

    let conn = raw_connection(&path);
    let (full_name, table_name, type_id): (String, String, u32) = conn
        .query_row(
            "SELECT full_name, table_name, type_id FROM attributes WHERE id = ?1",
            [id.raw()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(full_name, name.full_name);
    assert_eq!(table_name, "data_scalar_double");
    assert_eq!(type_id, ValueKind::Double.type_id());

    let err = gateway.store_attribute(&name, scalar_double_read()).unwrap_err();
    assert!(matches!(err, ArchiveError::Consistency(_)));
}

#[test]
fn incomplete_identity_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let mut name = test_attribute();
    name.domain.clear();
    let err = gateway.store_attribute(&name, scalar_double_read()).unwrap_err();
    assert!(matches!(err, ArchiveError::Consistency(_)));
}

#[test]
fn attribute_traits_round_trip_through_the_catalog() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    let traits =
        AttributeTraits::new(ValueKind::ULong64, ValueShape::Array, AccessMode::ReadWithWrite);
    gateway.store_attribute(&name, traits).unwrap();
    assert_eq!(gateway.fetch_attribute_traits(&name.full_name).unwrap(), traits);

    let err = gateway.fetch_attribute_traits("cs1/a/b/c/d").unwrap_err();
    assert!(matches!(err, ArchiveError::Consistency(_)));
}

// ============================================================================
// SECTION: History Tests
// ============================================================================

#[test]
fn repeated_history_events_share_one_event_type_row() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    gateway.store_history_event(&name.full_name, "start").unwrap();
    gateway.store_history_event(&name.full_name, "start").unwrap();

    let conn = raw_connection(&path);
    let history_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM history_events", [], |row| row.get(0))
        .unwrap();
    let event_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM event_types", [], |row| row.get(0)).unwrap();
    let distinct_ids: i64 = conn
        .query_row("SELECT COUNT(DISTINCT event_type_id) FROM history_events", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(history_rows, 2);
    assert_eq!(event_rows, 1);
    assert_eq!(distinct_ids, 1);
    assert_eq!(
        gateway.fetch_last_history_event(&name.full_name).unwrap(),
        Some("start".to_string())
    );
}

#[test]
fn last_history_event_tracks_insertion_order() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    gateway.store_history_event(&name.full_name, "add").unwrap();
    gateway.store_history_event(&name.full_name, "pause").unwrap();
    gateway.store_history_event(&name.full_name, "start").unwrap();
    assert_eq!(
        gateway.fetch_last_history_event(&name.full_name).unwrap(),
        Some("start".to_string())
    );
}

#[test]
fn attribute_without_history_yields_none() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    assert_eq!(gateway.fetch_last_history_event(&name.full_name).unwrap(), None);
}

#[test]
fn history_for_an_unknown_attribute_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let err = gateway.store_history_event("cs1/a/b/c/d", "start").unwrap_err();
    assert!(matches!(err, ArchiveError::Consistency(_)));
}

// ============================================================================
// SECTION: Data Event Tests
// ============================================================================

#[test]
fn scalar_double_read_value_round_trips_within_tolerance() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    gateway
        .store_data_event(
            &name.full_name,
            1700000000.25,
            Quality::Valid,
            Some(ValueBatch::Double(vec![3.14])),
            None,
            scalar_double_read(),
        )
        .unwrap();

    let conn = raw_connection(&path);
    let (value_r, quality, error_id): (f64, i64, Option<i64>) = conn
        .query_row(
            "SELECT value_r, quality, error_id FROM data_scalar_double",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert!((value_r - 3.14).abs() <= 3.14 * 0.0001);
    assert_eq!(quality, Quality::Valid.code());
    assert_eq!(error_id, None);
}

#[test]
fn empty_batches_are_stored_as_null_columns() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    let traits =
        AttributeTraits::new(ValueKind::Double, ValueShape::Array, AccessMode::ReadWrite);
    gateway.store_attribute(&name, traits).unwrap();
    gateway
        .store_data_event(
            &name.full_name,
            2.0,
            Quality::Invalid,
            Some(ValueBatch::Double(Vec::new())),
            None,
            traits,
        )
        .unwrap();

    let conn = raw_connection(&path);
    let (value_r, value_w): (Option<String>, Option<String>) = conn
        .query_row("SELECT value_r, value_w FROM data_array_double", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(value_r, None);
    assert_eq!(value_w, None);
}

#[test]
fn array_values_round_trip_through_the_sequence_encoding() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    let traits =
        AttributeTraits::new(ValueKind::Double, ValueShape::Array, AccessMode::ReadWrite);
    gateway.store_attribute(&name, traits).unwrap();
    let read = ValueBatch::Double(vec![1.5, -2.25, 3.0e-9]);
    let write = ValueBatch::Double(vec![0.25]);
    gateway
        .store_data_event(
            &name.full_name,
            3.0,
            Quality::Valid,
            Some(read.clone()),
            Some(write.clone()),
            traits,
        )
        .unwrap();

    let conn = raw_connection(&path);
    let (value_r, value_w): (String, String) = conn
        .query_row("SELECT value_r, value_w FROM data_array_double", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(decode_array(ValueKind::Double, &value_r).unwrap(), read);
    assert_eq!(decode_array(ValueKind::Double, &value_w).unwrap(), write);
}

#[test]
fn string_arrays_with_delimiters_survive_storage() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    let traits = AttributeTraits::new(ValueKind::Str, ValueShape::Array, AccessMode::Read);
    gateway.store_attribute(&name, traits).unwrap();
    let read = ValueBatch::Str(vec![
        "plain".to_string(),
        "with,comma".to_string(),
        "with\"quote".to_string(),
        "with}brace".to_string(),
    ]);
    gateway
        .store_data_event(&name.full_name, 4.0, Quality::Valid, Some(read.clone()), None, traits)
        .unwrap();

    let conn = raw_connection(&path);
    let value_r: String = conn
        .query_row("SELECT value_r FROM data_array_string", [], |row| row.get(0))
        .unwrap();
    assert_eq!(decode_array(ValueKind::Str, &value_r).unwrap(), read);
}

#[test]
fn write_only_traits_bind_the_write_column() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    let traits = AttributeTraits::new(ValueKind::Long, ValueShape::Scalar, AccessMode::Write);
    gateway.store_attribute(&name, traits).unwrap();
    gateway
        .store_data_event(
            &name.full_name,
            5.0,
            Quality::Valid,
            None,
            Some(ValueBatch::Long(vec![42])),
            traits,
        )
        .unwrap();

    let conn = raw_connection(&path);
    let (value_r, value_w): (Option<i64>, Option<i64>) = conn
        .query_row("SELECT value_r, value_w FROM data_scalar_long", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!(value_r, None);
    assert_eq!(value_w, Some(42));
}

#[test]
fn mismatched_batch_kind_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    let err = gateway
        .store_data_event(
            &name.full_name,
            6.0,
            Quality::Valid,
            Some(ValueBatch::Long(vec![4])),
            None,
            scalar_double_read(),
        )
        .unwrap_err();
    assert!(matches!(err, ArchiveError::Consistency(_)));

    let conn = raw_connection(&path);
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM data_scalar_double", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn repeated_error_messages_share_one_error_row() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    gateway
        .store_data_event_error(
            &name.full_name,
            1.0,
            Quality::Invalid,
            "sensor fault",
            scalar_double_read(),
        )
        .unwrap();
    gateway
        .store_data_event_error(
            &name.full_name,
            2.0,
            Quality::Invalid,
            "sensor fault",
            scalar_double_read(),
        )
        .unwrap();

    let conn = raw_connection(&path);
    let error_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM error_messages", [], |row| row.get(0)).unwrap();
    let (fact_rows, distinct_error_ids): (i64, i64) = conn
        .query_row(
            "SELECT COUNT(*), COUNT(DISTINCT error_id) FROM data_scalar_double",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    let null_values: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM data_scalar_double WHERE value_r IS NULL",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(error_rows, 1);
    assert_eq!(fact_rows, 2);
    assert_eq!(distinct_error_ids, 1);
    assert_eq!(null_values, 2);
}

// ============================================================================
// SECTION: Parameter Tests
// ============================================================================

#[test]
fn parameter_snapshots_accumulate_without_dedup() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let gateway = connected_gateway(&path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
    let metadata = sample_metadata();
    gateway.store_parameter_event(&name.full_name, 1.0, &metadata).unwrap();
    gateway.store_parameter_event(&name.full_name, 2.0, &metadata).unwrap();

    let conn = raw_connection(&path);
    let (rows, label): (i64, String) = conn
        .query_row(
            "SELECT COUNT(*), MAX(label) FROM parameter_events",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(rows, 2);
    assert_eq!(label, "Pressure");
}

// ============================================================================
// SECTION: Reconnect Tests
// ============================================================================

#[test]
fn a_fresh_gateway_resolves_existing_rows_by_read_through() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let name = test_attribute();
    {
        let first = connected_gateway(&path);
        first.store_attribute(&name, scalar_double_read()).unwrap();
        first.store_history_event(&name.full_name, "start").unwrap();
        first.disconnect().unwrap();
    }

    let second = connected_gateway(&path);
    assert!(second.fetch_attribute_archived(&name.full_name).unwrap());
    let err = second.store_attribute(&name, scalar_double_read()).unwrap_err();
    assert!(matches!(err, ArchiveError::Consistency(_)));
    second.store_history_event(&name.full_name, "start").unwrap();

    let conn = raw_connection(&path);
    let event_rows: i64 =
        conn.query_row("SELECT COUNT(*) FROM event_types", [], |row| row.get(0)).unwrap();
    let history_rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM history_events", [], |row| row.get(0))
        .unwrap();
    assert_eq!(event_rows, 1);
    assert_eq!(history_rows, 2);
}

#[test]
fn reconnect_replaces_the_previous_connection() {
    let temp = TempDir::new().unwrap();
    let first_path = temp.path().join("first.sqlite");
    let second_path = temp.path().join("second.sqlite");
    let gateway = connected_gateway(&first_path);
    let name = test_attribute();
    gateway.store_attribute(&name, scalar_double_read()).unwrap();

    gateway.connect(&second_path.display().to_string()).unwrap();
    assert!(gateway.is_open());
    // The second database is empty; the caches were cleared on reconnect.
    assert!(!gateway.fetch_attribute_archived(&name.full_name).unwrap());
    gateway.store_attribute(&name, scalar_double_read()).unwrap();
}

// ============================================================================
// SECTION: Diagnostics Tests
// ============================================================================

#[test]
fn gateway_reports_through_the_injected_sink() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("archive.sqlite");
    let memory = MemoryDiagnosticSink::new();
    let gateway = SqliteArchiveGateway::new(
        SqliteGatewayConfig::default(),
        SharedDiagnosticSink::from_sink(memory.clone()),
    );
    gateway.connect(&path.display().to_string()).unwrap();
    gateway.store_attribute(&test_attribute(), scalar_double_read()).unwrap();

    let records = memory.records();
    assert!(records.iter().any(|record| {
        record.level == DiagnosticLevel::Debug && record.message.contains("connected")
    }));
    assert!(records.iter().any(|record| {
        record.statement.as_deref() == Some("store_attribute")
            && record.message.contains("registered prepared statement")
    }));
}
