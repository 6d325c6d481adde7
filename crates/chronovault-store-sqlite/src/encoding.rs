// chronovault-store-sqlite/src/encoding.rs
// ============================================================================
// Module: Value Encoding
// Description: Scalar bindings and delimited-sequence array codecs.
// Purpose: Map typed value batches onto SQLite column values and back.
// Dependencies: chronovault-core, rusqlite, thiserror
// ============================================================================

//! ## Overview
//! Scalar values bind as native SQLite column values. Array values are
//! stored as a brace-framed, comma-delimited text encoding. String arrays
//! use a distinct quoted encoder: each element is wrapped in double quotes
//! with embedded quotes and backslashes escaped, so element content can
//! never corrupt the outer framing. Numeric and boolean arrays never
//! contain the delimiter and use the plain encoder.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Display;
use std::fmt::Write as _;
use std::str::FromStr;

use chronovault_core::ValueBatch;
use chronovault_core::ValueKind;
use rusqlite::types::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Value encoding and decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// A scalar binding was requested for an empty batch.
    #[error("cannot bind a scalar from an empty value batch")]
    Empty,
    /// An integer value does not fit the storage column.
    #[error("value {value} does not fit the storage column range")]
    OutOfRange {
        /// Display form of the offending value.
        value: String,
    },
    /// The stored text is not a valid sequence encoding.
    #[error("malformed sequence encoding: {0}")]
    Malformed(String),
    /// An element failed to parse as the expected kind.
    #[error("sequence element parse failure: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Scalar Binding
// ============================================================================

/// Returns the first element of a slice or the empty-batch error.
fn first<T>(values: &[T]) -> Result<&T, EncodingError> {
    values.first().ok_or(EncodingError::Empty)
}

/// Binds the first element of the batch as a native SQLite value.
///
/// # Errors
///
/// Returns [`EncodingError::Empty`] for an empty batch and
/// [`EncodingError::OutOfRange`] for an unsigned 64-bit value above the
/// signed column range.
pub fn scalar_value(batch: &ValueBatch) -> Result<Value, EncodingError> {
    match batch {
        ValueBatch::Boolean(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
        ValueBatch::UChar(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
        ValueBatch::Short(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
        ValueBatch::UShort(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
        ValueBatch::Long(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
        ValueBatch::ULong(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
        ValueBatch::Long64(values) => first(values).map(|value| Value::Integer(*value)),
        ValueBatch::ULong64(values) => {
            let value = first(values)?;
            i64::try_from(*value).map(Value::Integer).map_err(|_| EncodingError::OutOfRange {
                value: value.to_string(),
            })
        }
        ValueBatch::Float(values) => first(values).map(|value| Value::Real(f64::from(*value))),
        ValueBatch::Double(values) => first(values).map(|value| Value::Real(*value)),
        ValueBatch::Str(values) => first(values).map(|value| Value::Text(value.clone())),
        ValueBatch::State(values) => first(values).map(|value| Value::Integer(i64::from(*value))),
    }
}

// ============================================================================
// SECTION: Array Encoding
// ============================================================================

/// Encodes a plain sequence whose element text never contains delimiters.
fn plain_sequence<T: Display>(values: &[T]) -> String {
    let mut out = String::from("{");
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        let _ = write!(out, "{value}");
    }
    out.push('}');
    out
}

/// Encodes a string sequence with quoted, escaped elements.
fn quoted_sequence(values: &[String]) -> String {
    let mut out = String::from("{");
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push('"');
        for ch in value.chars() {
            if ch == '"' || ch == '\\' {
                out.push('\\');
            }
            out.push(ch);
        }
        out.push('"');
    }
    out.push('}');
    out
}

/// Encodes the batch as delimited-sequence text for an array column.
#[must_use]
pub fn array_text(batch: &ValueBatch) -> String {
    match batch {
        ValueBatch::Boolean(values) => plain_sequence(values),
        ValueBatch::UChar(values) => plain_sequence(values),
        ValueBatch::Short(values) => plain_sequence(values),
        ValueBatch::UShort(values) => plain_sequence(values),
        ValueBatch::Long(values) => plain_sequence(values),
        ValueBatch::ULong(values) => plain_sequence(values),
        ValueBatch::Long64(values) => plain_sequence(values),
        ValueBatch::ULong64(values) => plain_sequence(values),
        ValueBatch::Float(values) => plain_sequence(values),
        ValueBatch::Double(values) => plain_sequence(values),
        ValueBatch::Str(values) => quoted_sequence(values),
        ValueBatch::State(values) => plain_sequence(values),
    }
}

// ============================================================================
// SECTION: Array Decoding
// ============================================================================

/// Strips the brace framing and returns the inner text.
fn unframe(text: &str) -> Result<&str, EncodingError> {
    text.strip_prefix('{')
        .and_then(|inner| inner.strip_suffix('}'))
        .ok_or_else(|| EncodingError::Malformed(format!("missing sequence braces in: {text}")))
}

/// Parses a plain sequence into typed elements.
fn parse_plain<T>(text: &str) -> Result<Vec<T>, EncodingError>
where
    T: FromStr,
    T::Err: Display,
{
    let inner = unframe(text)?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|element| {
            element.parse::<T>().map_err(|err| EncodingError::Parse(format!("{element}: {err}")))
        })
        .collect()
}

/// Parses a quoted string sequence, honoring escapes.
fn parse_quoted(text: &str) -> Result<Vec<String>, EncodingError> {
    let inner = unframe(text)?;
    let mut values = Vec::new();
    let mut chars = inner.chars();
    loop {
        match chars.next() {
            None => return Ok(values),
            Some('"') => {}
            Some(other) => {
                return Err(EncodingError::Malformed(format!(
                    "expected opening quote, found: {other}"
                )));
            }
        }
        let mut element = String::new();
        loop {
            match chars.next() {
                None => {
                    return Err(EncodingError::Malformed(
                        "unterminated quoted element".to_string(),
                    ));
                }
                Some('\\') => match chars.next() {
                    Some(escaped) => element.push(escaped),
                    None => {
                        return Err(EncodingError::Malformed(
                            "dangling escape in quoted element".to_string(),
                        ));
                    }
                },
                Some('"') => break,
                Some(ch) => element.push(ch),
            }
        }
        values.push(element);
        match chars.next() {
            None => return Ok(values),
            Some(',') => {}
            Some(other) => {
                return Err(EncodingError::Malformed(format!(
                    "expected element separator, found: {other}"
                )));
            }
        }
    }
}

/// Decodes delimited-sequence text back into a typed batch.
///
/// # Errors
///
/// Returns [`EncodingError::Malformed`] for broken framing and
/// [`EncodingError::Parse`] for elements that do not parse as the kind.
pub fn decode_array(kind: ValueKind, text: &str) -> Result<ValueBatch, EncodingError> {
    match kind {
        ValueKind::Boolean => parse_plain(text).map(ValueBatch::Boolean),
        ValueKind::UChar => parse_plain(text).map(ValueBatch::UChar),
        ValueKind::Short => parse_plain(text).map(ValueBatch::Short),
        ValueKind::UShort => parse_plain(text).map(ValueBatch::UShort),
        ValueKind::Long => parse_plain(text).map(ValueBatch::Long),
        ValueKind::ULong => parse_plain(text).map(ValueBatch::ULong),
        ValueKind::Long64 => parse_plain(text).map(ValueBatch::Long64),
        ValueKind::ULong64 => parse_plain(text).map(ValueBatch::ULong64),
        ValueKind::Float => parse_plain(text).map(ValueBatch::Float),
        ValueKind::Double => parse_plain(text).map(ValueBatch::Double),
        ValueKind::Str => parse_quoted(text).map(ValueBatch::Str),
        ValueKind::State => parse_plain(text).map(ValueBatch::State),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
