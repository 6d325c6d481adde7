// chronovault-core/src/core/sample.rs
// ============================================================================
// Module: Event Payloads
// Description: Typed value batches, quality flags, and parameter metadata.
// Purpose: Carry event data across the archive store boundary.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Data events carry optional read and write values as a [`ValueBatch`]: a
//! closed sum of typed vectors matching the [`ValueKind`] enumeration. A
//! scalar event is a batch of length one; an empty batch is stored as NULL,
//! never as an empty sequence. Parameter events carry the nine descriptive
//! metadata strings of an attribute snapshot.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::traits::ValueKind;

// ============================================================================
// SECTION: Quality
// ============================================================================

/// Quality flag attached to every data event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// Value is valid.
    Valid,
    /// Value is invalid.
    Invalid,
    /// Value is in an alarm range.
    Alarm,
    /// Value is changing.
    Changing,
    /// Value is in a warning range.
    Warning,
}

impl Quality {
    /// Returns the stable numeric code stored in fact rows.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Valid => 0,
            Self::Invalid => 1,
            Self::Alarm => 2,
            Self::Changing => 3,
            Self::Warning => 4,
        }
    }

    /// Decodes a stored code back into a quality flag.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Valid),
            1 => Some(Self::Invalid),
            2 => Some(Self::Alarm),
            3 => Some(Self::Changing),
            4 => Some(Self::Warning),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Value Batch
// ============================================================================

/// Ordered sequence of typed values for one side of a data event.
///
/// The variant must agree with the [`ValueKind`] of the attribute's traits;
/// the gateway rejects mismatches before touching storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueBatch {
    /// Boolean elements.
    Boolean(Vec<bool>),
    /// Unsigned 8-bit elements.
    UChar(Vec<u8>),
    /// Signed 16-bit elements.
    Short(Vec<i16>),
    /// Unsigned 16-bit elements.
    UShort(Vec<u16>),
    /// Signed 32-bit elements.
    Long(Vec<i32>),
    /// Unsigned 32-bit elements.
    ULong(Vec<u32>),
    /// Signed 64-bit elements.
    Long64(Vec<i64>),
    /// Unsigned 64-bit elements.
    ULong64(Vec<u64>),
    /// Single-precision floating point elements.
    Float(Vec<f32>),
    /// Double-precision floating point elements.
    Double(Vec<f64>),
    /// String elements.
    Str(Vec<String>),
    /// Enumerated device state codes.
    State(Vec<i32>),
}

impl ValueBatch {
    /// Returns the value kind this batch carries.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Boolean(_) => ValueKind::Boolean,
            Self::UChar(_) => ValueKind::UChar,
            Self::Short(_) => ValueKind::Short,
            Self::UShort(_) => ValueKind::UShort,
            Self::Long(_) => ValueKind::Long,
            Self::ULong(_) => ValueKind::ULong,
            Self::Long64(_) => ValueKind::Long64,
            Self::ULong64(_) => ValueKind::ULong64,
            Self::Float(_) => ValueKind::Float,
            Self::Double(_) => ValueKind::Double,
            Self::Str(_) => ValueKind::Str,
            Self::State(_) => ValueKind::State,
        }
    }

    /// Returns the number of elements in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(values) => values.len(),
            Self::UChar(values) => values.len(),
            Self::Short(values) => values.len(),
            Self::UShort(values) => values.len(),
            Self::Long(values) => values.len(),
            Self::ULong(values) => values.len(),
            Self::Long64(values) => values.len(),
            Self::ULong64(values) => values.len(),
            Self::Float(values) => values.len(),
            Self::Double(values) => values.len(),
            Self::Str(values) => values.len(),
            Self::State(values) => values.len(),
        }
    }

    /// Returns true when the batch carries no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: Parameter Metadata
// ============================================================================

/// Descriptive metadata strings captured by a parameter snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    /// Display label.
    pub label: String,
    /// Engineering unit.
    pub unit: String,
    /// Standard unit conversion factor.
    pub standard_unit: String,
    /// Display unit conversion factor.
    pub display_unit: String,
    /// Display format string.
    pub format: String,
    /// Relative-change archiving threshold.
    pub archive_rel_change: String,
    /// Absolute-change archiving threshold.
    pub archive_abs_change: String,
    /// Periodic archiving interval.
    pub archive_period: String,
    /// Free-form description.
    pub description: String,
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::Quality;
    use super::ValueBatch;
    use crate::core::traits::ValueKind;

    #[test]
    fn quality_codes_round_trip() {
        for quality in [
            Quality::Valid,
            Quality::Invalid,
            Quality::Alarm,
            Quality::Changing,
            Quality::Warning,
        ] {
            assert_eq!(Quality::from_code(quality.code()), Some(quality));
        }
        assert_eq!(Quality::from_code(5), None);
    }

    #[test]
    fn batch_reports_kind_and_length() {
        let batch = ValueBatch::Double(vec![1.5, 2.5]);
        assert_eq!(batch.kind(), ValueKind::Double);
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_empty());
        assert!(ValueBatch::Str(Vec::new()).is_empty());
    }
}
