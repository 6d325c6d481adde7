// chronovault-core/src/core/traits.rs
// ============================================================================
// Module: Attribute Traits
// Description: Closed classification of archived values.
// Purpose: Select physical storage layout from value kind, shape, and access.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every archived value is classified by an immutable [`AttributeTraits`]
//! triple: value kind, shape, and access direction. The cross product
//! deterministically names one physical fact table and one family of
//! statements, so independently created gateways referring to the same
//! schema agree without coordination. All three dimensions are closed enums;
//! dispatch over them is always an exhaustive `match`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Value Kind
// ============================================================================

/// Scalar primitive kind of an archived value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Boolean flag.
    Boolean,
    /// Unsigned 8-bit integer.
    UChar,
    /// Signed 16-bit integer.
    Short,
    /// Unsigned 16-bit integer.
    UShort,
    /// Signed 32-bit integer.
    Long,
    /// Unsigned 32-bit integer.
    ULong,
    /// Signed 64-bit integer.
    Long64,
    /// Unsigned 64-bit integer.
    ULong64,
    /// Single-precision floating point.
    Float,
    /// Double-precision floating point.
    Double,
    /// UTF-8 string.
    Str,
    /// Enumerated device state code.
    State,
}

impl ValueKind {
    /// All value kinds, in stable storage-code order.
    pub const ALL: [Self; 12] = [
        Self::Boolean,
        Self::UChar,
        Self::Short,
        Self::UShort,
        Self::Long,
        Self::ULong,
        Self::Long64,
        Self::ULong64,
        Self::Float,
        Self::Double,
        Self::Str,
        Self::State,
    ];

    /// Returns the storage-identifier fragment used in table and statement
    /// names.
    #[must_use]
    pub const fn storage_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::UChar => "uchar",
            Self::Short => "short",
            Self::UShort => "ushort",
            Self::Long => "long",
            Self::ULong => "ulong",
            Self::Long64 => "long64",
            Self::ULong64 => "ulong64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Str => "string",
            Self::State => "state",
        }
    }

    /// Returns the stable numeric code stored in the attribute catalog.
    #[must_use]
    pub const fn type_id(self) -> u32 {
        match self {
            Self::Boolean => 1,
            Self::UChar => 2,
            Self::Short => 3,
            Self::UShort => 4,
            Self::Long => 5,
            Self::ULong => 6,
            Self::Long64 => 7,
            Self::ULong64 => 8,
            Self::Float => 9,
            Self::Double => 10,
            Self::Str => 11,
            Self::State => 12,
        }
    }

    /// Decodes a stored catalog code back into a value kind.
    #[must_use]
    pub const fn from_type_id(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Boolean),
            2 => Some(Self::UChar),
            3 => Some(Self::Short),
            4 => Some(Self::UShort),
            5 => Some(Self::Long),
            6 => Some(Self::ULong),
            7 => Some(Self::Long64),
            8 => Some(Self::ULong64),
            9 => Some(Self::Float),
            10 => Some(Self::Double),
            11 => Some(Self::Str),
            12 => Some(Self::State),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

// ============================================================================
// SECTION: Value Shape
// ============================================================================

/// Shape of an archived value: a single element or an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// Single element per event.
    Scalar,
    /// Ordered sequence of elements per event.
    Array,
}

impl ValueShape {
    /// All shapes, in stable storage-code order.
    pub const ALL: [Self; 2] = [Self::Scalar, Self::Array];

    /// Returns the storage-identifier fragment used in table and statement
    /// names.
    #[must_use]
    pub const fn storage_name(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Array => "array",
        }
    }

    /// Returns the stable numeric code stored in the attribute catalog.
    #[must_use]
    pub const fn format_id(self) -> u32 {
        match self {
            Self::Scalar => 1,
            Self::Array => 2,
        }
    }

    /// Decodes a stored catalog code back into a shape.
    #[must_use]
    pub const fn from_format_id(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Scalar),
            2 => Some(Self::Array),
            _ => None,
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

// ============================================================================
// SECTION: Access Mode
// ============================================================================

/// Access direction of an archived attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Read-only: events carry a read value.
    Read,
    /// Write-only: events carry a write value.
    Write,
    /// Read-write: events carry both values.
    ReadWrite,
    /// Read with write set point: events carry both values.
    ReadWithWrite,
}

impl AccessMode {
    /// All access modes, in stable storage-code order.
    pub const ALL: [Self; 4] = [Self::Read, Self::Write, Self::ReadWrite, Self::ReadWithWrite];

    /// Returns the storage-identifier fragment used in statement names.
    #[must_use]
    pub const fn storage_name(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::ReadWrite => "read_write",
            Self::ReadWithWrite => "read_with_write",
        }
    }

    /// Returns the stable numeric code stored in the attribute catalog.
    #[must_use]
    pub const fn access_id(self) -> u32 {
        match self {
            Self::Read => 1,
            Self::Write => 2,
            Self::ReadWrite => 3,
            Self::ReadWithWrite => 4,
        }
    }

    /// Decodes a stored catalog code back into an access mode.
    #[must_use]
    pub const fn from_access_id(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            3 => Some(Self::ReadWrite),
            4 => Some(Self::ReadWithWrite),
            _ => None,
        }
    }

    /// Returns true when events under this mode carry a read value.
    #[must_use]
    pub const fn has_read_data(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite | Self::ReadWithWrite)
    }

    /// Returns true when events under this mode carry a write value.
    #[must_use]
    pub const fn has_write_data(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite | Self::ReadWithWrite)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_name())
    }
}

// ============================================================================
// SECTION: Attribute Traits
// ============================================================================

/// Immutable classification triple for an archived attribute.
///
/// The traits of an attribute are fixed at `store_attribute` time and select
/// the physical fact table its data events land in for its entire lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeTraits {
    /// Scalar primitive kind of the value.
    kind: ValueKind,
    /// Scalar or array shape.
    shape: ValueShape,
    /// Access direction.
    access: AccessMode,
}

impl AttributeTraits {
    /// Creates a new traits triple.
    #[must_use]
    pub const fn new(kind: ValueKind, shape: ValueShape, access: AccessMode) -> Self {
        Self {
            kind,
            shape,
            access,
        }
    }

    /// Decodes catalog codes back into a traits triple.
    #[must_use]
    pub const fn from_codes(type_id: u32, format_id: u32, access_id: u32) -> Option<Self> {
        match (
            ValueKind::from_type_id(type_id),
            ValueShape::from_format_id(format_id),
            AccessMode::from_access_id(access_id),
        ) {
            (Some(kind), Some(shape), Some(access)) => Some(Self::new(kind, shape, access)),
            _ => None,
        }
    }

    /// Returns the value kind.
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        self.kind
    }

    /// Returns the shape.
    #[must_use]
    pub const fn shape(self) -> ValueShape {
        self.shape
    }

    /// Returns the access mode.
    #[must_use]
    pub const fn access(self) -> AccessMode {
        self.access
    }

    /// Returns true for scalar-shaped traits.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(self.shape, ValueShape::Scalar)
    }

    /// Returns true for array-shaped traits.
    #[must_use]
    pub const fn is_array(self) -> bool {
        matches!(self.shape, ValueShape::Array)
    }

    /// Returns true when events carry a read value.
    #[must_use]
    pub const fn has_read_data(self) -> bool {
        self.access.has_read_data()
    }

    /// Returns true when events carry a write value.
    #[must_use]
    pub const fn has_write_data(self) -> bool {
        self.access.has_write_data()
    }

    /// Returns the storage-identifier form, e.g. `scalar_double`.
    ///
    /// The access direction is deliberately absent: it selects statement
    /// variants, not the physical table.
    #[must_use]
    pub fn storage_id(self) -> String {
        format!("{}_{}", self.shape.storage_name(), self.kind.storage_name())
    }
}

impl fmt::Display for AttributeTraits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.shape, self.kind, self.access)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
