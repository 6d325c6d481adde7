// chronovault-core/src/core/attribute.rs
// ============================================================================
// Module: Attribute Identity
// Description: Fully-qualified attribute names and surrogate identifiers.
// Purpose: Provide the identity types referenced by every archive operation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An attribute is identified by its case-sensitive fully-qualified name.
//! The hierarchical parts (control system, domain, family, member, leaf
//! name) are stored alongside the identity in the catalog for query
//! convenience. Surrogate identifiers are assigned by the store on first
//! insert and never change.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Surrogate Identifier
// ============================================================================

/// Store-assigned surrogate identifier for a catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeId(i64);

impl AttributeId {
    /// Wraps a raw identifier assigned by the store.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Attribute Name
// ============================================================================

/// Fully-qualified attribute identity with its hierarchy parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeName {
    /// Fully-qualified name, unique and case-sensitive.
    pub full_name: String,
    /// Owning control system name.
    pub control_system: String,
    /// Hierarchy domain part.
    pub domain: String,
    /// Hierarchy family part.
    pub family: String,
    /// Hierarchy member part.
    pub member: String,
    /// Leaf attribute name.
    pub name: String,
}

impl AttributeName {
    /// Builds an identity from its parts, deriving the fully-qualified name.
    #[must_use]
    pub fn from_parts(
        control_system: impl Into<String>,
        domain: impl Into<String>,
        family: impl Into<String>,
        member: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let control_system = control_system.into();
        let domain = domain.into();
        let family = family.into();
        let member = member.into();
        let name = name.into();
        let full_name = format!("{control_system}/{domain}/{family}/{member}/{name}");
        Self {
            full_name,
            control_system,
            domain,
            family,
            member,
            name,
        }
    }

    /// Returns true when every identity field is non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.full_name.is_empty()
            && !self.control_system.is_empty()
            && !self.domain.is_empty()
            && !self.family.is_empty()
            && !self.member.is_empty()
            && !self.name.is_empty()
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::AttributeName;

    #[test]
    fn from_parts_derives_full_name() {
        let name = AttributeName::from_parts("cs1", "sector", "vacuum", "pump-01", "pressure");
        assert_eq!(name.full_name, "cs1/sector/vacuum/pump-01/pressure");
        assert!(name.is_complete());
    }

    #[test]
    fn incomplete_identity_is_detected() {
        let mut name = AttributeName::from_parts("cs1", "sector", "vacuum", "pump-01", "pressure");
        name.member.clear();
        assert!(!name.is_complete());
    }
}
