// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema model: explicit per-type field declarations.
//!
//! There is no runtime property enumeration in Rust, so every serializable
//! type declares its field list up front, either through
//! [`MessageDescriptorBuilder`] or a hand-built [`MessageDescriptor`]. The
//! registry sorts that declared list lexicographically at compile time, which
//! is what lets two independently built processes agree on wire layout
//! without ever exchanging a schema file.

mod builder;
pub mod registry;

pub use builder::MessageDescriptorBuilder;

use crate::error::RegistrationError;

/// Wire kinds a declared field can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    I32,
    I64,
    U32,
    U64,
    F64,
    String,
    Bytes,
    /// Open-typed payload carrier: the encoded bytes for this field are
    /// preceded by a type tag and decoded polymorphically.
    Dynamic,
}

impl FieldKind {
    /// Human-readable kind name, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F64 => "f64",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Dynamic => "dynamic",
        }
    }
}

/// One declared field of a registered message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name; unique within one type.
    pub name: String,
    /// Wire kind.
    pub kind: FieldKind,
    /// Optional fields carry a presence byte on the wire.
    pub optional: bool,
}

impl FieldDescriptor {
    /// Create a required field.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            optional: false,
        }
    }

    /// Mark the field optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

/// A registered message type: identity plus declared field set.
///
/// The `type_name` is the type's stable identity on the wire (the type tag
/// the decoder resolves). Fields are kept in declaration order here; the
/// deterministic lexicographic ordering is produced at compile time by the
/// registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDescriptor {
    /// Fully-qualified type name, e.g. `"acme::Ping"`.
    pub type_name: String,
    /// Declared fields, in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl MessageDescriptor {
    /// Create a descriptor from a declared field list.
    pub fn new(type_name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// Get a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a field's index in declaration order.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Reject descriptors whose field names collide.
    ///
    /// Duplicate names would break the sort-determinism invariant, so they
    /// fail the registration call instead of silently proceeding.
    pub(crate) fn check_unique_fields(&self) -> Result<(), RegistrationError> {
        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(RegistrationError::DuplicateField {
                    type_name: self.type_name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_lookup() {
        let desc = MessageDescriptor::new(
            "Point",
            vec![
                FieldDescriptor::new("x", FieldKind::I32),
                FieldDescriptor::new("y", FieldKind::I32),
            ],
        );
        assert!(desc.field("x").is_some());
        assert_eq!(desc.field_index("y"), Some(1));
        assert!(desc.field("z").is_none());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let desc = MessageDescriptor::new(
            "Bad",
            vec![
                FieldDescriptor::new("id", FieldKind::U32),
                FieldDescriptor::new("id", FieldKind::I64),
            ],
        );
        let err = desc.check_unique_fields().unwrap_err();
        assert_eq!(
            err,
            RegistrationError::DuplicateField {
                type_name: "Bad".into(),
                field: "id".into()
            }
        );
    }

    #[test]
    fn test_optional_flag() {
        let field = FieldDescriptor::new("note", FieldKind::String).optional();
        assert!(field.optional);
        assert_eq!(field.kind.name(), "string");
    }
}
