// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for MessageDescriptor.

use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};

/// Builder for creating MessageDescriptor instances.
#[derive(Debug)]
pub struct MessageDescriptorBuilder {
    type_name: String,
    fields: Vec<FieldDescriptor>,
}

impl MessageDescriptorBuilder {
    /// Create a new builder for a message type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a required field.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind));
        self
    }

    /// Add an optional field.
    pub fn optional_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind).optional());
        self
    }

    /// Add a required string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::String)
    }

    /// Add an optional string field.
    pub fn optional_string_field(self, name: impl Into<String>) -> Self {
        self.optional_field(name, FieldKind::String)
    }

    /// Add a raw bytes field.
    pub fn bytes_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Bytes)
    }

    /// Add an open-typed payload carrier field.
    ///
    /// Equivalent to declaring any field and flagging it afterwards with
    /// `SchemaRegistry::mark_dynamic`.
    pub fn dynamic_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Dynamic)
    }

    /// Build the MessageDescriptor.
    pub fn build(self) -> MessageDescriptor {
        MessageDescriptor::new(self.type_name, self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_declaration_order() {
        let desc = MessageDescriptorBuilder::new("Sensor")
            .field("id", FieldKind::U32)
            .field("value", FieldKind::F64)
            .optional_string_field("unit")
            .build();

        assert_eq!(desc.type_name, "Sensor");
        assert_eq!(desc.fields.len(), 3);
        assert_eq!(desc.fields[0].name, "id");
        assert!(desc.fields[2].optional);
    }

    #[test]
    fn test_dynamic_field() {
        let desc = MessageDescriptorBuilder::new("Wrapper")
            .dynamic_field("body")
            .build();
        assert_eq!(desc.fields[0].kind, FieldKind::Dynamic);
    }
}
