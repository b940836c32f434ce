// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased message values.
//!
//! A [`DynamicMessage`] is the runtime shape of any registered payload: a
//! type name plus a map of field values. Producers build one (directly or
//! through a [`crate::message::BusMessage`] impl), the codec walks it against
//! the type's compiled layout, and consumers read it back after decode
//! without compile-time knowledge of the concrete type.

use std::collections::HashMap;

use crate::schema::FieldKind;

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Nested message riding a dynamic field (carries its own type tag).
    Message(Box<DynamicMessage>),
    /// Absent optional value.
    Null,
}

impl FieldValue {
    /// Check if value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The field kind this value would be declared as, used for first-use
    /// descriptor inference. `Null` and `Message` values carry no kind.
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Self::Bool(_) => Some(FieldKind::Bool),
            Self::I32(_) => Some(FieldKind::I32),
            Self::I64(_) => Some(FieldKind::I64),
            Self::U32(_) => Some(FieldKind::U32),
            Self::U64(_) => Some(FieldKind::U64),
            Self::F64(_) => Some(FieldKind::F64),
            Self::Str(_) => Some(FieldKind::String),
            Self::Bytes(_) => Some(FieldKind::Bytes),
            Self::Message(_) | Self::Null => None,
        }
    }

    /// Variant name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F64(_) => "f64",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Message(_) => "message",
            Self::Null => "null",
        }
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::U32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as raw bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as nested message.
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Self::Message(v) => Some(v),
            _ => None,
        }
    }
}

// Conversion traits
impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<DynamicMessage> for FieldValue {
    fn from(v: DynamicMessage) -> Self {
        Self::Message(Box::new(v))
    }
}

/// A message value whose concrete type is only known by name.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    type_name: String,
    fields: HashMap<String, FieldValue>,
}

impl DynamicMessage {
    /// Create an empty message of the given type.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: HashMap::new(),
        }
    }

    /// The type identity carried as the wire tag.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set a field value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Set a field value, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Remove and return a field value.
    pub(crate) fn take(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// All field values.
    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    /// Number of set fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_values() {
        let v = FieldValue::from(42u32);
        assert_eq!(v.as_u32(), Some(42));
        assert_eq!(v.as_i32(), None);

        let v = FieldValue::from("hello");
        assert_eq!(v.as_str(), Some("hello"));
        assert_eq!(v.kind(), Some(FieldKind::String));

        assert!(FieldValue::Null.is_null());
        assert_eq!(FieldValue::Null.kind(), None);
    }

    #[test]
    fn test_message_fields() {
        let msg = DynamicMessage::new("Ping").with("id", 7i32).with("ts", 1000i64);
        assert_eq!(msg.type_name(), "Ping");
        assert_eq!(msg.len(), 2);
        assert_eq!(msg.get("id").and_then(FieldValue::as_i32), Some(7));
        assert!(msg.get("missing").is_none());
    }

    #[test]
    fn test_nested_message_value() {
        let inner = DynamicMessage::new("Inner").with("x", 1u32);
        let v = FieldValue::from(inner);
        assert_eq!(v.as_message().map(DynamicMessage::type_name), Some("Inner"));
        assert_eq!(v.kind(), None);
    }

    #[test]
    fn test_set_replaces() {
        let mut msg = DynamicMessage::new("T");
        msg.set("a", 1i32);
        msg.set("a", 2i32);
        assert_eq!(msg.len(), 1);
        assert_eq!(msg.get("a").and_then(FieldValue::as_i32), Some(2));
    }
}
