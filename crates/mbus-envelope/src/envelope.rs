// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The envelope: fixed-shape wrapper record carrying one application payload
//! plus message metadata, the unit actually placed on the wire.
//!
//! The fixed field set below is an external versioned contract. On the wire
//! the fields appear in lexicographic order (the envelope is an ordinary
//! registered type compiled like any other), which puts the payload slot
//! `message` at index 4:
//!
//! ```text
//! conversation_id, correlation_id, destination_address, fault_address,
//! message, message_id, request_id, response_address, retry_count,
//! source_address
//! ```
//!
//! An envelope is a value: built fresh per send, decoded fresh per receive,
//! never mutated after construction.

use crate::error::DecodeError;
use crate::schema::{FieldKind, MessageDescriptor, MessageDescriptorBuilder};
use crate::value::{DynamicMessage, FieldValue};

/// Registered type identity of the envelope itself.
pub const TYPE_NAME: &str = "mbus::Envelope";

/// Name of the open-typed payload slot.
pub const PAYLOAD_FIELD: &str = "message";

/// The wire unit: message metadata plus one open-typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub conversation_id: Option<String>,
    pub correlation_id: Option<String>,
    pub destination_address: Option<String>,
    pub fault_address: Option<String>,
    /// The application payload; its concrete type travels as a wire tag.
    pub message: DynamicMessage,
    pub message_id: Option<String>,
    pub request_id: Option<String>,
    pub response_address: Option<String>,
    pub retry_count: i32,
    pub source_address: Option<String>,
}

impl Envelope {
    /// Create an envelope around a payload, with empty metadata.
    pub fn new(message: DynamicMessage) -> Self {
        Self {
            conversation_id: None,
            correlation_id: None,
            destination_address: None,
            fault_address: None,
            message,
            message_id: None,
            request_id: None,
            response_address: None,
            retry_count: 0,
            source_address: None,
        }
    }

    pub fn with_conversation_id(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_destination_address(mut self, address: impl Into<String>) -> Self {
        self.destination_address = Some(address.into());
        self
    }

    pub fn with_fault_address(mut self, address: impl Into<String>) -> Self {
        self.fault_address = Some(address.into());
        self
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    pub fn with_response_address(mut self, address: impl Into<String>) -> Self {
        self.response_address = Some(address.into());
        self
    }

    pub fn with_retry_count(mut self, count: i32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn with_source_address(mut self, address: impl Into<String>) -> Self {
        self.source_address = Some(address.into());
        self
    }

    /// The envelope's own schema descriptor.
    ///
    /// `message` is declared like any other field; the codec flags it as the
    /// dynamic carrier through `SchemaRegistry::mark_dynamic` at setup.
    pub fn descriptor() -> MessageDescriptor {
        MessageDescriptorBuilder::new(TYPE_NAME)
            .optional_string_field("conversation_id")
            .optional_string_field("correlation_id")
            .optional_string_field("destination_address")
            .optional_string_field("fault_address")
            .dynamic_field(PAYLOAD_FIELD)
            .optional_string_field("message_id")
            .optional_string_field("request_id")
            .optional_string_field("response_address")
            .field("retry_count", FieldKind::I32)
            .optional_string_field("source_address")
            .build()
    }

    /// Flatten to a field map for the generic codec walk.
    pub(crate) fn to_fields(&self) -> DynamicMessage {
        let mut fields = DynamicMessage::new(TYPE_NAME);
        set_opt(&mut fields, "conversation_id", &self.conversation_id);
        set_opt(&mut fields, "correlation_id", &self.correlation_id);
        set_opt(&mut fields, "destination_address", &self.destination_address);
        set_opt(&mut fields, "fault_address", &self.fault_address);
        fields.set(PAYLOAD_FIELD, self.message.clone());
        set_opt(&mut fields, "message_id", &self.message_id);
        set_opt(&mut fields, "request_id", &self.request_id);
        set_opt(&mut fields, "response_address", &self.response_address);
        fields.set("retry_count", self.retry_count);
        set_opt(&mut fields, "source_address", &self.source_address);
        fields
    }

    /// Rebuild from a decoded field map.
    pub(crate) fn from_fields(mut fields: DynamicMessage) -> Result<Self, DecodeError> {
        let message = match fields.take(PAYLOAD_FIELD) {
            Some(FieldValue::Message(inner)) => *inner,
            _ => return Err(DecodeError::NullPayload),
        };
        Ok(Self {
            conversation_id: take_opt_string(&mut fields, "conversation_id")?,
            correlation_id: take_opt_string(&mut fields, "correlation_id")?,
            destination_address: take_opt_string(&mut fields, "destination_address")?,
            fault_address: take_opt_string(&mut fields, "fault_address")?,
            message,
            message_id: take_opt_string(&mut fields, "message_id")?,
            request_id: take_opt_string(&mut fields, "request_id")?,
            response_address: take_opt_string(&mut fields, "response_address")?,
            retry_count: match fields.take("retry_count") {
                Some(FieldValue::I32(v)) => v,
                other => {
                    return Err(DecodeError::Malformed(format!(
                        "retry_count is {}",
                        other.map_or("missing", |v| v.kind_name())
                    )));
                }
            },
            source_address: take_opt_string(&mut fields, "source_address")?,
        })
    }
}

fn set_opt(fields: &mut DynamicMessage, name: &str, value: &Option<String>) {
    match value {
        Some(v) => fields.set(name, v.clone()),
        None => fields.set(name, FieldValue::Null),
    }
}

fn take_opt_string(
    fields: &mut DynamicMessage,
    name: &str,
) -> Result<Option<String>, DecodeError> {
    match fields.take(name) {
        None | Some(FieldValue::Null) => Ok(None),
        Some(FieldValue::Str(s)) => Ok(Some(s)),
        Some(other) => Err(DecodeError::Malformed(format!(
            "{} is {}, expected string",
            name,
            other.kind_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_sorts_payload_to_index_4() {
        let desc = Envelope::descriptor();
        let mut names: Vec<&str> = desc.fields.iter().map(|f| f.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names[4], PAYLOAD_FIELD);
        assert_eq!(desc.field(PAYLOAD_FIELD).unwrap().kind, FieldKind::Dynamic);
    }

    #[test]
    fn test_fields_roundtrip() {
        let envelope = Envelope::new(DynamicMessage::new("Ping").with("id", 1i32))
            .with_message_id("m-42")
            .with_source_address("queue://a")
            .with_retry_count(3);

        let restored = Envelope::from_fields(envelope.to_fields()).unwrap();
        assert_eq!(restored, envelope);
    }

    #[test]
    fn test_missing_payload_is_error() {
        let mut fields = Envelope::new(DynamicMessage::new("Ping")).to_fields();
        fields.take(PAYLOAD_FIELD);
        assert!(matches!(
            Envelope::from_fields(fields),
            Err(DecodeError::NullPayload)
        ));
    }
}
