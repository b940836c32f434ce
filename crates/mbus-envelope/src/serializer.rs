// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport-facing serializer facade.
//!
//! The bus hands this layer a send context (envelope metadata plus outgoing
//! payload) or a receive context (incoming body stream); the facade runs the
//! codec and pushes results back through the context. Both context traits
//! belong to the transport host; this crate only consumes them.
//!
//! Streams are borrowed for the duration of the call. The serializer never
//! takes ownership of, retains, or closes a caller-supplied reader or
//! writer; the transport owns the stream's lifetime and needs it open after
//! the call returns.

use std::io::{Read, Write};
use std::sync::Arc;

use crate::codec::{Decoded, EnvelopeCodec};
use crate::envelope::Envelope;
use crate::error::SerializeError;
use crate::schema::MessageDescriptor;
use crate::value::DynamicMessage;

/// Outgoing message context supplied by the bus.
pub trait SendContext {
    fn conversation_id(&self) -> Option<&str>;
    fn correlation_id(&self) -> Option<&str>;
    fn destination_address(&self) -> Option<&str>;
    fn fault_address(&self) -> Option<&str>;
    fn message_id(&self) -> Option<&str>;
    fn request_id(&self) -> Option<&str>;
    fn response_address(&self) -> Option<&str>;
    fn retry_count(&self) -> i32;
    fn source_address(&self) -> Option<&str>;

    /// The payload to wrap.
    fn payload(&self) -> &DynamicMessage;

    /// Content-type slot the transport reads back for routing.
    fn set_content_type(&mut self, content_type: &str);
}

/// Incoming message context supplied by the bus.
pub trait ReceiveContext {
    /// The raw body stream; read, never closed, by the facade.
    fn body(&mut self) -> &mut dyn Read;

    /// Receives the decoded envelope and the recovered payload type for
    /// type-driven dispatch downstream.
    fn set_envelope(&mut self, envelope: Envelope, payload_type: Arc<MessageDescriptor>);
}

/// Serializes envelopes for the transport, advertising a fixed content type.
pub struct MessageSerializer {
    codec: EnvelopeCodec,
}

impl MessageSerializer {
    pub fn new(codec: EnvelopeCodec) -> Self {
        Self { codec }
    }

    /// The advertised content-type token; identical for every message and
    /// every registry state.
    pub fn content_type(&self) -> &'static str {
        EnvelopeCodec::CONTENT_TYPE
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// Wrap the context's payload in an envelope and write the encoded bytes.
    ///
    /// Stamps the content type on the context so the transport routes the
    /// bytes back to this codec on the consuming side.
    pub fn serialize(
        &self,
        context: &mut dyn SendContext,
        output: &mut dyn Write,
    ) -> Result<(), SerializeError> {
        context.set_content_type(EnvelopeCodec::CONTENT_TYPE);
        let envelope = envelope_from_context(context);
        let bytes = self.codec.encode(&envelope)?;
        output.write_all(&bytes)?;
        Ok(())
    }

    /// Read the context's body, decode it, and hand the envelope plus
    /// recovered payload type back to the context.
    pub fn deserialize(&self, context: &mut dyn ReceiveContext) -> Result<(), SerializeError> {
        let mut body = Vec::new();
        context.body().read_to_end(&mut body)?;
        let Decoded {
            envelope,
            payload_type,
        } = self.codec.decode(&body)?;
        context.set_envelope(envelope, payload_type);
        Ok(())
    }
}

fn envelope_from_context(context: &dyn SendContext) -> Envelope {
    Envelope {
        conversation_id: context.conversation_id().map(str::to_string),
        correlation_id: context.correlation_id().map(str::to_string),
        destination_address: context.destination_address().map(str::to_string),
        fault_address: context.fault_address().map(str::to_string),
        message: context.payload().clone(),
        message_id: context.message_id().map(str::to_string),
        request_id: context.request_id().map(str::to_string),
        response_address: context.response_address().map(str::to_string),
        retry_count: context.retry_count(),
        source_address: context.source_address().map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::registry::SchemaRegistry;
    use crate::schema::{FieldKind, MessageDescriptorBuilder};
    use crate::value::FieldValue;
    use std::io::Cursor;

    struct TestSendContext {
        payload: DynamicMessage,
        message_id: Option<String>,
        content_type: Option<String>,
    }

    impl SendContext for TestSendContext {
        fn conversation_id(&self) -> Option<&str> {
            None
        }
        fn correlation_id(&self) -> Option<&str> {
            None
        }
        fn destination_address(&self) -> Option<&str> {
            Some("queue://orders")
        }
        fn fault_address(&self) -> Option<&str> {
            None
        }
        fn message_id(&self) -> Option<&str> {
            self.message_id.as_deref()
        }
        fn request_id(&self) -> Option<&str> {
            None
        }
        fn response_address(&self) -> Option<&str> {
            None
        }
        fn retry_count(&self) -> i32 {
            0
        }
        fn source_address(&self) -> Option<&str> {
            None
        }
        fn payload(&self) -> &DynamicMessage {
            &self.payload
        }
        fn set_content_type(&mut self, content_type: &str) {
            self.content_type = Some(content_type.to_string());
        }
    }

    struct TestReceiveContext {
        body: Cursor<Vec<u8>>,
        received: Option<(Envelope, Arc<MessageDescriptor>)>,
    }

    impl ReceiveContext for TestReceiveContext {
        fn body(&mut self) -> &mut dyn Read {
            &mut self.body
        }
        fn set_envelope(&mut self, envelope: Envelope, payload_type: Arc<MessageDescriptor>) {
            self.received = Some((envelope, payload_type));
        }
    }

    fn serializer() -> MessageSerializer {
        let registry = Arc::new(SchemaRegistry::new());
        registry
            .register(
                MessageDescriptorBuilder::new("Order")
                    .field("sku", FieldKind::String)
                    .field("qty", FieldKind::U32)
                    .build(),
            )
            .unwrap();
        MessageSerializer::new(EnvelopeCodec::new(registry).unwrap())
    }

    #[test]
    fn test_serialize_stamps_content_type_and_writes() {
        let serializer = serializer();
        let mut context = TestSendContext {
            payload: DynamicMessage::new("Order").with("sku", "X-1").with("qty", 2u32),
            message_id: Some("m-7".into()),
            content_type: None,
        };
        let mut output = Vec::new();

        serializer.serialize(&mut context, &mut output).unwrap();

        assert_eq!(
            context.content_type.as_deref(),
            Some("application/vnd.mbus.envelope+bin")
        );
        assert!(!output.is_empty());

        // Writer stays usable after the call: the facade borrowed it only.
        output.write_all(b"").unwrap();
    }

    #[test]
    fn test_deserialize_hands_back_envelope_and_type() {
        let serializer = serializer();
        let mut send = TestSendContext {
            payload: DynamicMessage::new("Order").with("sku", "X-1").with("qty", 2u32),
            message_id: Some("m-7".into()),
            content_type: None,
        };
        let mut wire = Vec::new();
        serializer.serialize(&mut send, &mut wire).unwrap();

        let mut receive = TestReceiveContext {
            body: Cursor::new(wire),
            received: None,
        };
        serializer.deserialize(&mut receive).unwrap();

        let (envelope, payload_type) = receive.received.unwrap();
        assert_eq!(payload_type.type_name, "Order");
        assert_eq!(envelope.message_id.as_deref(), Some("m-7"));
        assert_eq!(
            envelope.destination_address.as_deref(),
            Some("queue://orders")
        );
        assert_eq!(
            envelope.message.get("qty").and_then(FieldValue::as_u32),
            Some(2)
        );
    }

    #[test]
    fn test_deserialize_empty_body_fails() {
        let serializer = serializer();
        let mut receive = TestReceiveContext {
            body: Cursor::new(Vec::new()),
            received: None,
        };
        let err = serializer.deserialize(&mut receive).unwrap_err();
        assert!(matches!(err, SerializeError::Decode(_)));
        assert!(receive.received.is_none());
    }
}
