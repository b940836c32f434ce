// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope codec: polymorphic encode/decode through the schema registry.
//!
//! # Wire contract
//!
//! The byte stream is the envelope's fields in compiled (lexicographic)
//! order, packed little-endian with no alignment padding:
//!
//! - required scalar: raw LE bytes (`bool` one byte, `f64` IEEE bits);
//! - `string` / `bytes`: u32 LE length + raw bytes, no terminator;
//! - optional field: presence byte `0`/`1`, then the value if present;
//! - dynamic field: presence byte, u32-length-prefixed type-tag string,
//!   u32-length-prefixed payload bytes. The payload bytes are the payload's
//!   own fields encoded standalone against its compiled layout, so the
//!   decoder can resolve "which concrete type is this" from the tag alone.
//!
//! This layout is a versioned external contract. Changing it breaks wire
//! compatibility with every deployed peer; the advertised content type is
//! the compatibility token transports key on.

pub mod wire;

use std::sync::Arc;

use crate::envelope::{self, Envelope};
use crate::error::{DecodeError, EncodeError, RegistrationError};
use crate::message::BusMessage;
use crate::schema::registry::{CompiledSchema, SchemaRegistry};
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};
use crate::value::{DynamicMessage, FieldValue};
use wire::{ByteReader, ByteWriter};

/// Content-type token advertised to transports.
///
/// Fixed contract, never derived from envelope contents; stable across
/// versions to remain wire-compatible.
pub const CONTENT_TYPE: &str = "application/vnd.mbus.envelope+bin";

/// A decoded envelope plus the recovered concrete payload type.
///
/// Downstream dispatch is type-driven, so the resolved type identity is
/// surfaced alongside the value rather than buried in it.
#[derive(Debug)]
pub struct Decoded {
    pub envelope: Envelope,
    pub payload_type: Arc<MessageDescriptor>,
}

impl Decoded {
    /// Extract the payload as a concrete registered type.
    pub fn payload_as<T: BusMessage>(&self) -> Result<T, DecodeError> {
        if self.payload_type.type_name != T::TYPE_NAME {
            return Err(DecodeError::PayloadType {
                expected: T::TYPE_NAME.to_string(),
                found: self.payload_type.type_name.clone(),
            });
        }
        T::from_payload(&self.envelope.message)
    }
}

/// Encodes and decodes envelopes against a shared [`SchemaRegistry`].
///
/// Construction is the explicit initialization point the host calls once at
/// startup: it registers the envelope's own descriptor, flags the payload
/// slot dynamic, and freezes the registry. Payload types registered later
/// are compiled additively and never disturb published layouts.
pub struct EnvelopeCodec {
    registry: Arc<SchemaRegistry>,
    envelope_schema: Arc<CompiledSchema>,
}

impl EnvelopeCodec {
    /// The content-type token, also available as [`CONTENT_TYPE`].
    pub const CONTENT_TYPE: &'static str = CONTENT_TYPE;

    /// Set up the codec over a registry.
    ///
    /// Registers the envelope type, marks its payload field as the dynamic
    /// carrier, and compiles everything registered so far. Safe to call on a
    /// registry that already carries payload registrations.
    pub fn new(registry: Arc<SchemaRegistry>) -> Result<Self, RegistrationError> {
        registry.register(Envelope::descriptor())?;
        registry.mark_dynamic(envelope::TYPE_NAME, envelope::PAYLOAD_FIELD)?;
        registry.compile_all();
        let envelope_schema = registry
            .compiled(envelope::TYPE_NAME)
            .ok_or_else(|| RegistrationError::UnknownType(envelope::TYPE_NAME.to_string()))?;
        Ok(Self {
            registry,
            envelope_schema,
        })
    }

    /// The registry this codec resolves types against.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Encode an envelope to wire bytes.
    ///
    /// The payload's type must be registered, or inferable from its field
    /// values for first-use registration (logged at debug). The returned
    /// buffer is the only artifact; the envelope is not retained.
    pub fn encode(&self, envelope: &Envelope) -> Result<Vec<u8>, EncodeError> {
        let fields = envelope.to_fields();
        let mut writer = ByteWriter::with_capacity(64);
        self.encode_message(&mut writer, &fields, &self.envelope_schema)?;
        Ok(writer.into_bytes())
    }

    /// Decode wire bytes back into an envelope and its recovered payload type.
    ///
    /// Fails with [`DecodeError`] on a truncated or malformed stream, an
    /// unregistered type tag, or an absent payload; the three causes stay
    /// distinguishable for the caller.
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        let mut reader = ByteReader::new(bytes);
        let (fields, recovered) = self.decode_message(&mut reader, &self.envelope_schema)?;
        if !reader.is_eof() {
            return Err(DecodeError::Malformed(format!(
                "{} trailing bytes after envelope",
                reader.remaining()
            )));
        }
        let payload_type = recovered.ok_or(DecodeError::NullPayload)?;
        let envelope = Envelope::from_fields(fields)?;
        Ok(Decoded {
            envelope,
            payload_type,
        })
    }

    /// Resolve the compiled layout for a payload, registering on first use.
    fn schema_for_payload(
        &self,
        payload: &DynamicMessage,
    ) -> Result<Arc<CompiledSchema>, EncodeError> {
        if let Some(schema) = self.registry.ensure_compiled(payload.type_name()) {
            return Ok(schema);
        }
        let descriptor = infer_descriptor(payload)?;
        log::debug!(
            "[codec] first-use registration of payload type {}",
            payload.type_name()
        );
        self.registry.register_and_compile(descriptor)?;
        self.registry
            .ensure_compiled(payload.type_name())
            .ok_or_else(|| EncodeError::UnknownType(payload.type_name().to_string()))
    }

    fn encode_message(
        &self,
        writer: &mut ByteWriter,
        message: &DynamicMessage,
        schema: &CompiledSchema,
    ) -> Result<(), EncodeError> {
        let type_name = &schema.descriptor().type_name;
        for field in schema.ordered_fields() {
            let value = message.get(&field.name);

            if field.kind == FieldKind::Dynamic {
                // Payload is never null on the wire.
                let inner = match value {
                    Some(FieldValue::Message(inner)) => inner,
                    None | Some(FieldValue::Null) => {
                        return Err(EncodeError::MissingField {
                            type_name: type_name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    Some(other) => {
                        return Err(EncodeError::TypeMismatch {
                            type_name: type_name.clone(),
                            field: field.name.clone(),
                            expected: "message",
                            found: other.kind_name(),
                        });
                    }
                };
                let inner_schema = self.schema_for_payload(inner)?;
                writer.write_u8(1);
                writer.write_str(inner.type_name());
                let mut nested = ByteWriter::with_capacity(32);
                self.encode_message(&mut nested, inner, &inner_schema)?;
                writer.write_len_prefixed(nested.as_slice());
                continue;
            }

            if field.optional {
                match value {
                    None | Some(FieldValue::Null) => {
                        writer.write_u8(0);
                    }
                    Some(v) => {
                        writer.write_u8(1);
                        encode_scalar(writer, type_name, field, v)?;
                    }
                }
            } else {
                let v = value.ok_or_else(|| EncodeError::MissingField {
                    type_name: type_name.clone(),
                    field: field.name.clone(),
                })?;
                encode_scalar(writer, type_name, field, v)?;
            }
        }
        Ok(())
    }

    #[allow(clippy::type_complexity)]
    fn decode_message(
        &self,
        reader: &mut ByteReader<'_>,
        schema: &CompiledSchema,
    ) -> Result<(DynamicMessage, Option<Arc<MessageDescriptor>>), DecodeError> {
        let mut message = DynamicMessage::new(schema.descriptor().type_name.clone());
        let mut recovered = None;
        for field in schema.ordered_fields() {
            if field.kind == FieldKind::Dynamic {
                if reader.read_u8()? == 0 {
                    return Err(DecodeError::NullPayload);
                }
                let tag = reader.read_str()?;
                let body = reader.read_len_prefixed()?;
                let inner_schema = match self.registry.ensure_compiled(&tag) {
                    Some(schema) => schema,
                    None => return Err(DecodeError::UnknownTypeTag(tag)),
                };
                let mut inner_reader = ByteReader::new(body);
                let (inner, _) = self.decode_message(&mut inner_reader, &inner_schema)?;
                if !inner_reader.is_eof() {
                    return Err(DecodeError::Malformed(format!(
                        "{} trailing bytes after payload {}",
                        inner_reader.remaining(),
                        tag
                    )));
                }
                recovered = Some(inner_schema.descriptor().clone());
                message.set(field.name.clone(), FieldValue::Message(Box::new(inner)));
                continue;
            }

            if field.optional && reader.read_u8()? == 0 {
                message.set(field.name.clone(), FieldValue::Null);
                continue;
            }
            let value = decode_scalar(reader, field.kind)?;
            message.set(field.name.clone(), value);
        }
        Ok((message, recovered))
    }
}

fn encode_scalar(
    writer: &mut ByteWriter,
    type_name: &str,
    field: &FieldDescriptor,
    value: &FieldValue,
) -> Result<(), EncodeError> {
    match (field.kind, value) {
        (FieldKind::Bool, FieldValue::Bool(v)) => writer.write_bool(*v),
        (FieldKind::I32, FieldValue::I32(v)) => writer.write_i32_le(*v),
        (FieldKind::I64, FieldValue::I64(v)) => writer.write_i64_le(*v),
        (FieldKind::U32, FieldValue::U32(v)) => writer.write_u32_le(*v),
        (FieldKind::U64, FieldValue::U64(v)) => writer.write_u64_le(*v),
        (FieldKind::F64, FieldValue::F64(v)) => writer.write_f64_le(*v),
        (FieldKind::String, FieldValue::Str(v)) => writer.write_str(v),
        (FieldKind::Bytes, FieldValue::Bytes(v)) => writer.write_len_prefixed(v),
        (kind, other) => {
            return Err(EncodeError::TypeMismatch {
                type_name: type_name.to_string(),
                field: field.name.clone(),
                expected: kind.name(),
                found: other.kind_name(),
            });
        }
    }
    Ok(())
}

fn decode_scalar(reader: &mut ByteReader<'_>, kind: FieldKind) -> Result<FieldValue, DecodeError> {
    Ok(match kind {
        FieldKind::Bool => FieldValue::Bool(reader.read_bool()?),
        FieldKind::I32 => FieldValue::I32(reader.read_i32_le()?),
        FieldKind::I64 => FieldValue::I64(reader.read_i64_le()?),
        FieldKind::U32 => FieldValue::U32(reader.read_u32_le()?),
        FieldKind::U64 => FieldValue::U64(reader.read_u64_le()?),
        FieldKind::F64 => FieldValue::F64(reader.read_f64_le()?),
        FieldKind::String => FieldValue::Str(reader.read_str()?),
        FieldKind::Bytes => FieldValue::Bytes(reader.read_len_prefixed()?.to_vec()),
        FieldKind::Dynamic => {
            // Handled by decode_message; a nested dynamic inside a payload is
            // outside the wire contract.
            return Err(DecodeError::Malformed(
                "dynamic field outside envelope".into(),
            ));
        }
    })
}

/// Infer a descriptor from a payload's field values (first-use registration).
fn infer_descriptor(payload: &DynamicMessage) -> Result<MessageDescriptor, EncodeError> {
    let mut fields = Vec::with_capacity(payload.len());
    for (name, value) in payload.fields() {
        let kind = value.kind().ok_or_else(|| EncodeError::UnrepresentablePayload {
            type_name: payload.type_name().to_string(),
            field: name.clone(),
        })?;
        fields.push(FieldDescriptor::new(name.clone(), kind));
    }
    Ok(MessageDescriptor::new(payload.type_name(), fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::MessageDescriptorBuilder;

    fn codec_with_ping() -> EnvelopeCodec {
        let registry = Arc::new(SchemaRegistry::new());
        registry
            .register(
                MessageDescriptorBuilder::new("Ping")
                    .field("id", FieldKind::I32)
                    .field("ts", FieldKind::I64)
                    .build(),
            )
            .unwrap();
        EnvelopeCodec::new(registry).unwrap()
    }

    fn ping_payload() -> DynamicMessage {
        DynamicMessage::new("Ping").with("id", 7i32).with("ts", 1000i64)
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = codec_with_ping();
        let envelope = Envelope::new(ping_payload())
            .with_message_id("m-1")
            .with_correlation_id("c-9");

        let bytes = codec.encode(&envelope).unwrap();
        let decoded = codec.decode(&bytes).unwrap();

        assert_eq!(decoded.payload_type.type_name, "Ping");
        assert_eq!(decoded.envelope, envelope);
    }

    #[test]
    fn test_content_type_is_constant() {
        let codec = codec_with_ping();
        let before = EnvelopeCodec::CONTENT_TYPE;
        codec
            .registry()
            .register_and_compile(MessageDescriptorBuilder::new("Extra").build())
            .unwrap();
        codec.registry().compile_all();
        assert_eq!(before, EnvelopeCodec::CONTENT_TYPE);
        assert_eq!(before, CONTENT_TYPE);
    }

    #[test]
    fn test_first_use_registration_on_encode() {
        let codec = codec_with_ping();
        let payload = DynamicMessage::new("AdHoc").with("note", "hi").with("n", 3u32);
        let bytes = codec.encode(&Envelope::new(payload)).unwrap();

        assert!(codec.registry().is_registered("AdHoc"));
        let decoded = codec.decode(&bytes).unwrap();
        assert_eq!(decoded.payload_type.type_name, "AdHoc");
        assert_eq!(
            decoded.envelope.message.get("note").and_then(FieldValue::as_str),
            Some("hi")
        );
    }

    #[test]
    fn test_unrepresentable_payload_rejected() {
        let codec = codec_with_ping();
        let mut payload = DynamicMessage::new("Weird");
        payload.set("gap", FieldValue::Null);
        let err = codec.encode(&Envelope::new(payload)).unwrap_err();
        assert!(matches!(err, EncodeError::UnrepresentablePayload { .. }));
    }

    #[test]
    fn test_missing_required_payload_field() {
        let codec = codec_with_ping();
        let payload = DynamicMessage::new("Ping").with("id", 7i32); // no ts
        let err = codec.encode(&Envelope::new(payload)).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::MissingField { ref field, .. } if field == "ts"
        ));
    }

    #[test]
    fn test_payload_field_type_mismatch() {
        let codec = codec_with_ping();
        let payload = ping_payload().with("id", "seven"); // string into i32 slot
        let err = codec.encode(&Envelope::new(payload)).unwrap_err();
        assert!(matches!(err, EncodeError::TypeMismatch { .. }));
    }

    #[test]
    fn test_decode_empty_stream() {
        let codec = codec_with_ping();
        assert!(matches!(
            codec.decode(&[]),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_trailing_bytes() {
        let codec = codec_with_ping();
        let mut bytes = codec.encode(&Envelope::new(ping_payload())).unwrap();
        bytes.push(0xFF);
        assert!(matches!(
            codec.decode(&bytes),
            Err(DecodeError::Malformed(_))
        ));
    }
}
