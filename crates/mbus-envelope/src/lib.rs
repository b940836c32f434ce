// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # mbus-envelope - Message-envelope serialization for a distributed bus
//!
//! Wraps an arbitrary application payload inside a fixed, versioned envelope,
//! encodes the envelope to a binary wire format, and recovers the payload's
//! concrete type on receipt without the consumer knowing it ahead of time.
//!
//! The core is a dynamic schema registry plus a polymorphic envelope codec:
//! message types register their field sets at runtime, the registry compiles
//! each set into a deterministic wire layout (fields sorted
//! lexicographically, so independently built producers and consumers agree
//! without exchanging a schema file), and the envelope's payload slot carries
//! a type tag the decoder resolves back to a registered schema.
//!
//! ## Quick Start
//!
//! ```rust
//! use mbus_envelope::{DynamicMessage, Envelope, EnvelopeCodec, FieldKind,
//!     MessageDescriptorBuilder, SchemaRegistry};
//! use std::sync::Arc;
//!
//! // Register expected payload types up front
//! let registry = Arc::new(SchemaRegistry::new());
//! registry.register(
//!     MessageDescriptorBuilder::new("acme::Ping")
//!         .field("id", FieldKind::I32)
//!         .field("ts", FieldKind::I64)
//!         .build(),
//! )?;
//!
//! // Codec setup registers the envelope type and freezes the registry
//! let codec = EnvelopeCodec::new(registry)?;
//!
//! // Producer side
//! let payload = DynamicMessage::new("acme::Ping").with("id", 7i32).with("ts", 1000i64);
//! let bytes = codec.encode(&Envelope::new(payload).with_message_id("m-1"))?;
//!
//! // Consumer side: the concrete type is recovered from the wire
//! let decoded = codec.decode(&bytes)?;
//! assert_eq!(decoded.payload_type.type_name, "acme::Ping");
//! assert_eq!(decoded.envelope.message.get("id").and_then(|v| v.as_i32()), Some(7));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules Overview
//!
//! - [`schema`] - field declarations, descriptor builder, and the registry
//! - [`value`] - type-erased payload values ([`DynamicMessage`])
//! - [`envelope`] - the fixed wire unit and its field contract
//! - [`codec`] - encode/decode and the content-type token
//! - [`message`] - the [`BusMessage`] trait for concrete payload types
//! - [`serializer`] - transport-facing facade over send/receive contexts
//! - [`error`] - registration, encode, and decode error taxonomy
//!
//! Transports, subscription bookkeeping, and retry policy live outside this
//! crate; it only turns envelopes into bytes and back.

/// Envelope encode/decode and the advertised content type.
pub mod codec;
/// The fixed-shape wire unit carrying metadata plus one payload.
pub mod envelope;
/// Registration, encode, and decode errors.
pub mod error;
/// Typed registration seam for concrete payload types.
pub mod message;
/// Schema declarations and the process-shared registry.
pub mod schema;
/// Transport-facing serializer facade.
pub mod serializer;
/// Type-erased message values.
pub mod value;

pub use codec::{Decoded, EnvelopeCodec, CONTENT_TYPE};
pub use envelope::Envelope;
pub use error::{DecodeError, EncodeError, RegistrationError, SerializeError};
pub use message::BusMessage;
pub use schema::registry::{CompiledSchema, SchemaRegistry};
pub use schema::{FieldDescriptor, FieldKind, MessageDescriptor, MessageDescriptorBuilder};
pub use serializer::{MessageSerializer, ReceiveContext, SendContext};
pub use value::{DynamicMessage, FieldValue};
