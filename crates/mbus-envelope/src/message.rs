// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed registration seam.
//!
//! Concrete Rust types ride the dynamic machinery by declaring their schema
//! and converting to/from [`DynamicMessage`]. Registration is one call per
//! type and safe to repeat:
//!
//! ```rust
//! use mbus_envelope::{BusMessage, DynamicMessage, FieldKind, MessageDescriptor,
//!     MessageDescriptorBuilder, SchemaRegistry};
//! use mbus_envelope::error::DecodeError;
//!
//! struct Ping { id: i32, ts: i64 }
//!
//! impl BusMessage for Ping {
//!     const TYPE_NAME: &'static str = "acme::Ping";
//!
//!     fn descriptor() -> MessageDescriptor {
//!         MessageDescriptorBuilder::new(Self::TYPE_NAME)
//!             .field("id", FieldKind::I32)
//!             .field("ts", FieldKind::I64)
//!             .build()
//!     }
//!
//!     fn to_payload(&self) -> DynamicMessage {
//!         DynamicMessage::new(Self::TYPE_NAME)
//!             .with("id", self.id)
//!             .with("ts", self.ts)
//!     }
//!
//!     fn from_payload(payload: &DynamicMessage) -> Result<Self, DecodeError> {
//!         Ok(Self {
//!             id: payload.get("id").and_then(|v| v.as_i32())
//!                 .ok_or_else(|| DecodeError::Malformed("Ping.id".into()))?,
//!             ts: payload.get("ts").and_then(|v| v.as_i64())
//!                 .ok_or_else(|| DecodeError::Malformed("Ping.ts".into()))?,
//!         })
//!     }
//! }
//!
//! let registry = SchemaRegistry::new();
//! registry.register_and_compile_message::<Ping>().unwrap();
//! assert!(registry.is_registered("acme::Ping"));
//! ```

use crate::error::DecodeError;
use crate::schema::MessageDescriptor;
use crate::value::DynamicMessage;

/// A concrete message type that can travel as an envelope payload.
pub trait BusMessage: Sized {
    /// Stable type identity; becomes the wire tag.
    const TYPE_NAME: &'static str;

    /// Declared field set, sorted by the registry at compile time.
    fn descriptor() -> MessageDescriptor;

    /// Convert to the type-erased form the codec encodes.
    fn to_payload(&self) -> DynamicMessage;

    /// Rebuild from a decoded payload.
    fn from_payload(payload: &DynamicMessage) -> Result<Self, DecodeError>;
}
