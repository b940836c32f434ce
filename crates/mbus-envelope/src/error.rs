// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for registration, encoding, and decoding.
//!
//! The codec never retries, never guesses a fallback type, and never partially
//! decodes: every failure is surfaced to the caller, with "unknown type tag"
//! kept distinct from "malformed bytes" so monitoring can tell deployment skew
//! (a missing registration) from data corruption.

use std::fmt;

/// Errors produced by schema registration.
///
/// All variants are caller bugs; a failed call leaves the registry untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Two fields of one descriptor share a name, so no deterministic
    /// field order exists for the type.
    DuplicateField { type_name: String, field: String },
    /// The type has never been registered.
    UnknownType(String),
    /// The type is registered but has no field with this name.
    UnknownField { type_name: String, field: String },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateField { type_name, field } => {
                write!(f, "duplicate field '{}' in type {}", field, type_name)
            }
            Self::UnknownType(name) => write!(f, "type not registered: {}", name),
            Self::UnknownField { type_name, field } => {
                write!(f, "type {} has no field '{}'", type_name, field)
            }
        }
    }
}

impl std::error::Error for RegistrationError {}

/// Errors produced while encoding an envelope to bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A required field of the message has no value.
    MissingField { type_name: String, field: String },
    /// A field value does not match the registered field kind.
    TypeMismatch {
        type_name: String,
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The payload's type is neither registered nor inferable from its values.
    UnknownType(String),
    /// First-use descriptor inference failed for this field (null or nested
    /// dynamic values carry no field kind).
    UnrepresentablePayload { type_name: String, field: String },
    /// First-use registration of the payload type was rejected.
    Registration(RegistrationError),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { type_name, field } => {
                write!(f, "missing field '{}' in {}", field, type_name)
            }
            Self::TypeMismatch {
                type_name,
                field,
                expected,
                found,
            } => write!(
                f,
                "field '{}' of {}: expected {}, found {}",
                field, type_name, expected, found
            ),
            Self::UnknownType(name) => write!(f, "payload type not registered: {}", name),
            Self::UnrepresentablePayload { type_name, field } => write!(
                f,
                "cannot infer a field kind for '{}' of unregistered type {}",
                field, type_name
            ),
            Self::Registration(e) => write!(f, "payload registration failed: {}", e),
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<RegistrationError> for EncodeError {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

/// Errors produced while decoding bytes back into an envelope.
///
/// "Could not reconstruct a usable message", in all its shapes.
#[derive(Debug)]
pub enum DecodeError {
    /// The byte stream ended before the current field was complete.
    Truncated { need: usize, have: usize },
    /// The bytes parsed but violate the wire contract.
    Malformed(String),
    /// The embedded payload type tag matches no registered type.
    UnknownTypeTag(String),
    /// The envelope parsed but carries no payload.
    NullPayload,
    /// A typed extraction asked for a different type than the wire carried.
    PayloadType { expected: String, found: String },
    /// A string field held invalid UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { need, have } => {
                write!(f, "truncated stream: need {} bytes, have {}", need, have)
            }
            Self::Malformed(msg) => write!(f, "malformed envelope: {}", msg),
            Self::UnknownTypeTag(tag) => write!(f, "unknown payload type tag: {}", tag),
            Self::NullPayload => write!(f, "decoded envelope has no payload"),
            Self::PayloadType { expected, found } => {
                write!(f, "payload is {}, not {}", found, expected)
            }
            Self::Utf8(e) => write!(f, "invalid UTF-8 in string field: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<std::string::FromUtf8Error> for DecodeError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::Utf8(e)
    }
}

/// Errors surfaced by the transport-facing serializer facade.
#[derive(Debug)]
pub enum SerializeError {
    Encode(EncodeError),
    Decode(DecodeError),
    Registration(RegistrationError),
    Io(std::io::Error),
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode failed: {}", e),
            Self::Decode(e) => write!(f, "decode failed: {}", e),
            Self::Registration(e) => write!(f, "registration failed: {}", e),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for SerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(e) => Some(e),
            Self::Decode(e) => Some(e),
            Self::Registration(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<EncodeError> for SerializeError {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<DecodeError> for SerializeError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

impl From<RegistrationError> for SerializeError {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

impl From<std::io::Error> for SerializeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_error_display() {
        let err = RegistrationError::DuplicateField {
            type_name: "Ping".into(),
            field: "id".into(),
        };
        assert_eq!(err.to_string(), "duplicate field 'id' in type Ping");
    }

    #[test]
    fn decode_error_distinguishes_skew_from_corruption() {
        let skew = DecodeError::UnknownTypeTag("Pong".into());
        let corrupt = DecodeError::Truncated { need: 4, have: 1 };
        assert!(skew.to_string().contains("unknown payload type tag"));
        assert!(corrupt.to_string().contains("truncated"));
    }

    #[test]
    fn serialize_error_wraps_sources() {
        let err = SerializeError::from(DecodeError::NullPayload);
        assert!(std::error::Error::source(&err).is_some());
    }
}
