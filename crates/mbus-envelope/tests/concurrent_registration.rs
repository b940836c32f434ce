// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registration racing live traffic: encode/decode against already-compiled
//! entries must keep succeeding while new types are registered and compiled
//! on other threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mbus_envelope::{
    DynamicMessage, Envelope, EnvelopeCodec, FieldKind, MessageDescriptorBuilder, SchemaRegistry,
};

#[test]
fn registration_never_disturbs_inflight_traffic() {
    let registry = Arc::new(SchemaRegistry::new());
    registry
        .register(
            MessageDescriptorBuilder::new("load::Sample")
                .field("seq", FieldKind::U64)
                .field("value", FieldKind::F64)
                .build(),
        )
        .unwrap();
    let codec = Arc::new(EnvelopeCodec::new(registry).unwrap());

    let stop = AtomicBool::new(false);

    std::thread::scope(|scope| {
        // Traffic threads: hot-path encode/decode of a compiled type.
        for worker in 0..4 {
            let codec = &codec;
            let stop = &stop;
            scope.spawn(move || {
                // Run at least one full round-trip even if the writer
                // finishes first.
                let mut seq = 0u64;
                loop {
                    let payload = DynamicMessage::new("load::Sample")
                        .with("seq", seq)
                        .with("value", fastrand::f64());
                    let bytes = codec
                        .encode(&Envelope::new(payload.clone()))
                        .expect("encode must not fail during registration");
                    let decoded = codec
                        .decode(&bytes)
                        .expect("decode must not fail during registration");
                    assert_eq!(decoded.payload_type.type_name, "load::Sample");
                    assert_eq!(decoded.envelope.message, payload);
                    seq += 1;
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                }
                assert!(seq > 0, "worker {} never ran", worker);
            });
        }

        // Writer thread: a stream of late registrations and recompiles.
        for i in 0..200 {
            let descriptor = MessageDescriptorBuilder::new(format!("late::T{}", i))
                .field("n", FieldKind::U32)
                .build();
            codec.registry().register_and_compile(descriptor).unwrap();
            if i % 10 == 0 {
                codec.registry().compile_all();
            }
        }
        stop.store(true, Ordering::Relaxed);
    });

    // Every late registration landed, plus the initial type and the envelope.
    assert_eq!(codec.registry().schema_count(), 202);

    // Late types are immediately usable.
    let payload = DynamicMessage::new("late::T199").with("n", 7u32);
    let decoded = codec
        .decode(&codec.encode(&Envelope::new(payload)).unwrap())
        .unwrap();
    assert_eq!(decoded.payload_type.type_name, "late::T199");
}
