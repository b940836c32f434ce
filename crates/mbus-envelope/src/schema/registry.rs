// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-shared schema registry.
//!
//! Registration is the rare path and encode/decode is the hot path, so the
//! registry is split in two:
//!
//! - a staging map of registered descriptors behind a `parking_lot::Mutex`,
//!   touched only by registration and compilation calls;
//! - a compiled snapshot behind an `arc_swap::ArcSwap`, read lock-free by
//!   every encode/decode call. Readers load an immutable snapshot and can
//!   never observe a half-constructed entry.
//!
//! Entry lifecycle: `unregistered -> registered(uncompiled) -> compiled`,
//! with no back transitions. Late compilation is purely additive: an entry
//! already published in the snapshot is carried into the next snapshot by
//! `Arc` clone and is never rebuilt, so in-flight traffic keeps decoding
//! against the exact plan it started with.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::error::RegistrationError;
use crate::message::BusMessage;
use crate::schema::{FieldDescriptor, FieldKind, MessageDescriptor};

// ---------------------------------------------------------------------------
// CompiledSchema
// ---------------------------------------------------------------------------

/// Per-type encode/decode plan: the descriptor plus its lexicographic wire
/// order, frozen at compile time.
#[derive(Debug)]
pub struct CompiledSchema {
    descriptor: Arc<MessageDescriptor>,
    /// Indices into `descriptor.fields`, sorted by field name.
    order: Vec<usize>,
}

impl CompiledSchema {
    fn compile(descriptor: Arc<MessageDescriptor>) -> Self {
        let mut order: Vec<usize> = (0..descriptor.fields.len()).collect();
        order.sort_by(|&a, &b| descriptor.fields[a].name.cmp(&descriptor.fields[b].name));
        Self { descriptor, order }
    }

    /// The registered descriptor this plan was compiled from.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// Fields in wire order (lexicographic by name).
    pub fn ordered_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.order.iter().map(|&i| &self.descriptor.fields[i])
    }

    /// Field names in wire order.
    pub fn field_order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.descriptor.fields[i].name.as_str())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

type Snapshot = HashMap<String, Arc<CompiledSchema>>;

/// Registry mapping type identity to a compiled binary layout.
///
/// Shared by `Arc` between the codec and registration code; passed explicitly
/// rather than accessed as ambient global state, which keeps its lifetime and
/// thread-safety contract visible.
pub struct SchemaRegistry {
    /// Every registered descriptor, compiled or not. All writers (register,
    /// mark_dynamic, compile) serialize on this lock; snapshot publication
    /// happens while it is held so updates cannot be lost.
    staged: Mutex<HashMap<String, Arc<MessageDescriptor>>>,
    /// Frozen encode/decode plans, swapped atomically.
    compiled: ArcSwap<Snapshot>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            staged: Mutex::new(HashMap::new()),
            compiled: ArcSwap::new(Arc::new(Snapshot::new())),
        }
    }

    /// Register a message type.
    ///
    /// Idempotent: a `type_name` that is already present returns immediately
    /// with no side effect. A re-registration with a differing field set is
    /// still a no-op, logged at warn since it usually means two components
    /// disagree about the type. Duplicate field names within the descriptor
    /// are rejected and leave the registry unchanged.
    pub fn register(&self, descriptor: MessageDescriptor) -> Result<(), RegistrationError> {
        descriptor.check_unique_fields()?;
        let mut staged = self.staged.lock();
        if let Some(existing) = staged.get(&descriptor.type_name) {
            if existing.fields != descriptor.fields {
                log::warn!(
                    "[registry] re-registration of {} with a different field set ignored",
                    descriptor.type_name
                );
            }
            return Ok(());
        }
        log::debug!(
            "[registry] registered {} ({} fields)",
            descriptor.type_name,
            descriptor.fields.len()
        );
        staged.insert(descriptor.type_name.clone(), Arc::new(descriptor));
        Ok(())
    }

    /// Register a message type and immediately compile it.
    ///
    /// The compile step is additive: entries already published stay exactly
    /// as they are.
    pub fn register_and_compile(
        &self,
        descriptor: MessageDescriptor,
    ) -> Result<(), RegistrationError> {
        let type_name = descriptor.type_name.clone();
        self.register(descriptor)?;
        self.compile_one(&type_name);
        Ok(())
    }

    /// Flag one field of an already-registered type as the open-typed
    /// payload carrier.
    ///
    /// Required before that field can hold values of more than one concrete
    /// type across envelopes. If the type is already compiled, its plan is
    /// recompiled additively so the flag takes effect immediately.
    pub fn mark_dynamic(&self, type_name: &str, field: &str) -> Result<(), RegistrationError> {
        let mut staged = self.staged.lock();
        let descriptor = staged
            .get(type_name)
            .ok_or_else(|| RegistrationError::UnknownType(type_name.to_string()))?;
        let index =
            descriptor
                .field_index(field)
                .ok_or_else(|| RegistrationError::UnknownField {
                    type_name: type_name.to_string(),
                    field: field.to_string(),
                })?;

        let mut updated = (**descriptor).clone();
        updated.fields[index].kind = FieldKind::Dynamic;
        let updated = Arc::new(updated);
        staged.insert(type_name.to_string(), updated.clone());

        // Keep an already-published plan in step with the flag.
        let snapshot = self.compiled.load();
        if snapshot.contains_key(type_name) {
            let mut next: Snapshot = (**snapshot).clone();
            next.insert(
                type_name.to_string(),
                Arc::new(CompiledSchema::compile(updated)),
            );
            self.compiled.store(Arc::new(next));
        }
        Ok(())
    }

    /// Freeze the entire current registration set into encode/decode plans.
    ///
    /// Idempotent and callable repeatedly; each call reflects the full
    /// staging map at that moment. Plans already published are reused, not
    /// rebuilt.
    pub fn compile_all(&self) {
        let staged = self.staged.lock();
        let current = self.compiled.load();
        let mut next = Snapshot::with_capacity(staged.len());
        for (name, descriptor) in staged.iter() {
            match current.get(name) {
                Some(existing) if Arc::ptr_eq(existing.descriptor(), descriptor) => {
                    next.insert(name.clone(), existing.clone());
                }
                _ => {
                    next.insert(
                        name.clone(),
                        Arc::new(CompiledSchema::compile(descriptor.clone())),
                    );
                }
            }
        }
        log::debug!("[registry] compiled {} schemas", next.len());
        self.compiled.store(Arc::new(next));
    }

    /// Additively compile a single staged type into the snapshot.
    fn compile_one(&self, type_name: &str) {
        let staged = self.staged.lock();
        let Some(descriptor) = staged.get(type_name) else {
            return;
        };
        let snapshot = self.compiled.load();
        if let Some(existing) = snapshot.get(type_name) {
            if Arc::ptr_eq(existing.descriptor(), descriptor) {
                return; // already compiled, repeated compiles are no-ops
            }
        }
        let mut next: Snapshot = (**snapshot).clone();
        next.insert(
            type_name.to_string(),
            Arc::new(CompiledSchema::compile(descriptor.clone())),
        );
        log::debug!("[registry] compiled {}", type_name);
        self.compiled.store(Arc::new(next));
    }

    /// Look up a compiled plan. Lock-free, hot path.
    pub fn compiled(&self, type_name: &str) -> Option<Arc<CompiledSchema>> {
        self.compiled.load().get(type_name).cloned()
    }

    /// Look up a compiled plan, compiling a staged-but-uncompiled entry on
    /// demand. Returns `None` only for types never registered.
    pub fn ensure_compiled(&self, type_name: &str) -> Option<Arc<CompiledSchema>> {
        if let Some(schema) = self.compiled(type_name) {
            return Some(schema);
        }
        self.compile_one(type_name);
        self.compiled(type_name)
    }

    /// Whether a type has been registered (compiled or not).
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.staged.lock().contains_key(type_name)
    }

    /// Number of registered types.
    pub fn schema_count(&self) -> usize {
        self.staged.lock().len()
    }

    /// List all registered type names (sorted for determinism).
    pub fn list_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.staged.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Register a concrete message type through its [`BusMessage`] impl.
    pub fn register_message<T: BusMessage>(&self) -> Result<(), RegistrationError> {
        self.register(T::descriptor())
    }

    /// Register and immediately compile a concrete message type.
    pub fn register_and_compile_message<T: BusMessage>(&self) -> Result<(), RegistrationError> {
        self.register_and_compile(T::descriptor())
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
