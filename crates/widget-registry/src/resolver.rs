//! Per-controller source resolution.
//!
//! A `SourceResolver` tracks exactly one widget reference at a time and owns
//! the registry subscription for it. Invalidation callbacks do not resolve
//! anything themselves; they notify the controller, which advances the
//! resolution generation and re-resolves on its own thread.

use std::sync::Arc;

use tracing::debug;

use widget_types::{CodeRecord, WidgetReference};

use crate::registry::{CodeRegistry, InvalidationCallback, SubscriptionId};

/// Result of resolving the tracked reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub record: CodeRecord,
    /// Display name of the source. Inline references only retain one when the
    /// resolver was built with the inline-src-override mode enabled.
    pub resolved_src: Option<String>,
    /// Resolution generation this result belongs to.
    pub generation: u64,
}

/// Tracks one widget reference and its registry subscription.
pub struct SourceResolver {
    registry: Arc<dyn CodeRegistry>,
    allow_inline_src_override: bool,
    reference: Option<WidgetReference>,
    subscription: Option<SubscriptionId>,
    generation: u64,
}

impl SourceResolver {
    pub fn new(registry: Arc<dyn CodeRegistry>, allow_inline_src_override: bool) -> Self {
        Self {
            registry,
            allow_inline_src_override,
            reference: None,
            subscription: None,
            generation: 0,
        }
    }

    /// Track a new reference, releasing the prior subscription. For path
    /// references, `notify` is registered with the registry and fires when
    /// the underlying code changes.
    pub fn track(&mut self, reference: WidgetReference, notify: InvalidationCallback) {
        self.release();
        if let WidgetReference::Path { path, .. } = &reference {
            self.subscription = Some(self.registry.subscribe(path, notify));
        }
        debug!(src = ?reference.display_src(), "tracking widget reference");
        self.reference = Some(reference);
        self.generation += 1;
    }

    /// Advance the resolution generation. Called by the controller when an
    /// invalidation notification arrives.
    pub fn advance_generation(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reference(&self) -> Option<&WidgetReference> {
        self.reference.as_ref()
    }

    /// Resolve the tracked reference against the registry.
    ///
    /// Inline references resolve synchronously and always succeed; whether
    /// they retain a display name depends on the override mode.
    pub fn resolve_current(&self) -> ResolvedSource {
        match &self.reference {
            None => ResolvedSource {
                record: CodeRecord::Pending,
                resolved_src: None,
                generation: self.generation,
            },
            Some(WidgetReference::Path { path, version }) => ResolvedSource {
                record: self.registry.resolve(path, *version),
                resolved_src: self.reference.as_ref().and_then(|r| r.display_src()),
                generation: self.generation,
            },
            Some(WidgetReference::Inline { code, src }) => ResolvedSource {
                record: CodeRecord::Code(code.clone()),
                resolved_src: if self.allow_inline_src_override {
                    src.clone()
                } else {
                    None
                },
                generation: self.generation,
            },
        }
    }

    /// Release the registry subscription, if any.
    pub fn release(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.registry.unsubscribe(id);
        }
    }
}

impl Drop for SourceResolver {
    fn drop(&mut self) {
        self.release();
    }
}
