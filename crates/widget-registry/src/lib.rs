//! Widget Registry
//!
//! Versioned code storage and per-controller source resolution.
//!
//! This crate provides:
//! - [`registry`]: The [`CodeRegistry`] trait - resolve, subscription fan-out,
//!   scoped invalidation, per-network cache epochs
//! - [`memory`]: [`InMemoryRegistry`] - thread-safe reference implementation
//! - [`resolver`]: [`SourceResolver`] - tracks one widget reference per
//!   controller, owning its registry subscription
//!
//! # Resolution Model
//!
//! A controller resolves a widget reference to a [`CodeRecord`](widget_types::CodeRecord):
//! `Pending` while the registry is still loading, `NotFound` when the registry
//! reports no record, or the resolved code text. Registering an invalidation
//! callback is how externally-updated code (an author publishing a new
//! version) propagates without any caller action: the callback fires, the
//! controller advances its resolution generation, and the reference is
//! re-resolved.
//!
//! The registry cache is shared: multiple controllers may resolve the same
//! reference, and invalidation fans out to all active subscribers.

pub mod memory;
pub mod registry;
pub mod resolver;

pub use memory::InMemoryRegistry;
pub use registry::{CodeRegistry, EpochCallback, InvalidationCallback, SubscriptionId};
pub use resolver::{ResolvedSource, SourceResolver};
