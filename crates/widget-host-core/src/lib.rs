//! Widget Host Core
//!
//! The widget lifecycle controller and its collaborators.
//!
//! This crate hosts untrusted, dynamically fetched widget modules: it
//! resolves a reference to code, keeps exactly one sandbox instance live per
//! code+configuration identity, gates re-execution behind structural
//! input-diffing, bridges a persistent local-state slot across executions,
//! and mediates privileged requests (transactions, commits) back to the host.
//!
//! # Core Modules
//!
//! - [`controller`]: [`WidgetLifecycleController`] - the state machine
//! - [`sandbox`]: capability interface consumed from the execution engine
//! - [`mediator`]: [`PrivilegedOpMediator`] - transaction/commit gating
//! - [`events`]: single-threaded event queue feeding the controller
//! - [`state`]: [`StateBridge`] - per-instance local-state slot
//! - [`differ`]: [`InputDiffer`] - deep-equality execution gate
//! - [`boundary`]: [`RenderBoundary`] - isolation for output consumption
//! - [`script`]: minimal reference engine for demos and tests
//!
//! # Concurrency Model
//!
//! Single-threaded cooperative scheduling: registry callbacks and sandbox
//! bindings only enqueue events; the controller drains the queue on
//! [`pump`](controller::WidgetLifecycleController::pump), which guarantees
//! identity recomputation happens-before input assembly for each change
//! batch. Disposing an instance renders its outstanding callbacks no-ops.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use widget_host_core::controller::{ControllerConfig, WidgetLifecycleController};
//! use widget_host_core::script::ScriptEngine;
//! use widget_registry::InMemoryRegistry;
//! use widget_types::{CollectingSink, WidgetReference};
//!
//! let registry = Arc::new(InMemoryRegistry::new());
//! let mut controller = WidgetLifecycleController::new(
//!     registry,
//!     Arc::new(ScriptEngine),
//!     Arc::new(CollectingSink::new()),
//!     ControllerConfig::default(),
//! );
//! controller.set_reference(WidgetReference::parse("alice.near/widget/Foo")?, vec![]);
//! println!("{:?}", controller.output());
//! ```

pub mod boundary;
pub mod controller;
pub mod differ;
pub mod events;
pub mod mediator;
pub mod sandbox;
pub mod script;
pub mod state;
pub mod testing;

pub use boundary::RenderBoundary;
pub use controller::{ControllerConfig, Phase, RenderOutput, WidgetLifecycleController};
pub use differ::InputDiffer;
pub use events::{Event, EventQueue};
pub use mediator::{
    CommitRequest, MediationResult, PrivilegedOpMediator, TransactionSubmitter,
};
pub use sandbox::{HostBindings, SandboxEngine, SandboxInstance, SandboxSpec};
pub use script::ScriptEngine;
pub use state::StateBridge;
