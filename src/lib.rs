//! Widget Host
//!
//! Hosts untrusted, dynamically fetched code modules ("widgets"), executing
//! each inside an isolated runtime instance and mediating privileged side
//! effects back to the host for confirmation.
//!
//! - **Lifecycle**: [`WidgetLifecycleController`] resolves references,
//!   recreates sandbox instances as identity changes, and gates re-execution
//!   behind structural input-diffing
//! - **Registry**: [`InMemoryRegistry`] with versioned entries, subscription
//!   fan-out, and per-network cache epochs
//! - **Privileged ops**: transaction batches and data commits queued for
//!   host confirmation
//!
//! See the `widget-host` binary for a snapshot-driven CLI demo.

pub mod snapshot;

pub use widget_host_core::{
    ControllerConfig, Event, EventQueue, HostBindings, InputDiffer, MediationResult, Phase,
    PrivilegedOpMediator, RenderBoundary, RenderOutput, SandboxEngine, SandboxInstance,
    SandboxSpec, ScriptEngine, StateBridge, TransactionSubmitter, WidgetLifecycleController,
};
pub use widget_registry::{CodeRegistry, InMemoryRegistry, ResolvedSource, SourceResolver};
pub use widget_types::{
    select_network, CodeRecord, CollectingSink, CommitData, ConfigOverride, ConfirmedIdentity,
    EffectRecord, ErrorScope, ErrorSink, ExecutionContext, ExecutionInput, HostError,
    InstanceVersion, RawTransaction, StateSlot, TracingSink, TransactionOutcome,
    TransactionRequest, WidgetPath, WidgetReference, BASE_GAS,
};
