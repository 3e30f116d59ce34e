//! Capability interface consumed from the sandbox execution engine.
//!
//! The engine itself (how module code is parsed and evaluated) is an external
//! collaborator. The controller sees a fixed capability surface: construct an
//! instance from a [`SandboxSpec`], `execute` it against a strongly-typed
//! input envelope, `dispose` it. All ambient bindings are passed at
//! construction time as an explicit struct, never introspected.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use widget_types::{
    CommitData, ConfigOverride, ExecutionInput, InstanceVersion, RawTransaction, StateSlot,
};

/// Callbacks wired by the controller through which sandboxed code reaches the
/// host. Every binding is guarded: after the owning instance is disposed it
/// becomes a no-op.
#[derive(Clone)]
pub struct HostBindings {
    /// Replace the instance's local-state slot; schedules a re-execution.
    pub state_setter: Arc<dyn Fn(StateSlot) + Send + Sync>,
    /// Force re-resolution of data scoped to this widget's account.
    pub cache_refresher: Arc<dyn Fn() + Send + Sync>,
    /// Submit a transaction batch for host confirmation.
    pub confirm_transactions: Arc<dyn Fn(Vec<RawTransaction>) + Send + Sync>,
    /// Request a data commit. `on_commit`/`on_cancel` are attached by the
    /// mediator; exactly one fires, exactly once.
    pub request_commit: Arc<dyn Fn(CommitData, CommitHooks) + Send + Sync>,
}

/// Continuations supplied by sandboxed code alongside a commit request.
pub struct CommitHooks {
    pub on_commit: Box<dyn FnOnce() + Send>,
    pub on_cancel: Box<dyn FnOnce() + Send>,
}

impl CommitHooks {
    /// Hooks that do nothing on either outcome.
    pub fn noop() -> Self {
        Self {
            on_commit: Box::new(|| {}),
            on_cancel: Box::new(|| {}),
        }
    }
}

impl std::fmt::Debug for CommitHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CommitHooks")
    }
}

/// Everything an engine needs to construct one execution context bound to a
/// single code+configuration identity.
pub struct SandboxSpec {
    pub code: String,
    pub network: String,
    pub depth: u32,
    pub src: Option<String>,
    pub configs: Vec<ConfigOverride>,
    pub instance_version: InstanceVersion,
    pub bindings: HostBindings,
    /// Host-provided ambient values surfaced to the widget.
    pub ambient_bindings: Value,
}

/// Factory for sandbox instances.
pub trait SandboxEngine: Send + Sync {
    fn create_instance(&self, spec: SandboxSpec) -> Result<Box<dyn SandboxInstance>>;
}

/// One execution context bound to one (code, configuration) identity.
pub trait SandboxInstance: Send {
    /// Run the module against `input`. May fail; a failure is an
    /// execution-scope fault, never fatal to the controller.
    fn execute(&mut self, input: &ExecutionInput) -> Result<Value>;

    /// Tear down the instance. Must be idempotent and side-effect-free on
    /// double invocation.
    fn dispose(&mut self);
}
