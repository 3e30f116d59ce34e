//! Closure-driven fakes for exercising the controller in tests.
//!
//! The fake engine records every created instance (spec summary, captured
//! bindings, dispose counter) and every execution input, so tests can assert
//! lifecycle properties without a real execution engine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use serde_json::Value;

use widget_types::{ExecutionInput, InstanceVersion};

use crate::sandbox::{HostBindings, SandboxEngine, SandboxInstance, SandboxSpec};

type ExecuteFn = dyn Fn(&ExecutionInput) -> Result<Value> + Send + Sync;

/// What the engine saw when one instance was created.
#[derive(Clone)]
pub struct InstanceRecord {
    pub code: String,
    pub src: Option<String>,
    pub network: String,
    pub instance_version: InstanceVersion,
    /// Bindings the controller wired into this instance; tests invoke them
    /// to simulate sandboxed code calling back into the host.
    pub bindings: HostBindings,
    pub dispose_count: Arc<AtomicUsize>,
}

impl InstanceRecord {
    pub fn dispose_count(&self) -> usize {
        self.dispose_count.load(Ordering::SeqCst)
    }
}

/// Scriptable [`SandboxEngine`]. Clones share the same records.
#[derive(Clone)]
pub struct FakeEngine {
    execute: Arc<ExecuteFn>,
    create_error: Option<String>,
    created: Arc<Mutex<Vec<InstanceRecord>>>,
    executions: Arc<Mutex<Vec<ExecutionInput>>>,
}

impl FakeEngine {
    pub fn new(
        execute: impl Fn(&ExecutionInput) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            execute: Arc::new(execute),
            create_error: None,
            created: Arc::new(Mutex::new(Vec::new())),
            executions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Engine whose instances always render `value`.
    pub fn rendering(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }

    /// Engine whose instances always fail with `message`.
    pub fn failing(message: &str) -> Self {
        let message = message.to_string();
        Self::new(move |_| Err(anyhow!("{message}")))
    }

    /// Engine that refuses to create instances.
    pub fn failing_creation(message: &str) -> Self {
        let mut engine = Self::rendering(Value::Null);
        engine.create_error = Some(message.to_string());
        engine
    }

    /// All instances created so far, in creation order.
    pub fn created(&self) -> Vec<InstanceRecord> {
        self.created.lock().clone()
    }

    /// The most recently created instance.
    pub fn last_created(&self) -> Option<InstanceRecord> {
        self.created.lock().last().cloned()
    }

    /// Every input executed so far, across all instances.
    pub fn executions(&self) -> Vec<ExecutionInput> {
        self.executions.lock().clone()
    }

    pub fn execution_count(&self) -> usize {
        self.executions.lock().len()
    }
}

impl SandboxEngine for FakeEngine {
    fn create_instance(&self, spec: SandboxSpec) -> Result<Box<dyn SandboxInstance>> {
        if let Some(message) = &self.create_error {
            return Err(anyhow!("{message}"));
        }
        let dispose_count = Arc::new(AtomicUsize::new(0));
        self.created.lock().push(InstanceRecord {
            code: spec.code,
            src: spec.src,
            network: spec.network,
            instance_version: spec.instance_version,
            bindings: spec.bindings,
            dispose_count: dispose_count.clone(),
        });
        Ok(Box::new(FakeInstance {
            execute: self.execute.clone(),
            executions: self.executions.clone(),
            dispose_count,
        }))
    }
}

struct FakeInstance {
    execute: Arc<ExecuteFn>,
    executions: Arc<Mutex<Vec<ExecutionInput>>>,
    dispose_count: Arc<AtomicUsize>,
}

impl SandboxInstance for FakeInstance {
    fn execute(&mut self, input: &ExecutionInput) -> Result<Value> {
        self.executions.lock().push(input.clone());
        (self.execute)(input)
    }

    fn dispose(&mut self) {
        self.dispose_count.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use widget_types::{ExecutionContext, StateSlot};

    fn input() -> ExecutionInput {
        ExecutionInput {
            props: Value::Null,
            context: ExecutionContext::unauthenticated("mainnet"),
            state: StateSlot::default(),
            cache_epoch: 0,
            instance_version: InstanceVersion::fresh(),
            host_bindings: Value::Null,
        }
    }

    fn spec(bindings: HostBindings) -> SandboxSpec {
        SandboxSpec {
            code: "return 1".into(),
            network: "mainnet".into(),
            depth: 0,
            src: None,
            configs: vec![],
            instance_version: InstanceVersion::fresh(),
            bindings,
            ambient_bindings: Value::Null,
        }
    }

    fn noop_bindings() -> HostBindings {
        HostBindings {
            state_setter: Arc::new(|_| {}),
            cache_refresher: Arc::new(|| {}),
            confirm_transactions: Arc::new(|_| {}),
            request_commit: Arc::new(|_, _| {}),
        }
    }

    #[test]
    fn test_engine_records_instances_and_executions() {
        let engine = FakeEngine::rendering(json!(7));
        let mut instance = engine.create_instance(spec(noop_bindings())).unwrap();

        assert_eq!(instance.execute(&input()).unwrap(), json!(7));
        assert_eq!(engine.execution_count(), 1);
        assert_eq!(engine.created().len(), 1);

        instance.dispose();
        instance.dispose();
        assert_eq!(engine.last_created().unwrap().dispose_count(), 2);
    }

    #[test]
    fn test_failing_creation() {
        let engine = FakeEngine::failing_creation("no capacity");
        assert!(engine.create_instance(spec(noop_bindings())).is_err());
        assert!(engine.created().is_empty());
    }
}
