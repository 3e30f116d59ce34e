//! The widget lifecycle state machine.
//!
//! `Idle → Resolving → Ready → Rendered | Faulted`, with `Faulted`
//! recoverable on the next successful execution and `Ready` re-entered with a
//! fresh instance whenever the confirmed identity changes.
//!
//! The controller is single-threaded: host setters and asynchronous callbacks
//! enqueue events, and [`pump`](WidgetLifecycleController::pump) drains them.
//! Within each drained batch, identity recomputation always happens-before
//! input assembly, so a sandbox never executes stale code against a newer
//! identity's expected shape.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use widget_registry::{CodeRegistry, SourceResolver, SubscriptionId};
use widget_types::{
    select_network, CodeRecord, CommitData, ConfigOverride, ConfirmedIdentity, ErrorSink,
    ExecutionContext, ExecutionInput, HostError, InstanceVersion, RawTransaction, StateSlot,
    TransactionOutcome, TransactionRequest, WidgetReference,
};

use crate::differ::InputDiffer;
use crate::events::{Event, EventQueue};
use crate::mediator::{CommitRequest, MediationResult, PrivilegedOpMediator, TransactionSubmitter};
use crate::sandbox::{CommitHooks, HostBindings, SandboxEngine, SandboxInstance, SandboxSpec};
use crate::state::StateBridge;

/// Upper bound on pump rounds per call; a widget that re-schedules itself
/// unconditionally on every execution would otherwise never quiesce.
const MAX_PUMP_ROUNDS: usize = 64;

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No reference tracked yet.
    Idle,
    /// Code resolution in flight.
    Resolving,
    /// A live instance exists but has not produced output yet.
    Ready,
    /// The last execution succeeded.
    Rendered,
    /// The last resolution or execution faulted; recoverable.
    Faulted,
}

/// What the host should render.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutput {
    /// Nothing to show yet (idle or resolving).
    Pending,
    /// Output tree produced by the last successful execution.
    Rendered(Value),
    /// Fallback shown in place of the widget after a fault.
    Fallback {
        message: String,
        trace: Option<String>,
    },
}

/// Host-side controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Fallback network when no configuration override names one.
    pub network_id: String,
    /// Nesting depth of this widget within the host tree.
    pub depth: u32,
    /// Allow inline code to retain a caller-supplied display name.
    pub allow_inline_src_override: bool,
    /// Host-provided ambient values surfaced to the widget.
    pub ambient_bindings: Value,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            network_id: "mainnet".to_string(),
            depth: 0,
            allow_inline_src_override: false,
            ambient_bindings: Value::Null,
        }
    }
}

struct ActiveInstance {
    instance: Box<dyn SandboxInstance>,
    version: InstanceVersion,
    /// Flipped on disposal; bindings check it before enqueueing anything.
    alive: Arc<AtomicBool>,
    bridge: StateBridge,
}

/// Orchestrates resolution, sandbox identity, memoized re-execution, and
/// privileged-operation gating for one widget.
pub struct WidgetLifecycleController {
    config: ControllerConfig,
    registry: Arc<dyn CodeRegistry>,
    engine: Arc<dyn SandboxEngine>,
    sink: Arc<dyn ErrorSink>,
    queue: EventQueue,
    resolver: SourceResolver,
    differ: InputDiffer,
    mediator: Arc<Mutex<PrivilegedOpMediator>>,

    configs: Vec<ConfigOverride>,
    props: Value,
    context: ExecutionContext,
    network: String,
    cache_epoch: u64,
    epoch_subscription: Option<SubscriptionId>,

    identity: Option<ConfirmedIdentity>,
    active: Option<ActiveInstance>,
    phase: Phase,
    output: RenderOutput,
    /// Resolution generation whose `NotFound` has already been reported.
    reported_generation: Option<u64>,
}

impl WidgetLifecycleController {
    pub fn new(
        registry: Arc<dyn CodeRegistry>,
        engine: Arc<dyn SandboxEngine>,
        sink: Arc<dyn ErrorSink>,
        config: ControllerConfig,
    ) -> Self {
        let network = config.network_id.clone();
        let mediator = Arc::new(Mutex::new(PrivilegedOpMediator::new(
            registry.clone(),
            network.clone(),
        )));
        let resolver = SourceResolver::new(registry.clone(), config.allow_inline_src_override);
        let mut controller = Self {
            cache_epoch: registry.epoch(&network),
            context: ExecutionContext::unauthenticated(&network),
            registry,
            engine,
            sink,
            queue: EventQueue::new(),
            resolver,
            differ: InputDiffer::new(),
            mediator,
            configs: Vec::new(),
            props: Value::Null,
            network: network.clone(),
            epoch_subscription: None,
            identity: None,
            active: None,
            phase: Phase::Idle,
            output: RenderOutput::Pending,
            reported_generation: None,
            config,
        };
        controller.subscribe_epoch(&network);
        controller
    }

    /// Submit confirmed-free transaction batches through `submitter` instead
    /// of queueing a confirmation prompt.
    pub fn with_submitter(self, submitter: Arc<dyn TransactionSubmitter>) -> Self {
        self.mediator.lock().enable_auto_submit(submitter);
        self
    }

    // ========================================================================
    // Host-facing setters (each drains the queue before returning)
    // ========================================================================

    /// Track a new widget reference with its configuration override sequence.
    pub fn set_reference(&mut self, reference: WidgetReference, configs: Vec<ConfigOverride>) {
        self.queue.push(Event::SetReference { reference, configs });
        self.pump();
    }

    /// Replace the caller-provided properties.
    pub fn set_props(&mut self, props: Value) {
        self.queue.push(Event::SetProps(props));
        self.pump();
    }

    /// Replace the ambient execution context.
    pub fn set_context(&mut self, context: ExecutionContext) {
        self.queue.push(Event::SetContext(context));
        self.pump();
    }

    /// Clonable handle through which external callbacks feed the controller.
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Drain the event queue and bring phase, instance, and output up to
    /// date. Re-drains when processing enqueued more work (state-setter
    /// feedback loop), bounded by [`MAX_PUMP_ROUNDS`].
    pub fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            while let Some(event) = self.queue.pop() {
                self.apply(event);
            }
            self.sync();
            if self.queue.is_empty() {
                return;
            }
        }
        warn!(
            src = ?self.identity.as_ref().and_then(|i| i.resolved_src.clone()),
            "pump did not quiesce after {MAX_PUMP_ROUNDS} rounds"
        );
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::SetReference { reference, configs } => {
                self.configs = configs;
                let queue = self.queue.clone();
                self.resolver
                    .track(reference, Arc::new(move || queue.push(Event::SourceInvalidated)));
                self.reported_generation = None;
            }
            Event::SetProps(props) => self.props = props,
            Event::SetContext(context) => self.context = context,
            Event::SourceInvalidated => self.resolver.advance_generation(),
            Event::CacheEpochAdvanced(epoch) => {
                // Monotonic even across network switches.
                self.cache_epoch = self.cache_epoch.max(epoch);
            }
            Event::StateUpdated { instance, slot } => match self.active.as_mut() {
                Some(active) if active.version == instance => active.bridge.apply(slot),
                _ => debug!(%instance, "dropped state update from a disposed instance"),
            },
            Event::RefreshCache => {
                let scope = self
                    .resolver
                    .reference()
                    .and_then(|r| r.account_id().map(str::to_string));
                if let Some(scope) = scope {
                    self.registry.invalidate_scope(&self.network, &scope);
                }
            }
        }
    }

    /// One settlement pass: resolve, recompute identity, recreate the
    /// instance if the identity changed, then assemble input and execute if
    /// it differs from the last executed input.
    fn sync(&mut self) {
        if self.resolver.reference().is_none() {
            self.phase = Phase::Idle;
            return;
        }
        let resolved = self.resolver.resolve_current();
        let code = match resolved.record {
            CodeRecord::Pending => {
                self.phase = Phase::Resolving;
                self.output = RenderOutput::Pending;
                return;
            }
            CodeRecord::NotFound => {
                let name = resolved
                    .resolved_src
                    .clone()
                    .unwrap_or_else(|| "<inline>".to_string());
                let message = format!("widget source not found: {name}");
                if self.reported_generation != Some(resolved.generation) {
                    self.sink.report(HostError::source(message.clone()));
                    self.reported_generation = Some(resolved.generation);
                }
                self.output = RenderOutput::Fallback {
                    message,
                    trace: None,
                };
                self.phase = Phase::Faulted;
                return;
            }
            CodeRecord::Code(code) => code,
        };

        let network = select_network(&self.configs, &self.config.network_id);
        let identity = ConfirmedIdentity {
            code,
            resolved_src: resolved.resolved_src,
            depth: self.config.depth,
            configs: self.configs.clone(),
            network,
        };
        if self.identity.as_ref() != Some(&identity) && !self.recreate_instance(identity) {
            return;
        }
        self.execute_if_changed();
    }

    // ========================================================================
    // Instance lifecycle
    // ========================================================================

    fn recreate_instance(&mut self, identity: ConfirmedIdentity) -> bool {
        self.dispose_active();

        if identity.network != self.network {
            self.subscribe_epoch(&identity.network.clone());
            self.cache_epoch = self.cache_epoch.max(self.registry.epoch(&identity.network));
            self.network = identity.network.clone();
        }

        let version = InstanceVersion::fresh();
        let alive = Arc::new(AtomicBool::new(true));
        let spec = SandboxSpec {
            code: identity.code.clone(),
            network: identity.network.clone(),
            depth: identity.depth,
            src: identity.resolved_src.clone(),
            configs: identity.configs.clone(),
            instance_version: version,
            bindings: self.build_bindings(version, alive.clone()),
            ambient_bindings: self.config.ambient_bindings.clone(),
        };
        match self.engine.create_instance(spec) {
            Ok(instance) => {
                info!(src = ?identity.resolved_src, %version, "sandbox instance created");
                self.active = Some(ActiveInstance {
                    instance,
                    version,
                    alive,
                    bridge: StateBridge::new(version),
                });
                self.differ.reset();
                self.mediator
                    .lock()
                    .set_auth(identity.network.clone(), self.context.account_id.clone());
                self.identity = Some(identity);
                self.phase = Phase::Ready;
                true
            }
            Err(error) => {
                let message = match &identity.resolved_src {
                    Some(src) => format!("{src}: {error:#}"),
                    None => format!("{error:#}"),
                };
                self.sink.report(HostError::execution(message.clone()));
                self.output = RenderOutput::Fallback {
                    message,
                    trace: None,
                };
                self.phase = Phase::Faulted;
                false
            }
        }
    }

    /// Dispose the live instance. Its `dispose` hook is idempotent; flipping
    /// `alive` first renders every callback it ever registered a no-op.
    fn dispose_active(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.alive.store(false, Ordering::SeqCst);
            active.instance.dispose();
            debug!(version = %active.version, "sandbox instance disposed");
        }
        self.identity = None;
    }

    fn build_bindings(&self, version: InstanceVersion, alive: Arc<AtomicBool>) -> HostBindings {
        let queue = self.queue.clone();
        let flag = alive.clone();
        let state_setter = Arc::new(move |slot: StateSlot| {
            if flag.load(Ordering::SeqCst) {
                queue.push(Event::StateUpdated {
                    instance: version,
                    slot,
                });
            }
        });

        let queue = self.queue.clone();
        let flag = alive.clone();
        let cache_refresher = Arc::new(move || {
            if flag.load(Ordering::SeqCst) {
                queue.push(Event::RefreshCache);
            }
        });

        let mediator = Arc::clone(&self.mediator);
        let flag = alive.clone();
        let confirm_transactions = Arc::new(move |raw: Vec<RawTransaction>| {
            if !flag.load(Ordering::SeqCst) {
                return;
            }
            if mediator.lock().request_transactions(raw) == MediationResult::Rejected {
                debug!("transaction batch resolved with a null result");
            }
        });

        let mediator = Arc::clone(&self.mediator);
        let flag = alive;
        let request_commit = Arc::new(move |data: CommitData, hooks: CommitHooks| {
            if !flag.load(Ordering::SeqCst) {
                return;
            }
            if mediator.lock().request_commit(CommitRequest { data, hooks })
                == MediationResult::Rejected
            {
                debug!("commit request resolved with a null result");
            }
        });

        HostBindings {
            state_setter,
            cache_refresher,
            confirm_transactions,
            request_commit,
        }
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn execute_if_changed(&mut self) {
        let Some(identity) = self.identity.clone() else {
            return;
        };
        let (version, state) = match self.active.as_ref() {
            Some(active) => (active.version, active.bridge.snapshot()),
            None => return,
        };

        let mut context = self.context.clone();
        context.widget_src = identity.resolved_src.clone();
        context.network_id = identity.network.clone();

        let input = ExecutionInput {
            props: self.props.clone(),
            context,
            state,
            cache_epoch: self.cache_epoch,
            instance_version: version,
            host_bindings: self.config.ambient_bindings.clone(),
        };
        if !self.differ.should_execute(&input) {
            debug!("execution suppressed: input unchanged");
            return;
        }

        self.mediator
            .lock()
            .set_auth(identity.network.clone(), self.context.account_id.clone());

        let result = match self.active.as_mut() {
            Some(active) => active.instance.execute(&input),
            None => return,
        };
        match result {
            Ok(value) => {
                self.output = RenderOutput::Rendered(value);
                self.phase = Phase::Rendered;
            }
            Err(error) => {
                let message = match &identity.resolved_src {
                    Some(src) => format!("{src}: {error}"),
                    None => error.to_string(),
                };
                self.sink.report(HostError::execution(message.clone()));
                self.output = RenderOutput::Fallback {
                    message,
                    trace: Some(format!("{error:?}")),
                };
                self.phase = Phase::Faulted;
            }
        }
    }

    // ========================================================================
    // Host-facing accessors and privileged-request surface
    // ========================================================================

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn output(&self) -> &RenderOutput {
        &self.output
    }

    pub fn cache_epoch(&self) -> u64 {
        self.cache_epoch
    }

    /// Version token of the live instance, if any.
    pub fn instance_version(&self) -> Option<InstanceVersion> {
        self.active.as_ref().map(|active| active.version)
    }

    /// Snapshot of the live instance's state slot, if any.
    pub fn state_snapshot(&self) -> Option<StateSlot> {
        self.active.as_ref().map(|active| active.bridge.snapshot())
    }

    /// The transaction batch awaiting host confirmation.
    pub fn pending_transactions(&self) -> Option<Vec<TransactionRequest>> {
        self.mediator
            .lock()
            .pending_transactions()
            .map(|batch| batch.to_vec())
    }

    /// Resolve the pending transaction batch with the host-reported outcome
    /// (`None` when the user declined).
    pub fn resolve_transactions(
        &mut self,
        outcome: Option<TransactionOutcome>,
    ) -> Option<TransactionOutcome> {
        let outcome = self.mediator.lock().resolve_transactions(outcome);
        // A completed transaction may have advanced the cache epoch.
        self.pump();
        outcome
    }

    /// The commit payload awaiting host confirmation.
    pub fn pending_commit(&self) -> Option<CommitData> {
        self.mediator.lock().pending_commit().cloned()
    }

    /// Resolve the pending commit; exactly one of its hooks fires.
    pub fn resolve_commit(&mut self, accepted: bool) -> bool {
        let resolved = self.mediator.lock().resolve_commit(accepted);
        self.pump();
        resolved
    }

    /// Drop the current output and comparison baseline so the next input
    /// change retries from scratch. Used by the render boundary.
    pub fn clear_output(&mut self) {
        self.output = RenderOutput::Pending;
        self.differ.reset();
    }

    /// Tear down the instance and release every subscription.
    pub fn dispose(&mut self) {
        self.dispose_active();
        self.resolver.release();
        if let Some(id) = self.epoch_subscription.take() {
            self.registry.unsubscribe(id);
        }
        self.phase = Phase::Idle;
        self.output = RenderOutput::Pending;
    }

    fn subscribe_epoch(&mut self, network: &str) {
        if let Some(id) = self.epoch_subscription.take() {
            self.registry.unsubscribe(id);
        }
        let queue = self.queue.clone();
        let id = self.registry.subscribe_epoch(
            network,
            Arc::new(move |epoch| queue.push(Event::CacheEpochAdvanced(epoch))),
        );
        self.epoch_subscription = Some(id);
    }
}

impl Drop for WidgetLifecycleController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEngine;
    use serde_json::json;
    use widget_registry::InMemoryRegistry;
    use widget_types::{CollectingSink, ErrorScope, WidgetPath};

    fn setup(engine: FakeEngine) -> (Arc<InMemoryRegistry>, Arc<CollectingSink>, WidgetLifecycleController) {
        let registry = Arc::new(InMemoryRegistry::new());
        let sink = Arc::new(CollectingSink::new());
        let controller = WidgetLifecycleController::new(
            registry.clone(),
            Arc::new(engine),
            sink.clone(),
            ControllerConfig::default(),
        );
        (registry, sink, controller)
    }

    #[test]
    fn test_starts_idle() {
        let (_registry, _sink, controller) = setup(FakeEngine::rendering(json!("ok")));
        assert_eq!(controller.phase(), Phase::Idle);
        assert_eq!(*controller.output(), RenderOutput::Pending);
    }

    #[test]
    fn test_pending_source_keeps_resolving_without_reports() {
        let (registry, sink, mut controller) = setup(FakeEngine::rendering(json!("ok")));
        let path = WidgetPath::new("alice.near/widget/Foo").unwrap();
        registry.mark_pending(&path);

        controller.set_reference(WidgetReference::parse("alice.near/widget/Foo").unwrap(), vec![]);
        assert_eq!(controller.phase(), Phase::Resolving);
        assert_eq!(*controller.output(), RenderOutput::Pending);
        assert!(sink.reports().is_empty());
    }

    #[test]
    fn test_not_found_reports_once_and_renders_fallback() {
        let (_registry, sink, mut controller) = setup(FakeEngine::rendering(json!("ok")));
        controller.set_reference(WidgetReference::parse("alice.near/widget/Gone").unwrap(), vec![]);

        assert_eq!(controller.phase(), Phase::Faulted);
        match controller.output() {
            RenderOutput::Fallback { message, .. } => {
                assert!(message.contains("alice.near/widget/Gone"));
            }
            other => panic!("unexpected output: {other:?}"),
        }
        // A second settlement of the same generation does not re-report.
        controller.set_props(json!({"x": 1}));
        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].scope, ErrorScope::Source);
    }

    #[test]
    fn test_unchanged_identity_preserves_instance_and_state() {
        let (registry, _sink, mut controller) = setup(FakeEngine::rendering(json!("ok")));
        let path = WidgetPath::new("alice.near/widget/Foo").unwrap();
        registry.publish(&path, None, "return 1");

        controller.set_reference(WidgetReference::parse("alice.near/widget/Foo").unwrap(), vec![]);
        let first = controller.instance_version().unwrap();

        controller.set_props(json!({"x": 1}));
        controller.set_props(json!({"x": 2}));
        assert_eq!(controller.instance_version().unwrap(), first);
    }

    #[test]
    fn test_network_override_change_recreates_instance() {
        let (registry, _sink, mut controller) = setup(FakeEngine::rendering(json!("ok")));
        let path = WidgetPath::new("alice.near/widget/Foo").unwrap();
        registry.publish(&path, None, "return 1");
        let reference = WidgetReference::parse("alice.near/widget/Foo").unwrap();

        controller.set_reference(reference.clone(), vec![]);
        let first = controller.instance_version().unwrap();

        controller.set_reference(
            reference,
            vec![ConfigOverride {
                network_id: Some("testnet".into()),
                props: None,
            }],
        );
        let second = controller.instance_version().unwrap();
        assert_ne!(first, second);
    }
}
