//! Isolation boundary around output consumption.
//!
//! Execution faults are handled inside the controller; a fault that surfaces
//! while the host CONSUMES the produced output (laying it out, mapping it to
//! native views) is a different failure mode and is caught one layer up, here.

use std::sync::Arc;

use anyhow::Result;

use widget_types::{ErrorSink, HostError};

use crate::controller::{RenderOutput, WidgetLifecycleController};

/// Catches host-level rendering faults on the produced output.
pub struct RenderBoundary {
    sink: Arc<dyn ErrorSink>,
}

impl RenderBoundary {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    /// Run `consume` over the controller's current output. On failure,
    /// reports a boundary-scope error and clears the output so the next
    /// input change retries from scratch.
    pub fn present<T>(
        &self,
        controller: &mut WidgetLifecycleController,
        consume: impl FnOnce(&RenderOutput) -> Result<T>,
    ) -> Option<T> {
        match consume(controller.output()) {
            Ok(value) => Some(value),
            Err(error) => {
                self.sink.report(HostError::boundary(format!("{error:#}")));
                controller.clear_output();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ControllerConfig, WidgetLifecycleController};
    use crate::testing::FakeEngine;
    use anyhow::anyhow;
    use serde_json::json;
    use widget_registry::InMemoryRegistry;
    use widget_types::{CollectingSink, ErrorScope, WidgetPath, WidgetReference};

    #[test]
    fn test_boundary_fault_reports_and_clears_output() {
        let registry = Arc::new(InMemoryRegistry::new());
        let sink = Arc::new(CollectingSink::new());
        let path = WidgetPath::new("alice.near/widget/Foo").unwrap();
        registry.publish(&path, None, "return 1");

        let mut controller = WidgetLifecycleController::new(
            registry,
            Arc::new(FakeEngine::rendering(json!("ok"))),
            sink.clone(),
            ControllerConfig::default(),
        );
        controller.set_reference(WidgetReference::parse("alice.near/widget/Foo").unwrap(), vec![]);
        assert!(matches!(controller.output(), RenderOutput::Rendered(_)));

        let boundary = RenderBoundary::new(sink.clone());
        let shown: Option<()> =
            boundary.present(&mut controller, |_| Err(anyhow!("layout exploded")));
        assert!(shown.is_none());
        assert_eq!(*controller.output(), RenderOutput::Pending);

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].scope, ErrorScope::Boundary);
        assert!(reports[0].message.contains("layout exploded"));

        // The next input change re-executes and recovers.
        controller.set_props(json!({"retry": true}));
        assert!(matches!(controller.output(), RenderOutput::Rendered(_)));
    }
}
