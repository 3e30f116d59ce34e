//! Structural input-diffing that suppresses redundant executions.

use widget_types::ExecutionInput;

/// Deep-equality gate over immutable input snapshots.
///
/// Execution is skipped when the candidate is structurally equal to the last
/// executed input for the SAME instance version (suppressing e.g. spurious
/// parent re-renders). Otherwise the candidate is snapshotted - a deep copy,
/// so later external mutation of caller-owned objects cannot corrupt the
/// comparison baseline - and execution proceeds.
#[derive(Debug, Default)]
pub struct InputDiffer {
    baseline: Option<ExecutionInput>,
}

impl InputDiffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `candidate` warrants an execution. Updates the baseline when
    /// it does.
    pub fn should_execute(&mut self, candidate: &ExecutionInput) -> bool {
        if let Some(baseline) = &self.baseline {
            if baseline.instance_version == candidate.instance_version && baseline == candidate {
                return false;
            }
        }
        self.baseline = Some(candidate.snapshot());
        true
    }

    /// Forget the baseline (on instance recreation or boundary recovery).
    pub fn reset(&mut self) {
        self.baseline = None;
    }
}
