//! Mediation of privileged operations emitted by sandboxed code.
//!
//! Transaction submissions and data commits never execute directly: they are
//! normalized and queued for host confirmation, with at most one pending
//! request of each kind per controller. Both paths are no-ops returning a
//! null result when no authenticated context exists.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use widget_registry::CodeRegistry;
use widget_types::{CommitData, RawTransaction, TransactionOutcome, TransactionRequest};

use crate::sandbox::CommitHooks;

/// Host-side executor used when the network is configured to skip
/// confirmation prompts.
pub trait TransactionSubmitter: Send + Sync {
    fn submit(&self, batch: &[TransactionRequest]) -> Result<TransactionOutcome>;
}

/// A commit request together with its resolution continuations.
pub struct CommitRequest {
    pub data: CommitData,
    pub hooks: CommitHooks,
}

/// Outcome of handing a privileged request to the mediator.
#[derive(Debug, PartialEq)]
pub enum MediationResult {
    /// Stored as the pending request; awaiting host confirmation.
    Queued,
    /// Submitted immediately (confirmation skipping enabled).
    Submitted(TransactionOutcome),
    /// Null result: no authenticated context, a request of this kind is
    /// already pending, or immediate submission failed.
    Rejected,
}

struct PendingCommit {
    data: CommitData,
    hooks: Option<CommitHooks>,
}

/// Intercepts transaction and commit requests and queues them for host
/// confirmation.
pub struct PrivilegedOpMediator {
    registry: Arc<dyn CodeRegistry>,
    network: String,
    account_id: Option<String>,
    skip_confirmation: bool,
    submitter: Option<Arc<dyn TransactionSubmitter>>,
    pending_transactions: Option<Vec<TransactionRequest>>,
    pending_commit: Option<PendingCommit>,
}

impl PrivilegedOpMediator {
    pub fn new(registry: Arc<dyn CodeRegistry>, network: impl Into<String>) -> Self {
        Self {
            registry,
            network: network.into(),
            account_id: None,
            skip_confirmation: false,
            submitter: None,
            pending_transactions: None,
            pending_commit: None,
        }
    }

    /// Submit batches without a confirmation prompt, through `submitter`.
    pub fn with_submitter(mut self, submitter: Arc<dyn TransactionSubmitter>) -> Self {
        self.enable_auto_submit(submitter);
        self
    }

    /// Same as [`with_submitter`](Self::with_submitter) for an already-shared
    /// mediator.
    pub fn enable_auto_submit(&mut self, submitter: Arc<dyn TransactionSubmitter>) {
        self.skip_confirmation = true;
        self.submitter = Some(submitter);
    }

    /// Refresh the authenticated context the mediator gates on.
    pub fn set_auth(&mut self, network: impl Into<String>, account_id: Option<String>) {
        self.network = network.into();
        self.account_id = account_id;
    }

    // ========================================================================
    // Transaction path
    // ========================================================================

    /// Normalize and queue (or immediately submit) a transaction batch.
    pub fn request_transactions(&mut self, raw: Vec<RawTransaction>) -> MediationResult {
        if self.account_id.is_none() {
            debug!("transaction batch dropped: no authenticated context");
            return MediationResult::Rejected;
        }
        let batch: Vec<TransactionRequest> =
            raw.into_iter().map(TransactionRequest::from).collect();

        if self.skip_confirmation {
            let Some(submitter) = self.submitter.clone() else {
                warn!("confirmation skipping enabled without a submitter");
                return MediationResult::Rejected;
            };
            return match submitter.submit(&batch) {
                Ok(outcome) => {
                    self.apply_outcome(&outcome);
                    MediationResult::Submitted(outcome)
                }
                Err(error) => {
                    warn!("immediate submission failed: {error:#}");
                    MediationResult::Rejected
                }
            };
        }

        if self.pending_transactions.is_some() {
            // The prior batch is only replaced by explicit resolution.
            debug!("transaction batch rejected: one is already pending");
            return MediationResult::Rejected;
        }
        debug!(len = batch.len(), "transaction batch queued for confirmation");
        self.pending_transactions = Some(batch);
        MediationResult::Queued
    }

    /// The batch awaiting host confirmation, if any.
    pub fn pending_transactions(&self) -> Option<&[TransactionRequest]> {
        self.pending_transactions.as_deref()
    }

    /// Resolve the pending batch with the host-reported outcome. A declined
    /// prompt resolves with `None`. Returns the outcome handed back to the
    /// caller.
    pub fn resolve_transactions(
        &mut self,
        outcome: Option<TransactionOutcome>,
    ) -> Option<TransactionOutcome> {
        if self.pending_transactions.take().is_none() {
            return None;
        }
        if let Some(outcome) = &outcome {
            self.apply_outcome(outcome);
        }
        outcome
    }

    /// A completed transaction invalidates the cache scoped to its receiver.
    fn apply_outcome(&self, outcome: &TransactionOutcome) {
        if let Some(receiver_id) = &outcome.receiver_id {
            self.registry.invalidate_scope(&self.network, receiver_id);
        }
    }

    // ========================================================================
    // Commit path
    // ========================================================================

    /// Queue a data-commit request for host confirmation.
    pub fn request_commit(&mut self, request: CommitRequest) -> MediationResult {
        if self.account_id.is_none() {
            debug!("commit request dropped: no authenticated context");
            return MediationResult::Rejected;
        }
        if self.pending_commit.is_some() {
            debug!("commit request rejected: one is already pending");
            return MediationResult::Rejected;
        }
        self.pending_commit = Some(PendingCommit {
            data: request.data,
            hooks: Some(request.hooks),
        });
        MediationResult::Queued
    }

    /// The commit payload awaiting host confirmation, if any.
    pub fn pending_commit(&self) -> Option<&CommitData> {
        self.pending_commit.as_ref().map(|pending| &pending.data)
    }

    /// Resolve the pending commit, invoking exactly one of the hooks exactly
    /// once. Returns whether a pending commit existed.
    pub fn resolve_commit(&mut self, accepted: bool) -> bool {
        let Some(mut pending) = self.pending_commit.take() else {
            return false;
        };
        if let Some(hooks) = pending.hooks.take() {
            if accepted {
                (hooks.on_commit)();
            } else {
                (hooks.on_cancel)();
            }
        }
        true
    }
}
