//! Shared types for the widget-host workspace.
//!
//! This crate provides foundational types used across multiple crates in the
//! workspace, breaking circular dependency chains.
//!
//! ## Reference Types
//!
//! The [`reference`] module contains widget addressing:
//! - [`WidgetPath`](reference::WidgetPath) - Validated `account/section/name` path
//! - [`WidgetReference`](reference::WidgetReference) - Path+version or inline code
//! - [`ConfigOverride`](reference::ConfigOverride) - Ordered configuration overrides
//!
//! ## Execution Types
//!
//! The [`input`] module holds the execution envelope ([`ExecutionInput`](input::ExecutionInput),
//! [`ExecutionContext`](input::ExecutionContext)), [`state`] the persistent
//! local-state slot, and [`identity`] the tuple whose change forces sandbox
//! recreation.
//!
//! ## Privileged Requests
//!
//! The [`request`] module contains transaction and commit payloads with their
//! normalization defaults.

pub mod error;
pub mod identity;
pub mod input;
pub mod record;
pub mod reference;
pub mod request;
pub mod state;

// Re-export commonly used types at crate root
pub use error::{CollectingSink, ErrorScope, ErrorSink, HostError, TracingSink};
pub use identity::ConfirmedIdentity;
pub use input::{ExecutionContext, ExecutionInput, InstanceVersion};
pub use record::CodeRecord;
pub use reference::{select_network, ConfigOverride, WidgetPath, WidgetReference};
pub use request::{
    CommitData, RawTransaction, TransactionOutcome, TransactionRequest, BASE_GAS,
};
pub use state::{EffectRecord, StateSlot};
