//! Core state management for the breakdown viewer
//!
//! This crate owns the selection, the active view and the explorer window,
//! and decides which fetches have to run and which results may be applied.

pub mod coordinator;
pub mod events;
pub mod pagination;
pub mod sequencer;
pub mod state;

// Re-export commonly used types
pub use coordinator::{Coordinator, Resolution};
pub use events::{handler_from_fn, Event, EventBus, EventHandler};
pub use pagination::{PageSummary, Pagination};
pub use sequencer::{perform, FetchOutcome, FetchRequest, FetchSequencer};
pub use state::{CoordinatorSettings, Selection, ViewState};
