//! View models for the breakdown viewer
//!
//! Each tab reads from the [`bd_core::Coordinator`] and renders text. Charts
//! live in [`ChartSlot`]s so their artifacts are rebuilt only when the bound
//! dataset changes.

mod annotation;
mod explorer;
mod insights;
mod lifecycle;

pub use annotation::AnnotationView;
pub use explorer::{ExplorerConfig, ExplorerView};
pub use insights::{BarBinding, InsightsView, PieBinding};
pub use lifecycle::{Bindable, ChartSlot};

use bd_data::CacheEntry;

/// Placeholder text for entries that have no payload to show
pub fn status_message(entry: &CacheEntry) -> Option<String> {
    match entry {
        CacheEntry::Loading => Some("Loading...".to_string()),
        CacheEntry::Failed(error) => Some(format!("No data available ({})", error)),
        CacheEntry::Absent | CacheEntry::Present(_) => None,
    }
}
