//! Selection and view state owned by a coordinator instance

use std::sync::Arc;

use bd_data::{ClientConfig, DataSource, SourceId, ViewKind};

use crate::pagination::Pagination;

/// Which data source is being inspected
#[derive(Debug, Clone, Default)]
pub enum Selection {
    #[default]
    NoSelection,
    Selected(Arc<DataSource>),
}

impl Selection {
    pub fn source(&self) -> Option<&Arc<DataSource>> {
        match self {
            Selection::Selected(source) => Some(source),
            Selection::NoSelection => None,
        }
    }

    pub fn source_id(&self) -> Option<&SourceId> {
        self.source().map(|source| &source.id)
    }

    /// Whether selecting `candidate` would change nothing.
    ///
    /// Sources are compared by value, so a source re-ingested under the same
    /// id with different contents is a different selection.
    pub fn is_same(&self, candidate: &DataSource) -> bool {
        match self {
            Selection::Selected(current) => current.as_ref() == candidate,
            Selection::NoSelection => false,
        }
    }
}

/// Defaults applied on every new selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    pub default_view: ViewKind,
    pub page_size: usize,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            default_view: ViewKind::Insights,
            page_size: 10,
        }
    }
}

impl From<&ClientConfig> for CoordinatorSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            default_view: config.default_view,
            page_size: config.page_size.max(1),
        }
    }
}

/// The mutable view state of one coordinator
#[derive(Debug, Clone)]
pub struct ViewState {
    pub selection: Selection,
    pub active_view: ViewKind,
    pub page: Pagination,
    /// Column of the most recent annotation request
    pub annotation_column: Option<String>,
}

impl ViewState {
    pub fn new(settings: &CoordinatorSettings) -> Self {
        Self {
            selection: Selection::NoSelection,
            active_view: settings.default_view,
            page: Pagination::new(settings.page_size),
            annotation_column: None,
        }
    }

    /// Replace the selection and reset everything downstream of it
    pub fn reset_for(&mut self, selection: Selection, settings: &CoordinatorSettings) {
        let total = selection.source().map(|source| source.rows_count).unwrap_or(0);
        self.selection = selection;
        self.active_view = settings.default_view;
        self.page = Pagination::new(settings.page_size).with_total(total);
        self.annotation_column = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, rows: usize) -> DataSource {
        DataSource {
            id: SourceId::new(id),
            filename: format!("{}.csv", id),
            columns_config: Default::default(),
            rows_count: rows,
            uploaded_at: None,
        }
    }

    #[test]
    fn test_same_id_different_contents_is_not_same() {
        let selection = Selection::Selected(Arc::new(source("a", 10)));
        assert!(selection.is_same(&source("a", 10)));
        assert!(!selection.is_same(&source("a", 11)));
        assert!(!Selection::NoSelection.is_same(&source("a", 10)));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let settings = CoordinatorSettings::default();
        let mut state = ViewState::new(&settings);
        state.active_view = ViewKind::Explorer;
        state.annotation_column = Some("region".into());

        state.reset_for(Selection::Selected(Arc::new(source("a", 25))), &settings);
        assert_eq!(state.active_view, ViewKind::Insights);
        assert_eq!(state.page.skip(), 0);
        assert_eq!(state.page.total(), 25);
        assert!(state.annotation_column.is_none());
    }
}
