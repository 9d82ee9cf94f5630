//! Annotation view: ask for a description of one metadata column

use bd_core::{Coordinator, FetchRequest};
use bd_data::{DataError, ViewKind};

use crate::status_message;

/// The annotation tab
#[derive(Debug, Default)]
pub struct AnnotationView {
    chosen_column: Option<String>,
}

impl AnnotationView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn choose_column(&mut self, column: impl Into<String>) {
        self.chosen_column = Some(column.into());
    }

    pub fn chosen_column(&self) -> Option<&str> {
        self.chosen_column.as_deref()
    }

    /// Whether the submit action is enabled
    pub fn can_submit(&self, coordinator: &Coordinator) -> bool {
        coordinator.can_submit_annotation(self.chosen_column())
    }

    /// Request an annotation for the chosen column
    pub fn submit(&self, coordinator: &mut Coordinator) -> Result<Vec<FetchRequest>, DataError> {
        let column = self
            .chosen_column
            .as_deref()
            .ok_or_else(|| DataError::InvalidRequest("no column chosen".to_string()))?;
        coordinator.request_annotation(column)
    }

    /// Drop a choice that does not belong to the current selection
    pub fn sync(&mut self, coordinator: &Coordinator) {
        if let Some(column) = self.chosen_column.as_deref() {
            if !coordinator.meta_columns().contains(&column) {
                self.chosen_column = None;
            }
        }
    }

    pub fn render(&self, coordinator: &Coordinator) -> String {
        let meta_columns = coordinator.meta_columns();
        if coordinator.selected().is_none() {
            return "Select a file to ask about its columns".to_string();
        }
        if meta_columns.is_empty() {
            return "This file has no metadata columns".to_string();
        }

        let mut out = format!("Columns: {}\n", meta_columns.join(", "));
        match self.chosen_column() {
            Some(column) => out.push_str(&format!("Chosen: {}\n", column)),
            None => out.push_str("Choose a column to ask about\n"),
        }

        if let Some(message) = status_message(coordinator.entry(ViewKind::Annotation)) {
            out.push_str(&message);
        } else if let Some(text) = coordinator.annotation() {
            out.push_str(text);
        }
        out
    }
}
