//! Explorer view: raw rows as a table

use bd_core::Coordinator;
use bd_data::{ExplorerPage, ViewKind, MISSING_PLACEHOLDER};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};

use crate::status_message;

/// Explorer configuration
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Maximum characters shown per cell
    pub max_cell_width: usize,
    /// Show the 1-based row number as the first column
    pub show_row_numbers: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_cell_width: 32,
            show_row_numbers: true,
        }
    }
}

/// The explorer tab
#[derive(Debug, Default)]
pub struct ExplorerView {
    pub config: ExplorerConfig,
}

impl ExplorerView {
    pub fn new(config: ExplorerConfig) -> Self {
        Self { config }
    }

    /// Render the current page followed by the page footer
    pub fn render(&self, coordinator: &Coordinator) -> String {
        if coordinator.selected().is_none() {
            return "Select a file to explore its rows".to_string();
        }
        if let Some(message) = status_message(coordinator.entry(ViewKind::Explorer)) {
            return message;
        }

        let table = match coordinator.explorer_page() {
            Some(page) => self.table(page).to_string(),
            None => String::new(),
        };
        format!("{}\n{}", table, self.footer(coordinator))
    }

    /// Build the table for one page
    pub fn table(&self, page: &ExplorerPage) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        let mut header: Vec<Cell> = Vec::new();
        if self.config.show_row_numbers {
            header.push(Cell::new("#"));
        }
        header.extend(page.headers().into_iter().map(Cell::new));
        table.set_header(header);

        for row in &page.rows {
            let mut cells = Vec::with_capacity(row.columns.len() + 1);
            if self.config.show_row_numbers {
                cells.push(Cell::new(row.row_number));
            }
            cells.extend(
                row.columns
                    .iter()
                    .map(|cell| Cell::new(self.truncate(&cell.input_value))),
            );
            table.add_row(cells);
        }

        table
    }

    fn footer(&self, coordinator: &Coordinator) -> String {
        let summary = coordinator.page_summary();
        let state = &coordinator.state().page;
        let mut footer = format!(
            "Page {} of {} ({} rows, {} per page)",
            summary.current_page,
            summary.total_pages,
            state.total(),
            state.limit()
        );
        if summary.can_go_previous {
            footer.push_str("  [prev]");
        }
        if summary.can_go_next {
            footer.push_str("  [next]");
        }
        footer
    }

    fn truncate(&self, value: &str) -> String {
        if value.is_empty() {
            return MISSING_PLACEHOLDER.to_string();
        }
        if value.chars().count() <= self.config.max_cell_width {
            return value.to_string();
        }
        let mut short: String = value
            .chars()
            .take(self.config.max_cell_width.saturating_sub(1))
            .collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bd_core::CoordinatorSettings;
    use bd_data::MemorySource;

    const CSV: &str = "name,city\nada,london\ngrace,\nlinus,helsinki\n";

    #[tokio::test]
    async fn test_renders_page_and_footer() {
        let memory = MemorySource::new("memory");
        let source = memory.ingest("people.csv", CSV.as_bytes()).unwrap();
        let mut coordinator = Coordinator::new(
            Arc::new(memory),
            CoordinatorSettings {
                default_view: ViewKind::Explorer,
                page_size: 2,
            },
        );
        let view = ExplorerView::default();
        assert!(view.render(&coordinator).starts_with("Select a file"));

        coordinator.refresh_sources().await.unwrap();
        let requests = coordinator.select(&source.id).unwrap();
        assert_eq!(view.render(&coordinator), "Loading...");

        coordinator.run(requests).await;
        let text = view.render(&coordinator);
        assert!(text.contains("ada"));
        assert!(text.contains(MISSING_PLACEHOLDER));
        assert!(!text.contains("linus"));
        assert!(text.ends_with("Page 1 of 2 (3 rows, 2 per page)  [next]"));
    }

    #[test]
    fn test_long_values_are_truncated() {
        let view = ExplorerView::new(ExplorerConfig {
            max_cell_width: 4,
            show_row_numbers: false,
        });
        assert_eq!(view.truncate("abcdef"), "abc…");
        assert_eq!(view.truncate("abcd"), "abcd");
    }
}
