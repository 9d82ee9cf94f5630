//! Insights view: value distribution pie and missing-values bar chart

use std::sync::Arc;

use bd_core::Coordinator;
use bd_data::{InsightsSnapshot, ViewKind};
use bd_render::{ChartBackend, ChartSpec, RenderArtifact, RenderError};

use crate::lifecycle::{Bindable, ChartSlot};
use crate::status_message;

/// Pie chart of the value counts of one metadata column
pub struct PieBinding {
    pub insights: Arc<InsightsSnapshot>,
    pub column: String,
}

impl Bindable for PieBinding {
    fn same_binding(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.insights, &other.insights) && self.column == other.column
    }

    fn chart_spec(&self) -> ChartSpec {
        let spec = ChartSpec::pie(format!("Value counts of '{}'", self.column));
        match self.insights.meta_value_counts.get(&self.column) {
            Some(counts) => counts
                .value_counts
                .iter()
                .fold(spec, |spec, (value, count)| spec.with_point(value.clone(), *count as f64)),
            None => spec,
        }
    }
}

/// Bar chart of missing-value percentages per column
pub struct BarBinding {
    pub insights: Arc<InsightsSnapshot>,
}

impl Bindable for BarBinding {
    fn same_binding(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.insights, &other.insights)
    }

    fn chart_spec(&self) -> ChartSpec {
        self.insights
            .missing_values
            .iter()
            .fold(
                ChartSpec::bar("Missing values (%)").with_y_max(100.0),
                |spec, (column, missing)| spec.with_point(column.clone(), missing.missing_percentage),
            )
    }
}

/// The insights tab
pub struct InsightsView {
    pie: ChartSlot<PieBinding>,
    bar: ChartSlot<BarBinding>,
    chosen_column: Option<String>,
}

impl InsightsView {
    pub fn new(backend: Arc<dyn ChartBackend>) -> Self {
        Self {
            pie: ChartSlot::new("value counts", backend.clone()),
            bar: ChartSlot::new("missing values", backend),
            chosen_column: None,
        }
    }

    /// Pick the metadata column shown in the pie chart
    pub fn choose_column(&mut self, column: impl Into<String>) {
        self.chosen_column = Some(column.into());
    }

    /// Column the pie chart is currently bound to
    pub fn chosen_column(&self) -> Option<&str> {
        self.chosen_column.as_deref()
    }

    /// Rebind both charts to the coordinator's current insights.
    ///
    /// A chosen column that is not a metadata column of the selection falls
    /// back to the first metadata column.
    pub fn sync(&mut self, coordinator: &Coordinator) -> Result<(), RenderError> {
        let meta_columns = coordinator.meta_columns();
        let valid = self
            .chosen_column
            .as_deref()
            .is_some_and(|column| meta_columns.contains(&column));
        if !valid {
            self.chosen_column = meta_columns.first().map(|column| column.to_string());
        }

        let insights = coordinator.insights().cloned();

        let pie = insights
            .clone()
            .zip(self.chosen_column.clone())
            .map(|(insights, column)| PieBinding { insights, column });
        self.pie.bind(pie)?;
        self.bar.bind(insights.map(|insights| BarBinding { insights }))?;
        Ok(())
    }

    pub fn pie_artifact(&self) -> Option<&RenderArtifact> {
        self.pie.artifact()
    }

    pub fn bar_artifact(&self) -> Option<&RenderArtifact> {
        self.bar.artifact()
    }

    /// Message to show instead of the charts, if any
    pub fn status(&self, coordinator: &Coordinator) -> Option<String> {
        if coordinator.selected().is_none() {
            return Some("Select a file to see its insights".to_string());
        }
        status_message(coordinator.entry(ViewKind::Insights))
    }

    /// Release both charts
    pub fn teardown(&mut self) {
        self.pie.teardown();
        self.bar.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_core::CoordinatorSettings;
    use bd_data::{
        ColumnConfig, ColumnRole, DataSource, MemorySource, MissingValues, SourceId, ValueCounts,
        ViewPayload,
    };
    use bd_render::TextBackend;
    use indexmap::IndexMap;

    fn source(id: &str) -> Arc<DataSource> {
        let mut columns_config = IndexMap::new();
        for (index, name) in ["region", "channel"].iter().enumerate() {
            columns_config.insert(
                name.to_string(),
                ColumnConfig {
                    index,
                    role: ColumnRole::Meta,
                    empty_values_count: 0,
                },
            );
        }
        Arc::new(DataSource {
            id: SourceId::new(id),
            filename: format!("{}.csv", id),
            columns_config,
            rows_count: 4,
            uploaded_at: None,
        })
    }

    fn snapshot() -> ViewPayload {
        let mut snapshot = InsightsSnapshot::default();
        for (index, name) in ["region", "channel"].iter().enumerate() {
            let mut value_counts = IndexMap::new();
            value_counts.insert("a".to_string(), 3);
            value_counts.insert("b".to_string(), 1);
            snapshot.meta_value_counts.insert(
                name.to_string(),
                ValueCounts {
                    column_index: index,
                    value_counts,
                },
            );
            snapshot.missing_values.insert(
                name.to_string(),
                MissingValues {
                    column_index: index,
                    missing_percentage: 25.0,
                },
            );
        }
        ViewPayload::Insights(Arc::new(snapshot))
    }

    fn loaded(id: &str, coordinator: &mut Coordinator) {
        let request = coordinator.select_source(source(id)).remove(0);
        coordinator.resolve(&request, Ok(snapshot()));
    }

    fn setup() -> (Arc<TextBackend>, Coordinator, InsightsView) {
        let backend = Arc::new(TextBackend::new());
        let coordinator = Coordinator::new(
            Arc::new(MemorySource::new("test")),
            CoordinatorSettings::default(),
        );
        let view = InsightsView::new(backend.clone());
        (backend, coordinator, view)
    }

    #[test]
    fn test_charts_follow_the_selection() {
        let (backend, mut coordinator, mut view) = setup();

        view.sync(&coordinator).unwrap();
        assert!(view.pie_artifact().is_none());
        assert!(view.status(&coordinator).is_some());

        loaded("a", &mut coordinator);
        view.sync(&coordinator).unwrap();
        assert_eq!(view.chosen_column(), Some("region"));
        assert_eq!(backend.live_artifacts(), 2);
        let pie = backend.output(view.pie_artifact().unwrap()).unwrap();
        assert!(pie.contains("75.0%"));

        // Re-syncing against the same snapshot keeps the charts
        view.sync(&coordinator).unwrap();
        assert_eq!(backend.created(), 2);

        // A new selection tears the old charts down while it loads
        coordinator.select_source(source("b"));
        view.sync(&coordinator).unwrap();
        assert_eq!(backend.live_artifacts(), 0);
        assert_eq!(view.status(&coordinator).as_deref(), Some("Loading..."));
    }

    #[test]
    fn test_choosing_a_column_rebinds_only_the_pie() {
        let (backend, mut coordinator, mut view) = setup();
        loaded("a", &mut coordinator);
        view.sync(&coordinator).unwrap();

        view.choose_column("channel");
        view.sync(&coordinator).unwrap();
        assert_eq!((backend.created(), backend.destroyed()), (3, 1));
        assert_eq!(backend.live_artifacts(), 2);

        view.choose_column("nonexistent");
        view.sync(&coordinator).unwrap();
        assert_eq!(view.chosen_column(), Some("region"));

        view.teardown();
        assert_eq!(backend.live_artifacts(), 0);
    }
}
