//! In-process data source that ingests CSV text the way the API server does

use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashSet;
use async_trait::async_trait;
use chrono::Utc;
use csv::ReaderBuilder;
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::info;

use super::DataAccess;
use crate::config::{NullConfig, MISSING_PLACEHOLDER};
use crate::model::{
    Cell, ColumnConfig, ColumnRole, DataSource, ExplorerPage, InsightsSnapshot, MissingValues,
    Row, SourceId, ValueCounts,
};
use crate::{DataError, Result};

/// Everything an annotator gets to see about a column
#[derive(Debug, Clone)]
pub struct AnnotationContext<'a> {
    pub source: &'a DataSource,
    pub column: &'a str,
    pub value_counts: &'a ValueCounts,
    /// The remaining metadata columns of the source
    pub other_meta_columns: Vec<&'a str>,
}

/// Produces natural-language annotations for metadata columns
pub trait Annotator: Send + Sync {
    fn annotate(&self, context: &AnnotationContext<'_>) -> Result<String>;
}

/// Deterministic annotator that summarizes the value distribution
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryAnnotator;

impl Annotator for SummaryAnnotator {
    fn annotate(&self, context: &AnnotationContext<'_>) -> Result<String> {
        let counts = &context.value_counts.value_counts;
        let total: u64 = counts.values().sum();

        let mut text = format!(
            "'{}' contains {} rows. Column '{}' takes {} distinct values",
            context.source.filename,
            context.source.rows_count,
            context.column,
            counts.len()
        );

        // Counts are stored most frequent first
        if let Some((value, count)) = counts.iter().next() {
            let share = if total > 0 {
                *count as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            text.push_str(&format!(
                "; the most common is '{}' with {} rows ({:.1}%)",
                value, count, share
            ));
        }
        text.push('.');

        if !context.other_meta_columns.is_empty() {
            text.push_str(&format!(
                " It can be cross-tabulated with {}.",
                context.other_meta_columns.join(", ")
            ));
        }

        Ok(text)
    }
}

/// An ingested file
struct StoredFile {
    source: DataSource,
    rows: Vec<Row>,
    insights: InsightsSnapshot,
}

/// Data source holding ingested files in memory
pub struct MemorySource {
    name: String,
    files: RwLock<IndexMap<SourceId, StoredFile>>,
    next_id: AtomicU64,
    null_config: NullConfig,
    annotator: Box<dyn Annotator>,
}

impl MemorySource {
    /// Create an empty in-memory source
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: RwLock::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
            null_config: NullConfig::default(),
            annotator: Box::new(SummaryAnnotator),
        }
    }

    pub fn with_annotator(mut self, annotator: Box<dyn Annotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_null_config(mut self, null_config: NullConfig) -> Self {
        self.null_config = null_config;
        self
    }

    /// Parse CSV text, classify its columns and store it
    pub fn ingest(&self, filename: &str, contents: &[u8]) -> Result<DataSource> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(contents);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.is_empty() {
            return Err(DataError::InvalidRequest(format!("{} has no header row", filename)));
        }

        // Read all records, keeping missing cells as None
        let mut records: Vec<Vec<Option<String>>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            let values = (0..headers.len())
                .map(|idx| {
                    record
                        .get(idx)
                        .filter(|value| !self.null_config.is_null(value))
                        .map(|value| value.to_string())
                })
                .collect();
            records.push(values);
        }

        let columns_config = Self::classify_columns(&headers, &records);
        let rows = Self::build_rows(&headers, &columns_config, records);
        let rows_count = rows.len();

        let id = SourceId::new(format!("{:024x}", self.next_id.fetch_add(1, Ordering::Relaxed)));
        let source = DataSource {
            id: id.clone(),
            filename: filename.to_string(),
            columns_config,
            rows_count,
            uploaded_at: Some(Utc::now().naive_utc()),
        };
        let insights = Self::compute_insights(&source, &rows);

        info!(
            "Ingested {} as {} ({} rows, {} meta columns)",
            filename,
            id,
            rows_count,
            source.meta_columns().len()
        );

        self.files.write().insert(
            id,
            StoredFile {
                source: source.clone(),
                rows,
                insights,
            },
        );

        Ok(source)
    }

    /// Column roles and missing counts
    fn classify_columns(
        headers: &[String],
        records: &[Vec<Option<String>>],
    ) -> IndexMap<String, ColumnConfig> {
        headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                let mut distinct = AHashSet::new();
                let mut empty_values_count = 0;
                for record in records {
                    match record.get(idx).and_then(Option::as_deref) {
                        Some(value) => {
                            distinct.insert(value);
                        }
                        None => empty_values_count += 1,
                    }
                }

                let config = ColumnConfig {
                    index: idx,
                    role: ColumnRole::from_distinct_count(distinct.len()),
                    empty_values_count,
                };
                (header.clone(), config)
            })
            .collect()
    }

    fn build_rows(
        headers: &[String],
        columns_config: &IndexMap<String, ColumnConfig>,
        records: Vec<Vec<Option<String>>>,
    ) -> Vec<Row> {
        records
            .into_iter()
            .enumerate()
            .map(|(idx, values)| Row {
                row_number: idx + 1,
                columns: values
                    .into_iter()
                    .zip(headers)
                    .enumerate()
                    .map(|(col_idx, (value, header))| Cell {
                        index: col_idx,
                        header: header.clone(),
                        input_value: value.unwrap_or_else(|| MISSING_PLACEHOLDER.to_string()),
                        role: columns_config.get(header).map(|c| c.role),
                    })
                    .collect(),
            })
            .collect()
    }

    fn compute_insights(source: &DataSource, rows: &[Row]) -> InsightsSnapshot {
        let missing_values = source
            .columns_config
            .iter()
            .map(|(name, config)| {
                let missing_percentage = if source.rows_count == 0 {
                    0.0
                } else {
                    config.empty_values_count as f64 * 100.0 / source.rows_count as f64
                };
                (
                    name.clone(),
                    MissingValues {
                        column_index: config.index,
                        missing_percentage,
                    },
                )
            })
            .collect();

        let meta_value_counts = source
            .columns_config
            .iter()
            .filter(|(_, config)| config.role == ColumnRole::Meta)
            .map(|(name, config)| {
                let mut counts: IndexMap<String, u64> = IndexMap::new();
                for row in rows {
                    if let Some(cell) = row.columns.get(config.index) {
                        *counts.entry(cell.input_value.clone()).or_insert(0) += 1;
                    }
                }
                // Most frequent first; ties keep first appearance
                counts.sort_by(|_, a, _, b| b.cmp(a));
                (
                    name.clone(),
                    ValueCounts {
                        column_index: config.index,
                        value_counts: counts,
                    },
                )
            })
            .collect();

        InsightsSnapshot {
            meta_value_counts,
            missing_values,
        }
    }

    fn not_found(id: &SourceId) -> DataError {
        DataError::NotFound(format!("source {}", id))
    }
}

#[async_trait]
impl DataAccess for MemorySource {
    async fn list_sources(&self) -> Result<Vec<DataSource>> {
        Ok(self
            .files
            .read()
            .values()
            .map(|file| file.source.clone())
            .collect())
    }

    async fn fetch_rows(&self, id: &SourceId, skip: usize, limit: usize) -> Result<ExplorerPage> {
        if limit == 0 {
            return Err(DataError::InvalidRequest("limit must be positive".to_string()));
        }

        let files = self.files.read();
        let file = files.get(id).ok_or_else(|| Self::not_found(id))?;
        Ok(ExplorerPage {
            skip,
            limit,
            rows: file.rows.iter().skip(skip).take(limit).cloned().collect(),
            rows_count: file.rows.len(),
        })
    }

    async fn fetch_insights(&self, id: &SourceId) -> Result<InsightsSnapshot> {
        let files = self.files.read();
        let file = files.get(id).ok_or_else(|| Self::not_found(id))?;
        Ok(file.insights.clone())
    }

    async fn request_annotation(&self, id: &SourceId, column: &str) -> Result<String> {
        let files = self.files.read();
        let file = files.get(id).ok_or_else(|| Self::not_found(id))?;

        match file.source.role_of(column) {
            None => return Err(DataError::NotFound(format!("column '{}'", column))),
            Some(ColumnRole::Meta) => {}
            Some(role) => {
                return Err(DataError::InvalidRequest(format!(
                    "column '{}' has role {:?}, not meta",
                    column, role
                )))
            }
        }

        let value_counts = file
            .insights
            .meta_value_counts
            .get(column)
            .ok_or_else(|| DataError::NotFound(format!("value counts for '{}'", column)))?;

        let context = AnnotationContext {
            source: &file.source,
            column,
            value_counts,
            other_meta_columns: file
                .source
                .meta_columns()
                .into_iter()
                .filter(|name| *name != column)
                .collect(),
        };
        self.annotator.annotate(&context)
    }

    async fn upload(&self, filename: &str, contents: Vec<u8>) -> Result<DataSource> {
        self.ingest(filename, &contents)
    }

    async fn delete(&self, id: &SourceId) -> Result<()> {
        if self.files.write().shift_remove(id).is_some() {
            info!("Deleted source {}", id);
        }
        Ok(())
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}
