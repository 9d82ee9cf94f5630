//! Wire-level data model shared by the sources, the cache and the coordinator

use std::fmt;

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Opaque identifier of an ingested data source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Role assigned to a column at ingestion time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnRole {
    /// At most one distinct value; carries no information
    Ignore,
    /// Categorical column with few distinct values
    Meta,
    /// Raw content column
    Data,
}

impl ColumnRole {
    /// Classify a column from its number of distinct non-missing values
    pub fn from_distinct_count(distinct: usize) -> Self {
        if distinct <= 1 {
            ColumnRole::Ignore
        } else if distinct < 10 {
            ColumnRole::Meta
        } else {
            ColumnRole::Data
        }
    }
}

/// Per-column ingestion metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Position of the column in the source file
    #[serde(default)]
    pub index: usize,

    /// Column role
    #[serde(rename = "type")]
    pub role: ColumnRole,

    /// Number of missing cells
    #[serde(default)]
    pub empty_values_count: usize,
}

/// A previously ingested tabular dataset.
///
/// Sources are immutable once fetched: a new selection always replaces the
/// whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "_id")]
    pub id: SourceId,

    pub filename: String,

    /// Column name to ingestion metadata, in file order
    #[serde(default)]
    pub columns_config: IndexMap<String, ColumnConfig>,

    /// Total row count; the listing endpoint may omit it
    #[serde(default)]
    pub rows_count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<NaiveDateTime>,
}

impl DataSource {
    /// Role of a column, if the column exists
    pub fn role_of(&self, column: &str) -> Option<ColumnRole> {
        self.columns_config.get(column).map(|config| config.role)
    }

    /// Whether the column is eligible for value distributions and annotations
    pub fn is_meta_column(&self, column: &str) -> bool {
        self.role_of(column) == Some(ColumnRole::Meta)
    }

    /// Names of all metadata columns, in file order
    pub fn meta_columns(&self) -> Vec<&str> {
        self.columns_config
            .iter()
            .filter(|(_, config)| config.role == ColumnRole::Meta)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// The display modes of the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Explorer,
    Insights,
    Annotation,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Insights, ViewKind::Annotation, ViewKind::Explorer];

    pub fn label(&self) -> &'static str {
        match self {
            ViewKind::Explorer => "Explorer",
            ViewKind::Insights => "Insights",
            ViewKind::Annotation => "Annotation",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "explorer" | "rows" => Ok(ViewKind::Explorer),
            "insights" => Ok(ViewKind::Insights),
            "annotation" | "ask" => Ok(ViewKind::Annotation),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

/// Window of rows requested from the explorer endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageKey {
    pub skip: usize,
    pub limit: usize,
}

impl PageKey {
    pub fn new(skip: usize, limit: usize) -> Self {
        Self { skip, limit }
    }
}

/// A single cell of an explorer row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub index: usize,
    pub header: String,
    pub input_value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ColumnRole>,
}

/// An explorer row with its 1-based row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub row_number: usize,
    pub columns: Vec<Cell>,
}

/// One page of raw rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerPage {
    pub skip: usize,
    pub limit: usize,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub rows_count: usize,
}

impl ExplorerPage {
    pub fn key(&self) -> PageKey {
        PageKey::new(self.skip, self.limit)
    }

    /// Column headers, taken from the first row
    pub fn headers(&self) -> Vec<&str> {
        self.rows
            .first()
            .map(|row| row.columns.iter().map(|cell| cell.header.as_str()).collect())
            .unwrap_or_default()
    }
}

/// Value frequencies of one metadata column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCounts {
    pub column_index: usize,
    pub value_counts: IndexMap<String, u64>,
}

/// Share of missing cells in one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValues {
    pub column_index: usize,
    #[serde(alias = "empty_values_percentage")]
    pub missing_percentage: f64,
}

/// Precomputed statistical summaries of a source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsSnapshot {
    #[serde(default)]
    pub meta_value_counts: IndexMap<String, ValueCounts>,
    #[serde(default)]
    pub missing_values: IndexMap<String, MissingValues>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_from_listing_json() {
        let json = r#"{
            "_id": "65a1",
            "filename": "sales.csv",
            "columns_config": {
                "region": {"index": 0, "type": "meta", "empty_values_count": 2},
                "notes": {"index": 1, "type": "data", "empty_values_count": 0},
                "const": {"index": 2, "type": "ignore", "empty_values_count": 0}
            }
        }"#;

        let source: DataSource = serde_json::from_str(json).unwrap();
        assert_eq!(source.id.as_str(), "65a1");
        assert_eq!(source.rows_count, 0);
        assert_eq!(source.meta_columns(), vec!["region"]);
        assert!(source.is_meta_column("region"));
        assert!(!source.is_meta_column("notes"));
        assert_eq!(source.role_of("missing"), None);
    }

    #[test]
    fn test_missing_values_accepts_server_spelling() {
        let json = r#"{
            "missing_values": {"region": {"column_index": 0, "empty_values_percentage": 12.5}},
            "meta_value_counts": {"region": {"column_index": 0, "value_counts": {"north": 3, "south": 1}}}
        }"#;

        let snapshot: InsightsSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.missing_values["region"].missing_percentage, 12.5);
        assert_eq!(snapshot.meta_value_counts["region"].value_counts["north"], 3);
    }

    #[test]
    fn test_column_role_thresholds() {
        assert_eq!(ColumnRole::from_distinct_count(0), ColumnRole::Ignore);
        assert_eq!(ColumnRole::from_distinct_count(1), ColumnRole::Ignore);
        assert_eq!(ColumnRole::from_distinct_count(2), ColumnRole::Meta);
        assert_eq!(ColumnRole::from_distinct_count(9), ColumnRole::Meta);
        assert_eq!(ColumnRole::from_distinct_count(10), ColumnRole::Data);
    }

    #[test]
    fn test_view_kind_parsing() {
        assert_eq!("Explorer".parse::<ViewKind>().unwrap(), ViewKind::Explorer);
        assert_eq!("ask".parse::<ViewKind>().unwrap(), ViewKind::Annotation);
        assert!("charts".parse::<ViewKind>().is_err());
    }
}
