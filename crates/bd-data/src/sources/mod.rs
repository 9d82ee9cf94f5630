//! Remote data access

pub mod http_source;
pub mod memory_source;

pub use http_source::HttpSource;
pub use memory_source::{AnnotationContext, Annotator, MemorySource, SummaryAnnotator};

use async_trait::async_trait;

use crate::model::{DataSource, ExplorerPage, InsightsSnapshot, SourceId};
use crate::Result;

/// The remote operations the viewer consumes
#[async_trait]
pub trait DataAccess: Send + Sync {
    /// List every ingested source
    async fn list_sources(&self) -> Result<Vec<DataSource>>;

    /// Fetch a window of raw rows
    async fn fetch_rows(&self, id: &SourceId, skip: usize, limit: usize) -> Result<ExplorerPage>;

    /// Fetch the precomputed summaries of a source
    async fn fetch_insights(&self, id: &SourceId) -> Result<InsightsSnapshot>;

    /// Ask for a natural-language annotation of a metadata column
    async fn request_annotation(&self, id: &SourceId, column: &str) -> Result<String>;

    /// Ingest a CSV file
    async fn upload(&self, filename: &str, contents: Vec<u8>) -> Result<DataSource>;

    /// Delete a source and its rows
    async fn delete(&self, id: &SourceId) -> Result<()>;

    /// Human readable name of the backend
    fn source_name(&self) -> &str;
}
