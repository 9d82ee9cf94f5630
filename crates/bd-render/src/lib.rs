//! Chart rendering abstraction
//!
//! A [`ChartBackend`] turns a [`ChartSpec`] into a [`RenderArtifact`] and
//! releases it again. Artifacts are plain handles; the backend owns whatever
//! resources stand behind them.

use thiserror::Error;
use uuid::Uuid;

mod text;

pub use text::TextBackend;

/// Errors raised by chart backends
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Invalid chart: {0}")]
    InvalidSpec(String),

    #[error("Unknown render artifact {0}")]
    UnknownArtifact(Uuid),
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;

/// Chart shapes used by the insights view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    Pie,
    Bar,
}

/// Everything a backend needs to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Fixed upper bound of the value axis; the largest value when unset
    pub y_max: Option<f64>,
}

impl ChartSpec {
    pub fn pie(title: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::Pie,
            title: title.into(),
            labels: Vec::new(),
            values: Vec::new(),
            y_max: None,
        }
    }

    pub fn bar(title: impl Into<String>) -> Self {
        Self {
            kind: ChartKind::Bar,
            ..Self::pie(title)
        }
    }

    /// Append one labelled value
    pub fn with_point(mut self, label: impl Into<String>, value: f64) -> Self {
        self.labels.push(label.into());
        self.values.push(value);
        self
    }

    pub fn with_y_max(mut self, y_max: f64) -> Self {
        self.y_max = Some(y_max);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Check that labels and values line up and every value is drawable
    pub fn validate(&self) -> Result<()> {
        if self.labels.len() != self.values.len() {
            return Err(RenderError::InvalidSpec(format!(
                "{} labels for {} values",
                self.labels.len(),
                self.values.len()
            )));
        }
        if let Some(value) = self.values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(RenderError::InvalidSpec(format!("cannot draw value {}", value)));
        }
        Ok(())
    }
}

/// Handle to a constructed chart.
///
/// Not `Clone`: exactly one owner may hand it back to [`ChartBackend::destroy`].
#[derive(Debug, PartialEq, Eq)]
pub struct RenderArtifact {
    id: Uuid,
    kind: ChartKind,
}

impl RenderArtifact {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ChartKind {
        self.kind
    }
}

/// Trait for chart backends
pub trait ChartBackend: Send + Sync {
    /// Construct a chart
    fn create(&self, spec: &ChartSpec) -> Result<RenderArtifact>;

    /// Release a chart and everything attached to it
    fn destroy(&self, artifact: RenderArtifact) -> Result<()>;

    /// Number of artifacts created and not yet destroyed
    fn live_artifacts(&self) -> usize;

    /// Backend name for logging
    fn name(&self) -> &str;
}
