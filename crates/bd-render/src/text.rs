//! Terminal chart backend

use std::sync::atomic::{AtomicUsize, Ordering};

use ahash::AHashMap;
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::{ChartBackend, ChartKind, ChartSpec, RenderArtifact, RenderError, Result};

const BAR_WIDTH: usize = 40;

/// Renders charts as plain text and keeps the output of every live artifact
pub struct TextBackend {
    live: Mutex<AHashMap<Uuid, String>>,
    created: AtomicUsize,
    destroyed: AtomicUsize,
}

impl TextBackend {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(AHashMap::new()),
            created: AtomicUsize::new(0),
            destroyed: AtomicUsize::new(0),
        }
    }

    /// Rendered text of a live artifact
    pub fn output(&self, artifact: &RenderArtifact) -> Option<String> {
        self.live.lock().get(&artifact.id()).cloned()
    }

    /// Total number of artifacts ever created
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Total number of artifacts ever destroyed
    pub fn destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn render(spec: &ChartSpec) -> String {
        let mut out = format!("{}\n", spec.title);
        if spec.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        let label_width = spec.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let total: f64 = spec.values.iter().sum();
        let scale = match spec.kind {
            ChartKind::Pie => total,
            ChartKind::Bar => spec
                .y_max
                .unwrap_or_else(|| spec.values.iter().cloned().fold(0.0, f64::max)),
        };

        for (label, value) in spec.labels.iter().zip(&spec.values) {
            let filled = if scale > 0.0 {
                ((value / scale).min(1.0) * BAR_WIDTH as f64).round() as usize
            } else {
                0
            };
            let bar = "#".repeat(filled);

            match spec.kind {
                ChartKind::Pie => {
                    let share = if total > 0.0 { value * 100.0 / total } else { 0.0 };
                    out.push_str(&format!(
                        "  {:<width$} {:<bar_width$} {:>5.1}% ({})\n",
                        label,
                        bar,
                        share,
                        value,
                        width = label_width,
                        bar_width = BAR_WIDTH
                    ));
                }
                ChartKind::Bar => {
                    out.push_str(&format!(
                        "  {:<width$} {:<bar_width$} {:.2}\n",
                        label,
                        bar,
                        value,
                        width = label_width,
                        bar_width = BAR_WIDTH
                    ));
                }
            }
        }
        out
    }
}

impl Default for TextBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartBackend for TextBackend {
    fn create(&self, spec: &ChartSpec) -> Result<RenderArtifact> {
        spec.validate()?;

        let artifact = RenderArtifact::new(spec.kind);
        self.live.lock().insert(artifact.id(), Self::render(spec));
        self.created.fetch_add(1, Ordering::SeqCst);
        debug!("Created {:?} chart {} '{}'", spec.kind, artifact.id(), spec.title);
        Ok(artifact)
    }

    fn destroy(&self, artifact: RenderArtifact) -> Result<()> {
        if self.live.lock().remove(&artifact.id()).is_none() {
            return Err(RenderError::UnknownArtifact(artifact.id()));
        }
        self.destroyed.fetch_add(1, Ordering::SeqCst);
        debug!("Destroyed chart {}", artifact.id());
        Ok(())
    }

    fn live_artifacts(&self) -> usize {
        self.live.lock().len()
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_destroy_track_live_artifacts() {
        let backend = TextBackend::new();
        let spec = ChartSpec::pie("region").with_point("north", 3.0).with_point("south", 1.0);

        let artifact = backend.create(&spec).unwrap();
        assert_eq!(backend.live_artifacts(), 1);

        let text = backend.output(&artifact).unwrap();
        assert!(text.starts_with("region\n"));
        assert!(text.contains("75.0%"));

        backend.destroy(artifact).unwrap();
        assert_eq!(backend.live_artifacts(), 0);
        assert_eq!((backend.created(), backend.destroyed()), (1, 1));
    }

    #[test]
    fn test_bar_respects_fixed_axis() {
        let backend = TextBackend::new();
        let spec = ChartSpec::bar("missing")
            .with_point("a", 50.0)
            .with_y_max(100.0);

        let artifact = backend.create(&spec).unwrap();
        let text = backend.output(&artifact).unwrap();
        assert!(text.contains(&format!("a {:<40} 50.00", "#".repeat(20))));
    }

    #[test]
    fn test_invalid_specs_are_rejected() {
        let backend = TextBackend::new();
        let mut spec = ChartSpec::pie("broken").with_point("a", 1.0);
        spec.labels.push("b".into());
        assert!(matches!(backend.create(&spec), Err(RenderError::InvalidSpec(_))));

        let negative = ChartSpec::bar("negative").with_point("a", -1.0);
        assert!(backend.create(&negative).is_err());
        assert_eq!(backend.created(), 0);
    }

    #[test]
    fn test_destroying_twice_fails() {
        let backend = TextBackend::new();
        let artifact = backend.create(&ChartSpec::pie("x").with_point("a", 1.0)).unwrap();
        let stale = RenderArtifact {
            id: artifact.id(),
            kind: artifact.kind(),
        };

        backend.destroy(artifact).unwrap();
        assert!(matches!(backend.destroy(stale), Err(RenderError::UnknownArtifact(_))));
    }
}
