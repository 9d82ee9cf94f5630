//! Chart slots that own at most one render artifact

use std::sync::Arc;

use bd_render::{ChartBackend, ChartSpec, RenderArtifact, RenderError};
use tracing::{debug, warn};

/// Data a chart slot can be bound to
pub trait Bindable {
    /// Whether `other` refers to the same dataset.
    ///
    /// Implementations compare by reference, not by value.
    fn same_binding(&self, other: &Self) -> bool;

    /// Build the chart for this binding
    fn chart_spec(&self) -> ChartSpec;

    /// Bindings without data show a placeholder instead of a chart
    fn is_empty(&self) -> bool {
        self.chart_spec().is_empty()
    }
}

/// One renderable chart position.
///
/// Rebinding to a different dataset destroys the current artifact before a
/// new one is created, so a slot never holds two live artifacts.
pub struct ChartSlot<B: Bindable> {
    name: &'static str,
    backend: Arc<dyn ChartBackend>,
    binding: Option<B>,
    artifact: Option<RenderArtifact>,
}

impl<B: Bindable> ChartSlot<B> {
    pub fn new(name: &'static str, backend: Arc<dyn ChartBackend>) -> Self {
        Self {
            name,
            backend,
            binding: None,
            artifact: None,
        }
    }

    /// Bind the slot to new data.
    ///
    /// Returns `Ok(false)` when the binding refers to the current dataset and
    /// nothing was rebuilt.
    pub fn bind(&mut self, binding: Option<B>) -> Result<bool, RenderError> {
        let unchanged = match (&self.binding, &binding) {
            (None, None) => true,
            (Some(current), Some(next)) => current.same_binding(next),
            _ => false,
        };
        if unchanged {
            return Ok(false);
        }

        self.release();
        self.binding = None;

        if let Some(binding) = binding {
            // The binding is kept only once its chart exists, so a failed
            // build is retried on the next bind
            if binding.is_empty() {
                debug!("{} chart shows a placeholder", self.name);
            } else {
                self.artifact = Some(self.backend.create(&binding.chart_spec())?);
                debug!("Rebuilt {} chart", self.name);
            }
            self.binding = Some(binding);
        }

        Ok(true)
    }

    /// Destroy any live artifact and drop the binding
    pub fn teardown(&mut self) {
        self.release();
        self.binding = None;
    }

    pub fn artifact(&self) -> Option<&RenderArtifact> {
        self.artifact.as_ref()
    }

    pub fn binding(&self) -> Option<&B> {
        self.binding.as_ref()
    }

    /// True when the slot shows a placeholder
    pub fn is_placeholder(&self) -> bool {
        self.artifact.is_none()
    }

    fn release(&mut self) {
        if let Some(artifact) = self.artifact.take() {
            if let Err(e) = self.backend.destroy(artifact) {
                warn!("Failed to destroy {} chart: {}", self.name, e);
            }
        }
    }
}

impl<B: Bindable> Drop for ChartSlot<B> {
    fn drop(&mut self) {
        self.release();
    }
}
