//! The view coordinator.
//!
//! Commands mutate the owned [`ViewState`] synchronously and return the
//! fetches they need. The caller runs those fetches (see [`perform`]) and
//! feeds each outcome back through [`Coordinator::resolve`], which applies it
//! only if the context captured at issue time is still current.

use std::sync::Arc;

use tracing::{debug, info, warn};

use bd_data::{
    CacheEntry, DataAccess, DataError, DataSource, ExplorerPage, InsightsSnapshot, SourceId,
    ViewCache, ViewKey, ViewKind, ViewPayload,
};

use crate::events::{events, EventBus};
use crate::pagination::PageSummary;
use crate::sequencer::{perform, FetchOutcome, FetchRequest, FetchSequencer};
use crate::state::{CoordinatorSettings, Selection, ViewState};

/// What happened to a resolved fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The outcome was written to the cache
    Applied,
    /// The selection, view or page moved on; the outcome was dropped
    Discarded,
}

/// Owns selection, view and pagination state plus the per-view cache
pub struct Coordinator {
    access: Arc<dyn DataAccess>,
    settings: CoordinatorSettings,
    sources: Vec<Arc<DataSource>>,
    state: ViewState,
    cache: ViewCache,
    sequencer: FetchSequencer,
    events: Arc<EventBus>,
}

impl Coordinator {
    /// Create a coordinator with nothing selected
    pub fn new(access: Arc<dyn DataAccess>, settings: CoordinatorSettings) -> Self {
        Self {
            access,
            state: ViewState::new(&settings),
            settings,
            sources: Vec::new(),
            cache: ViewCache::new(),
            sequencer: FetchSequencer::new(),
            events: Arc::new(EventBus::new()),
        }
    }

    pub fn access(&self) -> Arc<dyn DataAccess> {
        self.access.clone()
    }

    /// Notifications published by commands and by [`Coordinator::resolve`].
    ///
    /// Handlers run synchronously inside the command that triggered them.
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    // ----------------------------------------------------------------------
    // Source listing

    /// Reload the list of selectable sources
    pub async fn refresh_sources(&mut self) -> Result<&[Arc<DataSource>], DataError> {
        let listed = self.access.list_sources().await?;
        info!("Listed {} sources from {}", listed.len(), self.access.source_name());
        self.sources = listed.into_iter().map(Arc::new).collect();
        Ok(&self.sources)
    }

    pub fn sources(&self) -> &[Arc<DataSource>] {
        &self.sources
    }

    /// Ingest a CSV file and refresh the listing
    pub async fn upload(&mut self, filename: &str, contents: Vec<u8>) -> Result<Arc<DataSource>, DataError> {
        let uploaded = self.access.upload(filename, contents).await?;
        info!("Uploaded {} as {}", filename, uploaded.id);
        self.refresh_sources().await?;

        Ok(self
            .sources
            .iter()
            .find(|source| source.id == uploaded.id)
            .cloned()
            .unwrap_or_else(|| Arc::new(uploaded)))
    }

    /// Delete a source, dropping the selection if it was the selected one
    pub async fn delete_source(&mut self, id: &SourceId) -> Result<(), DataError> {
        self.access.delete(id).await?;
        if self.state.selection.source_id() == Some(id) {
            self.clear_selection();
        }
        self.refresh_sources().await?;
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Commands

    /// Select a listed source by id
    pub fn select(&mut self, id: &SourceId) -> Result<Vec<FetchRequest>, DataError> {
        let source = self
            .sources
            .iter()
            .find(|source| &source.id == id)
            .cloned()
            .ok_or_else(|| DataError::NotFound(format!("source {}", id)))?;
        Ok(self.select_source(source))
    }

    /// Select a source, resetting the cache, the active view and the page.
    ///
    /// Selecting a value-equal source again changes nothing.
    pub fn select_source(&mut self, source: Arc<DataSource>) -> Vec<FetchRequest> {
        if self.state.selection.is_same(&source) {
            debug!("Source {} is already selected", source.id);
            return Vec::new();
        }

        info!("Selecting {} ({})", source.filename, source.id);
        self.cache.reset(Some(source.id.clone()));
        self.sequencer.reset();
        self.state
            .reset_for(Selection::Selected(source.clone()), &self.settings);

        self.events.publish(events::SelectionChanged {
            source_id: source.id.clone(),
            filename: source.filename.clone(),
        });

        self.fetch_active_view()
    }

    /// Return to the empty state
    pub fn clear_selection(&mut self) {
        let Some(source_id) = self.state.selection.source_id().cloned() else {
            return;
        };

        info!("Clearing selection of {}", source_id);
        self.cache.reset(None);
        self.sequencer.reset();
        self.state.reset_for(Selection::NoSelection, &self.settings);
        self.events.publish(events::SelectionCleared { source_id });
    }

    /// Make a view active, fetching its data on a cache miss
    pub fn activate_view(&mut self, view: ViewKind) -> Vec<FetchRequest> {
        if self.state.active_view != view {
            debug!("Activating {} view", view);
            self.state.active_view = view;
            self.events.publish(events::ViewActivated { view });
        }
        self.fetch_active_view()
    }

    pub fn go_to_next_page(&mut self) -> Vec<FetchRequest> {
        if self.state.selection.source().is_none() || self.state.page.go_next().is_none() {
            debug!("Next page unavailable");
            return Vec::new();
        }
        self.page_changed()
    }

    pub fn go_to_previous_page(&mut self) -> Vec<FetchRequest> {
        if self.state.selection.source().is_none() || self.state.page.go_previous().is_none() {
            debug!("Previous page unavailable");
            return Vec::new();
        }
        self.page_changed()
    }

    /// Change the explorer page size and return to the first page
    pub fn set_page_size(&mut self, limit: usize) -> Result<Vec<FetchRequest>, DataError> {
        if limit == 0 {
            return Err(DataError::InvalidRequest("page size must be positive".to_string()));
        }
        self.state.page.set_limit(limit);
        Ok(self.page_changed())
    }

    /// Ask for an annotation of a metadata column of the selected source.
    ///
    /// Only one annotation fetch per source may be outstanding; while one is
    /// pending, further requests change nothing and issue no fetch.
    pub fn request_annotation(&mut self, column: &str) -> Result<Vec<FetchRequest>, DataError> {
        let source = self
            .state
            .selection
            .source()
            .cloned()
            .ok_or_else(|| DataError::InvalidRequest("no source selected".to_string()))?;

        if !source.is_meta_column(column) {
            return Err(DataError::InvalidRequest(format!(
                "'{}' is not a metadata column of {}",
                column, source.filename
            )));
        }

        if self.annotation_in_flight(&source.id) {
            debug!("Annotation already pending for {}; ignoring '{}'", source.id, column);
            return Ok(Vec::new());
        }

        self.state.annotation_column = Some(column.to_string());
        self.events.publish(events::AnnotationRequested {
            source_id: source.id.clone(),
            column: column.to_string(),
        });

        if self.state.active_view != ViewKind::Annotation {
            self.state.active_view = ViewKind::Annotation;
            self.events.publish(events::ViewActivated {
                view: ViewKind::Annotation,
            });
        }

        Ok(self.ensure(&source.id, ViewKey::Annotation(column.to_string())))
    }

    // ----------------------------------------------------------------------
    // Fetch resolution

    /// Apply the outcome of a fetch if its context is still current
    pub fn resolve(&mut self, request: &FetchRequest, outcome: FetchOutcome) -> Resolution {
        let tracked = self.sequencer.complete(request);

        if !tracked || !self.is_current(request) {
            // The slot is ours only if the sequencer still tracked this token
            if tracked && self.cache.get(&request.key).is_loading() {
                self.cache.forget(&request.key);
            }
            warn!(
                "Discarding stale {:?} result for {} (token {})",
                request.key, request.source, request.token
            );
            self.events.publish(events::FetchDiscarded {
                source_id: request.source.clone(),
                view: request.key.kind(),
            });
            return Resolution::Discarded;
        }

        match outcome {
            Ok(payload) => {
                if let ViewPayload::Page(page) = &payload {
                    self.state.page.set_total(page.rows_count);
                }
                info!("Loaded {:?} for {}", request.key, request.source);
                self.cache.store(&request.source, request.key.clone(), payload);
            }
            Err(error) => {
                warn!(
                    "{} fetch for {} failed ({}): {}",
                    request.key.kind(),
                    request.source,
                    error.kind(),
                    error
                );
                self.cache.fail(&request.source, request.key.clone(), error);
            }
        }

        Resolution::Applied
    }

    /// Run fetches one after another and resolve each
    pub async fn run(&mut self, requests: Vec<FetchRequest>) -> Vec<Resolution> {
        let access = self.access.clone();
        let mut resolutions = Vec::with_capacity(requests.len());
        for request in requests {
            let outcome = perform(access.as_ref(), &request).await;
            resolutions.push(self.resolve(&request, outcome));
        }
        resolutions
    }

    fn is_current(&self, request: &FetchRequest) -> bool {
        if self.state.selection.source_id() != Some(&request.source) {
            return false;
        }
        if self.state.active_view != request.key.kind() {
            return false;
        }

        match &request.key {
            ViewKey::Explorer(page) => *page == self.state.page.key(),
            ViewKey::Insights => true,
            ViewKey::Annotation(column) => {
                self.state.annotation_column.as_deref() == Some(column.as_str())
            }
        }
    }

    fn page_changed(&mut self) -> Vec<FetchRequest> {
        let page = self.state.page;
        self.events.publish(events::PageChanged {
            skip: page.skip(),
            limit: page.limit(),
            current_page: page.current_page(),
        });

        if self.state.active_view == ViewKind::Explorer {
            self.fetch_active_view()
        } else {
            Vec::new()
        }
    }

    /// Issue the proactive fetch of the active view, if any
    fn fetch_active_view(&mut self) -> Vec<FetchRequest> {
        let Some(source_id) = self.state.selection.source_id().cloned() else {
            return Vec::new();
        };

        match self.state.active_view {
            ViewKind::Explorer => {
                let key = ViewKey::Explorer(self.state.page.key());
                self.ensure(&source_id, key)
            }
            ViewKind::Insights => self.ensure(&source_id, ViewKey::Insights),
            // Annotations are only fetched on explicit request
            ViewKind::Annotation => Vec::new(),
        }
    }

    /// Fetch a key unless it is cached or already loading
    fn ensure(&mut self, source: &SourceId, key: ViewKey) -> Vec<FetchRequest> {
        match self.cache.get(&key) {
            CacheEntry::Present(_) | CacheEntry::Loading => {
                debug!("No fetch needed for {:?}", key);
                return Vec::new();
            }
            CacheEntry::Absent | CacheEntry::Failed(_) => {}
        }

        match self.sequencer.issue(source, key.clone()) {
            Some(request) => {
                self.cache.mark_loading(source, key);
                vec![request]
            }
            None => Vec::new(),
        }
    }

    // ----------------------------------------------------------------------
    // Queries

    pub fn selected(&self) -> Option<&Arc<DataSource>> {
        self.state.selection.source()
    }

    pub fn active_view(&self) -> ViewKind {
        self.state.active_view
    }

    /// Cache entry currently backing a view
    pub fn entry(&self, view: ViewKind) -> &CacheEntry {
        match view {
            ViewKind::Explorer => self.cache.get(&ViewKey::Explorer(self.state.page.key())),
            ViewKind::Insights => self.cache.get(&ViewKey::Insights),
            ViewKind::Annotation => match &self.state.annotation_column {
                Some(column) => self.cache.get(&ViewKey::Annotation(column.clone())),
                None => CacheEntry::absent(),
            },
        }
    }

    pub fn active_entry(&self) -> &CacheEntry {
        self.entry(self.state.active_view)
    }

    /// True iff the active view's entry is loading
    pub fn is_loading(&self) -> bool {
        self.active_entry().is_loading()
    }

    pub fn is_view_loading(&self, view: ViewKind) -> bool {
        self.entry(view).is_loading()
    }

    pub fn explorer_page(&self) -> Option<&Arc<ExplorerPage>> {
        self.entry(ViewKind::Explorer).page()
    }

    pub fn insights(&self) -> Option<&Arc<InsightsSnapshot>> {
        self.entry(ViewKind::Insights).insights()
    }

    pub fn annotation(&self) -> Option<&str> {
        self.entry(ViewKind::Annotation).annotation()
    }

    pub fn annotation_column(&self) -> Option<&str> {
        self.state.annotation_column.as_deref()
    }

    pub fn page_summary(&self) -> PageSummary {
        self.state.page.summary()
    }

    /// Metadata columns of the selected source
    pub fn meta_columns(&self) -> Vec<&str> {
        self.selected()
            .map(|source| source.meta_columns())
            .unwrap_or_default()
    }

    /// Whether an annotation request for `column` would be accepted right now
    pub fn can_submit_annotation(&self, column: Option<&str>) -> bool {
        let (Some(column), Some(source)) = (column, self.selected()) else {
            return false;
        };
        source.is_meta_column(column) && !self.annotation_in_flight(&source.id)
    }

    fn annotation_in_flight(&self, source: &SourceId) -> bool {
        self.sequencer
            .any_in_flight(source, |key| matches!(key, ViewKey::Annotation(_)))
    }

    /// Number of fetches issued but not yet resolved
    pub fn pending_fetches(&self) -> usize {
        self.sequencer.pending()
    }
}
