//! Per-view result cache for the current selection

use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use crate::model::{ExplorerPage, InsightsSnapshot, PageKey, SourceId, ViewKind};
use crate::DataError;

/// Maximum number of explorer pages kept for one source
const MAX_CACHED_PAGES: usize = 50;

static ABSENT: CacheEntry = CacheEntry::Absent;

/// Cache key within one selection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    /// One explorer page; each window is a distinct payload
    Explorer(PageKey),
    Insights,
    /// Annotation for one column
    Annotation(String),
}

impl ViewKey {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewKey::Explorer(_) => ViewKind::Explorer,
            ViewKey::Insights => ViewKind::Insights,
            ViewKey::Annotation(_) => ViewKind::Annotation,
        }
    }
}

/// A fetched result.
///
/// Payloads are reference counted so views can compare dataset identity with
/// `Arc::ptr_eq` instead of by value.
#[derive(Debug, Clone)]
pub enum ViewPayload {
    Page(Arc<ExplorerPage>),
    Insights(Arc<InsightsSnapshot>),
    Annotation(Arc<str>),
}

/// State of one cache slot
#[derive(Debug, Clone, Default)]
pub enum CacheEntry {
    #[default]
    Absent,
    Loading,
    Present(ViewPayload),
    Failed(DataError),
}

impl CacheEntry {
    /// Shared `Absent` entry for keys that were never written
    pub fn absent() -> &'static CacheEntry {
        &ABSENT
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, CacheEntry::Loading)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, CacheEntry::Present(_))
    }

    pub fn payload(&self) -> Option<&ViewPayload> {
        match self {
            CacheEntry::Present(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DataError> {
        match self {
            CacheEntry::Failed(error) => Some(error),
            _ => None,
        }
    }

    pub fn page(&self) -> Option<&Arc<ExplorerPage>> {
        match self.payload()? {
            ViewPayload::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn insights(&self) -> Option<&Arc<InsightsSnapshot>> {
        match self.payload()? {
            ViewPayload::Insights(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn annotation(&self) -> Option<&str> {
        match self.payload()? {
            ViewPayload::Annotation(text) => Some(text),
            _ => None,
        }
    }
}

/// Cache of fetched results, scoped to a single data source.
///
/// Every entry belongs to the source passed to [`ViewCache::reset`]; writes
/// for any other source are refused, so nothing from a previous selection can
/// become observable again.
#[derive(Debug)]
pub struct ViewCache {
    source: Option<SourceId>,
    entries: AHashMap<ViewKey, CacheEntry>,
    /// Explorer pages in insertion order, oldest first
    page_order: Vec<PageKey>,
    max_pages: usize,
}

impl ViewCache {
    /// Create an empty cache bound to no source
    pub fn new() -> Self {
        Self::with_max_pages(MAX_CACHED_PAGES)
    }

    pub fn with_max_pages(max_pages: usize) -> Self {
        Self {
            source: None,
            entries: AHashMap::new(),
            page_order: Vec::new(),
            max_pages: max_pages.max(1),
        }
    }

    /// The source the entries belong to
    pub fn source(&self) -> Option<&SourceId> {
        self.source.as_ref()
    }

    /// Drop every entry and rebind to a new source
    pub fn reset(&mut self, source: Option<SourceId>) {
        debug!(
            "Resetting view cache ({} entries) for source {:?}",
            self.entries.len(),
            source.as_ref().map(SourceId::as_str)
        );
        self.entries.clear();
        self.page_order.clear();
        self.source = source;
    }

    /// Look up an entry; missing keys read as `Absent`
    pub fn get(&self, key: &ViewKey) -> &CacheEntry {
        self.entries.get(key).unwrap_or(&ABSENT)
    }

    /// Mark a key as being fetched
    pub fn mark_loading(&mut self, source: &SourceId, key: ViewKey) -> bool {
        self.put(source, key, CacheEntry::Loading)
    }

    /// Store a fetched payload
    pub fn store(&mut self, source: &SourceId, key: ViewKey, payload: ViewPayload) -> bool {
        self.put(source, key, CacheEntry::Present(payload))
    }

    /// Record a failed fetch
    pub fn fail(&mut self, source: &SourceId, key: ViewKey, error: DataError) -> bool {
        self.put(source, key, CacheEntry::Failed(error))
    }

    /// Forget a key entirely, returning it to `Absent`
    pub fn forget(&mut self, key: &ViewKey) {
        self.entries.remove(key);
        if let ViewKey::Explorer(page) = key {
            self.page_order.retain(|p| p != page);
        }
    }

    /// Number of entries, in any state
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn put(&mut self, source: &SourceId, key: ViewKey, entry: CacheEntry) -> bool {
        if self.source.as_ref() != Some(source) {
            debug!("Refusing cache write for {} (cache bound to {:?})", source, self.source);
            return false;
        }

        if let ViewKey::Explorer(page) = &key {
            self.touch_page(*page);
        }
        self.entries.insert(key, entry);
        true
    }

    /// Track page insertion order and evict the oldest settled pages
    fn touch_page(&mut self, page: PageKey) {
        if !self.page_order.contains(&page) {
            self.page_order.push(page);
        }

        while self.page_order.len() > self.max_pages {
            let victim = self
                .page_order
                .iter()
                .position(|p| !self.get(&ViewKey::Explorer(*p)).is_loading() && *p != page);
            match victim {
                Some(idx) => {
                    let evicted = self.page_order.remove(idx);
                    self.entries.remove(&ViewKey::Explorer(evicted));
                }
                None => break,
            }
        }
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(skip: usize, limit: usize) -> ViewPayload {
        ViewPayload::Page(Arc::new(ExplorerPage {
            skip,
            limit,
            rows: Vec::new(),
            rows_count: 100,
        }))
    }

    #[test]
    fn test_missing_keys_read_absent() {
        let cache = ViewCache::new();
        assert!(matches!(cache.get(&ViewKey::Insights), CacheEntry::Absent));
    }

    #[test]
    fn test_writes_for_other_source_are_refused() {
        let a = SourceId::new("a");
        let b = SourceId::new("b");
        let mut cache = ViewCache::new();
        cache.reset(Some(a.clone()));

        assert!(cache.mark_loading(&a, ViewKey::Insights));
        assert!(!cache.store(&b, ViewKey::Insights, page(0, 10)));
        assert!(cache.get(&ViewKey::Insights).is_loading());
    }

    #[test]
    fn test_reset_clears_everything() {
        let a = SourceId::new("a");
        let mut cache = ViewCache::new();
        cache.reset(Some(a.clone()));
        cache.store(&a, ViewKey::Explorer(PageKey::new(0, 10)), page(0, 10));
        cache.fail(&a, ViewKey::Insights, DataError::NotFound("a".into()));

        cache.reset(Some(SourceId::new("b")));
        assert!(cache.is_empty());
        assert!(matches!(
            cache.get(&ViewKey::Explorer(PageKey::new(0, 10))),
            CacheEntry::Absent
        ));
    }

    #[test]
    fn test_oldest_pages_are_evicted() {
        let a = SourceId::new("a");
        let mut cache = ViewCache::with_max_pages(2);
        cache.reset(Some(a.clone()));

        for skip in [0, 10, 20] {
            cache.store(&a, ViewKey::Explorer(PageKey::new(skip, 10)), page(skip, 10));
        }

        assert_eq!(cache.len(), 2);
        assert!(!cache.get(&ViewKey::Explorer(PageKey::new(0, 10))).is_present());
        assert!(cache.get(&ViewKey::Explorer(PageKey::new(20, 10))).is_present());
    }

    #[test]
    fn test_loading_pages_survive_eviction() {
        let a = SourceId::new("a");
        let mut cache = ViewCache::with_max_pages(1);
        cache.reset(Some(a.clone()));

        cache.mark_loading(&a, ViewKey::Explorer(PageKey::new(0, 10)));
        cache.store(&a, ViewKey::Explorer(PageKey::new(10, 10)), page(10, 10));

        assert!(cache.get(&ViewKey::Explorer(PageKey::new(0, 10))).is_loading());
    }
}
