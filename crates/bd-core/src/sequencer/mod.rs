//! Request sequencing for fetches issued against a changing selection

use std::sync::Arc;

use ahash::AHashMap;
use tracing::debug;

use bd_data::{DataAccess, DataError, SourceId, ViewKey, ViewPayload};

/// A fetch issued by the coordinator, with the context captured at issue time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Monotonically increasing token
    pub token: u64,
    pub source: SourceId,
    pub key: ViewKey,
}

/// Result of running a [`FetchRequest`]
pub type FetchOutcome = Result<ViewPayload, DataError>;

/// Tracks the outstanding fetch per (source, view key).
///
/// A second request for a key that is already in flight is suppressed, and a
/// completion only counts if its token is the one currently tracked.
#[derive(Debug, Default)]
pub struct FetchSequencer {
    next_token: u64,
    in_flight: AHashMap<(SourceId, ViewKey), u64>,
}

impl FetchSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request, or `None` if one is already outstanding
    pub fn issue(&mut self, source: &SourceId, key: ViewKey) -> Option<FetchRequest> {
        let slot = (source.clone(), key.clone());
        if self.in_flight.contains_key(&slot) {
            debug!("Suppressing duplicate fetch for {} {:?}", source, key);
            return None;
        }

        self.next_token += 1;
        let token = self.next_token;
        self.in_flight.insert(slot, token);

        Some(FetchRequest {
            token,
            source: source.clone(),
            key,
        })
    }

    /// Release the slot of a finished request.
    ///
    /// Returns `false` when the request was superseded (its slot was reset or
    /// reissued), in which case nothing is released.
    pub fn complete(&mut self, request: &FetchRequest) -> bool {
        let slot = (request.source.clone(), request.key.clone());
        match self.in_flight.get(&slot) {
            Some(token) if *token == request.token => {
                self.in_flight.remove(&slot);
                true
            }
            _ => false,
        }
    }

    pub fn is_in_flight(&self, source: &SourceId, key: &ViewKey) -> bool {
        self.in_flight.contains_key(&(source.clone(), key.clone()))
    }

    /// Whether any outstanding request for `source` matches `filter`
    pub fn any_in_flight<F>(&self, source: &SourceId, filter: F) -> bool
    where
        F: Fn(&ViewKey) -> bool,
    {
        self.in_flight
            .keys()
            .any(|(slot_source, key)| slot_source == source && filter(key))
    }

    /// Number of outstanding requests
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Forget every outstanding request; their results will be ignored
    pub fn reset(&mut self) {
        if !self.in_flight.is_empty() {
            debug!("Abandoning {} in-flight fetches", self.in_flight.len());
        }
        self.in_flight.clear();
    }
}

/// Run a request against the data access layer
pub async fn perform(access: &dyn DataAccess, request: &FetchRequest) -> FetchOutcome {
    let source = &request.source;
    let payload = match &request.key {
        ViewKey::Explorer(page) => ViewPayload::Page(Arc::new(
            access.fetch_rows(source, page.skip, page.limit).await?,
        )),
        ViewKey::Insights => ViewPayload::Insights(Arc::new(access.fetch_insights(source).await?)),
        ViewKey::Annotation(column) => ViewPayload::Annotation(Arc::from(
            access.request_annotation(source, column).await?,
        )),
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_data::PageKey;

    #[test]
    fn test_duplicates_are_suppressed() {
        let mut sequencer = FetchSequencer::new();
        let a = SourceId::new("a");

        let first = sequencer.issue(&a, ViewKey::Insights).unwrap();
        assert!(sequencer.issue(&a, ViewKey::Insights).is_none());

        let page = sequencer.issue(&a, ViewKey::Explorer(PageKey::new(0, 10))).unwrap();
        assert!(page.token > first.token);
        assert_eq!(sequencer.pending(), 2);
    }

    #[test]
    fn test_completion_releases_slot() {
        let mut sequencer = FetchSequencer::new();
        let a = SourceId::new("a");

        let request = sequencer.issue(&a, ViewKey::Insights).unwrap();
        assert!(sequencer.complete(&request));
        assert!(!sequencer.is_in_flight(&a, &ViewKey::Insights));
        assert!(sequencer.issue(&a, ViewKey::Insights).is_some());
    }

    #[test]
    fn test_in_flight_lookup_is_per_source() {
        let mut sequencer = FetchSequencer::new();
        let a = SourceId::new("a");
        let b = SourceId::new("b");

        sequencer.issue(&a, ViewKey::Annotation("region".into())).unwrap();
        let is_annotation = |key: &ViewKey| matches!(key, ViewKey::Annotation(_));
        assert!(sequencer.any_in_flight(&a, is_annotation));
        assert!(!sequencer.any_in_flight(&b, is_annotation));
        assert!(!sequencer.any_in_flight(&a, |key| *key == ViewKey::Insights));
    }

    #[test]
    fn test_superseded_requests_do_not_complete() {
        let mut sequencer = FetchSequencer::new();
        let a = SourceId::new("a");

        let stale = sequencer.issue(&a, ViewKey::Insights).unwrap();
        sequencer.reset();
        let fresh = sequencer.issue(&a, ViewKey::Insights).unwrap();

        assert!(!sequencer.complete(&stale));
        assert!(sequencer.is_in_flight(&a, &ViewKey::Insights));
        assert!(sequencer.complete(&fresh));
    }
}
