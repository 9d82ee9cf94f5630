use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

/// Event bus carrying coordinator notifications to presentation code
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<SharedHandler>>>>,
}

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Coordinator events
pub mod events {
    use super::Event;
    use bd_data::{SourceId, ViewKind};

    /// A new data source was selected
    #[derive(Debug, Clone)]
    pub struct SelectionChanged {
        pub source_id: SourceId,
        pub filename: String,
    }

    /// The selection was dropped, e.g. after its source was deleted
    #[derive(Debug, Clone)]
    pub struct SelectionCleared {
        pub source_id: SourceId,
    }

    /// A view became active
    #[derive(Debug, Clone)]
    pub struct ViewActivated {
        pub view: ViewKind,
    }

    /// The explorer window moved or was resized
    #[derive(Debug, Clone)]
    pub struct PageChanged {
        pub skip: usize,
        pub limit: usize,
        pub current_page: usize,
    }

    /// An annotation was requested for a column
    #[derive(Debug, Clone)]
    pub struct AnnotationRequested {
        pub source_id: SourceId,
        pub column: String,
    }

    /// A resolved fetch was dropped because its context went stale
    #[derive(Debug, Clone)]
    pub struct FetchDiscarded {
        pub source_id: SourceId,
        pub view: ViewKind,
    }

    // Implement Event trait for all event types
    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(
        SelectionChanged,
        SelectionCleared,
        ViewActivated,
        PageChanged,
        AnnotationRequested,
        FetchDiscarded
    );
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers
            .entry(type_id)
            .or_insert_with(Vec::new)
            .push(Arc::new(Mutex::new(handler)));
    }

    /// Publish an event.
    ///
    /// Handlers run synchronously after the bus lock is released, so they may
    /// subscribe or publish other events. A handler must not publish the event
    /// type it is handling.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let event_handlers: Vec<SharedHandler> = match self.handlers.lock().get(&type_id) {
            Some(event_handlers) => event_handlers.clone(),
            None => return,
        };

        for handler in event_handlers {
            handler.lock().handle(&event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}
