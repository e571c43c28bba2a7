use std::sync::{Arc, PoisonError, RwLock};

use globset::{Glob, GlobMatcher};
use tracing::trace;

use crate::{
    EdgeflowError, Result, ShareLock,
    events::{Event, Message},
};

macro_rules! dispatch_event {
    ($handles:expr, $(&$item:ident), +) => {
        let handlers = $handles.read().unwrap_or_else(PoisonError::into_inner);
        for handle in handlers.iter() {
            (handle)($(&$item),+);
        }
    };
}

pub type EditorEventHandle = Arc<dyn Fn(&Event<Message>) + Send + Sync>;

/// Synchronous event fan-out. Handlers run on the thread that emits.
#[derive(Clone, Default)]
pub struct EventBus {
    handlers: ShareLock<Vec<EditorEventHandle>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn emit(
        &self,
        message: Message,
    ) {
        trace!("event {} {:?}", message.subject, message.event);
        let event = Event::new(&message);
        dispatch_event!(self.handlers, &event);
    }

    fn register(
        &self,
        handle: EditorEventHandle,
    ) {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner).push(handle);
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    /// use the glob pattern to match the view id
    /// eg. view1*
    pub view: String,

    /// use the glob pattern to match the subject
    /// eg. Filter*
    pub subject: String,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            view: "*".to_string(),
            subject: "*".to_string(),
        }
    }
}

impl SubscribeOptions {
    pub fn with_view(view: impl Into<String>) -> Self {
        Self {
            view: view.into(),
            subject: "*".to_string(),
        }
    }

    pub fn with_subject(subject: impl Into<String>) -> Self {
        Self {
            view: "*".to_string(),
            subject: subject.into(),
        }
    }
}

/// Registers filtered handlers on an [`EventBus`].
#[derive(Clone)]
pub struct EventSubscriber {
    bus: EventBus,
    glob: (GlobMatcher, GlobMatcher),
}

impl EventSubscriber {
    pub fn new(
        bus: &EventBus,
        options: SubscribeOptions,
    ) -> Result<Self> {
        let compile = |pattern: &str| -> Result<GlobMatcher> {
            Glob::new(pattern).map(|g| g.compile_matcher()).map_err(|e| EdgeflowError::Config(format!("invalid glob '{}': {}", pattern, e)))
        };

        Ok(Self {
            bus: bus.clone(),
            glob: (compile(&options.view)?, compile(&options.subject)?),
        })
    }

    pub fn on_event(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.bus.register(Arc::new(move |e| {
            if is_match(&glob, e) {
                f(e);
            }
        }));
    }

    pub fn on_error(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.bus.register(Arc::new(move |e| {
            if e.event.is_error() && is_match(&glob, e) {
                f(e);
            }
        }));
    }

    pub fn on_dirty(
        &self,
        f: impl Fn(&Event<Message>) + Send + Sync + 'static,
    ) {
        let glob = self.glob.clone();

        self.bus.register(Arc::new(move |e| {
            if e.event.is_dirty() && is_match(&glob, e) {
                f(e);
            }
        }));
    }
}

fn is_match(
    glob: &(GlobMatcher, GlobMatcher),
    e: &Event<Message>,
) -> bool {
    let (pat_view, pat_subject) = glob;
    pat_view.is_match(&e.view) && pat_subject.is_match(&e.subject)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::events::EditorEvent;

    fn message(
        view: &str,
        subject: &str,
        event: EditorEvent,
    ) -> Message {
        Message {
            view: view.to_string(),
            subject: subject.to_string(),
            event,
            timestamp: 0,
        }
    }

    #[test]
    fn test_filters_by_view_and_subject() {
        let bus = EventBus::new();
        let all = Arc::new(AtomicUsize::new(0));
        let filters = Arc::new(AtomicUsize::new(0));

        let counter = all.clone();
        EventSubscriber::new(&bus, SubscribeOptions::with_view("panel1"))
            .unwrap()
            .on_event(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let counter = filters.clone();
        EventSubscriber::new(&bus, SubscribeOptions::with_subject("Filter*"))
            .unwrap()
            .on_event(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        for (view, name) in [("panel1", "FilterModule"), ("panel1", "SensorModule"), ("panel2", "FilterModule2")] {
            bus.emit(message(
                view,
                name,
                EditorEvent::ModuleRemoved {
                    name: name.into(),
                },
            ));
        }

        assert_eq!(all.load(Ordering::SeqCst), 2);
        assert_eq!(filters.load(Ordering::SeqCst), 2);
        assert_eq!(bus.handler_count(), 2);
    }

    #[test]
    fn test_on_error_only_sees_errors() {
        let bus = EventBus::new();
        let errors = Arc::new(AtomicUsize::new(0));

        let counter = errors.clone();
        EventSubscriber::new(&bus, SubscribeOptions::default()).unwrap().on_error(move |e| {
            assert!(e.event.is_error());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(message(
            "v",
            "",
            EditorEvent::PageSaved {
                routes: 1,
            },
        ));
        bus.emit(message(
            "v",
            "",
            EditorEvent::Error {
                message: "boom".into(),
            },
        ));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_glob() {
        let bus = EventBus::new();
        assert!(EventSubscriber::new(&bus, SubscribeOptions::with_subject("[")).is_err());
    }
}
