//! Events emitted while a view edits a topology.
//!
//! Hosts subscribe through [`EventBus`] to follow what a view does without
//! polling its state, e.g. to flag an editor tab as modified.

mod bus;

pub use bus::{EditorEventHandle, EventBus, EventSubscriber, SubscribeOptions};

use serde::Serialize;

use crate::{route::RouteId, session::EditTarget, topology::NodeId};

/// Identifier of one open view.
pub type ViewId = String;

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditorEvent {
    /// A manifest was loaded and the topology rebuilt.
    Loaded {
        modules: usize,
        routes: usize,
    },
    RouteAdded {
        id: RouteId,
    },
    RouteRemoved {
        id: RouteId,
    },
    ModuleRemoved {
        name: NodeId,
    },
    /// A target has unsaved changes.
    Dirty {
        target: EditTarget,
    },
    /// A pending edit was written into the topology.
    Committed {
        target: EditTarget,
    },
    /// A pending edit was dropped.
    Reverted {
        target: EditTarget,
    },
    /// The whole manifest was sent to the host.
    PageSaved {
        routes: usize,
    },
    Error {
        message: String,
    },
}

/// Event message with its view context.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// View that produced the event.
    pub view: ViewId,
    /// Node name, `#<route id>`, `$system`, or empty for view-wide events.
    pub subject: String,
    pub event: EditorEvent,
    /// Timestamp in milliseconds.
    pub timestamp: i64,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl EditorEvent {
    pub fn is_error(&self) -> bool {
        matches!(self, EditorEvent::Error { .. })
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self, EditorEvent::Dirty { .. })
    }
}
