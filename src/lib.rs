//! # Edgeflow
//!
//! Edgeflow is the editing core of a visual designer for IoT Edge deployment
//! manifests. It turns the module and route sections of a manifest into a
//! graph, lets a user change that graph through an edit session, and writes
//! the result back into the same document.
//!
//! ## Core Features
//!
//! - **Route codec**: Parses and prints the edge hub route language
//! - **Topology graph**: Modules, system nodes and the upstream endpoint as nodes, routes as edges
//! - **Edit session**: One target at a time with an explicit save or discard of pending edits
//! - **View protocol**: Message-based contract between a host and any number of independent views
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use edgeflow::{EditorConfig, UserAction, ViewController, ViewPort};
//!
//! let (host, view_end, ui) = ViewPort::pair(256);
//! let mut view = ViewController::new(EditorConfig::default());
//! tokio::spawn(async move { view.serve(view_end).await });
//!
//! host.load(manifest_json)?;
//! ui.send(UserAction::Connect { source: "SensorModule".into(), target: "IoTHub".into() })?;
//! ```

mod common;
mod config;
mod editor;
mod error;
mod utils;

pub mod events;
pub mod model;
pub mod protocol;
pub mod route;
pub mod session;
pub mod topology;

use std::sync::{Arc, RwLock};

pub use config::{CurvinessConfig, EditorConfig, RouteNaming};
pub use editor::EditorState;
pub use error::EdgeflowError;
pub use events::{EditorEvent, EventBus, EventSubscriber, SubscribeOptions};
pub use model::{Manifest, Module};
pub use protocol::{HostEnd, HostMessage, Reply, UiEnd, UserAction, ViewController, ViewEnd, ViewMessage, ViewPort};
pub use route::{Route, RouteId};
pub use session::{EditSession, EditTarget};
pub use topology::TopologyGraph;

/// Result type alias for Edgeflow operations.
pub type Result<T> = std::result::Result<T, EdgeflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
