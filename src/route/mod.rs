//! Message routes and their textual form in the manifest.
//!
//! A route travels between the graph and the manifest as a string such as
//! `FROM /messages/modules/A/outputs/out WHERE temp > 10 INTO BrokeredEndpoint("/modules/B/inputs/in")`.
//! [`codec`] translates between that string and [`Route`], [`naming`] derives
//! the manifest keys the strings are stored under.

pub mod codec;
pub mod naming;

use serde::{Deserialize, Serialize};

use crate::model::{UPSTREAM, UPSTREAM_PORT};

/// Unique identifier for a route within a graph.
pub type RouteId = u32;

/// A directed message route from a module output to a module input or upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub source_module: String,
    pub source_port: String,
    pub target_module: String,
    /// input name, or `$upstream` when the target is the upstream node
    pub target_port: String,
    /// filter expression, empty when the route is unconditional
    pub condition: String,
}

impl Route {
    pub fn new(
        source_module: impl Into<String>,
        source_port: impl Into<String>,
        target_module: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_module: source_module.into(),
            source_port: source_port.into(),
            target_module: target_module.into(),
            target_port: target_port.into(),
            condition: String::new(),
        }
    }

    /// A route to the upstream node.
    pub fn upstream(
        source_module: impl Into<String>,
        source_port: impl Into<String>,
    ) -> Self {
        Self::new(source_module, source_port, UPSTREAM, UPSTREAM_PORT)
    }

    pub fn with_condition(
        mut self,
        condition: impl Into<String>,
    ) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn is_upstream(&self) -> bool {
        self.target_module == UPSTREAM
    }

    /// Both ports are filled in. Incomplete routes are never persisted.
    pub fn is_complete(&self) -> bool {
        !self.source_port.is_empty() && !self.target_port.is_empty()
    }
}
