use serde::{Deserialize, Serialize};

use crate::model::{EDGE_AGENT, EDGE_HUB, Module};

/// node id, the module name for user modules
pub type NodeId = String;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Module,
    System,
    Upstream,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SystemKind {
    EdgeAgent,
    EdgeHub,
}

impl SystemKind {
    pub fn node_id(&self) -> &'static str {
        match self {
            SystemKind::EdgeAgent => EDGE_AGENT,
            SystemKind::EdgeHub => EDGE_HUB,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Module(Module),
    /// settings live in the graph's system modules
    System(SystemKind),
    Upstream,
}

/// Canvas position, set by dragging. Never written to the manifest.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub data: NodeData,
    pub position: Option<Position>,
}

impl Node {
    pub(crate) fn new(
        id: impl Into<NodeId>,
        data: NodeData,
    ) -> Self {
        Self {
            id: id.into(),
            data,
            position: None,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Module(_) => NodeKind::Module,
            NodeData::System(_) => NodeKind::System,
            NodeData::Upstream => NodeKind::Upstream,
        }
    }

    pub fn module(&self) -> Option<&Module> {
        match &self.data {
            NodeData::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn module_mut(&mut self) -> Option<&mut Module> {
        match &mut self.data {
            NodeData::Module(module) => Some(module),
            _ => None,
        }
    }
}
