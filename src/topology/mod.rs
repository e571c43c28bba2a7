//! In-memory deployment topology.
//!
//! Nodes are the user modules, the two system modules and the virtual
//! upstream node; edges are message routes. The graph is rebuilt from the
//! manifest on every load and mutated in place while the user edits.

mod edge;
mod graph;
mod node;

pub use edge::RouteEdge;
pub use graph::TopologyGraph;
pub use node::{Node, NodeData, NodeId, NodeKind, Position, SystemKind};
