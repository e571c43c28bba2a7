//! Serde models for the parts of a deployment manifest the editor understands.

mod manifest;
mod module;

pub use manifest::Manifest;
pub use module::{EDGE_AGENT, EDGE_HUB, Module, ModuleStatus, RestartPolicy, SystemModule, SystemModules, UPSTREAM, UPSTREAM_PORT, is_reserved_name};
