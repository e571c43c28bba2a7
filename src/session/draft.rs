//! Unsaved copies of the edited values and the patches that change them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    model::{Module, ModuleStatus, RestartPolicy, SystemModules},
    route::Route,
};

/// Editable settings of a user module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDraft {
    pub image: String,
    pub create_options: Value,
    pub status: ModuleStatus,
    pub restart_policy: RestartPolicy,
    pub env: Option<Value>,
    pub twin: Option<Value>,
}

impl ModuleDraft {
    pub fn from_module(module: &Module) -> Self {
        Self {
            image: module.image.clone(),
            create_options: module.create_options.clone(),
            status: module.status,
            restart_policy: module.restart_policy,
            env: module.env.clone(),
            twin: module.twin.clone(),
        }
    }

    pub(crate) fn apply_to(
        &self,
        module: &mut Module,
    ) {
        module.image = self.image.clone();
        module.create_options = self.create_options.clone();
        module.status = self.status;
        module.restart_policy = self.restart_policy;
        module.env = self.env.clone();
        module.twin = self.twin.clone();
    }
}

/// Editable attributes of a route. Endpoints are fixed once connected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteDraft {
    pub source_port: String,
    pub target_port: String,
    pub condition: String,
}

impl RouteDraft {
    pub fn from_route(route: &Route) -> Self {
        Self {
            source_port: route.source_port.clone(),
            target_port: route.target_port.clone(),
            condition: route.condition.clone(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.source_port.is_empty() && !self.target_port.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Module(ModuleDraft),
    System(SystemModules),
    Route(RouteDraft),
}

/// Field changes for a module draft. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModulePatch {
    pub image: Option<String>,
    pub create_options: Option<Value>,
    pub status: Option<ModuleStatus>,
    pub restart_policy: Option<RestartPolicy>,
    pub env: Option<Value>,
    /// `Some(Value::Null)` removes the twin
    pub twin: Option<Value>,
}

impl ModulePatch {
    pub(crate) fn apply(
        &self,
        draft: &mut ModuleDraft,
    ) {
        if let Some(image) = &self.image {
            draft.image = image.clone();
        }
        if let Some(create_options) = &self.create_options {
            draft.create_options = create_options.clone();
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(policy) = self.restart_policy {
            draft.restart_policy = policy;
        }
        if let Some(env) = &self.env {
            draft.env = Some(env.clone());
        }
        if let Some(twin) = &self.twin {
            draft.twin = if twin.is_null() { None } else { Some(twin.clone()) };
        }
    }
}

/// Field changes for the system settings draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemPatch {
    pub edge_agent_image: Option<String>,
    pub edge_agent_create_options: Option<Value>,
    pub edge_hub_image: Option<String>,
    pub edge_hub_create_options: Option<Value>,
    pub edge_hub_status: Option<ModuleStatus>,
    pub edge_hub_restart_policy: Option<RestartPolicy>,
    pub store_and_forward_ttl: Option<u64>,
}

impl SystemPatch {
    pub(crate) fn apply(
        &self,
        draft: &mut SystemModules,
    ) {
        if let Some(image) = &self.edge_agent_image {
            draft.edge_agent.image = image.clone();
        }
        if let Some(create_options) = &self.edge_agent_create_options {
            draft.edge_agent.create_options = create_options.clone();
        }
        if let Some(image) = &self.edge_hub_image {
            draft.edge_hub.image = image.clone();
        }
        if let Some(create_options) = &self.edge_hub_create_options {
            draft.edge_hub.create_options = create_options.clone();
        }
        if let Some(status) = self.edge_hub_status {
            draft.edge_hub.status = Some(status);
        }
        if let Some(policy) = self.edge_hub_restart_policy {
            draft.edge_hub.restart_policy = Some(policy);
        }
        if let Some(ttl) = self.store_and_forward_ttl {
            draft.store_and_forward_ttl = Some(ttl);
        }
    }
}

/// Field changes for a route draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutePatch {
    pub source_port: Option<String>,
    pub target_port: Option<String>,
    pub condition: Option<String>,
}

impl RoutePatch {
    pub(crate) fn apply(
        &self,
        draft: &mut RouteDraft,
    ) {
        if let Some(port) = &self.source_port {
            draft.source_port = port.trim().to_string();
        }
        if let Some(port) = &self.target_port {
            draft.target_port = port.trim().to_string();
        }
        if let Some(condition) = &self.condition {
            draft.condition = condition.trim().to_string();
        }
    }
}
