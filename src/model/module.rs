use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the virtual node standing for the cloud upstream endpoint.
pub const UPSTREAM: &str = "IoTHub";
/// Target port written for routes into the upstream node.
pub const UPSTREAM_PORT: &str = "$upstream";
/// Graph key of the edge agent system module.
pub const EDGE_AGENT: &str = "$edgeAgent";
/// Graph key of the edge hub system module.
pub const EDGE_HUB: &str = "$edgeHub";

/// Names a user module may never take.
pub fn is_reserved_name(name: &str) -> bool {
    name == UPSTREAM || name.starts_with('$')
}

/// Desired run state of a module.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModuleStatus {
    #[default]
    Running,
    Stopped,
}

/// When the edge agent restarts a module.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RestartPolicy {
    #[default]
    Always,
    Never,
    OnFailed,
    OnUnhealthy,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SettingsModel {
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub create_options: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleModel {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: ModuleStatus,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    #[serde(default)]
    pub env: Option<Value>,
    #[serde(default)]
    pub settings: SettingsModel,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SystemModuleModel {
    #[serde(default)]
    pub status: Option<ModuleStatus>,
    #[serde(default)]
    pub restart_policy: Option<RestartPolicy>,
    #[serde(default)]
    pub settings: SettingsModel,
}

/// A user module of the deployment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    /// unique module name
    pub name: String,
    /// module schema version, `1.0` for new modules
    pub version: Option<String>,
    /// runtime type, `docker` for new modules
    pub kind: Option<String>,
    /// container image, `registry/repo:tag`
    pub image: String,
    /// docker create options, kept opaque
    pub create_options: Value,
    pub status: ModuleStatus,
    pub restart_policy: RestartPolicy,
    /// environment variables, kept opaque
    pub env: Option<Value>,
    /// desired properties of the module twin
    pub twin: Option<Value>,
}

impl Module {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: Some("1.0".to_string()),
            kind: Some("docker".to_string()),
            image: image.into(),
            create_options: Value::Null,
            status: ModuleStatus::default(),
            restart_policy: RestartPolicy::default(),
            env: None,
            twin: None,
        }
    }

    pub(crate) fn from_model(
        name: &str,
        model: ModuleModel,
        twin: Option<Value>,
    ) -> Self {
        Self {
            name: name.to_string(),
            version: model.version,
            kind: model.kind,
            image: model.settings.image,
            create_options: model.settings.create_options,
            status: model.status,
            restart_policy: model.restart_policy,
            env: model.env,
            twin,
        }
    }
}

/// Settings of one system module. The edge agent carries neither status nor restart policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemModule {
    pub image: String,
    pub create_options: Value,
    pub status: Option<ModuleStatus>,
    pub restart_policy: Option<RestartPolicy>,
}

impl SystemModule {
    pub(crate) fn from_model(model: SystemModuleModel) -> Self {
        Self {
            image: model.settings.image,
            create_options: model.settings.create_options,
            status: model.status,
            restart_policy: model.restart_policy,
        }
    }
}

/// Everything edited through the system settings pane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemModules {
    pub edge_agent: SystemModule,
    pub edge_hub: SystemModule,
    /// `storeAndForwardConfiguration.timeToLiveSecs` of the edge hub
    pub store_and_forward_ttl: Option<u64>,
}
