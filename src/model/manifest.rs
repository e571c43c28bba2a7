//! Deployment manifest document.
//!
//! The editor never rebuilds a manifest from scratch. It keeps the loaded
//! document and rewrites only the sub-paths it models, so fields the editor
//! does not understand survive a load/save cycle.

use std::sync::LazyLock;

use serde_json::{Map, Value, json};

use crate::{
    EdgeflowError, Result,
    model::module::{EDGE_AGENT, EDGE_HUB, Module, ModuleModel, SystemModule, SystemModuleModel, SystemModules},
};

const DESIRED: &str = "properties.desired";

static MANIFEST_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "type": "object",
        "required": ["$edgeAgent", "$edgeHub"],
        "properties": {
            "$edgeAgent": {
                "type": "object",
                "required": ["properties.desired"],
                "properties": {
                    "properties.desired": {
                        "type": "object",
                        "required": ["systemModules"],
                        "properties": {
                            "modules": {
                                "type": "object",
                                "additionalProperties": {
                                    "type": "object",
                                    "properties": {
                                        "settings": {
                                            "type": "object",
                                            "properties": { "image": { "type": "string" } }
                                        }
                                    }
                                }
                            },
                            "systemModules": {
                                "type": "object",
                                "required": ["edgeAgent", "edgeHub"],
                                "properties": {
                                    "edgeAgent": { "type": "object" },
                                    "edgeHub": { "type": "object" }
                                }
                            }
                        }
                    }
                }
            },
            "$edgeHub": {
                "type": "object",
                "required": ["properties.desired"],
                "properties": {
                    "properties.desired": {
                        "type": "object",
                        "properties": {
                            "routes": {
                                "type": "object",
                                "additionalProperties": { "type": "string" }
                            }
                        }
                    }
                }
            }
        }
    })
});

/// A deployment manifest that has passed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    doc: Value,
}

impl Manifest {
    pub fn from_value(doc: Value) -> Result<Self> {
        jsonschema::validate(&MANIFEST_SCHEMA, &doc)?;
        Ok(Self {
            doc,
        })
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let doc = serde_json::from_str::<Value>(s).map_err(|e| EdgeflowError::Manifest(format!("{}", e)))?;
        Self::from_value(doc)
    }

    pub fn as_value(&self) -> &Value {
        &self.doc
    }

    pub fn into_value(self) -> Value {
        self.doc
    }

    fn desired(
        &self,
        owner: &str,
    ) -> Option<&Map<String, Value>> {
        self.doc.get(owner)?.get(DESIRED)?.as_object()
    }

    fn desired_mut(
        &mut self,
        owner: &str,
    ) -> &mut Map<String, Value> {
        let root = as_object(&mut self.doc);
        let owner = object_entry(root, owner);
        object_entry(owner, DESIRED)
    }

    /// User modules in document order, each with its twin when present.
    pub fn modules(&self) -> Result<Vec<Module>> {
        let Some(modules) = self.desired(EDGE_AGENT).and_then(|d| d.get("modules")).and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::with_capacity(modules.len());
        for (name, value) in modules.iter() {
            let model = serde_json::from_value::<ModuleModel>(value.clone()).map_err(|e| EdgeflowError::Manifest(format!("invalid module '{}': {}", name, e)))?;
            let twin = self.desired(name).map(|d| Value::Object(d.clone()));
            out.push(Module::from_model(name, model, twin));
        }
        Ok(out)
    }

    pub fn system_modules(&self) -> Result<SystemModules> {
        let system = self.desired(EDGE_AGENT).and_then(|d| d.get("systemModules")).ok_or(EdgeflowError::Manifest("missing systemModules".to_string()))?;

        let read = |key: &str| -> Result<SystemModule> {
            let value = system.get(key).cloned().unwrap_or(Value::Null);
            let model = serde_json::from_value::<SystemModuleModel>(value).map_err(|e| EdgeflowError::Manifest(format!("invalid system module '{}': {}", key, e)))?;
            Ok(SystemModule::from_model(model))
        };

        let store_and_forward_ttl = self
            .desired(EDGE_HUB)
            .and_then(|d| d.get("storeAndForwardConfiguration"))
            .and_then(|s| s.get("timeToLiveSecs"))
            .and_then(Value::as_u64);

        Ok(SystemModules {
            edge_agent: read("edgeAgent")?,
            edge_hub: read("edgeHub")?,
            store_and_forward_ttl,
        })
    }

    /// Route names and route strings in document order.
    pub fn routes(&self) -> Vec<(String, String)> {
        self.desired(EDGE_HUB)
            .and_then(|d| d.get("routes"))
            .and_then(Value::as_object)
            .map(|routes| routes.iter().filter_map(|(name, text)| text.as_str().map(|t| (name.clone(), t.to_string()))).collect())
            .unwrap_or_default()
    }

    /// Writes the given modules into the document, removing modules (and
    /// their twins) that are no longer present.
    pub fn write_modules<'a>(
        &mut self,
        modules: impl IntoIterator<Item = &'a Module>,
    ) {
        let modules: Vec<&Module> = modules.into_iter().collect();

        let removed: Vec<String> = {
            let map = object_entry(self.desired_mut(EDGE_AGENT), "modules");
            let removed: Vec<String> = map.keys().filter(|k| !modules.iter().any(|m| &m.name == *k)).cloned().collect();
            for name in removed.iter() {
                map.remove(name);
            }
            for module in modules.iter() {
                write_module(object_entry(map, &module.name), module);
            }
            removed
        };

        let root = as_object(&mut self.doc);
        for name in removed.iter() {
            root.remove(name);
        }
        for module in modules.iter() {
            match &module.twin {
                Some(twin) => {
                    object_entry(root, &module.name).insert(DESIRED.to_string(), twin.clone());
                }
                None => {
                    root.remove(&module.name);
                }
            }
        }
    }

    pub fn write_system_modules(
        &mut self,
        system: &SystemModules,
    ) {
        let map = object_entry(self.desired_mut(EDGE_AGENT), "systemModules");
        write_system_module(object_entry(map, "edgeAgent"), &system.edge_agent);
        write_system_module(object_entry(map, "edgeHub"), &system.edge_hub);

        if let Some(ttl) = system.store_and_forward_ttl {
            let hub = self.desired_mut(EDGE_HUB);
            object_entry(hub, "storeAndForwardConfiguration").insert("timeToLiveSecs".to_string(), json!(ttl));
        }
    }

    /// Replaces the whole routes map.
    pub fn write_routes(
        &mut self,
        routes: Map<String, Value>,
    ) {
        self.desired_mut(EDGE_HUB).insert("routes".to_string(), Value::Object(routes));
    }
}

fn write_module(
    target: &mut Map<String, Value>,
    module: &Module,
) {
    if let Some(version) = &module.version {
        target.insert("version".to_string(), json!(version));
    }
    if let Some(kind) = &module.kind {
        target.insert("type".to_string(), json!(kind));
    }
    target.insert("status".to_string(), json!(module.status));
    target.insert("restartPolicy".to_string(), json!(module.restart_policy));
    match &module.env {
        Some(env) => target.insert("env".to_string(), env.clone()),
        None => target.remove("env"),
    };
    write_settings(object_entry(target, "settings"), &module.image, &module.create_options);
}

fn write_system_module(
    target: &mut Map<String, Value>,
    module: &SystemModule,
) {
    if let Some(status) = module.status {
        target.insert("status".to_string(), json!(status));
    }
    if let Some(policy) = module.restart_policy {
        target.insert("restartPolicy".to_string(), json!(policy));
    }
    write_settings(object_entry(target, "settings"), &module.image, &module.create_options);
}

fn write_settings(
    settings: &mut Map<String, Value>,
    image: &str,
    create_options: &Value,
) {
    settings.insert("image".to_string(), json!(image));
    if create_options.is_null() {
        settings.remove("createOptions");
    } else {
        settings.insert("createOptions".to_string(), create_options.clone());
    }
}

fn as_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was replaced with an object"),
    }
}

fn object_entry<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> &'a mut Map<String, Value> {
    as_object(map.entry(key.to_string()).or_insert_with(|| Value::Object(Map::new())))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::{ModuleStatus, RestartPolicy};

    fn sample() -> Value {
        json!({
            "$schema-template": "4.0.0",
            "$edgeAgent": {
                "properties.desired": {
                    "schemaVersion": "1.1",
                    "runtime": { "type": "docker" },
                    "systemModules": {
                        "edgeAgent": { "type": "docker", "settings": { "image": "mcr.microsoft.com/azureiotedge-agent:1.4", "createOptions": {} } },
                        "edgeHub": {
                            "type": "docker",
                            "status": "running",
                            "restartPolicy": "always",
                            "settings": { "image": "mcr.microsoft.com/azureiotedge-hub:1.4", "createOptions": "{\"HostConfig\":{}}" }
                        }
                    },
                    "modules": {
                        "SensorModule": {
                            "version": "1.0",
                            "type": "docker",
                            "status": "running",
                            "restartPolicy": "always",
                            "startupOrder": 1,
                            "settings": { "image": "repo/sensor:0.1", "createOptions": {} }
                        },
                        "FilterModule": {
                            "version": "1.0",
                            "type": "docker",
                            "status": "running",
                            "restartPolicy": "always",
                            "settings": { "image": "repo/filter:0.1" }
                        }
                    }
                }
            },
            "$edgeHub": {
                "properties.desired": {
                    "schemaVersion": "1.1",
                    "routes": {
                        "sensorToFilter": "FROM /messages/modules/SensorModule/outputs/temperature INTO BrokeredEndpoint(\"/modules/FilterModule/inputs/input1\")"
                    },
                    "storeAndForwardConfiguration": { "timeToLiveSecs": 7200 }
                }
            },
            "FilterModule": { "properties.desired": { "TemperatureThreshold": 25 } }
        })
    }

    #[test]
    fn test_read_modules() {
        let manifest = Manifest::from_value(sample()).unwrap();
        let modules = manifest.modules().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0].name, "SensorModule");
        assert_eq!(modules[0].twin, None);
        assert_eq!(modules[1].name, "FilterModule");
        assert_eq!(modules[1].twin, Some(json!({ "TemperatureThreshold": 25 })));
        assert_eq!(modules[1].create_options, Value::Null);
    }

    #[test]
    fn test_read_system_modules() {
        let manifest = Manifest::from_value(sample()).unwrap();
        let system = manifest.system_modules().unwrap();
        assert_eq!(system.edge_agent.image, "mcr.microsoft.com/azureiotedge-agent:1.4");
        assert_eq!(system.edge_agent.status, None);
        assert_eq!(system.edge_hub.status, Some(ModuleStatus::Running));
        assert_eq!(system.edge_hub.restart_policy, Some(RestartPolicy::Always));
        assert_eq!(system.store_and_forward_ttl, Some(7200));
    }

    #[test]
    fn test_read_routes() {
        let manifest = Manifest::from_value(sample()).unwrap();
        let routes = manifest.routes();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].0, "sensorToFilter");
    }

    #[test]
    fn test_rejects_bad_shape() {
        assert!(matches!(Manifest::from_value(json!({ "$edgeAgent": {} })), Err(EdgeflowError::Manifest(_))));
        let mut doc = sample();
        doc["$edgeHub"]["properties.desired"]["routes"]["broken"] = json!(42);
        assert!(Manifest::from_value(doc).is_err());
        assert!(Manifest::from_json("not json").is_err());
    }

    #[test]
    fn test_write_modules_keeps_unknown_fields() {
        let mut manifest = Manifest::from_value(sample()).unwrap();
        let mut modules = manifest.modules().unwrap();
        modules[0].image = "repo/sensor:0.2".to_string();
        modules.remove(1);

        manifest.write_modules(modules.iter());
        let doc = manifest.into_value();
        let sensor = &doc["$edgeAgent"]["properties.desired"]["modules"]["SensorModule"];
        assert_eq!(sensor["settings"]["image"], json!("repo/sensor:0.2"));
        assert_eq!(sensor["startupOrder"], json!(1));
        assert!(doc["$edgeAgent"]["properties.desired"]["modules"].get("FilterModule").is_none());
        assert!(doc.get("FilterModule").is_none());
        assert_eq!(doc["$schema-template"], json!("4.0.0"));
        assert_eq!(doc["$edgeAgent"]["properties.desired"]["runtime"], json!({ "type": "docker" }));
    }

    #[test]
    fn test_write_new_module_with_twin() {
        let mut manifest = Manifest::from_value(sample()).unwrap();
        let mut module = Module::new("CounterModule", "repo/counter:1.0");
        module.twin = Some(json!({ "interval": 5 }));

        manifest.write_modules([&module]);
        let doc = manifest.into_value();
        let counter = &doc["$edgeAgent"]["properties.desired"]["modules"]["CounterModule"];
        assert_eq!(counter["type"], json!("docker"));
        assert_eq!(counter["restartPolicy"], json!("always"));
        assert!(counter["settings"].get("createOptions").is_none());
        assert_eq!(doc["CounterModule"]["properties.desired"], json!({ "interval": 5 }));
    }

    #[test]
    fn test_write_system_modules() {
        let mut manifest = Manifest::from_value(sample()).unwrap();
        let mut system = manifest.system_modules().unwrap();
        system.edge_hub.restart_policy = Some(RestartPolicy::OnUnhealthy);
        system.store_and_forward_ttl = Some(60);

        manifest.write_system_modules(&system);
        let doc = manifest.into_value();
        let hub = &doc["$edgeAgent"]["properties.desired"]["systemModules"]["edgeHub"];
        assert_eq!(hub["restartPolicy"], json!("on-unhealthy"));
        assert_eq!(hub["type"], json!("docker"));
        assert!(doc["$edgeAgent"]["properties.desired"]["systemModules"]["edgeAgent"].get("status").is_none());
        assert_eq!(doc["$edgeHub"]["properties.desired"]["storeAndForwardConfiguration"]["timeToLiveSecs"], json!(60));
    }
}
