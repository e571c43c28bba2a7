//! View controller: one per open panel.
//!
//! All mutation happens synchronously inside `handle_*`; `serve` only moves
//! messages between the port and those handlers, one at a time. Errors are
//! local to the view: they are logged, reported as events and as
//! [`Reply::Failed`], and the loop keeps running.

use tracing::{debug, info, warn};

use crate::{
    EdgeflowError, EditorConfig, EditorState, Result,
    events::{EditorEvent, EventBus, Message, ViewId},
    model::{Manifest, Module},
    protocol::{
        message::{HostMessage, Inbound, Reply, UserAction, ViewMessage},
        port::ViewEnd,
    },
    route::RouteId,
    session::{BeginEdit, EditTarget, Outcome, Resolved, Viewing},
    topology::{NodeKind, Position},
    utils,
};

pub struct ViewController {
    id: ViewId,
    config: EditorConfig,
    state: Option<EditorState>,
    events: EventBus,
}

impl ViewController {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_events(config, EventBus::new())
    }

    pub fn with_events(
        config: EditorConfig,
        events: EventBus,
    ) -> Self {
        Self {
            id: utils::longid(),
            config,
            state: None,
            events,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// `None` until a manifest has been loaded.
    pub fn state(&self) -> Option<&EditorState> {
        self.state.as_ref()
    }

    pub fn on_mount(&self) -> ViewMessage {
        ViewMessage::Ready
    }

    /// Runs the view until the host closes it or every sender is gone.
    pub async fn serve(
        &mut self,
        port: ViewEnd,
    ) -> Result<()> {
        port.to_host.send_async(self.on_mount()).await?;

        while let Some(inbound) = port.inbound.next_async().await {
            match inbound {
                Inbound::Host(HostMessage::Close) => {
                    self.state = None;
                    break;
                }
                Inbound::Host(msg) => {
                    if let Err(e) = self.handle_host(msg) {
                        self.report(&e);
                    }
                }
                Inbound::User(action) => {
                    let reply = match self.handle_action(action) {
                        Ok(Reply::Send(msg)) => {
                            port.to_host.send_async(msg).await?;
                            Reply::Done
                        }
                        Ok(reply) => reply,
                        Err(e) => {
                            self.report(&e);
                            Reply::Failed(e)
                        }
                    };
                    if port.to_ui.send_async(reply).await.is_err() {
                        debug!("view {} has no ui attached", self.id);
                    }
                }
            }
        }

        info!("view {} closed", self.id);
        Ok(())
    }

    pub fn handle_host(
        &mut self,
        msg: HostMessage,
    ) -> Result<()> {
        match msg {
            HostMessage::Load {
                manifest,
            } => {
                let manifest = Manifest::from_value(manifest)?;
                let state = EditorState::load(manifest, &self.config)?;
                let (modules, routes) = (state.graph().module_count(), state.graph().route_count());
                self.state = Some(state);

                info!("view {} loaded {} modules, {} routes", self.id, modules, routes);
                self.emit(
                    "",
                    EditorEvent::Loaded {
                        modules,
                        routes,
                    },
                );
            }
            HostMessage::Close => {
                self.state = None;
            }
        }
        Ok(())
    }

    pub fn handle_action(
        &mut self,
        action: UserAction,
    ) -> Result<Reply> {
        debug!("view {} action {:?}", self.id, action);
        let state = self.state.as_mut().ok_or(EdgeflowError::Protocol("no manifest loaded".to_string()))?;
        let (graph, session) = state.parts_mut();

        let reply = match action {
            UserAction::Connect {
                source,
                target,
            } => {
                let id = graph.connect(&source, &target)?;
                let begin = session.begin_edit(graph, EditTarget::Route(id))?;
                let dirty = session.is_dirty();
                let reply = Self::begin_reply(begin, session.viewing().clone(), EditTarget::Route(id));

                self.emit_route(id, EditorEvent::RouteAdded {
                    id,
                });
                if dirty {
                    self.emit_dirty();
                }
                reply
            }
            UserAction::AddModule {
                name,
                image,
            } => {
                graph.add_module(Module::new(name, image))?;
                Reply::Done
            }
            UserAction::SelectNode {
                name,
            } => {
                let kind = graph.node(&name).map(|n| n.kind()).ok_or(EdgeflowError::Module(format!("module {} not found", name)))?;
                let target = match kind {
                    NodeKind::Module => EditTarget::Module(name),
                    NodeKind::System => EditTarget::System,
                    NodeKind::Upstream => return Ok(Reply::Done),
                };
                let begin = session.begin_edit(graph, target.clone())?;
                Self::begin_reply(begin, session.viewing().clone(), target)
            }
            UserAction::SelectRoute {
                id,
            } => {
                let target = EditTarget::Route(id);
                let begin = session.begin_edit(graph, target.clone())?;
                let dirty = session.is_dirty();
                let reply = Self::begin_reply(begin, session.viewing().clone(), target);
                if dirty {
                    self.emit_dirty();
                }
                reply
            }
            UserAction::EditModule {
                patch,
            } => {
                if session.edit_module(&patch)? {
                    self.emit_dirty();
                }
                Reply::Done
            }
            UserAction::EditSystem {
                patch,
            } => {
                if session.edit_system(&patch)? {
                    self.emit_dirty();
                }
                Reply::Done
            }
            UserAction::EditRoute {
                patch,
            } => {
                if session.edit_route(&patch)? {
                    self.emit_dirty();
                }
                Reply::Done
            }
            UserAction::SaveEdit => {
                let resolved = session.save(graph)?;
                self.emit_resolved(&resolved);
                Reply::Resolved(resolved)
            }
            UserAction::DiscardEdit | UserAction::Dismiss => {
                let resolved = session.discard(graph)?;
                self.emit_resolved(&resolved);
                Reply::Resolved(resolved)
            }
            UserAction::CloseEdit => {
                let resolved = session.close(graph)?;
                self.emit_resolved(&resolved);
                Reply::Resolved(resolved)
            }
            UserAction::Delete {
                target,
            } => {
                match target {
                    EditTarget::Module(name) => {
                        let routes = graph.remove_module(&name)?;
                        session.forget(&EditTarget::Module(name.clone()));
                        for id in routes.iter() {
                            session.forget(&EditTarget::Route(*id));
                        }
                        self.emit(
                            &name,
                            EditorEvent::ModuleRemoved {
                                name: name.clone(),
                            },
                        );
                        for id in routes {
                            self.emit_route(id, EditorEvent::RouteRemoved {
                                id,
                            });
                        }
                    }
                    EditTarget::Route(id) => {
                        if graph.remove_route(id).is_some() {
                            session.forget(&EditTarget::Route(id));
                            self.emit_route(id, EditorEvent::RouteRemoved {
                                id,
                            });
                        }
                    }
                    EditTarget::System => return Err(EdgeflowError::Module("system modules cannot be deleted".to_string())),
                }
                Reply::Done
            }
            UserAction::Drag {
                node,
                x,
                y,
            } => {
                graph.set_position(
                    &node,
                    Position {
                        x,
                        y,
                    },
                )?;
                Reply::Done
            }
            UserAction::SavePage => {
                // incomplete routes are implicit deletes
                let incomplete = graph.incomplete_routes();
                for id in incomplete.iter() {
                    graph.remove_route(*id);
                    session.forget(&EditTarget::Route(*id));
                }

                let manifest = state.to_manifest(self.config.route_naming);
                let routes = state.graph().route_count();
                state.set_saved(manifest.clone());

                for id in incomplete {
                    self.emit_route(id, EditorEvent::RouteRemoved {
                        id,
                    });
                }
                self.emit(
                    "",
                    EditorEvent::PageSaved {
                        routes,
                    },
                );
                Reply::Send(ViewMessage::Save {
                    manifest: manifest.into_value(),
                })
            }
        };
        Ok(reply)
    }

    fn begin_reply(
        begin: BeginEdit,
        viewing: Viewing,
        requested: EditTarget,
    ) -> Reply {
        match begin {
            BeginEdit::Switched | BeginEdit::Unchanged => Reply::Viewing(viewing),
            BeginEdit::ResolutionRequired {
                pending,
            } => Reply::Prompt {
                pending,
                requested,
            },
        }
    }

    fn report(
        &self,
        e: &EdgeflowError,
    ) {
        warn!("view {} failed: {}", self.id, e);
        self.emit(
            "",
            EditorEvent::Error {
                message: e.to_string(),
            },
        );
    }

    fn emit(
        &self,
        subject: &str,
        event: EditorEvent,
    ) {
        self.events.emit(Message {
            view: self.id.clone(),
            subject: subject.to_string(),
            event,
            timestamp: utils::time::time_millis(),
        });
    }

    fn emit_route(
        &self,
        id: RouteId,
        event: EditorEvent,
    ) {
        self.emit(&EditTarget::Route(id).subject(), event);
    }

    fn emit_dirty(&self) {
        let Some(target) = self.state.as_ref().and_then(|s| s.session().viewing().target()) else {
            return;
        };
        self.emit(
            &target.subject(),
            EditorEvent::Dirty {
                target,
            },
        );
    }

    fn emit_resolved(
        &self,
        resolved: &Resolved,
    ) {
        if let Some(target) = &resolved.target {
            let event = match resolved.outcome {
                Outcome::Saved => Some(EditorEvent::Committed {
                    target: target.clone(),
                }),
                Outcome::Discarded => Some(EditorEvent::Reverted {
                    target: target.clone(),
                }),
                Outcome::RouteRemoved(id) => Some(EditorEvent::RouteRemoved {
                    id,
                }),
                Outcome::Nothing => None,
            };
            if let Some(event) = event {
                self.emit(&target.subject(), event);
            }
        }

        // continuing into a new route leaves the session dirty
        if self.state.as_ref().is_some_and(|s| s.session().is_dirty()) {
            self.emit_dirty();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::{Value, json};

    use super::*;
    use crate::{
        events::{EventSubscriber, SubscribeOptions},
        protocol::ViewPort,
        session::{ModulePatch, RoutePatch},
    };

    fn manifest() -> Value {
        json!({
            "$edgeAgent": {
                "properties.desired": {
                    "schemaVersion": "1.1",
                    "systemModules": {
                        "edgeAgent": { "type": "docker", "settings": { "image": "agent:1.4" } },
                        "edgeHub": { "type": "docker", "status": "running", "restartPolicy": "always", "settings": { "image": "hub:1.4" } }
                    },
                    "modules": {
                        "SensorModule": { "version": "1.0", "type": "docker", "status": "running", "restartPolicy": "always", "settings": { "image": "repo/sensor:0.1" } },
                        "FilterModule": { "version": "1.0", "type": "docker", "status": "running", "restartPolicy": "always", "settings": { "image": "repo/filter:0.1" } }
                    }
                }
            },
            "$edgeHub": {
                "properties.desired": {
                    "schemaVersion": "1.1",
                    "routes": {
                        "sensorToFilter": "FROM /messages/modules/SensorModule/outputs/temperature INTO BrokeredEndpoint(\"/modules/FilterModule/inputs/input1\")"
                    }
                }
            }
        })
    }

    fn loaded() -> ViewController {
        let mut view = ViewController::new(EditorConfig::default());
        view.handle_host(HostMessage::Load {
            manifest: manifest(),
        })
        .unwrap();
        view
    }

    fn recorded(view: &ViewController) -> Arc<Mutex<Vec<EditorEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        EventSubscriber::new(view.events(), SubscribeOptions::default()).unwrap().on_event(move |e| {
            sink.lock().unwrap().push(e.event.clone());
        });
        events
    }

    fn saved_routes(reply: Reply) -> Vec<(String, String)> {
        match reply {
            Reply::Send(ViewMessage::Save {
                manifest,
            }) => Manifest::from_value(manifest).unwrap().routes(),
            other => panic!("expected a save message, got {:?}", other),
        }
    }

    #[test]
    fn test_actions_need_a_manifest() {
        let mut view = ViewController::new(EditorConfig::default());
        assert_eq!(view.on_mount(), ViewMessage::Ready);
        assert!(matches!(view.handle_action(UserAction::SavePage), Err(EdgeflowError::Protocol(_))));
        assert!(view.state().is_none());
    }

    #[test]
    fn test_invalid_manifest_keeps_view_empty() {
        let mut view = ViewController::new(EditorConfig::default());
        let result = view.handle_host(HostMessage::Load {
            manifest: json!({ "modules": [] }),
        });
        assert!(matches!(result, Err(EdgeflowError::Manifest(_))));
        assert!(view.state().is_none());
    }

    #[test]
    fn test_connect_edit_and_save_page() {
        let mut view = loaded();

        let reply = view
            .handle_action(UserAction::Connect {
                source: "FilterModule".into(),
                target: "IoTHub".into(),
            })
            .unwrap();
        assert_eq!(reply, Reply::Viewing(Viewing::Route(2)));

        view.handle_action(UserAction::EditRoute {
            patch: RoutePatch {
                source_port: Some("output1".to_string()),
                ..Default::default()
            },
        })
        .unwrap();
        let Reply::Resolved(resolved) = view.handle_action(UserAction::SaveEdit).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolved.outcome, Outcome::Saved);

        let routes = saved_routes(view.handle_action(UserAction::SavePage).unwrap());
        assert_eq!(
            routes,
            vec![
                (
                    "SensorModuleToFilterModule".to_string(),
                    "FROM /messages/modules/SensorModule/outputs/temperature INTO BrokeredEndpoint(\"/modules/FilterModule/inputs/input1\")".to_string()
                ),
                ("FilterModuleToIoTHub".to_string(), "FROM /messages/modules/FilterModule/outputs/output1 INTO $upstream".to_string()),
            ]
        );
    }

    #[test]
    fn test_pending_route_prompts_before_switching() {
        let mut view = loaded();
        let events = recorded(&view);

        view.handle_action(UserAction::Connect {
            source: "SensorModule".into(),
            target: "FilterModule".into(),
        })
        .unwrap();
        let reply = view
            .handle_action(UserAction::SelectNode {
                name: "FilterModule".into(),
            })
            .unwrap();
        assert_eq!(
            reply,
            Reply::Prompt {
                pending: EditTarget::Route(2),
                requested: EditTarget::Module("FilterModule".into()),
            }
        );

        let Reply::Resolved(resolved) = view.handle_action(UserAction::Dismiss).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolved.outcome, Outcome::RouteRemoved(2));
        assert_eq!(resolved.next, Viewing::Module("FilterModule".into()));
        assert_eq!(view.state().unwrap().graph().route_count(), 1);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                EditorEvent::RouteAdded {
                    id: 2
                },
                EditorEvent::Dirty {
                    target: EditTarget::Route(2)
                },
                EditorEvent::RouteRemoved {
                    id: 2
                },
            ]
        );
    }

    #[test]
    fn test_save_page_drops_incomplete_routes() {
        let mut view = loaded();
        view.handle_action(UserAction::Connect {
            source: "FilterModule".into(),
            target: "SensorModule".into(),
        })
        .unwrap();

        let routes = saved_routes(view.handle_action(UserAction::SavePage).unwrap());
        assert_eq!(routes.len(), 1);

        let state = view.state().unwrap();
        assert_eq!(state.graph().route_count(), 1);
        assert_eq!(state.session().viewing(), &Viewing::None);
        assert_eq!(state.manifest().routes(), routes);
    }

    #[test]
    fn test_select_nodes() {
        let mut view = loaded();
        let reply = view
            .handle_action(UserAction::SelectNode {
                name: "$edgeHub".into(),
            })
            .unwrap();
        assert_eq!(reply, Reply::Viewing(Viewing::System));

        let reply = view
            .handle_action(UserAction::SelectNode {
                name: "IoTHub".into(),
            })
            .unwrap();
        assert_eq!(reply, Reply::Done);
        assert_eq!(view.state().unwrap().session().viewing(), &Viewing::System);

        assert!(
            view.handle_action(UserAction::SelectNode {
                name: "Nope".into()
            })
            .is_err()
        );
    }

    #[test]
    fn test_delete_module_removes_its_routes() {
        let mut view = loaded();
        let events = recorded(&view);

        view.handle_action(UserAction::SelectRoute {
            id: 1,
        })
        .unwrap();
        view.handle_action(UserAction::Delete {
            target: EditTarget::Module("SensorModule".into()),
        })
        .unwrap();

        let state = view.state().unwrap();
        assert_eq!(state.graph().route_count(), 0);
        assert!(!state.graph().contains_node("SensorModule"));
        assert_eq!(state.session().viewing(), &Viewing::None);
        assert_eq!(events.lock().unwrap().len(), 2);

        assert!(
            view.handle_action(UserAction::Delete {
                target: EditTarget::System
            })
            .is_err()
        );
    }

    #[test]
    fn test_unroutable_port_keeps_route_pending() {
        let mut view = loaded();
        view.handle_action(UserAction::Connect {
            source: "SensorModule".into(),
            target: "FilterModule".into(),
        })
        .unwrap();
        view.handle_action(UserAction::EditRoute {
            patch: RoutePatch {
                source_port: Some("out put".to_string()),
                target_port: Some("in/1".to_string()),
                ..Default::default()
            },
        })
        .unwrap();

        assert!(matches!(view.handle_action(UserAction::SaveEdit), Err(EdgeflowError::InvalidRoute(_))));
        let state = view.state().unwrap();
        assert!(state.session().is_dirty());
        assert!(state.graph().route(2).unwrap().is_pending());

        // what gets saved can always be loaded again
        let Reply::Send(ViewMessage::Save {
            manifest,
        }) = view.handle_action(UserAction::SavePage).unwrap()
        else {
            panic!("expected a save message");
        };
        let mut reopened = ViewController::new(EditorConfig::default());
        reopened
            .handle_host(HostMessage::Load {
                manifest,
            })
            .unwrap();
        assert_eq!(reopened.state().unwrap().graph().route_count(), 1);
    }

    #[test]
    fn test_add_module_rejects_unroutable_name() {
        let mut view = loaded();
        let result = view.handle_action(UserAction::AddModule {
            name: "My Module".into(),
            image: "repo/my:1.0".into(),
        });
        assert!(matches!(result, Err(EdgeflowError::Module(_))));
    }

    #[test]
    fn test_save_page_drops_prompt_of_purged_route() {
        let mut view = loaded();
        view.handle_action(UserAction::Connect {
            source: "SensorModule".into(),
            target: "FilterModule".into(),
        })
        .unwrap();
        let reply = view
            .handle_action(UserAction::SelectNode {
                name: "SensorModule".into(),
            })
            .unwrap();
        assert!(matches!(reply, Reply::Prompt { .. }));
        view.handle_action(UserAction::SavePage).unwrap();

        view.handle_action(UserAction::SelectNode {
            name: "FilterModule".into(),
        })
        .unwrap();
        view.handle_action(UserAction::EditModule {
            patch: ModulePatch {
                image: Some("repo/filter:0.2".to_string()),
                ..Default::default()
            },
        })
        .unwrap();
        let Reply::Resolved(resolved) = view.handle_action(UserAction::SaveEdit).unwrap() else {
            panic!("expected a resolution");
        };
        assert_eq!(resolved.next, Viewing::Module("FilterModule".into()));
    }

    #[tokio::test]
    async fn test_serve() {
        let config = EditorConfig::default();
        let (host, view_end, ui) = ViewPort::from_config(&config);
        let mut view = ViewController::new(config);
        let handle = tokio::spawn(async move { view.serve(view_end).await });

        assert_eq!(host.next_message_async().await, Some(ViewMessage::Ready));
        host.load(manifest()).unwrap();

        ui.send(UserAction::AddModule {
            name: "CounterModule".into(),
            image: "repo/counter:1.0".into(),
        })
        .unwrap();
        assert_eq!(ui.next_reply_async().await, Some(Reply::Done));

        ui.send(UserAction::SelectNode {
            name: "Nope".into(),
        })
        .unwrap();
        assert!(matches!(ui.next_reply_async().await, Some(Reply::Failed(EdgeflowError::Module(_)))));

        ui.send(UserAction::SavePage).unwrap();
        assert_eq!(ui.next_reply_async().await, Some(Reply::Done));
        let Some(ViewMessage::Save {
            manifest,
        }) = host.next_message_async().await
        else {
            panic!("expected a save message");
        };
        assert_eq!(manifest["$edgeAgent"]["properties.desired"]["modules"]["CounterModule"]["settings"]["image"], json!("repo/counter:1.0"));

        host.close().unwrap();
        assert!(handle.await.unwrap().is_ok());
    }
}
