use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    EdgeflowError,
    route::RouteId,
    session::{EditTarget, ModulePatch, Resolved, RoutePatch, SystemPatch, Viewing},
    topology::NodeId,
};

/// Host to view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostMessage {
    /// Full manifest; the view rebuilds everything from it.
    Load {
        manifest: Value,
    },
    /// The panel is being disposed.
    Close,
}

/// View to host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum ViewMessage {
    /// Sent once on mount; the host answers with `load`.
    Ready,
    /// Full manifest to write back to disk.
    Save {
        manifest: Value,
    },
}

/// Canvas gestures and edit pane commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UserAction {
    /// Drag-connect from one node to another.
    Connect {
        source: NodeId,
        target: NodeId,
    },
    AddModule {
        name: NodeId,
        image: String,
    },
    /// Click on a node; system nodes open the system settings.
    SelectNode {
        name: NodeId,
    },
    SelectRoute {
        id: RouteId,
    },
    EditModule {
        patch: ModulePatch,
    },
    EditSystem {
        patch: SystemPatch,
    },
    EditRoute {
        patch: RoutePatch,
    },
    SaveEdit,
    DiscardEdit,
    /// Dialog dismissed without choosing; same as discard.
    Dismiss,
    /// Edit pane closed; pending edits are discarded.
    CloseEdit,
    Delete {
        target: EditTarget,
    },
    Drag {
        node: NodeId,
        x: f64,
        y: f64,
    },
    SavePage,
}

/// Anything a view loop receives.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Host(HostMessage),
    User(UserAction),
}

impl From<HostMessage> for Inbound {
    fn from(msg: HostMessage) -> Self {
        Inbound::Host(msg)
    }
}

impl From<UserAction> for Inbound {
    fn from(action: UserAction) -> Self {
        Inbound::User(action)
    }
}

/// Answer to a user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Done,
    /// The edit pane shows this now.
    Viewing(Viewing),
    /// Ask the user to save or discard `pending` before `requested` opens.
    Prompt {
        pending: EditTarget,
        requested: EditTarget,
    },
    Resolved(Resolved),
    /// A message that has to go to the host.
    Send(ViewMessage),
    Failed(EdgeflowError),
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wire_format() {
        let msg: HostMessage = serde_json::from_value(json!({ "command": "load", "manifest": { "a": 1 } })).unwrap();
        assert_eq!(
            msg,
            HostMessage::Load {
                manifest: json!({ "a": 1 })
            }
        );
        assert_eq!(serde_json::to_value(ViewMessage::Ready).unwrap(), json!({ "command": "ready" }));
        assert_eq!(
            serde_json::to_value(ViewMessage::Save {
                manifest: json!({})
            })
            .unwrap(),
            json!({ "command": "save", "manifest": {} })
        );
    }

    #[test]
    fn test_user_action_wire_format() {
        let action: UserAction = serde_json::from_value(json!({ "action": "connect", "source": "A", "target": "B" })).unwrap();
        assert_eq!(
            action,
            UserAction::Connect {
                source: "A".into(),
                target: "B".into()
            }
        );
        let action: UserAction = serde_json::from_value(json!({ "action": "delete", "target": { "kind": "route", "id": 3 } })).unwrap();
        assert_eq!(
            action,
            UserAction::Delete {
                target: EditTarget::Route(3)
            }
        );
        let action: UserAction = serde_json::from_value(json!({ "action": "editRoute", "patch": { "sourcePort": "out" } })).unwrap();
        assert!(matches!(action, UserAction::EditRoute { .. }));
    }
}
