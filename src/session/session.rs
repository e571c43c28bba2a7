//! Edit session state machine.
//!
//! The session shows one target at a time and holds a draft of its values.
//! A field change makes the session dirty; a dirty session refuses to switch
//! to another target until the pending edit is saved or discarded, after
//! which it continues to the target that was requested in the meantime.
//!
//! A route created by a connect gesture starts dirty. Discarding it, or saving
//! it with an empty port, removes it from the graph.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    EdgeflowError, Result,
    route::RouteId,
    session::draft::{Draft, ModuleDraft, ModulePatch, RouteDraft, RoutePatch, SystemPatch},
    topology::{NodeId, TopologyGraph},
};

/// Something the user can edit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum EditTarget {
    Module(NodeId),
    System,
    Route(RouteId),
}

impl EditTarget {
    /// Subject used when reporting events about this target.
    pub fn subject(&self) -> String {
        match self {
            EditTarget::Module(name) => name.clone(),
            EditTarget::System => "$system".to_string(),
            EditTarget::Route(id) => format!("#{}", id),
        }
    }
}

/// What the edit pane currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum Viewing {
    #[default]
    None,
    Module(NodeId),
    System,
    Route(RouteId),
}

impl Viewing {
    pub fn target(&self) -> Option<EditTarget> {
        match self {
            Viewing::None => None,
            Viewing::Module(name) => Some(EditTarget::Module(name.clone())),
            Viewing::System => Some(EditTarget::System),
            Viewing::Route(id) => Some(EditTarget::Route(*id)),
        }
    }
}

impl From<EditTarget> for Viewing {
    fn from(target: EditTarget) -> Self {
        match target {
            EditTarget::Module(name) => Viewing::Module(name),
            EditTarget::System => Viewing::System,
            EditTarget::Route(id) => Viewing::Route(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Clean,
    Dirty(EditTarget),
}

/// Result of asking to edit a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginEdit {
    /// now showing the requested target
    Switched,
    /// the requested target was already shown
    Unchanged,
    /// `pending` must be saved or discarded first; the session continues to
    /// the requested target afterwards
    ResolutionRequired {
        pending: EditTarget,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// nothing was pending
    Nothing,
    Saved,
    Discarded,
    /// an incomplete or unsaved new route was deleted
    RouteRemoved(RouteId),
}

/// Result of saving or discarding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub target: Option<EditTarget>,
    pub outcome: Outcome,
    /// what the session shows afterwards
    pub next: Viewing,
}

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    viewing: Viewing,
    draft: Option<Draft>,
    dirty: bool,
    queued: Option<EditTarget>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn viewing(&self) -> &Viewing {
        &self.viewing
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Target waiting for the pending edit to be resolved.
    pub fn queued(&self) -> Option<&EditTarget> {
        self.queued.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn state(&self) -> SessionState {
        match (self.dirty, self.viewing.target()) {
            (true, Some(target)) => SessionState::Dirty(target),
            _ => SessionState::Clean,
        }
    }

    /// Drops everything without touching the graph.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn begin_edit(
        &mut self,
        graph: &TopologyGraph,
        target: EditTarget,
    ) -> Result<BeginEdit> {
        let current = self.viewing.target();
        if current.as_ref() == Some(&target) {
            self.queued = None;
            return Ok(BeginEdit::Unchanged);
        }

        if let (true, Some(pending)) = (self.dirty, current) {
            debug!("edit of {:?} waits for {:?}", target, pending);
            self.queued = Some(target);
            return Ok(BeginEdit::ResolutionRequired {
                pending,
            });
        }

        self.open(graph, target)?;
        self.queued = None;
        Ok(BeginEdit::Switched)
    }

    /// Loads the draft of `target` from the graph and shows it.
    fn open(
        &mut self,
        graph: &TopologyGraph,
        target: EditTarget,
    ) -> Result<()> {
        let (draft, dirty) = Self::load_draft(graph, &target)?;
        self.draft = Some(draft);
        self.dirty = dirty;
        self.viewing = target.into();
        Ok(())
    }

    fn load_draft(
        graph: &TopologyGraph,
        target: &EditTarget,
    ) -> Result<(Draft, bool)> {
        match target {
            EditTarget::Module(name) => {
                let module = graph.module(name).ok_or(EdgeflowError::Module(format!("module {} not found", name)))?;
                Ok((Draft::Module(ModuleDraft::from_module(module)), false))
            }
            EditTarget::System => Ok((Draft::System(graph.system_modules().clone()), false)),
            EditTarget::Route(id) => {
                let edge = graph.route(*id).ok_or(EdgeflowError::InvalidRoute(format!("route #{} not found", id)))?;
                Ok((Draft::Route(RouteDraft::from_route(&edge.route)), edge.is_pending()))
            }
        }
    }

    pub fn mark_dirty(&mut self) -> Result<()> {
        if self.viewing == Viewing::None {
            return Err(EdgeflowError::Session("nothing is being edited".to_string()));
        }
        self.dirty = true;
        Ok(())
    }

    /// Applies a patch to the module draft. Returns whether anything changed.
    pub fn edit_module(
        &mut self,
        patch: &ModulePatch,
    ) -> Result<bool> {
        let Some(Draft::Module(draft)) = self.draft.as_mut() else {
            return Err(EdgeflowError::Session("no module is being edited".to_string()));
        };
        let before = draft.clone();
        patch.apply(draft);
        let changed = *draft != before;
        self.touch(changed)
    }

    pub fn edit_system(
        &mut self,
        patch: &SystemPatch,
    ) -> Result<bool> {
        let Some(Draft::System(draft)) = self.draft.as_mut() else {
            return Err(EdgeflowError::Session("system modules are not being edited".to_string()));
        };
        let before = draft.clone();
        patch.apply(draft);
        let changed = *draft != before;
        self.touch(changed)
    }

    pub fn edit_route(
        &mut self,
        patch: &RoutePatch,
    ) -> Result<bool> {
        let Some(Draft::Route(draft)) = self.draft.as_mut() else {
            return Err(EdgeflowError::Session("no route is being edited".to_string()));
        };
        let before = draft.clone();
        patch.apply(draft);
        let changed = *draft != before;
        self.touch(changed)
    }

    fn touch(
        &mut self,
        changed: bool,
    ) -> Result<bool> {
        if changed {
            self.mark_dirty()?;
        }
        Ok(changed)
    }

    /// Commits the draft into the graph and continues to a queued target.
    pub fn save(
        &mut self,
        graph: &mut TopologyGraph,
    ) -> Result<Resolved> {
        let target = self.viewing.target().ok_or(EdgeflowError::Session("nothing is being edited".to_string()))?;

        let outcome = if !self.dirty {
            Outcome::Nothing
        } else {
            match (&target, &self.draft) {
                (EditTarget::Module(name), Some(Draft::Module(draft))) => {
                    let module = graph.module_mut(name).ok_or(EdgeflowError::Module(format!("module {} not found", name)))?;
                    draft.apply_to(module);
                    Outcome::Saved
                }
                (EditTarget::System, Some(Draft::System(draft))) => {
                    graph.set_system_modules(draft.clone());
                    Outcome::Saved
                }
                (EditTarget::Route(id), Some(Draft::Route(draft))) => {
                    if draft.is_complete() {
                        graph.update_route(*id, &draft.source_port, &draft.target_port, &draft.condition)?;
                        Outcome::Saved
                    } else {
                        graph.remove_route(*id);
                        Outcome::RouteRemoved(*id)
                    }
                }
                _ => return Err(EdgeflowError::Session(format!("draft does not match {:?}", target))),
            }
        };

        debug!("save {:?}: {:?}", target, outcome);
        Ok(self.finish(graph, target, outcome))
    }

    /// Reverts the draft to the graph values and continues to a queued target.
    /// New or incomplete routes are removed instead.
    pub fn discard(
        &mut self,
        graph: &mut TopologyGraph,
    ) -> Result<Resolved> {
        let target = self.viewing.target().ok_or(EdgeflowError::Session("nothing is being edited".to_string()))?;

        let outcome = match &target {
            EditTarget::Route(id) => match graph.route(*id) {
                Some(edge) if edge.is_pending() || !edge.route.is_complete() => {
                    graph.remove_route(*id);
                    Outcome::RouteRemoved(*id)
                }
                Some(_) if self.dirty => Outcome::Discarded,
                _ => Outcome::Nothing,
            },
            _ if self.dirty => Outcome::Discarded,
            _ => Outcome::Nothing,
        };

        if outcome == Outcome::Discarded {
            let (draft, _) = Self::load_draft(graph, &target)?;
            self.draft = Some(draft);
        }

        debug!("discard {:?}: {:?}", target, outcome);
        Ok(self.finish(graph, target, outcome))
    }

    /// Closes the edit pane. Pending edits are discarded and nothing queued is opened.
    pub fn close(
        &mut self,
        graph: &mut TopologyGraph,
    ) -> Result<Resolved> {
        self.queued = None;
        let resolved = match self.viewing {
            Viewing::None => Resolved {
                target: None,
                outcome: Outcome::Nothing,
                next: Viewing::None,
            },
            _ => self.discard(graph)?,
        };

        self.viewing = Viewing::None;
        self.draft = None;
        self.dirty = false;
        Ok(Resolved {
            next: Viewing::None,
            ..resolved
        })
    }

    /// Stops showing or queueing a target that no longer exists in the graph.
    pub fn forget(
        &mut self,
        target: &EditTarget,
    ) {
        if self.queued.as_ref() == Some(target) {
            self.queued = None;
        }
        if self.viewing.target().as_ref() == Some(target) {
            // the queued target was waiting on this edit
            self.queued = None;
            self.viewing = Viewing::None;
            self.draft = None;
            self.dirty = false;
        }
    }

    fn finish(
        &mut self,
        graph: &TopologyGraph,
        target: EditTarget,
        outcome: Outcome,
    ) -> Resolved {
        self.dirty = false;
        if let Outcome::RouteRemoved(_) = outcome {
            self.viewing = Viewing::None;
            self.draft = None;
        }

        if let Some(next) = self.queued.take() {
            if let Err(e) = self.open(graph, next) {
                warn!("queued edit target is gone: {}", e);
                self.viewing = Viewing::None;
                self.draft = None;
            }
        }

        Resolved {
            target: Some(target),
            outcome,
            next: self.viewing.clone(),
        }
    }
}
