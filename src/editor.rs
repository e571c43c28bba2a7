//! State of one open editor view.

use crate::{
    EditorConfig, Result, RouteNaming,
    model::Manifest,
    session::EditSession,
    topology::TopologyGraph,
};

/// Everything one view owns: the last loaded document, the topology built
/// from it and the edit session. Each panel has its own instance.
#[derive(Debug, Clone)]
pub struct EditorState {
    manifest: Manifest,
    graph: TopologyGraph,
    session: EditSession,
}

impl EditorState {
    pub fn load(
        manifest: Manifest,
        config: &EditorConfig,
    ) -> Result<Self> {
        let graph = TopologyGraph::load_from_manifest(&manifest, config.curviness)?;
        Ok(Self {
            manifest,
            graph,
            session: EditSession::new(),
        })
    }

    /// The document the view was loaded from, or last saved.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut TopologyGraph {
        &mut self.graph
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut TopologyGraph, &mut EditSession) {
        (&mut self.graph, &mut self.session)
    }

    /// Writes the committed topology into a copy of the loaded document.
    /// Pending drafts are not included.
    pub fn to_manifest(
        &self,
        naming: RouteNaming,
    ) -> Manifest {
        let mut manifest = self.manifest.clone();
        manifest.write_modules(self.graph.modules());
        manifest.write_system_modules(self.graph.system_modules());
        manifest.write_routes(self.graph.to_manifest_routes(naming));
        manifest
    }

    pub(crate) fn set_saved(
        &mut self,
        manifest: Manifest,
    ) {
        self.manifest = manifest;
    }
}
