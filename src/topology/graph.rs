//! Topology graph backed by a stable directed graph.
//!
//! Route ids come from a high-water mark, so an id is never handed out twice
//! in the lifetime of a graph. Iteration over routes follows id order, which
//! is creation order.

use std::collections::{BTreeMap, HashMap};

use petgraph::{
    Direction,
    stable_graph::{EdgeIndex, NodeIndex, StableDiGraph},
    visit::EdgeRef,
};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::{
    CurvinessConfig, EdgeflowError, Result, RouteNaming,
    model::{Manifest, Module, SystemModules, UPSTREAM, UPSTREAM_PORT, is_reserved_name},
    route::{
        Route, RouteId, codec,
        naming::{RouteNamer, base_name},
    },
    topology::{
        edge::RouteEdge,
        node::{Node, NodeData, NodeId, NodeKind, Position, SystemKind},
    },
};

/// Deployment topology: modules, system modules and the upstream node,
/// connected by routes.
#[derive(Debug, Clone)]
pub struct TopologyGraph {
    graph: StableDiGraph<Node, RouteEdge>,
    nodes: HashMap<NodeId, NodeIndex>,
    routes: BTreeMap<RouteId, EdgeIndex>,
    system: SystemModules,
    last_route_id: RouteId,
    curviness: CurvinessConfig,
}

impl Default for TopologyGraph {
    fn default() -> Self {
        Self::new(SystemModules::default(), CurvinessConfig::default())
    }
}

impl TopologyGraph {
    /// An empty topology holding only the system modules and the upstream node.
    pub fn new(
        system: SystemModules,
        curviness: CurvinessConfig,
    ) -> Self {
        let mut topology = Self {
            graph: StableDiGraph::default(),
            nodes: HashMap::new(),
            routes: BTreeMap::new(),
            system,
            last_route_id: 0,
            curviness,
        };
        for kind in [SystemKind::EdgeAgent, SystemKind::EdgeHub] {
            topology.insert_node(Node::new(kind.node_id(), NodeData::System(kind)));
        }
        topology.insert_node(Node::new(UPSTREAM, NodeData::Upstream));
        topology
    }

    /// Builds the topology from a manifest. Route ids follow document order starting at 1.
    pub fn load_from_manifest(
        manifest: &Manifest,
        curviness: CurvinessConfig,
    ) -> Result<Self> {
        let mut topology = Self::new(manifest.system_modules()?, curviness);

        for module in manifest.modules()? {
            topology.add_module(module)?;
        }
        for (name, text) in manifest.routes() {
            let route = codec::decode(&text)?;
            topology.insert_route(route, Some(name), false)?;
        }

        debug!("loaded topology: {} modules, {} routes", topology.module_count(), topology.route_count());
        Ok(topology)
    }

    /// Output a human-readable representation of the topology
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();

        lines.push("=== Topology ===".to_string());
        lines.push(format!("Nodes: {}, Routes: {}", self.graph.node_count(), self.graph.edge_count()));
        lines.push(String::new());

        lines.push("--- Nodes ---".to_string());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            match node.module() {
                Some(module) => lines.push(format!("[{}] {} (image: {}, status: {})", node.kind().as_ref(), node.id, module.image, module.status.as_ref())),
                None => lines.push(format!("[{}] {}", node.kind().as_ref(), node.id)),
            }
        }
        lines.push(String::new());

        lines.push("--- Routes ---".to_string());
        for edge in self.routes() {
            lines.push(format!("#{} {} (curviness: {})", edge.id, codec::encode(&edge.route), edge.curviness));
        }
        lines.push(String::new());

        lines.push("--- Graph Structure ---".to_string());
        for idx in self.graph.node_indices() {
            let node = &self.graph[idx];
            let outgoing: Vec<String> = self
                .graph
                .edges_directed(idx, Direction::Outgoing)
                .map(|e| format!("{}({}->{})", self.graph[e.target()].id, e.weight().route.source_port, e.weight().route.target_port))
                .collect();

            if outgoing.is_empty() {
                lines.push(format!("{} -> (none)", node.id));
            } else {
                lines.push(format!("{} -> {}", node.id, outgoing.join(", ")));
            }
        }

        lines.join("\n")
    }

    fn insert_node(
        &mut self,
        node: Node,
    ) {
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.nodes.insert(id, idx);
    }

    /// Adds a user module. Fails when the name is reserved or already present.
    pub fn add_module(
        &mut self,
        module: Module,
    ) -> Result<()> {
        if module.name.is_empty() || is_reserved_name(&module.name) {
            return Err(EdgeflowError::Module(format!("module name '{}' is reserved", module.name)));
        }
        if !codec::is_valid_name(&module.name) {
            return Err(EdgeflowError::Module(format!("module name '{}' cannot be used in a route", module.name)));
        }
        if self.nodes.contains_key(&module.name) {
            return Err(EdgeflowError::Module(format!("module {} already exists", module.name)));
        }

        trace!("topology::add_module({})", module.name);
        self.insert_node(Node::new(module.name.clone(), NodeData::Module(module)));
        Ok(())
    }

    /// Replaces the settings of an existing module or adds a new one.
    pub fn upsert_module(
        &mut self,
        module: Module,
    ) -> Result<()> {
        match self.module_mut(&module.name) {
            Some(existing) => {
                *existing = module;
                Ok(())
            }
            None => self.add_module(module),
        }
    }

    /// Removes a user module and every route touching it.
    /// Returns the ids of the removed routes.
    pub fn remove_module(
        &mut self,
        name: &str,
    ) -> Result<Vec<RouteId>> {
        let idx = self.node_index(name)?;
        if self.graph[idx].kind() != NodeKind::Module {
            return Err(EdgeflowError::Module(format!("{} cannot be deleted", name)));
        }

        let incident: Vec<RouteId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();
        for id in incident.iter() {
            self.remove_route(*id);
        }

        trace!("topology::remove_module({})", name);
        self.graph.remove_node(idx);
        self.nodes.remove(name);
        Ok(incident)
    }

    fn node_index(
        &self,
        id: &str,
    ) -> Result<NodeIndex> {
        self.nodes.get(id).copied().ok_or(EdgeflowError::Module(format!("module {} not found", id)))
    }

    pub fn node(
        &self,
        id: &str,
    ) -> Option<&Node> {
        self.nodes.get(id).map(|idx| &self.graph[*idx])
    }

    pub fn contains_node(
        &self,
        id: &str,
    ) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, including system modules and the upstream node.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn module(
        &self,
        name: &str,
    ) -> Option<&Module> {
        self.node(name).and_then(Node::module)
    }

    pub fn module_mut(
        &mut self,
        name: &str,
    ) -> Option<&mut Module> {
        let idx = *self.nodes.get(name)?;
        self.graph[idx].module_mut()
    }

    /// User modules in insertion order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.graph.node_indices().filter_map(|idx| self.graph[idx].module())
    }

    pub fn module_count(&self) -> usize {
        self.modules().count()
    }

    pub fn system_modules(&self) -> &SystemModules {
        &self.system
    }

    pub fn set_system_modules(
        &mut self,
        system: SystemModules,
    ) {
        self.system = system;
    }

    /// Moves a node on the canvas.
    pub fn set_position(
        &mut self,
        id: &str,
        position: Position,
    ) -> Result<()> {
        let idx = self.node_index(id)?;
        self.graph[idx].position = Some(position);
        Ok(())
    }

    /// Adds a route and returns its id.
    pub fn add_route(
        &mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
        condition: &str,
    ) -> Result<RouteId> {
        let target_port = if target == UPSTREAM { UPSTREAM_PORT } else { target_port };
        let route = Route::new(source, source_port, target, target_port).with_condition(condition);
        self.insert_route(route, None, false)
    }

    /// Adds a route for a connect gesture. Its ports are empty until the user
    /// fills them in, except the target port of an upstream route.
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
    ) -> Result<RouteId> {
        let target_port = if target == UPSTREAM { UPSTREAM_PORT } else { "" };
        self.insert_route(Route::new(source, "", target, target_port), None, true)
    }

    /// Adds a route as given. An upstream route must already carry `$upstream`
    /// as its target port; ports are either empty or valid names.
    pub(crate) fn insert_route(
        &mut self,
        route: Route,
        origin_name: Option<String>,
        pending: bool,
    ) -> Result<RouteId> {
        if route.source_module == route.target_module {
            return Err(EdgeflowError::InvalidRoute(format!("module {} cannot route to itself", route.source_module)));
        }

        let source = self.nodes.get(&route.source_module).copied().ok_or(EdgeflowError::InvalidRoute(format!("source module {} not found", route.source_module)))?;
        let target = self.nodes.get(&route.target_module).copied().ok_or(EdgeflowError::InvalidRoute(format!("target module {} not found", route.target_module)))?;

        if self.graph[source].kind() != NodeKind::Module {
            return Err(EdgeflowError::InvalidRoute(format!("{} cannot be the source of a route", route.source_module)));
        }
        match self.graph[target].kind() {
            NodeKind::Module => {}
            NodeKind::Upstream if route.target_port == UPSTREAM_PORT => {}
            NodeKind::Upstream => return Err(EdgeflowError::InvalidRoute(format!("{} only accepts the {} endpoint, not input {}", UPSTREAM, UPSTREAM_PORT, route.target_port))),
            NodeKind::System => return Err(EdgeflowError::InvalidRoute(format!("{} cannot be the target of a route", route.target_module))),
        }

        Self::check_ports(&route.source_port, &route.target_port)?;

        self.last_route_id += 1;
        let id = self.last_route_id;
        let nth = self.parallel_routes(source, target).len();

        trace!("topology::add_route(#{}, {} -> {})", id, route.source_module, route.target_module);
        let edge = RouteEdge {
            id,
            route,
            curviness: self.curviness.nth(nth),
            origin_name,
            pending,
        };
        let idx = self.graph.add_edge(source, target, edge);
        self.routes.insert(id, idx);
        Ok(id)
    }

    /// Removes a route. Unknown ids are ignored.
    pub fn remove_route(
        &mut self,
        id: RouteId,
    ) -> Option<Route> {
        let idx = self.routes.remove(&id)?;
        let (source, target) = self.graph.edge_endpoints(idx)?;
        let edge = self.graph.remove_edge(idx)?;

        trace!("topology::remove_route(#{})", id);
        self.refresh_curviness(source, target);
        Some(edge.route)
    }

    /// Commits edited route attributes. Clears the pending flag; a route whose
    /// attributes changed forgets its manifest name.
    pub fn update_route(
        &mut self,
        id: RouteId,
        source_port: &str,
        target_port: &str,
        condition: &str,
    ) -> Result<()> {
        let edge = self.route_mut(id).ok_or(EdgeflowError::InvalidRoute(format!("route #{} not found", id)))?;
        let target_port = if edge.route.is_upstream() { UPSTREAM_PORT } else { target_port };
        Self::check_ports(source_port, target_port)?;

        if edge.route.source_port != source_port || edge.route.target_port != target_port || edge.route.condition != condition {
            edge.route.source_port = source_port.to_string();
            edge.route.target_port = target_port.to_string();
            edge.route.condition = condition.to_string();
            edge.origin_name = None;
        }
        edge.pending = false;
        Ok(())
    }

    /// Empty ports are allowed until a route is saved; anything else has to
    /// survive a trip through the route string.
    fn check_ports(
        source_port: &str,
        target_port: &str,
    ) -> Result<()> {
        for port in [source_port, target_port] {
            if !port.is_empty() && !codec::is_valid_name(port) {
                return Err(EdgeflowError::InvalidRoute(format!("port name '{}' cannot be used in a route", port)));
            }
        }
        Ok(())
    }

    pub fn route(
        &self,
        id: RouteId,
    ) -> Option<&RouteEdge> {
        self.routes.get(&id).map(|idx| &self.graph[*idx])
    }

    fn route_mut(
        &mut self,
        id: RouteId,
    ) -> Option<&mut RouteEdge> {
        let idx = *self.routes.get(&id)?;
        self.graph.edge_weight_mut(idx)
    }

    /// Routes in creation order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteEdge> {
        self.routes.values().map(|idx| &self.graph[*idx])
    }

    pub fn route_ids(&self) -> Vec<RouteId> {
        self.routes.keys().copied().collect()
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Routes with an empty port.
    pub fn incomplete_routes(&self) -> Vec<RouteId> {
        self.routes().filter(|e| !e.route.is_complete()).map(|e| e.id).collect()
    }

    /// Routes between the same ordered pair of nodes, in id order.
    fn parallel_routes(
        &self,
        source: NodeIndex,
        target: NodeIndex,
    ) -> Vec<EdgeIndex> {
        self.routes.values().copied().filter(|idx| self.graph.edge_endpoints(*idx) == Some((source, target))).collect()
    }

    fn refresh_curviness(
        &mut self,
        source: NodeIndex,
        target: NodeIndex,
    ) {
        for (nth, idx) in self.parallel_routes(source, target).into_iter().enumerate() {
            self.graph[idx].curviness = self.curviness.nth(nth);
        }
    }

    /// Serializes the routes into the manifest `routes` map, in creation order.
    /// Incomplete routes are left out.
    pub fn to_manifest_routes(
        &self,
        naming: RouteNaming,
    ) -> Map<String, Value> {
        let complete: Vec<&RouteEdge> = self.routes().filter(|e| e.route.is_complete()).collect();
        let mut namer = RouteNamer::new();
        let mut names: HashMap<RouteId, String> = HashMap::new();

        if naming == RouteNaming::Stable {
            for edge in complete.iter() {
                if let Some(name) = &edge.origin_name {
                    if namer.reserve(name) {
                        names.insert(edge.id, name.clone());
                    }
                }
            }
        }

        let mut out = Map::new();
        for edge in complete {
            let name = match names.remove(&edge.id) {
                Some(name) => name,
                None => namer.assign(&base_name(&edge.route.source_module, &edge.route.target_module)),
            };
            out.insert(name, Value::String(codec::encode(&edge.route)));
        }
        out
    }
}

impl TryFrom<&Manifest> for TopologyGraph {
    type Error = EdgeflowError;

    fn try_from(manifest: &Manifest) -> Result<Self> {
        Self::load_from_manifest(manifest, CurvinessConfig::default())
    }
}
