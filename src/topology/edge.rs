use crate::route::{Route, RouteId};

/// A route as held by the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEdge {
    pub id: RouteId,
    pub route: Route,
    /// rendering hint separating parallel routes between the same modules
    pub curviness: u32,
    /// key the route had in the loaded manifest, dropped once the route is edited
    pub(crate) origin_name: Option<String>,
    /// created by a connect gesture and not saved yet
    pub(crate) pending: bool,
}

impl RouteEdge {
    pub fn origin_name(&self) -> Option<&str> {
        self.origin_name.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
