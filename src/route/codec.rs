//! Route string encoding and decoding.
//!
//! Grammar, with single spaces exactly as written:
//!
//! ```text
//! FROM /messages/modules/<sourceModule>/outputs/<sourcePort>
//!   [ WHERE <condition> ]
//!   INTO ( $upstream | BrokeredEndpoint("/modules/<targetModule>/inputs/<targetPort>") )
//! ```
//!
//! Only strings of this exact shape are accepted; anything else is a
//! [`EdgeflowError::RouteDecode`]. Names are not escaped, so module and port
//! names must not contain `/`, quotes or whitespace.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    EdgeflowError, Result,
    model::UPSTREAM_PORT,
    route::Route,
};

/// Regex pattern for a route string.
const ROUTE_PATTERN: &str = r#"(?s)^FROM /messages/modules/(?P<source_module>[^/\s"]+)/outputs/(?P<source_port>[^/\s"]+)(?: WHERE (?P<condition>.+?))? INTO (?:(?P<upstream>\$upstream)|BrokeredEndpoint\("/modules/(?P<target_module>[^/\s"]+)/inputs/(?P<target_port>[^/\s"]+)"\))$"#;

static ROUTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(ROUTE_PATTERN).expect("route pattern is a valid regex"));

/// Whether `name` can stand as a module or port name in a route string.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c == '/' || c == '"' || c.is_whitespace())
}

/// Parses a route string.
pub fn decode(text: &str) -> Result<Route> {
    let caps = ROUTE_RE.captures(text).ok_or_else(|| EdgeflowError::route_decode(text))?;

    let source_module = &caps["source_module"];
    let source_port = &caps["source_port"];
    let condition = caps.name("condition").map(|c| c.as_str()).unwrap_or_default();

    let route = if caps.name("upstream").is_some() {
        Route::upstream(source_module, source_port)
    } else {
        match (caps.name("target_module"), caps.name("target_port")) {
            (Some(module), Some(port)) => Route::new(source_module, source_port, module.as_str(), port.as_str()),
            _ => return Err(EdgeflowError::route_decode(text)),
        }
    };

    Ok(route.with_condition(condition))
}

/// Renders a route string. `decode(&encode(r)) == r` for every complete route
/// whose names respect the grammar.
pub fn encode(route: &Route) -> String {
    let target = if route.is_upstream() {
        UPSTREAM_PORT.to_string()
    } else {
        format!("BrokeredEndpoint(\"/modules/{}/inputs/{}\")", route.target_module, route.target_port)
    };

    if route.condition.is_empty() {
        format!("FROM /messages/modules/{}/outputs/{} INTO {}", route.source_module, route.source_port, target)
    } else {
        format!("FROM /messages/modules/{}/outputs/{} WHERE {} INTO {}", route.source_module, route.source_port, route.condition, target)
    }
}
