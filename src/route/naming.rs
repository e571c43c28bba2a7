//! Route names used as keys of the manifest `routes` map.

use std::collections::HashSet;

/// Base name of a route between two modules.
pub fn base_name(
    source_module: &str,
    target_module: &str,
) -> String {
    format!("{}To{}", source_module, target_module)
}

/// Hands out unique route names within one serialization pass.
///
/// A taken name gets the smallest numeric suffix, starting at `2`, that is
/// still free. Every name handed out or reserved counts as taken.
#[derive(Debug, Default)]
pub struct RouteNamer {
    used: HashSet<String>,
}

impl RouteNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `name` as is. Returns false if it was already taken.
    pub fn reserve(
        &mut self,
        name: &str,
    ) -> bool {
        self.used.insert(name.to_string())
    }

    pub fn is_taken(
        &self,
        name: &str,
    ) -> bool {
        self.used.contains(name)
    }

    /// Claims `base`, or the first free `base2`, `base3`, ...
    pub fn assign(
        &mut self,
        base: &str,
    ) -> String {
        if self.reserve(base) {
            return base.to_string();
        }

        let mut suffix = 2u32;
        loop {
            let candidate = format!("{}{}", base, suffix);
            if self.reserve(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}
