use crate::{
    routes::{HeaderMatcher, QueryParamMatcher},
    PathMatchKind, Route, RouteTable, RouteTables, TableKey, VirtualService,
};
use serde::Serialize;
use std::fmt;


/// Marks a delegating route that was not expanded.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionWarning {
    /// The delegated route table does not exist.
    UnresolvedDelegate,

    /// The delegated route table is already being expanded by an ancestor.
    CycleDetected,

    /// The route sits at the maximum delegation depth.
    DepthExceeded,
}

/// A route in the effective routing tree. Routes that delegate to a route
/// table carry that table's routes as children, one level deeper.
#[derive(Clone, Debug, PartialEq)]
pub struct EffectiveRouteNode {
    pub route: Route,
    pub depth: usize,
    pub warning: Option<ResolutionWarning>,
    pub children: Vec<EffectiveRouteNode>,
}

/// A flattened [`EffectiveRouteNode`], as listed in the sub-route table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRow {
    pub depth: usize,
    pub destination: String,
    pub matcher: String,
    pub match_type: PathMatchKind,
    pub methods: Vec<String>,
    pub headers: String,
    pub query_params: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ResolutionWarning>,
}

/// Expands `root`'s routes through their delegations.
///
/// `root` is on the ancestor path, so a delegation back to it is reported as a
/// cycle. Routes delegating at `max_depth` are not expanded.
pub fn resolve(
    root: &RouteTable,
    tables: &RouteTables,
    max_depth: usize,
) -> Vec<EffectiveRouteNode> {
    let mut resolver = Resolver {
        tables,
        max_depth,
        path: vec![&root.metadata],
    };
    resolver.expand(&root.routes, 0)
}

/// Expands a virtual service's inline routes through their delegations.
pub fn resolve_virtual_service(
    vs: &VirtualService,
    tables: &RouteTables,
    max_depth: usize,
) -> Vec<EffectiveRouteNode> {
    let mut resolver = Resolver {
        tables,
        max_depth,
        path: Vec::new(),
    };
    resolver.expand(&vs.routes, 0)
}

/// Lists every node of the forest depth-first, parents before their children.
pub fn flatten(nodes: &[EffectiveRouteNode]) -> Vec<RouteRow> {
    fn visit(node: &EffectiveRouteNode, rows: &mut Vec<RouteRow>) {
        rows.push(RouteRow::new(node));
        for child in &node.children {
            visit(child, rows);
        }
    }

    let mut rows = Vec::new();
    for node in nodes {
        visit(node, &mut rows);
    }
    rows
}

struct Resolver<'a> {
    tables: &'a RouteTables,
    max_depth: usize,

    /// The route tables being expanded, outermost first.
    path: Vec<&'a TableKey>,
}

// === impl Resolver ===

impl<'a> Resolver<'a> {
    fn expand(&mut self, routes: &'a [Route], depth: usize) -> Vec<EffectiveRouteNode> {
        routes.iter().map(|route| self.node(route, depth)).collect()
    }

    fn node(&mut self, route: &'a Route, depth: usize) -> EffectiveRouteNode {
        let Some(delegate) = route.destination.delegate() else {
            return EffectiveRouteNode::leaf(route, depth, None);
        };

        let tables = self.tables;
        let Some((key, table)) = tables.get_key_value(delegate) else {
            tracing::debug!(table = %delegate, depth, "Delegated route table not found");
            return EffectiveRouteNode::leaf(
                route,
                depth,
                Some(ResolutionWarning::UnresolvedDelegate),
            );
        };

        if self.path.contains(&key) {
            tracing::debug!(table = %key, depth, "Delegation cycle detected");
            return EffectiveRouteNode::leaf(route, depth, Some(ResolutionWarning::CycleDetected));
        }

        if depth >= self.max_depth {
            tracing::debug!(table = %key, depth, max_depth = self.max_depth, "Delegation too deep");
            return EffectiveRouteNode::leaf(route, depth, Some(ResolutionWarning::DepthExceeded));
        }

        self.path.push(key);
        let children = self.expand(&table.routes, depth + 1);
        self.path.pop();

        EffectiveRouteNode {
            route: route.clone(),
            depth,
            warning: None,
            children,
        }
    }
}

// === impl EffectiveRouteNode ===

impl EffectiveRouteNode {
    fn leaf(route: &Route, depth: usize, warning: Option<ResolutionWarning>) -> Self {
        Self {
            route: route.clone(),
            depth,
            warning,
            children: Vec::new(),
        }
    }
}

// === impl RouteRow ===

impl RouteRow {
    fn new(node: &EffectiveRouteNode) -> Self {
        let matcher = &node.route.matcher;
        Self {
            depth: node.depth,
            destination: node.route.destination.label(),
            matcher: matcher.path.value.clone(),
            match_type: matcher.path.kind,
            methods: matcher.methods.iter().cloned().collect(),
            headers: matcher
                .headers
                .iter()
                .map(|HeaderMatcher { name, value, .. }| format!("{name}:{value}"))
                .collect::<Vec<_>>()
                .join(", "),
            query_params: matcher
                .query_params
                .iter()
                .map(|QueryParamMatcher { name, value, .. }| format!("{name}:{value}"))
                .collect::<Vec<_>>()
                .join(", "),
            warning: node.warning,
        }
    }
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedDelegate => write!(f, "unresolved delegate"),
            Self::CycleDetected => write!(f, "cycle detected"),
            Self::DepthExceeded => write!(f, "maximum delegation depth exceeded"),
        }
    }
}
