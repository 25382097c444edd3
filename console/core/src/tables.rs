use crate::{ResourceRef, Route};
use ahash::AHashMap as HashMap;

/// Route tables are addressed by namespace and name.
pub type TableKey = ResourceRef;

/// Every known route table, keyed for delegation lookups.
pub type RouteTables = HashMap<TableKey, RouteTable>;

#[derive(Clone, Debug, PartialEq)]
pub struct RouteTable {
    pub metadata: TableKey,
    pub routes: Vec<Route>,
}

/// The root of a routing graph: a set of domains served by inline routes.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualService {
    pub metadata: ResourceRef,
    pub domains: Vec<String>,
    pub routes: Vec<Route>,
    pub options: Option<serde_json::Value>,
}

pub fn index_tables(tables: impl IntoIterator<Item = RouteTable>) -> RouteTables {
    tables
        .into_iter()
        .map(|table| (table.metadata.clone(), table))
        .collect()
}
