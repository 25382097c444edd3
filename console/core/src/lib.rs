//! Gloo console routing core
//!
//! Models how a gateway route maps an HTTP request matcher to a destination and
//! provides the pure operations the console runs over that model:
//!
//! - [`compile::compile_route`] turns edited form state into a canonical [`Route`],
//!   reporting every validation problem at once.
//! - [`delegation::resolve`] expands delegated route tables into an effective
//!   routing tree, marking unresolved, cyclic and over-deep delegations inline.
//! - [`upstream_group::assemble_details`] fetches the details of every upstream
//!   referenced by an upstream group or failover scheme and reassembles them in
//!   declaration order.
//!
//! ```text
//! [ VirtualService ] -> [ Route ] -> [ RouteTable ] -> [ Route ] -> [ Upstream ]
//!                                \-> [ UpstreamGroup ] -> [ Upstream ]
//! ```
//!
//! Resources are fetched by a catalog collaborator (see [`catalog`]) before any
//! of these operations run; none of them hold state between calls.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod compile;
pub mod delegation;
pub mod destination;
pub mod routes;
pub mod tables;
pub mod upstream;
pub mod upstream_group;
pub mod validation;

pub use self::{
    destination::{Destination, DestinationSpec, DestinationSpecKind, SingleDestination},
    routes::{Matcher, PathMatchKind, Route},
    tables::{RouteTable, RouteTables, TableKey, VirtualService},
    upstream::{Upstream, UpstreamDetail, UpstreamKind},
    validation::{Field, Reason, ValidationError},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// References a namespaced resource by name.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ResourceRef {
    pub name: String,
    pub namespace: String,
}

// === impl ResourceRef ===

impl ResourceRef {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
