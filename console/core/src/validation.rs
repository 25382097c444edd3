use crate::{upstream::ClassifyError, DestinationSpecKind, ResourceRef};
use serde::Serialize;
use std::fmt;

/// A user-fixable problem with a route form, attached to the field that caused it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: Field,
    pub reason: Reason,
}

/// Identifies a route form field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    VirtualService,
    Path,
    Header(usize),
    QueryParameter(usize),
    Method(usize),
    /// The method set as a whole, once its entries no longer have positions.
    Methods,
    Upstream,
    DestinationSpec,
    Destinations,
    WeightedDestination(usize),
    UpstreamGroup,
    Delegate,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Reason {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("paths begin with `/`; {0:?} is not an absolute path")]
    RelativePath(String),

    #[error("invalid regular expression: {0}")]
    InvalidRegex(String),

    #[error("name must not be empty")]
    EmptyName,

    #[error("method must not be empty")]
    EmptyMethod,

    #[error("an upstream must be selected")]
    UpstreamNotSelected,

    #[error("upstream {0} not found")]
    UpstreamNotFound(ResourceRef),

    #[error(transparent)]
    UnclassifiedUpstream(#[from] ClassifyError),

    #[error("destination spec {found} does not match the upstream, which expects {expected}")]
    DestinationTypeMismatch {
        expected: DestinationSpecKind,
        found: DestinationSpecKind,
    },

    #[error("virtual service {0} not found")]
    VirtualServiceNotFound(ResourceRef),

    #[error("an upstream group must be selected")]
    UpstreamGroupNotSelected,

    #[error("upstream group {0} not found")]
    UpstreamGroupNotFound(ResourceRef),

    #[error("a route table must be selected")]
    DelegateNotSelected,

    #[error("at least one weighted destination is required")]
    NoWeightedDestinations,

    #[error("either every weighted destination declares a weight or none does")]
    MixedWeights,

    #[error("weights must not all be zero")]
    ZeroTotalWeight,
}

// === impl ValidationError ===

impl ValidationError {
    pub fn new(field: Field, reason: impl Into<Reason>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

// === impl Field ===

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VirtualService => write!(f, "virtualService"),
            Self::Path => write!(f, "path"),
            Self::Header(i) => write!(f, "headers[{i}]"),
            Self::QueryParameter(i) => write!(f, "queryParameters[{i}]"),
            Self::Method(i) => write!(f, "methods[{i}]"),
            Self::Methods => write!(f, "methods"),
            Self::Upstream => write!(f, "upstream"),
            Self::DestinationSpec => write!(f, "destinationSpec"),
            Self::Destinations => write!(f, "destinations"),
            Self::WeightedDestination(i) => write!(f, "destinations[{i}]"),
            Self::UpstreamGroup => write!(f, "upstreamGroup"),
            Self::Delegate => write!(f, "routeTable"),
        }
    }
}
