use crate::{
    upstream::{classify_upstream, ClassifyError, ServiceSpec, Upstream, UpstreamKind},
    validation::Reason,
    ResourceRef,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

/// Where a matched request is routed. Exactly one variant applies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    Single(SingleDestination),
    Multi {
        destinations: Vec<WeightedDestination>,
    },
    UpstreamGroup(ResourceRef),
    Delegate(ResourceRef),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleDestination {
    pub upstream: ResourceRef,
    #[serde(default)]
    pub destination_spec: DestinationSpec,
}

/// Weights are relative; they need not sum to any particular total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedDestination {
    pub destination: SingleDestination,
    pub weight: u32,
}

/// Function-level routing details, keyed by the type of the upstream a
/// destination references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DestinationSpec {
    Aws(AwsDestinationSpec),
    Azure(AzureDestinationSpec),
    Rest(RestDestinationSpec),
    Grpc(GrpcDestinationSpec),
    #[default]
    None,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwsDestinationSpec {
    pub logical_name: String,

    /// Invokes the lambda asynchronously when set.
    pub invocation_style: bool,
    pub response_transformation: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AzureDestinationSpec {
    pub function_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestDestinationSpec {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrpcDestinationSpec {
    pub package: String,
    pub service: String,
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// Extracts function parameters from request headers and path.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Parameters {
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DestinationSpecKind {
    Aws,
    Azure,
    Rest,
    Grpc,
    None,
}

/// The destination spec variants that routes to an upstream may carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AcceptedSpecs {
    /// The variant a form is reset to when the upstream is selected.
    pub preferred: DestinationSpecKind,
}

/// Determines which destination spec variants routes to `upstream` may carry.
///
/// AWS and Azure upstreams take their own specs. Upstreams that declare a
/// REST or gRPC service spec take the matching function spec or none at all;
/// all others carry none.
pub fn accepted_specs(upstream: &Upstream) -> Result<AcceptedSpecs, ClassifyError> {
    let kind = classify_upstream(upstream)?;
    let preferred = match kind {
        UpstreamKind::Aws => DestinationSpecKind::Aws,
        UpstreamKind::Azure => DestinationSpecKind::Azure,
        kind => match upstream.service_spec(kind) {
            Some(ServiceSpec::Rest) => DestinationSpecKind::Rest,
            Some(ServiceSpec::Grpc) => DestinationSpecKind::Grpc,
            None => DestinationSpecKind::None,
        },
    };
    Ok(AcceptedSpecs { preferred })
}

/// Builds the destination spec for an upstream from the spec entered on a
/// form.
///
/// A form spec of a variant the upstream does not accept is a mismatch rather
/// than something to convert or drop. An accepted spec is kept as entered,
/// blank fields included; see [`DestinationSpec::blank_fields`].
pub fn build_destination_spec(
    accepted: AcceptedSpecs,
    form: &DestinationSpec,
) -> Result<DestinationSpec, Reason> {
    let found = form.kind();
    if !accepted.accepts(found) {
        return Err(Reason::DestinationTypeMismatch {
            expected: accepted.preferred,
            found,
        });
    }
    Ok(form.clone())
}

// === impl AcceptedSpecs ===

impl AcceptedSpecs {
    pub fn accepts(self, kind: DestinationSpecKind) -> bool {
        kind == self.preferred
            || (kind == DestinationSpecKind::None
                && matches!(
                    self.preferred,
                    DestinationSpecKind::Rest | DestinationSpecKind::Grpc
                ))
    }
}

// === impl Destination ===

impl Destination {
    pub fn single(upstream: ResourceRef) -> Self {
        Self::Single(SingleDestination {
            upstream,
            destination_spec: DestinationSpec::None,
        })
    }

    pub fn delegate(&self) -> Option<&ResourceRef> {
        match self {
            Self::Delegate(table) => Some(table),
            _ => None,
        }
    }

    /// A short name for the destination, as shown in route listings.
    pub fn label(&self) -> String {
        match self {
            Self::Single(single) => single.upstream.name.clone(),
            Self::Multi { destinations } => destinations
                .iter()
                .map(|weighted| weighted.destination.upstream.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Self::UpstreamGroup(group) => group.name.clone(),
            Self::Delegate(table) => table.name.clone(),
        }
    }
}

// === impl DestinationSpec ===

impl DestinationSpec {
    pub fn kind(&self) -> DestinationSpecKind {
        match self {
            Self::Aws(_) => DestinationSpecKind::Aws,
            Self::Azure(_) => DestinationSpecKind::Azure,
            Self::Rest(_) => DestinationSpecKind::Rest,
            Self::Grpc(_) => DestinationSpecKind::Grpc,
            Self::None => DestinationSpecKind::None,
        }
    }

    /// Names the function fields a form has left blank.
    ///
    /// Blank fields do not stop a route from compiling; the gateway reports
    /// them when it processes the route.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        let blank = |value: &str, name: &'static str| value.trim().is_empty().then_some(name);
        match self {
            Self::Aws(aws) => blank(&aws.logical_name, "logicalName").into_iter().collect(),
            Self::Azure(azure) => blank(&azure.function_name, "functionName")
                .into_iter()
                .collect(),
            Self::Rest(rest) => blank(&rest.function_name, "functionName")
                .into_iter()
                .collect(),
            Self::Grpc(grpc) => [
                blank(&grpc.package, "package"),
                blank(&grpc.service, "service"),
                blank(&grpc.function, "function"),
            ]
            .into_iter()
            .flatten()
            .collect(),
            Self::None => vec![],
        }
    }

    /// The blank spec a form starts from for an upstream expecting `kind`.
    pub fn empty(kind: DestinationSpecKind) -> Self {
        match kind {
            DestinationSpecKind::Aws => Self::Aws(Default::default()),
            DestinationSpecKind::Azure => Self::Azure(Default::default()),
            DestinationSpecKind::Rest => Self::Rest(Default::default()),
            DestinationSpecKind::Grpc => Self::Grpc(Default::default()),
            DestinationSpecKind::None => Self::None,
        }
    }
}

impl fmt::Display for DestinationSpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aws => write!(f, "AWS"),
            Self::Azure => write!(f, "AZURE"),
            Self::Rest => write!(f, "REST"),
            Self::Grpc => write!(f, "GRPC"),
            Self::None => write!(f, "NONE"),
        }
    }
}
