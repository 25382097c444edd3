use crate::ResourceRef;
use serde::Serialize;
use std::fmt;

/// A backend service definition.
///
/// This mirrors the resource's wire shape: one optional field per upstream
/// type. A well-formed upstream populates exactly one of them; see
/// [`classify_upstream`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Upstream {
    pub metadata: Option<ResourceRef>,
    pub spec: UpstreamSpec,
    pub status: Option<UpstreamStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpstreamSpec {
    pub aws: Option<AwsUpstream>,
    pub azure: Option<AzureUpstream>,
    pub kube: Option<KubeUpstream>,
    pub static_hosts: Option<StaticUpstream>,
    pub pipe: Option<PipeUpstream>,
    pub consul: Option<ConsulUpstream>,
    pub aws_ec2: Option<AwsEc2Upstream>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AwsUpstream {
    pub region: String,
    pub lambda_functions: Vec<LambdaFunction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LambdaFunction {
    pub logical_name: String,
    pub lambda_function_name: String,
    pub qualifier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AzureUpstream {
    pub function_app_name: String,
    pub functions: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KubeUpstream {
    pub service_name: String,
    pub service_namespace: String,
    pub service_port: u32,
    pub service_spec: Option<ServiceSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticUpstream {
    pub hosts: Vec<(String, u32)>,
    pub service_spec: Option<ServiceSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipeUpstream {
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsulUpstream {
    pub service_name: String,
    pub data_centers: Vec<String>,
    pub service_spec: Option<ServiceSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AwsEc2Upstream {
    pub region: String,
    pub port: Option<u32>,
}

/// The function-level protocol an upstream declares, which determines the
/// destination spec routes to it carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ServiceSpec {
    Rest,
    Grpc,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpstreamKind {
    Aws,
    Azure,
    Kube,
    Static,
    Pipe,
    Consul,
    AwsEc2,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("upstream declares more than one type: {}", display_kinds(.0))]
    AmbiguousUpstreamType(Vec<UpstreamKind>),

    #[error("upstream does not declare a known type")]
    UnknownUpstreamType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamStatus {
    pub state: State,
    pub reason: Option<String>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum State {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Warning,
}

/// The fetched view of an upstream, as rendered in group detail tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamDetail {
    pub upstream: ResourceRef,
    pub kind: Option<UpstreamKind>,
    pub state: State,
    pub reason: Option<String>,
    pub target: String,
}

/// Determines the single type an upstream declares.
pub fn classify_upstream(upstream: &Upstream) -> Result<UpstreamKind, ClassifyError> {
    let UpstreamSpec {
        aws,
        azure,
        kube,
        static_hosts,
        pipe,
        consul,
        aws_ec2,
    } = &upstream.spec;

    let populated = [
        (aws.is_some(), UpstreamKind::Aws),
        (azure.is_some(), UpstreamKind::Azure),
        (kube.is_some(), UpstreamKind::Kube),
        (static_hosts.is_some(), UpstreamKind::Static),
        (pipe.is_some(), UpstreamKind::Pipe),
        (consul.is_some(), UpstreamKind::Consul),
        (aws_ec2.is_some(), UpstreamKind::AwsEc2),
    ]
    .into_iter()
    .filter_map(|(set, kind)| set.then_some(kind))
    .collect::<Vec<_>>();

    match populated.as_slice() {
        [] => Err(ClassifyError::UnknownUpstreamType),
        [kind] => Ok(*kind),
        _ => Err(ClassifyError::AmbiguousUpstreamType(populated)),
    }
}

fn display_kinds(kinds: &[UpstreamKind]) -> String {
    kinds
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// === impl Upstream ===

impl Upstream {
    /// The service spec declared by the upstream's populated type, if that type
    /// supports one.
    pub fn service_spec(&self, kind: UpstreamKind) -> Option<ServiceSpec> {
        match kind {
            UpstreamKind::Kube => self.spec.kube.as_ref()?.service_spec,
            UpstreamKind::Static => self.spec.static_hosts.as_ref()?.service_spec,
            UpstreamKind::Consul => self.spec.consul.as_ref()?.service_spec,
            _ => None,
        }
    }

    fn target(&self, kind: UpstreamKind) -> Option<String> {
        let UpstreamSpec {
            aws,
            azure,
            kube,
            static_hosts,
            pipe,
            consul,
            aws_ec2,
        } = &self.spec;
        let target = match kind {
            UpstreamKind::Aws => {
                let aws = aws.as_ref()?;
                format!(
                    "{} ({} functions)",
                    aws.region,
                    aws.lambda_functions.len()
                )
            }
            UpstreamKind::Azure => azure.as_ref()?.function_app_name.clone(),
            UpstreamKind::Kube => {
                let kube = kube.as_ref()?;
                format!(
                    "{}.{}:{}",
                    kube.service_name, kube.service_namespace, kube.service_port
                )
            }
            UpstreamKind::Static => static_hosts
                .as_ref()?
                .hosts
                .iter()
                .map(|(addr, port)| format!("{addr}:{port}"))
                .collect::<Vec<_>>()
                .join(", "),
            UpstreamKind::Pipe => pipe.as_ref()?.path.clone(),
            UpstreamKind::Consul => consul.as_ref()?.service_name.clone(),
            UpstreamKind::AwsEc2 => {
                let ec2 = aws_ec2.as_ref()?;
                match ec2.port {
                    Some(port) => format!("{}:{port}", ec2.region),
                    None => ec2.region.clone(),
                }
            }
        };
        Some(target)
    }
}

// === impl UpstreamDetail ===

impl UpstreamDetail {
    pub fn new(reference: ResourceRef, upstream: &Upstream) -> Self {
        let kind = classify_upstream(upstream).ok();
        let target = kind
            .and_then(|kind| upstream.target(kind))
            .unwrap_or_default();
        let (state, reason) = upstream
            .status
            .as_ref()
            .map(|status| (status.state, status.reason.clone()))
            .unwrap_or_default();
        Self {
            upstream: reference,
            kind,
            state,
            reason,
            target,
        }
    }
}

impl fmt::Display for UpstreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aws => write!(f, "AWS"),
            Self::Azure => write!(f, "Azure"),
            Self::Kube => write!(f, "Kubernetes"),
            Self::Static => write!(f, "Static"),
            Self::Pipe => write!(f, "Pipe"),
            Self::Consul => write!(f, "Consul"),
            Self::AwsEc2 => write!(f, "AWS EC2"),
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
