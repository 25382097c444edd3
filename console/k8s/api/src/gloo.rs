use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A backend the gateway routes to. Exactly one upstream type is expected to
/// be set.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gloo.solo.io",
    version = "v1",
    kind = "Upstream",
    status = "UpstreamStatus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsUpstreamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureUpstreamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube: Option<KubeUpstreamSpec>,

    #[serde(default, rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_hosts: Option<StaticUpstreamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe: Option<PipeUpstreamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consul: Option<ConsulUpstreamSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_ec2: Option<AwsEc2UpstreamSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsUpstreamSpec {
    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub lambda_functions: Vec<LambdaFunctionSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LambdaFunctionSpec {
    #[serde(default)]
    pub logical_name: String,

    #[serde(default)]
    pub lambda_function_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureUpstreamSpec {
    #[serde(default)]
    pub function_app_name: String,

    #[serde(default)]
    pub functions: Vec<AzureFunctionSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureFunctionSpec {
    pub function_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeUpstreamSpec {
    #[serde(default)]
    pub service_name: String,

    #[serde(default)]
    pub service_namespace: String,

    #[serde(default)]
    pub service_port: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_spec: Option<ServiceSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaticUpstreamSpec {
    #[serde(default)]
    pub hosts: Vec<Host>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_spec: Option<ServiceSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Host {
    pub addr: String,
    pub port: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct PipeUpstreamSpec {
    #[serde(default)]
    pub path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsulUpstreamSpec {
    #[serde(default)]
    pub service_name: String,

    #[serde(default)]
    pub data_centers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_spec: Option<ServiceSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsEc2UpstreamSpec {
    #[serde(default)]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

/// Declares the function-level protocol of a service. The protocol details
/// themselves are not interpreted.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<Value>,
}

/// Status may be reported directly or per reporting namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaced_statuses: Option<NamespacedStatuses>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct NamespacedStatuses {
    #[serde(default)]
    pub statuses: BTreeMap<String, Status>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct Status {
    #[serde(default)]
    pub state: State,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum State {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Warning,
}

/// Splits traffic across weighted upstreams.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gloo.solo.io",
    version = "v1",
    kind = "UpstreamGroup",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamGroupSpec {
    #[serde(default)]
    pub destinations: Vec<GroupDestination>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupDestination {
    pub destination: crate::gateway::Destination,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

/// At most one function-level spec is set, matching the upstream's type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsDestinationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureDestinationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest: Option<RestDestinationSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcDestinationSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AwsDestinationSpec {
    #[serde(default)]
    pub logical_name: String,

    #[serde(default)]
    pub invocation_style: InvocationStyle,

    #[serde(default)]
    pub response_transformation: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvocationStyle {
    #[default]
    Sync,
    Async,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AzureDestinationSpec {
    #[serde(default)]
    pub function_name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RestDestinationSpec {
    #[serde(default)]
    pub function_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrpcDestinationSpec {
    #[serde(default)]
    pub package: String,

    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub function: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Parameters {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}
