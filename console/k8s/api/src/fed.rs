use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Describes, level by level, where traffic for a primary upstream fails over
/// to across clusters.
#[derive(Clone, Debug, Default, PartialEq, Eq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "fed.solo.io",
    version = "v1",
    kind = "FailoverScheme",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct FailoverSchemeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<ClusterObjectRef>,

    /// Ordered by priority, highest first.
    #[serde(default)]
    pub failover_groups: Vec<FailoverGroup>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailoverGroup {
    #[serde(default)]
    pub priority_group: Vec<PriorityGroup>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorityGroup {
    #[serde(default)]
    pub cluster: String,

    #[serde(default)]
    pub upstreams: Vec<crate::ResourceRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality_weight: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClusterObjectRef {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
}
