use crate::{gloo::DestinationSpec, ResourceRef};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serves a set of domains with an inline list of routes. Routes may delegate
/// to [`RouteTable`]s.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gateway.solo.io",
    version = "v1",
    kind = "VirtualService",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub virtual_host: VirtualHost,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualHost {
    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default)]
    pub routes: Vec<Route>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

/// A list of routes that virtual services and other route tables delegate to.
#[derive(Clone, Debug, Default, PartialEq, CustomResource, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "gateway.solo.io",
    version = "v1",
    kind = "RouteTable",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RouteTableSpec {
    #[serde(default)]
    pub routes: Vec<Route>,

    /// Orders route tables that are delegated to by the same route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
}

/// A route carries exactly one action. The wire format does not enforce
/// this; conversions reject routes that set none or several.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<Matcher>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_action: Option<RouteAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate_action: Option<DelegateAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Path specifiers are mutually exclusive; a matcher without one matches the
/// `/` prefix.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Matcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<HeaderMatcher>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_parameters: Vec<QueryParameterMatcher>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeaderMatcher {
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub regex: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub invert_match: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueryParameterMatcher {
    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub regex: bool,
}

/// Exactly one of `single`, `multi` and `upstream_group` is set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single: Option<Destination>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi: Option<MultiDestination>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_group: Option<ResourceRef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub upstream: ResourceRef,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_spec: Option<DestinationSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MultiDestination {
    #[serde(default)]
    pub destinations: Vec<WeightedDestination>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeightedDestination {
    pub destination: Destination,

    #[serde(default)]
    pub weight: u32,
}

/// Delegates to a single route table, either through `ref` or through the
/// older top-level `name`/`namespace` fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DelegateAction {
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<ResourceRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}
