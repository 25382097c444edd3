#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod fed;
pub mod gateway;
pub mod gloo;

pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
pub use kube::{Resource, ResourceExt};

/// References a resource by name. A missing namespace defaults to the
/// namespace of the resource holding the reference.
#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub struct ResourceRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

// === impl ResourceRef ===

impl ResourceRef {
    pub fn namespace_or<'n>(&'n self, default: &'n str) -> &'n str {
        self.namespace.as_deref().unwrap_or(default)
    }
}
