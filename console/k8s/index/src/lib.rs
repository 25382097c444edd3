//! Gloo console resource index
//!
//! Converts the gateway's Kubernetes resources into the console's core model
//! and holds a point-in-time [`Catalog`] of them:
//!
//! - `VirtualService` and `RouteTable` routes become core [`Route`]s; compiled
//!   routes convert back with [`routes::api_route`].
//! - `Upstream`, `UpstreamGroup` and `FailoverScheme` become their core
//!   counterparts.
//!
//! References that omit a namespace resolve to the namespace of the resource
//! that holds them. Resources that violate the wire format's one-of
//! constraints fail to convert; [`decode_all`] skips them with a warning so a
//! single bad resource never hides the rest.
//!
//! [`Route`]: gloo_console_core::Route

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod catalog;
pub mod routes;
pub mod upstreams;

pub use self::catalog::Catalog;
use anyhow::{anyhow, Result};
use gloo_console_core::ResourceRef;
use gloo_console_k8s_api::{self as api, ResourceExt};

/// Converts every resource with `convert`, skipping those that fail.
pub fn decode_all<T, U>(
    resources: impl IntoIterator<Item = T>,
    convert: impl Fn(T) -> Result<U>,
) -> Vec<U>
where
    T: ResourceExt,
{
    resources
        .into_iter()
        .filter_map(|resource| {
            let namespace = resource.namespace().unwrap_or_default();
            let name = resource.name_any();
            match convert(resource) {
                Ok(value) => Some(value),
                Err(error) => {
                    tracing::warn!(%namespace, %name, error = %format_args!("{error:#}"), "Skipping invalid resource");
                    None
                }
            }
        })
        .collect()
}

/// The namespace and name of a namespaced resource.
pub fn metadata<T: ResourceExt>(resource: &T) -> Result<ResourceRef> {
    let name = resource
        .meta()
        .name
        .clone()
        .ok_or_else(|| anyhow!("resource has no name"))?;
    let namespace = resource
        .namespace()
        .ok_or_else(|| anyhow!("resource {name} has no namespace"))?;
    Ok(ResourceRef::new(namespace, name))
}

/// Resolves a reference held by a resource in `ns`.
pub fn resource_ref(reference: api::ResourceRef, ns: &str) -> ResourceRef {
    ResourceRef::new(reference.namespace_or(ns), &reference.name)
}
