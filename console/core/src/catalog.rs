use crate::{
    upstream_group::UpstreamGroup, ResourceRef, RouteTable, Upstream, UpstreamDetail,
    VirtualService,
};
use anyhow::Result;

/// Models the resource store's read side.
///
/// Implementations return decoded resources; resources that cannot be decoded
/// are omitted rather than failing the listing.
#[async_trait::async_trait]
pub trait DiscoverCatalog {
    async fn list_upstreams(&self) -> Result<Vec<Upstream>>;

    async fn list_upstream_groups(&self) -> Result<Vec<UpstreamGroup>>;

    async fn list_virtual_services(&self) -> Result<Vec<VirtualService>>;

    async fn list_route_tables(&self) -> Result<Vec<RouteTable>>;
}

/// Fetches the detail of a single upstream.
#[async_trait::async_trait]
pub trait FetchUpstreamDetail {
    async fn get_upstream_detail(&self, upstream: &ResourceRef) -> Result<UpstreamDetail>;
}
