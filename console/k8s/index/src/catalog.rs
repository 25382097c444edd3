use anyhow::{anyhow, Result};
use gloo_console_core::{
    catalog::{DiscoverCatalog, FetchUpstreamDetail},
    compile::CompileContext,
    delegation::{self, EffectiveRouteNode},
    tables::index_tables,
    upstream_group::UpstreamGroup,
    ResourceRef, RouteTables, Upstream, UpstreamDetail, VirtualService,
};


/// A snapshot of the resources routes are compiled and resolved against.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub upstreams: Vec<Upstream>,
    pub upstream_groups: Vec<UpstreamGroup>,
    pub virtual_services: Vec<VirtualService>,
    pub route_tables: RouteTables,
}

// === impl Catalog ===

impl Catalog {
    /// Lists every resource kind concurrently.
    pub async fn fetch<D>(discover: &D) -> Result<Self>
    where
        D: DiscoverCatalog + ?Sized,
    {
        let (upstreams, upstream_groups, virtual_services, route_tables) = futures::try_join!(
            discover.list_upstreams(),
            discover.list_upstream_groups(),
            discover.list_virtual_services(),
            discover.list_route_tables(),
        )?;
        tracing::debug!(
            upstreams = upstreams.len(),
            upstream_groups = upstream_groups.len(),
            virtual_services = virtual_services.len(),
            route_tables = route_tables.len(),
            "Fetched catalog"
        );

        Ok(Self {
            upstreams,
            upstream_groups,
            virtual_services,
            route_tables: index_tables(route_tables),
        })
    }

    pub fn compile_context(&self) -> CompileContext<'_> {
        CompileContext {
            upstreams: &self.upstreams,
            virtual_services: &self.virtual_services,
            upstream_groups: Some(&self.upstream_groups),
        }
    }

    pub fn virtual_service(&self, reference: &ResourceRef) -> Option<&VirtualService> {
        self.virtual_services
            .iter()
            .find(|vs| vs.metadata == *reference)
    }

    pub fn upstream_group(&self, reference: &ResourceRef) -> Option<&UpstreamGroup> {
        self.upstream_groups
            .iter()
            .find(|group| group.metadata == *reference)
    }

    pub fn upstream(&self, reference: &ResourceRef) -> Option<&Upstream> {
        self.upstreams
            .iter()
            .find(|upstream| upstream.metadata.as_ref() == Some(reference))
    }

    /// The effective routing tree of a virtual service.
    pub fn effective_routes(
        &self,
        reference: &ResourceRef,
        max_depth: usize,
    ) -> Result<Vec<EffectiveRouteNode>> {
        let vs = self
            .virtual_service(reference)
            .ok_or_else(|| anyhow!("virtual service {reference} not found"))?;
        Ok(delegation::resolve_virtual_service(
            vs,
            &self.route_tables,
            max_depth,
        ))
    }
}

#[async_trait::async_trait]
impl FetchUpstreamDetail for Catalog {
    async fn get_upstream_detail(&self, reference: &ResourceRef) -> Result<UpstreamDetail> {
        let upstream = self
            .upstream(reference)
            .ok_or_else(|| anyhow!("upstream {reference} not found"))?;
        Ok(UpstreamDetail::new(reference.clone(), upstream))
    }
}
