use crate::{
    core::{
        catalog::{DiscoverCatalog, FetchUpstreamDetail},
        upstream_group::{FailoverScheme, UpstreamGroup},
        ResourceRef, RouteTable, Upstream, UpstreamDetail, VirtualService,
    },
    index::{self, routes, upstreams},
    k8s,
};
use anyhow::{Context, Result};
use kube::{
    api::{Api, ListParams},
    core::NamespaceResourceScope,
    Client, Resource,
};
use serde::de::DeserializeOwned;
use std::fmt;

/// Reads gateway resources from the cluster.
#[derive(Clone)]
pub struct KubeCatalog {
    client: Client,
}

// === impl KubeCatalog ===

impl KubeCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn upstream_group(&self, reference: &ResourceRef) -> Result<UpstreamGroup> {
        let group = self
            .get::<k8s::gloo::UpstreamGroup>(reference)
            .await
            .with_context(|| format!("failed to get upstream group {reference}"))?;
        upstreams::upstream_group(group)
    }

    pub async fn failover_scheme(&self, reference: &ResourceRef) -> Result<FailoverScheme> {
        let scheme = self
            .get::<k8s::fed::FailoverScheme>(reference)
            .await
            .with_context(|| format!("failed to get failover scheme {reference}"))?;
        upstreams::failover_scheme(scheme)
    }

    async fn list_all<K>(&self) -> Result<Vec<K>>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
        K: Clone + DeserializeOwned + fmt::Debug,
    {
        let api = Api::<K>::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .with_context(|| format!("failed to list {}", K::plural(&())))?;
        Ok(list.items)
    }

    async fn get<K>(&self, reference: &ResourceRef) -> Result<K>
    where
        K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
        K: Clone + DeserializeOwned + fmt::Debug,
    {
        let api = Api::<K>::namespaced(self.client.clone(), &reference.namespace);
        Ok(api.get(&reference.name).await?)
    }
}

#[async_trait::async_trait]
impl DiscoverCatalog for KubeCatalog {
    async fn list_upstreams(&self) -> Result<Vec<Upstream>> {
        let resources = self.list_all::<k8s::gloo::Upstream>().await?;
        Ok(index::decode_all(resources, upstreams::upstream))
    }

    async fn list_upstream_groups(&self) -> Result<Vec<UpstreamGroup>> {
        let resources = self.list_all::<k8s::gloo::UpstreamGroup>().await?;
        Ok(index::decode_all(resources, upstreams::upstream_group))
    }

    async fn list_virtual_services(&self) -> Result<Vec<VirtualService>> {
        let resources = self.list_all::<k8s::gateway::VirtualService>().await?;
        Ok(index::decode_all(resources, routes::virtual_service))
    }

    async fn list_route_tables(&self) -> Result<Vec<RouteTable>> {
        let resources = self.list_all::<k8s::gateway::RouteTable>().await?;
        Ok(index::decode_all(resources, routes::route_table))
    }
}

#[async_trait::async_trait]
impl FetchUpstreamDetail for KubeCatalog {
    async fn get_upstream_detail(&self, reference: &ResourceRef) -> Result<UpstreamDetail> {
        let resource = self.get::<k8s::gloo::Upstream>(reference).await?;
        let upstream = upstreams::upstream(resource)?;
        Ok(UpstreamDetail::new(reference.clone(), &upstream))
    }
}
