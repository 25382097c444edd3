use crate::{
    core::{ResourceRef, Route},
    index::routes::api_route,
    k8s::gateway::{self as api, VirtualService},
};
use anyhow::{bail, Context, Result};
use kube::{
    api::{Api, PostParams},
    Client,
};

/// Where a compiled route lands in a virtual service's route list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Insert(usize),
    Replace(usize),
}

/// Writes `route` to the virtual service.
pub(crate) async fn apply_route(
    client: Client,
    vs: &ResourceRef,
    route: &Route,
    placement: Placement,
) -> Result<()> {
    let api = Api::<VirtualService>::namespaced(client, &vs.namespace);
    let mut resource = api
        .get(&vs.name)
        .await
        .with_context(|| format!("failed to get virtual service {vs}"))?;

    place(&mut resource.spec.virtual_host.routes, api_route(route), placement)
        .with_context(|| format!("cannot update virtual service {vs}"))?;

    api.replace(&vs.name, &PostParams::default(), &resource)
        .await
        .with_context(|| format!("failed to update virtual service {vs}"))?;
    tracing::info!(virtual_service = %vs, ?placement, "Applied route");
    Ok(())
}

/// A replaced route keeps its name. Matchers that compiled routes cannot
/// express are dropped with a warning.
fn place(
    routes: &mut Vec<api::Route>,
    mut route: api::Route,
    placement: Placement,
) -> Result<()> {
    match placement {
        Placement::Insert(index) if index <= routes.len() => routes.insert(index, route),
        Placement::Replace(index) if index < routes.len() => {
            let previous = &routes[index];
            if route.name.is_none() {
                route.name = previous.name.clone();
            }

            let dropped = previous.matchers.len().saturating_sub(route.matchers.len());
            if dropped > 0 {
                tracing::warn!(index, dropped, "Replacing route drops its extra matchers");
            }
            if previous
                .matchers
                .iter()
                .flat_map(|matcher| &matcher.headers)
                .any(|header| header.invert_match)
            {
                tracing::warn!(index, "Replacing route drops its inverted header matches");
            }

            routes[index] = route;
        }
        Placement::Insert(index) | Placement::Replace(index) => {
            bail!("no route position {index} among {} routes", routes.len())
        }
    }
    Ok(())
}
