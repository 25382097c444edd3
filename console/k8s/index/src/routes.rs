use crate::{metadata, resource_ref};
use anyhow::{anyhow, bail, Result};
use gloo_console_core::{
    destination::{
        AwsDestinationSpec, AzureDestinationSpec, GrpcDestinationSpec, Parameters,
        RestDestinationSpec, WeightedDestination,
    },
    routes::{HeaderMatcher, PathMatch, QueryParamMatcher},
    Destination, DestinationSpec, Matcher, PathMatchKind, ResourceRef, Route, RouteTable,
    SingleDestination, VirtualService,
};
use gloo_console_k8s_api::{self as k8s, gateway as api, gloo};

#[cfg(test)]
mod tests;

pub fn virtual_service(vs: api::VirtualService) -> Result<VirtualService> {
    let metadata = metadata(&vs)?;
    let api::VirtualHost {
        domains,
        routes,
        options,
    } = vs.spec.virtual_host;
    let routes = routes
        .into_iter()
        .enumerate()
        .map(|(i, route)| {
            try_route(route, &metadata.namespace).map_err(|error| error.context(format!("routes[{i}]")))
        })
        .collect::<Result<_>>()?;
    Ok(VirtualService {
        metadata,
        domains,
        routes,
        options,
    })
}

pub fn route_table(rt: api::RouteTable) -> Result<RouteTable> {
    let metadata = metadata(&rt)?;
    let routes = rt
        .spec
        .routes
        .into_iter()
        .enumerate()
        .map(|(i, route)| {
            try_route(route, &metadata.namespace).map_err(|error| error.context(format!("routes[{i}]")))
        })
        .collect::<Result<_>>()?;
    Ok(RouteTable { metadata, routes })
}

/// Converts a route stored on a resource in namespace `ns`.
pub fn try_route(
    api::Route {
        matchers,
        route_action,
        delegate_action,
        options,
        name: _,
    }: api::Route,
    ns: &str,
) -> Result<Route> {
    if matchers.len() > 1 {
        tracing::debug!(
            matchers = matchers.len(),
            "Route has several matchers; only the first is shown"
        );
    }
    let matcher = matchers
        .into_iter()
        .next()
        .map(try_matcher)
        .transpose()?
        .unwrap_or_default();

    let destination = match (route_action, delegate_action) {
        (Some(action), None) => route_action_destination(action, ns)?,
        (None, Some(action)) => Destination::Delegate(delegate_ref(action, ns)?),
        (Some(_), Some(_)) => bail!("route sets both a route action and a delegate action"),
        (None, None) => bail!("route sets neither a route action nor a delegate action"),
    };

    Ok(Route {
        matcher,
        destination,
        options,
    })
}

pub fn try_matcher(
    api::Matcher {
        prefix,
        exact,
        regex,
        headers,
        query_parameters,
        methods,
    }: api::Matcher,
) -> Result<Matcher> {
    let path = match (prefix, exact, regex) {
        (None, None, None) => PathMatch {
            kind: PathMatchKind::Prefix,
            value: "/".to_string(),
        },
        (Some(value), None, None) => PathMatch {
            kind: PathMatchKind::Prefix,
            value,
        },
        (None, Some(value), None) => PathMatch {
            kind: PathMatchKind::Exact,
            value,
        },
        (None, None, Some(value)) => PathMatch {
            kind: PathMatchKind::Regex,
            value,
        },
        _ => bail!("matcher sets more than one path specifier"),
    };

    let headers = headers
        .into_iter()
        .map(
            |api::HeaderMatcher {
                 name,
                 value,
                 regex,
                 invert_match,
             }| {
                if invert_match {
                    tracing::debug!(header = %name, "Inverted header match is shown as a plain match");
                }
                HeaderMatcher { name, value, regex }
            },
        )
        .collect();

    let query_params = query_parameters
        .into_iter()
        .map(
            |api::QueryParameterMatcher { name, value, regex }| QueryParamMatcher {
                name,
                value,
                regex,
            },
        )
        .collect();

    Ok(Matcher {
        path,
        headers,
        query_params,
        methods: methods.into_iter().collect(),
    })
}

fn route_action_destination(
    api::RouteAction {
        single,
        multi,
        upstream_group,
    }: api::RouteAction,
    ns: &str,
) -> Result<Destination> {
    match (single, multi, upstream_group) {
        (Some(single), None, None) => single_destination(single, ns).map(Destination::Single),
        (None, Some(api::MultiDestination { destinations }), None) => {
            let destinations = destinations
                .into_iter()
                .map(|api::WeightedDestination { destination, weight }| {
                    Ok(WeightedDestination {
                        destination: single_destination(destination, ns)?,
                        weight,
                    })
                })
                .collect::<Result<_>>()?;
            Ok(Destination::Multi { destinations })
        }
        (None, None, Some(group)) => Ok(Destination::UpstreamGroup(resource_ref(group, ns))),
        (None, None, None) => bail!("route action sets no destination"),
        _ => bail!("route action sets more than one destination"),
    }
}

pub fn single_destination(
    api::Destination {
        upstream,
        destination_spec,
    }: api::Destination,
    ns: &str,
) -> Result<SingleDestination> {
    Ok(SingleDestination {
        upstream: resource_ref(upstream, ns),
        destination_spec: destination_spec
            .map(try_destination_spec)
            .transpose()?
            .unwrap_or_default(),
    })
}

pub fn try_destination_spec(
    gloo::DestinationSpec {
        aws,
        azure,
        rest,
        grpc,
    }: gloo::DestinationSpec,
) -> Result<DestinationSpec> {
    let spec = match (aws, azure, rest, grpc) {
        (None, None, None, None) => DestinationSpec::None,
        (Some(aws), None, None, None) => DestinationSpec::Aws(AwsDestinationSpec {
            logical_name: aws.logical_name,
            invocation_style: aws.invocation_style == gloo::InvocationStyle::Async,
            response_transformation: aws.response_transformation,
        }),
        (None, Some(azure), None, None) => DestinationSpec::Azure(AzureDestinationSpec {
            function_name: azure.function_name,
        }),
        (None, None, Some(rest), None) => DestinationSpec::Rest(RestDestinationSpec {
            function_name: rest.function_name,
            parameters: rest.parameters.map(parameters),
        }),
        (None, None, None, Some(grpc)) => DestinationSpec::Grpc(GrpcDestinationSpec {
            package: grpc.package,
            service: grpc.service,
            function: grpc.function,
            parameters: grpc.parameters.map(parameters),
        }),
        _ => bail!("destination spec sets more than one function type"),
    };
    Ok(spec)
}

fn parameters(gloo::Parameters { headers, path }: gloo::Parameters) -> Parameters {
    Parameters { headers, path }
}

fn delegate_ref(
    api::DelegateAction {
        reference,
        name,
        namespace,
    }: api::DelegateAction,
    ns: &str,
) -> Result<ResourceRef> {
    match (reference, name) {
        (Some(reference), None) => Ok(resource_ref(reference, ns)),
        (None, Some(name)) => Ok(resource_ref(k8s::ResourceRef { name, namespace }, ns)),
        (Some(_), Some(_)) => bail!("delegate action sets both a reference and a name"),
        (None, None) => Err(anyhow!("delegate action does not reference a route table")),
    }
}

/// Converts a compiled route into its resource representation.
pub fn api_route(route: &Route) -> api::Route {
    let Route {
        matcher,
        destination,
        options,
    } = route;

    let (route_action, delegate_action) = match destination {
        Destination::Delegate(table) => (
            None,
            Some(api::DelegateAction {
                reference: Some(api_ref(table)),
                name: None,
                namespace: None,
            }),
        ),
        Destination::Single(single) => (
            Some(api::RouteAction {
                single: Some(api_destination(single)),
                ..Default::default()
            }),
            None,
        ),
        Destination::Multi { destinations } => (
            Some(api::RouteAction {
                multi: Some(api::MultiDestination {
                    destinations: destinations
                        .iter()
                        .map(|WeightedDestination { destination, weight }| {
                            api::WeightedDestination {
                                destination: api_destination(destination),
                                weight: *weight,
                            }
                        })
                        .collect(),
                }),
                ..Default::default()
            }),
            None,
        ),
        Destination::UpstreamGroup(group) => (
            Some(api::RouteAction {
                upstream_group: Some(api_ref(group)),
                ..Default::default()
            }),
            None,
        ),
    };

    api::Route {
        matchers: vec![api_matcher(matcher)],
        route_action,
        delegate_action,
        options: options.clone(),
        name: None,
    }
}

fn api_matcher(matcher: &Matcher) -> api::Matcher {
    let PathMatch { kind, value } = &matcher.path;
    let (prefix, exact, regex) = match kind {
        PathMatchKind::Prefix => (Some(value.clone()), None, None),
        PathMatchKind::Exact => (None, Some(value.clone()), None),
        PathMatchKind::Regex => (None, None, Some(value.clone())),
    };
    api::Matcher {
        prefix,
        exact,
        regex,
        headers: matcher
            .headers
            .iter()
            .map(|HeaderMatcher { name, value, regex }| api::HeaderMatcher {
                name: name.clone(),
                value: value.clone(),
                regex: *regex,
                invert_match: false,
            })
            .collect(),
        query_parameters: matcher
            .query_params
            .iter()
            .map(
                |QueryParamMatcher { name, value, regex }| api::QueryParameterMatcher {
                    name: name.clone(),
                    value: value.clone(),
                    regex: *regex,
                },
            )
            .collect(),
        methods: matcher.methods.iter().cloned().collect(),
    }
}

fn api_destination(single: &SingleDestination) -> api::Destination {
    let spec = match &single.destination_spec {
        DestinationSpec::None => None,
        DestinationSpec::Aws(aws) => Some(gloo::DestinationSpec {
            aws: Some(gloo::AwsDestinationSpec {
                logical_name: aws.logical_name.clone(),
                invocation_style: if aws.invocation_style {
                    gloo::InvocationStyle::Async
                } else {
                    gloo::InvocationStyle::Sync
                },
                response_transformation: aws.response_transformation,
            }),
            ..Default::default()
        }),
        DestinationSpec::Azure(azure) => Some(gloo::DestinationSpec {
            azure: Some(gloo::AzureDestinationSpec {
                function_name: azure.function_name.clone(),
            }),
            ..Default::default()
        }),
        DestinationSpec::Rest(rest) => Some(gloo::DestinationSpec {
            rest: Some(gloo::RestDestinationSpec {
                function_name: rest.function_name.clone(),
                parameters: rest.parameters.as_ref().map(api_parameters),
            }),
            ..Default::default()
        }),
        DestinationSpec::Grpc(grpc) => Some(gloo::DestinationSpec {
            grpc: Some(gloo::GrpcDestinationSpec {
                package: grpc.package.clone(),
                service: grpc.service.clone(),
                function: grpc.function.clone(),
                parameters: grpc.parameters.as_ref().map(api_parameters),
            }),
            ..Default::default()
        }),
    };
    api::Destination {
        upstream: api_ref(&single.upstream),
        destination_spec: spec,
    }
}

fn api_parameters(Parameters { headers, path }: &Parameters) -> gloo::Parameters {
    gloo::Parameters {
        headers: headers.clone(),
        path: path.clone(),
    }
}

fn api_ref(reference: &ResourceRef) -> k8s::ResourceRef {
    k8s::ResourceRef {
        name: reference.name.clone(),
        namespace: Some(reference.namespace.clone()),
    }
}
