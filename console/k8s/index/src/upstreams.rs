use crate::{metadata, resource_ref};
use anyhow::{bail, Result};
use gloo_console_core::{
    upstream::{self as core, ServiceSpec, State, UpstreamStatus},
    upstream_group::{FailoverScheme, PriorityGroup, UpstreamGroup, WeightedUpstream},
    ResourceRef, Upstream,
};
use gloo_console_k8s_api::{fed, gloo as api, ResourceExt};

pub fn upstream(upstream: api::Upstream) -> Result<Upstream> {
    let metadata = upstream
        .metadata
        .name
        .as_ref()
        .map(|name| ResourceRef::new(upstream.namespace().unwrap_or_default(), name));

    let api::UpstreamSpec {
        aws,
        azure,
        kube,
        static_hosts,
        pipe,
        consul,
        aws_ec2,
    } = upstream.spec;

    let spec = core::UpstreamSpec {
        aws: aws.map(|api::AwsUpstreamSpec { region, lambda_functions }| core::AwsUpstream {
            region,
            lambda_functions: lambda_functions
                .into_iter()
                .map(|function| core::LambdaFunction {
                    logical_name: function.logical_name,
                    lambda_function_name: function.lambda_function_name,
                    qualifier: function.qualifier,
                })
                .collect(),
        }),
        azure: azure.map(|azure| core::AzureUpstream {
            function_app_name: azure.function_app_name,
            functions: azure
                .functions
                .into_iter()
                .map(|function| function.function_name)
                .collect(),
        }),
        kube: kube
            .map(|kube| -> Result<_> {
                Ok(core::KubeUpstream {
                    service_name: kube.service_name,
                    service_namespace: kube.service_namespace,
                    service_port: kube.service_port,
                    service_spec: service_spec(kube.service_spec)?,
                })
            })
            .transpose()?,
        static_hosts: static_hosts
            .map(|hosts| -> Result<_> {
                Ok(core::StaticUpstream {
                    hosts: hosts
                        .hosts
                        .into_iter()
                        .map(|api::Host { addr, port }| (addr, port))
                        .collect(),
                    service_spec: service_spec(hosts.service_spec)?,
                })
            })
            .transpose()?,
        pipe: pipe.map(|pipe| core::PipeUpstream { path: pipe.path }),
        consul: consul
            .map(|consul| -> Result<_> {
                Ok(core::ConsulUpstream {
                    service_name: consul.service_name,
                    data_centers: consul.data_centers,
                    service_spec: service_spec(consul.service_spec)?,
                })
            })
            .transpose()?,
        aws_ec2: aws_ec2.map(|ec2| core::AwsEc2Upstream {
            region: ec2.region,
            port: ec2.port,
        }),
    };

    Ok(Upstream {
        metadata,
        spec,
        status: upstream.status.and_then(status),
    })
}

fn service_spec(spec: Option<api::ServiceSpec>) -> Result<Option<ServiceSpec>> {
    match spec {
        None => Ok(None),
        Some(api::ServiceSpec {
            rest: Some(_),
            grpc: Some(_),
        }) => bail!("service spec sets both REST and gRPC"),
        Some(api::ServiceSpec { rest: Some(_), .. }) => Ok(Some(ServiceSpec::Rest)),
        Some(api::ServiceSpec { grpc: Some(_), .. }) => Ok(Some(ServiceSpec::Grpc)),
        Some(_) => Ok(None),
    }
}

/// Statuses reported per namespace are reduced to the first reporter's.
fn status(
    api::UpstreamStatus {
        state,
        reason,
        namespaced_statuses,
    }: api::UpstreamStatus,
) -> Option<UpstreamStatus> {
    if let Some(state) = state {
        return Some(UpstreamStatus {
            state: state_from(state),
            reason,
        });
    }
    let (_, status) = namespaced_statuses?.statuses.into_iter().next()?;
    Some(UpstreamStatus {
        state: state_from(status.state),
        reason: status.reason,
    })
}

fn state_from(state: api::State) -> State {
    match state {
        api::State::Pending => State::Pending,
        api::State::Accepted => State::Accepted,
        api::State::Rejected => State::Rejected,
        api::State::Warning => State::Warning,
    }
}

pub fn upstream_group(group: api::UpstreamGroup) -> Result<UpstreamGroup> {
    let metadata = metadata(&group)?;
    let destinations = group
        .spec
        .destinations
        .into_iter()
        .map(|api::GroupDestination { destination, weight }| {
            if destination.destination_spec.is_some() {
                tracing::debug!(upstream = %destination.upstream.name, "Ignoring group destination spec");
            }
            WeightedUpstream {
                upstream: resource_ref(destination.upstream, &metadata.namespace),
                weight,
            }
        })
        .collect();
    Ok(UpstreamGroup {
        metadata,
        destinations,
    })
}

pub fn failover_scheme(scheme: fed::FailoverScheme) -> Result<FailoverScheme> {
    let metadata = metadata(&scheme)?;
    let fed::FailoverSchemeSpec {
        primary,
        failover_groups,
    } = scheme.spec;

    let primary = primary.map(|primary| {
        let namespace = if primary.namespace.is_empty() {
            metadata.namespace.clone()
        } else {
            primary.namespace
        };
        ResourceRef::new(namespace, primary.name)
    });

    let failover_groups = failover_groups
        .into_iter()
        .map(|group| {
            group
                .priority_group
                .into_iter()
                .map(
                    |fed::PriorityGroup {
                         cluster,
                         upstreams,
                         locality_weight,
                     }| PriorityGroup {
                        cluster: (!cluster.is_empty()).then_some(cluster),
                        locality_weight,
                        upstreams: upstreams
                            .into_iter()
                            .map(|upstream| WeightedUpstream {
                                upstream: resource_ref(upstream, &metadata.namespace),
                                weight: None,
                            })
                            .collect(),
                    },
                )
                .collect()
        })
        .collect();

    Ok(FailoverScheme {
        metadata,
        primary,
        failover_groups,
    })
}
