use super::*;
use crate::{
    destination::{
        AwsDestinationSpec, AzureDestinationSpec, GrpcDestinationSpec, RestDestinationSpec,
    },
    upstream::{AwsUpstream, AzureUpstream, KubeUpstream, ServiceSpec, UpstreamSpec},
    upstream_group::WeightedUpstream,
    DestinationSpecKind,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const NS: &str = "gloo-system";

fn kube(name: &str, service_spec: Option<ServiceSpec>) -> Upstream {
    Upstream {
        metadata: Some(ResourceRef::new(NS, name)),
        spec: UpstreamSpec {
            kube: Some(KubeUpstream {
                service_name: name.to_string(),
                service_namespace: "default".to_string(),
                service_port: 8080,
                service_spec,
            }),
            ..Default::default()
        },
        status: None,
    }
}

fn aws(name: &str) -> Upstream {
    Upstream {
        metadata: Some(ResourceRef::new(NS, name)),
        spec: UpstreamSpec {
            aws: Some(AwsUpstream {
                region: "us-east-1".to_string(),
                lambda_functions: vec![],
            }),
            ..Default::default()
        },
        status: None,
    }
}

fn azure(name: &str) -> Upstream {
    Upstream {
        metadata: Some(ResourceRef::new(NS, name)),
        spec: UpstreamSpec {
            azure: Some(AzureUpstream {
                function_app_name: "contact".to_string(),
                functions: vec![],
            }),
            ..Default::default()
        },
        status: None,
    }
}

struct Fixture {
    upstreams: Vec<Upstream>,
    virtual_services: Vec<VirtualService>,
    upstream_groups: Vec<UpstreamGroup>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            upstreams: vec![
                kube("users", None),
                kube("petstore", Some(ServiceSpec::Rest)),
                aws("lambda"),
                azure("functions"),
                Upstream {
                    metadata: Some(ResourceRef::new(NS, "broken")),
                    ..Default::default()
                },
                // Without metadata an upstream cannot be referenced.
                Upstream {
                    metadata: None,
                    ..kube("anonymous", None)
                },
                kube("bookstore", Some(ServiceSpec::Grpc)),
            ],
            virtual_services: vec![VirtualService {
                metadata: ResourceRef::new(NS, "default"),
                domains: vec!["*".to_string()],
                routes: vec![],
                options: None,
            }],
            upstream_groups: vec![UpstreamGroup {
                metadata: ResourceRef::new(NS, "canary"),
                destinations: vec![WeightedUpstream {
                    upstream: ResourceRef::new(NS, "users"),
                    weight: Some(1),
                }],
            }],
        }
    }

    fn ctx(&self) -> CompileContext<'_> {
        CompileContext {
            upstreams: &self.upstreams,
            virtual_services: &self.virtual_services,
            upstream_groups: Some(&self.upstream_groups),
        }
    }
}

fn single_form(upstream: &str, destination_spec: DestinationSpec) -> RouteForm {
    RouteForm {
        virtual_service: Some(ResourceRef::new(NS, "default")),
        path: "/users".to_string(),
        destination: DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, upstream)),
            destination_spec,
        },
        ..Default::default()
    }
}

fn aws_spec() -> DestinationSpec {
    DestinationSpec::Aws(AwsDestinationSpec {
        logical_name: "contact-form".to_string(),
        invocation_style: false,
        response_transformation: true,
    })
}

fn weighted(upstream: &str, weight: Option<u32>) -> WeightedUpstreamForm {
    WeightedUpstreamForm {
        upstream: Some(ResourceRef::new(NS, upstream)),
        destination_spec: DestinationSpec::None,
        weight,
    }
}

#[test]
fn compiles_single_destination() {
    let fixture = Fixture::new();
    let form = RouteForm {
        methods: vec!["GET".to_string(), "POST".to_string()],
        options: Some(serde_json::json!({ "timeout": "5s" })),
        ..single_form("lambda", aws_spec())
    };

    let route = compile_route(&form, &fixture.ctx()).expect("form must compile");
    assert_eq!(route.matcher.path.value, "/users");
    assert_eq!(route.matcher.path.kind, PathMatchKind::Prefix);
    assert_eq!(
        route.matcher.methods.iter().collect::<Vec<_>>(),
        vec!["GET", "POST"]
    );
    assert_eq!(
        route.destination,
        Destination::Single(SingleDestination {
            upstream: ResourceRef::new(NS, "lambda"),
            destination_spec: aws_spec(),
        })
    );
    assert_eq!(route.options, Some(serde_json::json!({ "timeout": "5s" })));
}

#[rstest]
#[case::azure_spec_on_aws(
    "lambda",
    DestinationSpec::Azure(AzureDestinationSpec { function_name: "hello".to_string() }),
    DestinationSpecKind::Aws,
    DestinationSpecKind::Azure
)]
#[case::aws_spec_on_kube("users", aws_spec(), DestinationSpecKind::None, DestinationSpecKind::Aws)]
#[case::grpc_spec_on_rest(
    "petstore",
    DestinationSpec::Grpc(GrpcDestinationSpec::default()),
    DestinationSpecKind::Rest,
    DestinationSpecKind::Grpc
)]
#[case::none_on_aws("lambda", DestinationSpec::None, DestinationSpecKind::Aws, DestinationSpecKind::None)]
fn rejects_mismatched_destination_spec(
    #[case] upstream: &str,
    #[case] spec: DestinationSpec,
    #[case] expected: DestinationSpecKind,
    #[case] found: DestinationSpecKind,
) {
    let fixture = Fixture::new();
    assert_eq!(
        compile_route(&single_form(upstream, spec), &fixture.ctx()),
        Err(vec![ValidationError::new(
            Field::DestinationSpec,
            Reason::DestinationTypeMismatch { expected, found },
        )])
    );
}

#[test]
fn keeps_matching_rest_spec() {
    let fixture = Fixture::new();
    let spec = DestinationSpec::Rest(RestDestinationSpec {
        function_name: "findPets".to_string(),
        parameters: None,
    });
    let route =
        compile_route(&single_form("petstore", spec.clone()), &fixture.ctx()).expect("compiles");
    assert_eq!(
        route.destination,
        Destination::Single(SingleDestination {
            upstream: ResourceRef::new(NS, "petstore"),
            destination_spec: spec,
        })
    );
}

#[rstest]
#[case::plain_kube("users", DestinationSpec::None)]
#[case::rest_kube_without_spec("petstore", DestinationSpec::None)]
#[case::rest_kube_blank("petstore", DestinationSpec::Rest(RestDestinationSpec::default()))]
#[case::grpc_kube_without_spec("bookstore", DestinationSpec::None)]
#[case::grpc_kube_blank("bookstore", DestinationSpec::Grpc(GrpcDestinationSpec::default()))]
#[case::aws_blank("lambda", DestinationSpec::Aws(AwsDestinationSpec::default()))]
#[case::aws_filled("lambda", aws_spec())]
#[case::azure_blank("functions", DestinationSpec::Azure(AzureDestinationSpec::default()))]
fn matching_pairs_keep_the_entered_spec(#[case] upstream: &str, #[case] spec: DestinationSpec) {
    let fixture = Fixture::new();
    let route = compile_route(&single_form(upstream, spec.clone()), &fixture.ctx())
        .expect("matching pair must compile");
    assert_eq!(
        route.destination,
        Destination::Single(SingleDestination {
            upstream: ResourceRef::new(NS, upstream),
            destination_spec: spec,
        })
    );
}

#[rstest]
#[case::unknown("missing")]
#[case::without_metadata("anonymous")]
fn rejects_unknown_upstream(#[case] name: &str) {
    let fixture = Fixture::new();
    assert_eq!(
        compile_route(&single_form(name, DestinationSpec::None), &fixture.ctx()),
        Err(vec![ValidationError::new(
            Field::Upstream,
            Reason::UpstreamNotFound(ResourceRef::new(NS, name)),
        )])
    );
}

#[test]
fn rejects_unclassified_upstream() {
    let fixture = Fixture::new();
    let errors = compile_route(&single_form("broken", DestinationSpec::None), &fixture.ctx())
        .expect_err("upstream declares no type");
    assert_eq!(
        errors,
        vec![ValidationError::new(
            Field::Upstream,
            crate::upstream::ClassifyError::UnknownUpstreamType,
        )]
    );
}

#[test]
fn reports_every_error_together() {
    let fixture = Fixture::new();
    let form = RouteForm {
        virtual_service: Some(ResourceRef::new(NS, "missing")),
        path: "users".to_string(),
        methods: vec!["GET".to_string(), String::new()],
        destination: DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, "lambda")),
            destination_spec: DestinationSpec::Azure(AzureDestinationSpec::default()),
        },
        ..Default::default()
    };

    assert_eq!(
        compile_route(&form, &fixture.ctx()),
        Err(vec![
            ValidationError::new(Field::Method(1), Reason::EmptyMethod),
            ValidationError::new(Field::Path, Reason::RelativePath("users".to_string())),
            ValidationError::new(
                Field::DestinationSpec,
                Reason::DestinationTypeMismatch {
                    expected: DestinationSpecKind::Aws,
                    found: DestinationSpecKind::Azure,
                },
            ),
            ValidationError::new(
                Field::VirtualService,
                Reason::VirtualServiceNotFound(ResourceRef::new(NS, "missing")),
            ),
        ])
    );
}

#[test]
fn compilation_is_idempotent() {
    let fixture = Fixture::new();
    let forms = vec![
        RouteForm {
            match_type: PathMatchKind::Regex,
            path: "/users/[0-9]+".to_string(),
            headers: vec![HeaderMatcher {
                name: "x-version".to_string(),
                value: "v2".to_string(),
                regex: false,
            }],
            methods: vec!["PUT".to_string(), "GET".to_string()],
            ..single_form("lambda", aws_spec())
        },
        RouteForm {
            path: "/split".to_string(),
            destination: DestinationForm::Multi {
                destinations: vec![weighted("users", None), weighted("users", None)],
            },
            ..Default::default()
        },
        RouteForm {
            path: "/group".to_string(),
            destination: DestinationForm::UpstreamGroup {
                upstream_group: Some(ResourceRef::new(NS, "canary")),
            },
            ..Default::default()
        },
    ];

    for form in forms {
        let first = compile_route(&form, &fixture.ctx()).expect("form must compile");
        assert_eq!(compile_route(&form, &fixture.ctx()), Ok(first.clone()));

        let reloaded = RouteForm::from_route(&first, form.virtual_service.clone());
        assert_eq!(compile_route(&reloaded, &fixture.ctx()), Ok(first));
    }
}

#[test]
fn unweighted_destinations_share_equally() {
    let fixture = Fixture::new();
    let form = RouteForm {
        path: "/".to_string(),
        destination: DestinationForm::Multi {
            destinations: vec![weighted("users", None), weighted("petstore", None)],
        },
        ..Default::default()
    };

    let route = compile_route(&form, &fixture.ctx()).expect("form must compile");
    let Destination::Multi { destinations } = route.destination else {
        panic!("expected a multi destination");
    };
    assert_eq!(
        destinations.iter().map(|d| d.weight).collect::<Vec<_>>(),
        vec![1, 1]
    );
}

#[rstest]
#[case::empty(vec![], Reason::NoWeightedDestinations)]
#[case::mixed(vec![weighted("users", Some(3)), weighted("users", None)], Reason::MixedWeights)]
#[case::all_zero(vec![weighted("users", Some(0)), weighted("users", Some(0))], Reason::ZeroTotalWeight)]
fn enforces_weight_policy(#[case] destinations: Vec<WeightedUpstreamForm>, #[case] reason: Reason) {
    let fixture = Fixture::new();
    let form = RouteForm {
        path: "/".to_string(),
        destination: DestinationForm::Multi { destinations },
        ..Default::default()
    };
    assert_eq!(
        compile_route(&form, &fixture.ctx()),
        Err(vec![ValidationError::new(Field::Destinations, reason)])
    );
}

#[test]
fn individual_zero_weights_are_allowed() {
    let fixture = Fixture::new();
    let form = RouteForm {
        path: "/".to_string(),
        destination: DestinationForm::Multi {
            destinations: vec![weighted("users", Some(0)), weighted("users", Some(5))],
        },
        ..Default::default()
    };
    assert!(compile_route(&form, &fixture.ctx()).is_ok());
}

#[test]
fn checks_upstream_groups_when_known() {
    let fixture = Fixture::new();
    let form = RouteForm {
        path: "/".to_string(),
        destination: DestinationForm::UpstreamGroup {
            upstream_group: Some(ResourceRef::new(NS, "stable")),
        },
        ..Default::default()
    };
    assert_eq!(
        compile_route(&form, &fixture.ctx()),
        Err(vec![ValidationError::new(
            Field::UpstreamGroup,
            Reason::UpstreamGroupNotFound(ResourceRef::new(NS, "stable")),
        )])
    );

    let unchecked = CompileContext {
        upstream_groups: None,
        ..fixture.ctx()
    };
    assert!(compile_route(&form, &unchecked).is_ok());
}

#[test]
fn delegates_are_not_checked() {
    let fixture = Fixture::new();
    let form = RouteForm {
        path: "/api".to_string(),
        destination: DestinationForm::Delegate {
            route_table: Some(ResourceRef::new(NS, "nowhere")),
        },
        ..Default::default()
    };
    let route = compile_route(&form, &fixture.ctx()).expect("form must compile");
    assert_eq!(
        route.destination,
        Destination::Delegate(ResourceRef::new(NS, "nowhere"))
    );
}

#[test]
fn blank_selections_are_reported() {
    let fixture = Fixture::new();
    let blank = RouteForm {
        path: "/".to_string(),
        ..Default::default()
    };
    assert_eq!(
        compile_route(&blank, &fixture.ctx()),
        Err(vec![ValidationError::new(
            Field::Upstream,
            Reason::UpstreamNotSelected
        )])
    );

    let delegate = RouteForm {
        destination: DestinationForm::Delegate { route_table: None },
        ..blank
    };
    assert_eq!(
        compile_route(&delegate, &fixture.ctx()),
        Err(vec![ValidationError::new(
            Field::Delegate,
            Reason::DelegateNotSelected
        )])
    );
}

#[test]
fn selecting_upstream_resets_stale_spec() {
    let fixture = Fixture::new();
    let lambda = &fixture.upstreams[2];
    let functions = &fixture.upstreams[3];

    let mut form = single_form("lambda", aws_spec());
    form.select_upstream(lambda);
    assert_eq!(
        form.destination,
        DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, "lambda")),
            destination_spec: aws_spec(),
        },
        "same type keeps the entered spec"
    );

    form.select_upstream(functions);
    assert_eq!(
        form.destination,
        DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, "functions")),
            destination_spec: DestinationSpec::Azure(AzureDestinationSpec::default()),
        }
    );

    // A blank spec of the right type still compiles.
    assert!(compile_route(&form, &fixture.ctx()).is_ok());

    // A plain route to a REST upstream is kept as it is.
    let petstore = &fixture.upstreams[1];
    let mut form = single_form("users", DestinationSpec::None);
    form.select_upstream(petstore);
    assert_eq!(
        form.destination,
        DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, "petstore")),
            destination_spec: DestinationSpec::None,
        }
    );
}

#[test]
fn selecting_upstream_replaces_other_destinations() {
    let fixture = Fixture::new();
    let mut form = RouteForm {
        destination: DestinationForm::Delegate {
            route_table: Some(ResourceRef::new(NS, "rt-a")),
        },
        ..Default::default()
    };
    form.select_upstream(&fixture.upstreams[1]);
    assert_eq!(
        form.destination,
        DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, "petstore")),
            destination_spec: DestinationSpec::Rest(RestDestinationSpec::default()),
        }
    );

    let mut entry = weighted("users", None);
    entry.destination_spec = aws_spec();
    entry.select_upstream(&fixture.upstreams[0]);
    assert_eq!(entry.destination_spec, DestinationSpec::None);
}

#[test]
fn reads_yaml_forms() {
    let form: RouteForm = serde_yaml::from_str(
        r#"
virtualService:
  name: default
  namespace: gloo-system
path: /users
matchType: EXACT
methods: [GET]
destination:
  type: upstream
  upstream:
    name: lambda
    namespace: gloo-system
  destinationSpec:
    aws:
      logicalName: contact-form
"#,
    )
    .expect("form must parse");

    assert_eq!(form.match_type, PathMatchKind::Exact);
    assert_eq!(
        form.destination,
        DestinationForm::Upstream {
            upstream: Some(ResourceRef::new(NS, "lambda")),
            destination_spec: DestinationSpec::Aws(AwsDestinationSpec {
                logical_name: "contact-form".to_string(),
                ..Default::default()
            }),
        }
    );
}
