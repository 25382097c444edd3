use super::*;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn route(yaml: &str) -> api::Route {
    serde_yaml::from_str(yaml).expect("route must parse")
}

#[test]
fn converts_delegating_virtual_service() {
    let vs: api::VirtualService = serde_yaml::from_str(
        r#"
apiVersion: gateway.solo.io/v1
kind: VirtualService
metadata:
  name: vs1
  namespace: gloo-system
spec:
  virtualHost:
    domains: ["*"]
    routes:
    - matchers:
      - prefix: /api
      delegateAction:
        ref:
          name: rt-a
          namespace: apps
    - delegateAction:
        name: rt-b
"#,
    )
    .expect("resource must parse");

    let vs = virtual_service(vs).expect("virtual service must convert");
    assert_eq!(vs.metadata, ResourceRef::new("gloo-system", "vs1"));
    assert_eq!(
        vs.routes
            .iter()
            .map(|route| route.destination.clone())
            .collect::<Vec<_>>(),
        vec![
            Destination::Delegate(ResourceRef::new("apps", "rt-a")),
            Destination::Delegate(ResourceRef::new("gloo-system", "rt-b")),
        ]
    );
    // A route without matchers matches everything.
    assert_eq!(vs.routes[1].matcher, Matcher::default());
}

#[test]
fn converts_function_destination() {
    let route = try_route(
        route(
            r#"
matchers:
- exact: /contact
  methods: [POST]
  headers:
  - name: x-tenant
    value: "[a-z]+"
    regex: true
routeAction:
  single:
    upstream:
      name: aws-lambda
    destinationSpec:
      aws:
        logicalName: contact-form
        invocationStyle: ASYNC
options:
  timeout: 5s
"#,
        ),
        "gloo-system",
    )
    .expect("route must convert");

    assert_eq!(
        route,
        Route {
            matcher: Matcher {
                headers: vec![HeaderMatcher {
                    name: "x-tenant".to_string(),
                    value: "[a-z]+".to_string(),
                    regex: true,
                }],
                methods: ["POST".to_string()].into_iter().collect(),
                ..Matcher::exact("/contact")
            },
            destination: Destination::Single(SingleDestination {
                upstream: ResourceRef::new("gloo-system", "aws-lambda"),
                destination_spec: DestinationSpec::Aws(AwsDestinationSpec {
                    logical_name: "contact-form".to_string(),
                    invocation_style: true,
                    response_transformation: false,
                }),
            }),
            options: Some(serde_json::json!({ "timeout": "5s" })),
        }
    );
}

#[rstest]
#[case::no_action("matchers: [{prefix: /}]")]
#[case::both_actions(
    "{routeAction: {upstreamGroup: {name: g}}, delegateAction: {name: rt}}"
)]
#[case::two_destinations(
    "{routeAction: {upstreamGroup: {name: g}, single: {upstream: {name: u}}}}"
)]
#[case::two_paths("{matchers: [{prefix: /, exact: /a}], delegateAction: {name: rt}}")]
#[case::two_specs(
    "{routeAction: {single: {upstream: {name: u}, destinationSpec: {aws: {}, azure: {}}}}}"
)]
#[case::empty_delegate("{delegateAction: {}}")]
fn rejects_one_of_violations(#[case] yaml: &str) {
    assert!(try_route(route(yaml), "default").is_err());
}

#[test]
fn round_trips_compiled_routes() {
    let routes = vec![
        Route {
            matcher: Matcher {
                query_params: vec![QueryParamMatcher {
                    name: "page".to_string(),
                    value: "[0-9]+".to_string(),
                    regex: true,
                }],
                ..Matcher::regex("/users/[0-9]+")
            },
            destination: Destination::Multi {
                destinations: vec![
                    WeightedDestination {
                        destination: SingleDestination {
                            upstream: ResourceRef::new("gloo-system", "petstore"),
                            destination_spec: DestinationSpec::Rest(RestDestinationSpec {
                                function_name: "findPets".to_string(),
                                parameters: Some(Parameters {
                                    headers: btreemap! {
                                        ":path".to_string() => "/pets/{id}".to_string(),
                                    },
                                    path: None,
                                }),
                            }),
                        },
                        weight: 3,
                    },
                    WeightedDestination {
                        destination: SingleDestination {
                            upstream: ResourceRef::new("gloo-system", "users"),
                            destination_spec: DestinationSpec::None,
                        },
                        weight: 1,
                    },
                ],
            },
            options: None,
        },
        Route {
            matcher: Matcher::prefix("/grpc"),
            destination: Destination::Single(SingleDestination {
                upstream: ResourceRef::new("apps", "bookstore"),
                destination_spec: DestinationSpec::Grpc(GrpcDestinationSpec {
                    package: "bookstore".to_string(),
                    service: "Bookstore".to_string(),
                    function: "ListShelves".to_string(),
                    parameters: None,
                }),
            }),
            options: None,
        },
        Route {
            matcher: Matcher::exact("/group"),
            destination: Destination::UpstreamGroup(ResourceRef::new("apps", "canary")),
            options: Some(serde_json::json!({ "prefixRewrite": "/" })),
        },
        Route {
            matcher: Matcher::prefix("/api"),
            destination: Destination::Delegate(ResourceRef::new("apps", "rt-a")),
            options: None,
        },
    ];

    for route in routes {
        let converted = try_route(api_route(&route), "elsewhere").expect("route must convert");
        assert_eq!(converted, route);
    }
}
