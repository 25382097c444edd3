use crate::{
    core::{
        delegation::{flatten, EffectiveRouteNode, RouteRow},
        upstream_group::{FailoverScheme, GroupTable, UpstreamRow},
        ResourceRef, Route, ValidationError,
    },
    index::routes::api_route,
};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Indented text.
    #[default]
    Plain,
    Json,
}

// === impl OutputFormat ===

impl OutputFormat {
    pub(crate) fn routes(self, vs: &ResourceRef, nodes: &[EffectiveRouteNode]) -> Result<String> {
        let rows = flatten(nodes);
        if self == Self::Json {
            return json(&rows);
        }

        let mut out = format!("virtual service {vs}\n");
        for row in &rows {
            writeln!(out, "{}", route_line(row))?;
        }
        Ok(out)
    }

    pub(crate) fn group_table(self, table: &GroupTable) -> Result<String> {
        if self == Self::Json {
            return json(table);
        }
        let mut out = String::new();
        write_table(&mut out, table, "")?;
        Ok(out)
    }

    pub(crate) fn failover(self, scheme: &FailoverScheme, levels: &[GroupTable]) -> Result<String> {
        if self == Self::Json {
            #[derive(Serialize)]
            #[serde(rename_all = "camelCase")]
            struct Failover<'a> {
                primary: Option<&'a ResourceRef>,
                levels: &'a [GroupTable],
            }
            return json(&Failover {
                primary: scheme.primary.as_ref(),
                levels,
            });
        }

        let mut out = format!("failover scheme {}\n", scheme.metadata);
        if let Some(primary) = &scheme.primary {
            writeln!(out, "primary: {primary}")?;
        }
        for (i, table) in levels.iter().enumerate() {
            writeln!(out, "priority {}", i + 1)?;
            write_table(&mut out, table, "  ")?;
        }
        Ok(out)
    }

    /// Renders a compiled route as it is stored on a virtual service.
    pub(crate) fn route(self, route: &Route) -> Result<String> {
        let resource = api_route(route);
        match self {
            Self::Json => json(&resource),
            Self::Plain => Ok(serde_yaml::to_string(&resource)?),
        }
    }

    pub(crate) fn validation_errors(self, errors: &[ValidationError]) -> Result<String> {
        if self == Self::Json {
            #[derive(Serialize)]
            struct Invalid {
                field: String,
                reason: String,
            }
            let errors = errors
                .iter()
                .map(|error| Invalid {
                    field: error.field.to_string(),
                    reason: error.reason.to_string(),
                })
                .collect::<Vec<_>>();
            return json(&errors);
        }

        let mut out = String::new();
        for error in errors {
            writeln!(out, "invalid {error}")?;
        }
        Ok(out)
    }
}

fn json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(value)?;
    out.push('\n');
    Ok(out)
}

fn route_line(row: &RouteRow) -> String {
    let mut line = format!(
        "{:indent$}{} {} -> {}",
        "",
        row.match_type,
        row.matcher,
        row.destination,
        indent = 2 * (row.depth + 1),
    );
    if !row.methods.is_empty() {
        line.push_str(&format!(" methods={}", row.methods.join(",")));
    }
    if !row.headers.is_empty() {
        line.push_str(&format!(" headers=[{}]", row.headers));
    }
    if !row.query_params.is_empty() {
        line.push_str(&format!(" query=[{}]", row.query_params));
    }
    if let Some(warning) = row.warning {
        line.push_str(&format!(" ({warning})"));
    }
    line
}

fn write_table(out: &mut String, table: &GroupTable, indent: &str) -> Result<()> {
    for group in &table.groups {
        match &group.cluster {
            Some(cluster) => writeln!(
                out,
                "{indent}group {} cluster={cluster} weight={}",
                group.index, group.weight
            )?,
            None => writeln!(out, "{indent}group {} weight={}", group.index, group.weight)?,
        }
        for row in &group.rows {
            writeln!(out, "{indent}  {}", upstream_line(row))?;
        }
    }
    Ok(())
}

fn upstream_line(row: &UpstreamRow) -> String {
    let weight = row
        .weight
        .map(|w| format!(" weight={w}"))
        .unwrap_or_default();
    match &row.detail {
        Ok(detail) => {
            let kind = detail
                .kind
                .map(|kind| kind.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let mut line = format!(
                "{}{weight} type={kind} target={} state={}",
                row.upstream, detail.target, detail.state
            );
            if let Some(reason) = &detail.reason {
                line.push_str(&format!(" reason={reason:?}"));
            }
            line
        }
        Err(error) => format!("{}{weight} error={:?}", row.upstream, error.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        delegation::ResolutionWarning,
        upstream::State,
        upstream_group::{FetchError, GroupRows, GroupWeight, Ratio},
        Destination, Field, Matcher, Reason, UpstreamDetail, UpstreamKind,
    };
    use pretty_assertions::assert_eq;

    const NS: &str = "gloo-system";

    fn node(path: &str, destination: Destination, depth: usize) -> EffectiveRouteNode {
        EffectiveRouteNode {
            route: Route {
                matcher: Matcher::prefix(path),
                destination,
                options: None,
            },
            depth,
            warning: None,
            children: vec![],
        }
    }

    #[test]
    fn indents_routes_by_depth() {
        let mut api = node(
            "/api",
            Destination::Delegate(ResourceRef::new(NS, "rt-a")),
            0,
        );
        let mut cycle = node(
            "/loop",
            Destination::Delegate(ResourceRef::new(NS, "rt-a")),
            1,
        );
        cycle.warning = Some(ResolutionWarning::CycleDetected);
        api.children = vec![
            node("/users", Destination::single(ResourceRef::new(NS, "users")), 1),
            cycle,
        ];

        let out = OutputFormat::Plain
            .routes(&ResourceRef::new(NS, "vs1"), &[api])
            .expect("rendering must succeed");
        assert_eq!(
            out,
            "virtual service gloo-system/vs1\n\
             \x20 PREFIX /api -> rt-a\n\
             \x20   PREFIX /users -> users\n\
             \x20   PREFIX /loop -> rt-a (cycle detected)\n"
        );
    }

    #[test]
    fn lists_group_rows_with_failures() {
        let table = GroupTable {
            groups: vec![GroupRows {
                index: 0,
                cluster: Some("remote-1".to_string()),
                weight: GroupWeight::Share(Ratio {
                    numerator: 1,
                    denominator: 2,
                }),
                rows: vec![
                    UpstreamRow {
                        group_index: 0,
                        upstream_index: 0,
                        upstream: ResourceRef::new(NS, "users"),
                        weight: None,
                        detail: Ok(UpstreamDetail {
                            upstream: ResourceRef::new(NS, "users"),
                            kind: Some(UpstreamKind::Kube),
                            state: State::Accepted,
                            reason: None,
                            target: "users.default:8080".to_string(),
                        }),
                    },
                    UpstreamRow {
                        group_index: 0,
                        upstream_index: 1,
                        upstream: ResourceRef::new(NS, "gone"),
                        weight: None,
                        detail: Err(FetchError {
                            upstream: ResourceRef::new(NS, "gone"),
                            message: "not found".to_string(),
                        }),
                    },
                ],
            }],
        };

        let out = OutputFormat::Plain
            .group_table(&table)
            .expect("rendering must succeed");
        assert_eq!(
            out,
            "group 0 cluster=remote-1 weight=50.0%\n\
             \x20 gloo-system/users type=Kubernetes target=users.default:8080 state=Accepted\n\
             \x20 gloo-system/gone error=\"not found\"\n"
        );

        let json: serde_json::Value = serde_json::from_str(
            &OutputFormat::Json
                .group_table(&table)
                .expect("rendering must succeed"),
        )
        .expect("output must be JSON");
        assert_eq!(
            json["groups"][0]["rows"][1]["detail"],
            serde_json::json!({ "error": "not found" })
        );
        assert_eq!(
            json["groups"][0]["rows"][0]["detail"]["fetched"]["target"],
            "users.default:8080"
        );
    }

    #[test]
    fn lists_validation_errors() {
        let errors = vec![
            ValidationError::new(Field::Path, Reason::EmptyPath),
            ValidationError::new(Field::Method(2), Reason::EmptyMethod),
        ];
        assert_eq!(
            OutputFormat::Plain
                .validation_errors(&errors)
                .expect("rendering must succeed"),
            "invalid path: path must not be empty\n\
             invalid methods[2]: method must not be empty\n"
        );
    }
}
