use crate::{
    destination::{accepted_specs, build_destination_spec, WeightedDestination},
    routes::{validate_matcher, HeaderMatcher, PathMatch, QueryParamMatcher},
    upstream_group::UpstreamGroup,
    Destination, DestinationSpec, Field, Matcher, PathMatchKind, Reason, ResourceRef, Route,
    SingleDestination, Upstream, ValidationError, VirtualService,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
mod tests;

/// The editable state of a route, as entered on the console's route form.
///
/// Forms are deliberately loose: any field may be blank or stale.
/// [`compile_route`] is the only way to turn one into a [`Route`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteForm {
    /// The virtual service the route is created on, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_service: Option<ResourceRef>,
    pub path: String,
    pub match_type: PathMatchKind,
    pub headers: Vec<HeaderMatcher>,
    pub query_parameters: Vec<QueryParamMatcher>,
    pub methods: Vec<String>,
    pub destination: DestinationForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DestinationForm {
    #[serde(rename_all = "camelCase")]
    Upstream {
        #[serde(default)]
        upstream: Option<ResourceRef>,
        #[serde(default)]
        destination_spec: DestinationSpec,
    },

    Multi {
        #[serde(default)]
        destinations: Vec<WeightedUpstreamForm>,
    },

    #[serde(rename_all = "camelCase")]
    UpstreamGroup {
        #[serde(default)]
        upstream_group: Option<ResourceRef>,
    },

    #[serde(rename_all = "camelCase")]
    Delegate {
        #[serde(default)]
        route_table: Option<ResourceRef>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeightedUpstreamForm {
    pub upstream: Option<ResourceRef>,
    pub destination_spec: DestinationSpec,
    pub weight: Option<u32>,
}

/// The resources a route form is checked against.
#[derive(Copy, Clone, Debug, Default)]
pub struct CompileContext<'a> {
    pub upstreams: &'a [Upstream],
    pub virtual_services: &'a [VirtualService],

    /// Upstream group references are only checked when groups are known.
    pub upstream_groups: Option<&'a [UpstreamGroup]>,
}

/// Compiles a route form into a canonical [`Route`].
///
/// Every problem with the form is collected and returned together, each
/// attached to the field that caused it. Compilation is pure: compiling the
/// same form against the same context always yields the same result, and a
/// compiled route loaded back with [`RouteForm::from_route`] compiles to
/// itself.
pub fn compile_route(
    form: &RouteForm,
    ctx: &CompileContext<'_>,
) -> Result<Route, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let matcher = form.matcher(&mut errors);
    let destination = form.destination.compile(ctx, &mut errors);

    if let Some(vs) = &form.virtual_service {
        if !ctx.virtual_services.iter().any(|v| v.metadata == *vs) {
            errors.push(ValidationError::new(
                Field::VirtualService,
                Reason::VirtualServiceNotFound(vs.clone()),
            ));
        }
    }

    match destination {
        Some(destination) if errors.is_empty() => Ok(Route {
            matcher,
            destination,
            options: form.options.clone(),
        }),
        _ => {
            tracing::debug!(errors = errors.len(), "Route form rejected");
            Err(errors)
        }
    }
}

// === impl RouteForm ===

impl RouteForm {
    /// Loads an existing route for editing.
    pub fn from_route(route: &Route, virtual_service: Option<ResourceRef>) -> Self {
        let PathMatch { kind, value } = &route.matcher.path;
        Self {
            virtual_service,
            path: value.clone(),
            match_type: *kind,
            headers: route.matcher.headers.clone(),
            query_parameters: route.matcher.query_params.clone(),
            methods: route.matcher.methods.iter().cloned().collect(),
            destination: DestinationForm::from(&route.destination),
            options: route.options.clone(),
        }
    }

    /// Points the form at `upstream` as its single destination.
    ///
    /// When the upstream does not accept the destination spec the form
    /// currently holds, the spec is reset to the upstream's preferred blank one.
    pub fn select_upstream(&mut self, upstream: &Upstream) {
        match &mut self.destination {
            DestinationForm::Upstream {
                upstream: selected,
                destination_spec,
            } => {
                *selected = upstream.metadata.clone();
                reset_spec(destination_spec, upstream);
            }
            destination => {
                let destination_spec = accepted_specs(upstream)
                    .map(|accepted| DestinationSpec::empty(accepted.preferred))
                    .unwrap_or_default();
                *destination = DestinationForm::Upstream {
                    upstream: upstream.metadata.clone(),
                    destination_spec,
                };
            }
        }
    }

    fn matcher(&self, errors: &mut Vec<ValidationError>) -> Matcher {
        let mut methods = std::collections::BTreeSet::new();
        for (i, method) in self.methods.iter().enumerate() {
            if method.is_empty() {
                errors.push(ValidationError::new(Field::Method(i), Reason::EmptyMethod));
            } else {
                methods.insert(method.clone());
            }
        }

        let matcher = Matcher {
            path: PathMatch {
                kind: self.match_type,
                value: self.path.clone(),
            },
            headers: self.headers.clone(),
            query_params: self.query_parameters.clone(),
            methods,
        };
        if let Err(invalid) = validate_matcher(&matcher) {
            errors.extend(invalid);
        }
        matcher
    }
}

// === impl WeightedUpstreamForm ===

impl WeightedUpstreamForm {
    /// Points the entry at `upstream`, resetting its spec when the upstream
    /// expects a different type.
    pub fn select_upstream(&mut self, upstream: &Upstream) {
        self.upstream = upstream.metadata.clone();
        reset_spec(&mut self.destination_spec, upstream);
    }
}

fn reset_spec(spec: &mut DestinationSpec, upstream: &Upstream) {
    match accepted_specs(upstream) {
        Ok(accepted) if accepted.accepts(spec.kind()) => {}
        Ok(accepted) => *spec = DestinationSpec::empty(accepted.preferred),
        Err(_) => *spec = DestinationSpec::None,
    }
}

// === impl DestinationForm ===

impl Default for DestinationForm {
    fn default() -> Self {
        Self::Upstream {
            upstream: None,
            destination_spec: DestinationSpec::None,
        }
    }
}

impl From<&Destination> for DestinationForm {
    fn from(destination: &Destination) -> Self {
        match destination {
            Destination::Single(single) => Self::Upstream {
                upstream: Some(single.upstream.clone()),
                destination_spec: single.destination_spec.clone(),
            },
            Destination::Multi { destinations } => Self::Multi {
                destinations: destinations
                    .iter()
                    .map(|weighted| WeightedUpstreamForm {
                        upstream: Some(weighted.destination.upstream.clone()),
                        destination_spec: weighted.destination.destination_spec.clone(),
                        weight: Some(weighted.weight),
                    })
                    .collect(),
            },
            Destination::UpstreamGroup(group) => Self::UpstreamGroup {
                upstream_group: Some(group.clone()),
            },
            Destination::Delegate(table) => Self::Delegate {
                route_table: Some(table.clone()),
            },
        }
    }
}

impl DestinationForm {
    fn compile(
        &self,
        ctx: &CompileContext<'_>,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Destination> {
        match self {
            Self::Upstream {
                upstream,
                destination_spec,
            } => {
                let Some(upstream) = upstream else {
                    errors.push(ValidationError::new(
                        Field::Upstream,
                        Reason::UpstreamNotSelected,
                    ));
                    return None;
                };
                single(
                    ctx,
                    upstream,
                    destination_spec,
                    (Field::Upstream, Field::DestinationSpec),
                    errors,
                )
                .map(Destination::Single)
            }

            Self::Multi { destinations } => multi(ctx, destinations, errors),

            Self::UpstreamGroup { upstream_group } => {
                let Some(group) = upstream_group else {
                    errors.push(ValidationError::new(
                        Field::UpstreamGroup,
                        Reason::UpstreamGroupNotSelected,
                    ));
                    return None;
                };
                if let Some(groups) = ctx.upstream_groups {
                    if !groups.iter().any(|g| g.metadata == *group) {
                        errors.push(ValidationError::new(
                            Field::UpstreamGroup,
                            Reason::UpstreamGroupNotFound(group.clone()),
                        ));
                        return None;
                    }
                }
                Some(Destination::UpstreamGroup(group.clone()))
            }

            // Delegates are not checked here; a missing route table is marked
            // when the routing tree is resolved.
            Self::Delegate { route_table } => match route_table {
                Some(table) => Some(Destination::Delegate(table.clone())),
                None => {
                    errors.push(ValidationError::new(
                        Field::Delegate,
                        Reason::DelegateNotSelected,
                    ));
                    None
                }
            },
        }
    }
}

fn single(
    ctx: &CompileContext<'_>,
    reference: &ResourceRef,
    form_spec: &DestinationSpec,
    (upstream_field, spec_field): (Field, Field),
    errors: &mut Vec<ValidationError>,
) -> Option<SingleDestination> {
    let Some(upstream) = ctx
        .upstreams
        .iter()
        .find(|u| u.metadata.as_ref() == Some(reference))
    else {
        errors.push(ValidationError::new(
            upstream_field,
            Reason::UpstreamNotFound(reference.clone()),
        ));
        return None;
    };

    let accepted = match accepted_specs(upstream) {
        Ok(accepted) => accepted,
        Err(error) => {
            errors.push(ValidationError::new(upstream_field, error));
            return None;
        }
    };

    match build_destination_spec(accepted, form_spec) {
        Ok(destination_spec) => {
            let blank = destination_spec.blank_fields();
            if !blank.is_empty() {
                tracing::debug!(
                    upstream = %reference,
                    ?blank,
                    "Destination spec has blank fields"
                );
            }
            Some(SingleDestination {
                upstream: reference.clone(),
                destination_spec,
            })
        }
        Err(reason) => {
            errors.push(ValidationError::new(spec_field, reason));
            None
        }
    }
}

/// Either every entry declares a weight or none does. Without weights, every
/// entry gets an equal share.
fn multi(
    ctx: &CompileContext<'_>,
    entries: &[WeightedUpstreamForm],
    errors: &mut Vec<ValidationError>,
) -> Option<Destination> {
    if entries.is_empty() {
        errors.push(ValidationError::new(
            Field::Destinations,
            Reason::NoWeightedDestinations,
        ));
        return None;
    }

    let declared = entries.iter().filter(|e| e.weight.is_some()).count();
    let mut valid = true;
    if declared != 0 && declared != entries.len() {
        errors.push(ValidationError::new(
            Field::Destinations,
            Reason::MixedWeights,
        ));
        valid = false;
    } else if declared == entries.len() && entries.iter().all(|e| e.weight == Some(0)) {
        errors.push(ValidationError::new(
            Field::Destinations,
            Reason::ZeroTotalWeight,
        ));
        valid = false;
    }

    let mut destinations = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let field = Field::WeightedDestination(i);
        let Some(upstream) = &entry.upstream else {
            errors.push(ValidationError::new(field, Reason::UpstreamNotSelected));
            valid = false;
            continue;
        };
        match single(
            ctx,
            upstream,
            &entry.destination_spec,
            (field.clone(), field),
            errors,
        ) {
            Some(destination) => destinations.push(WeightedDestination {
                destination,
                weight: entry.weight.unwrap_or(1),
            }),
            None => valid = false,
        }
    }

    valid.then_some(Destination::Multi { destinations })
}
