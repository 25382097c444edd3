use crate::{catalog::FetchUpstreamDetail, ResourceRef, UpstreamDetail};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Serialize, Serializer};
use std::fmt;


/// A named, weighted collection of upstreams used for traffic splitting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpstreamGroup {
    pub metadata: ResourceRef,
    pub destinations: Vec<WeightedUpstream>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedUpstream {
    pub upstream: ResourceRef,
    pub weight: Option<u32>,
}

/// Describes where traffic for a primary upstream fails over to, level by
/// level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailoverScheme {
    pub metadata: ResourceRef,
    pub primary: Option<ResourceRef>,
    pub failover_groups: Vec<Vec<PriorityGroup>>,
}

/// Upstreams sharing a failover priority, optionally weighted against the
/// other groups at the same priority.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriorityGroup {
    pub cluster: Option<String>,
    pub locality_weight: Option<u32>,
    pub upstreams: Vec<WeightedUpstream>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupTable {
    pub groups: Vec<GroupRows>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRows {
    pub index: usize,
    pub cluster: Option<String>,
    pub weight: GroupWeight,
    pub rows: Vec<UpstreamRow>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamRow {
    pub group_index: usize,
    pub upstream_index: usize,
    pub upstream: ResourceRef,
    pub weight: Option<u32>,
    #[serde(serialize_with = "serialize_detail")]
    pub detail: Result<UpstreamDetail, FetchError>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupWeight {
    Share(Ratio),
    Equal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ratio {
    pub numerator: u64,
    pub denominator: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("failed to fetch upstream {upstream}: {message}")]
pub struct FetchError {
    pub upstream: ResourceRef,
    pub message: String,
}

/// Fetches the detail of every upstream in `groups` and lays the results out
/// as table rows.
///
/// Fetches within a group run concurrently; a group's fetches are only issued
/// once the previous group's have all completed. Rows are placed by their
/// `(group, upstream)` coordinates, so the table order never depends on
/// completion order. A failed fetch is reported on its own row.
pub async fn assemble_details<F>(groups: &[PriorityGroup], fetch: &F) -> GroupTable
where
    F: FetchUpstreamDetail + ?Sized,
{
    let weights = group_weights(groups);
    let mut table = Vec::with_capacity(groups.len());

    for (group_index, (group, weight)) in groups.iter().zip(weights).enumerate() {
        let mut fetched = group
            .upstreams
            .iter()
            .enumerate()
            .map(|(upstream_index, weighted)| async move {
                let detail = fetch
                    .get_upstream_detail(&weighted.upstream)
                    .await
                    .map_err(|error| FetchError {
                        upstream: weighted.upstream.clone(),
                        message: format!("{error:#}"),
                    });
                (upstream_index, detail)
            })
            .collect::<FuturesUnordered<_>>()
            .collect::<Vec<_>>()
            .await;
        fetched.sort_unstable_by_key(|(upstream_index, _)| *upstream_index);

        let rows = group
            .upstreams
            .iter()
            .zip(fetched)
            .map(|(weighted, (upstream_index, detail))| {
                if let Err(error) = &detail {
                    tracing::debug!(%error, group_index, upstream_index, "Upstream detail unavailable");
                }
                UpstreamRow {
                    group_index,
                    upstream_index,
                    upstream: weighted.upstream.clone(),
                    weight: weighted.weight,
                    detail,
                }
            })
            .collect();

        table.push(GroupRows {
            index: group_index,
            cluster: group.cluster.clone(),
            weight,
            rows,
        });
    }

    GroupTable { groups: table }
}

pub async fn assemble_upstream_group<F>(group: &UpstreamGroup, fetch: &F) -> GroupTable
where
    F: FetchUpstreamDetail + ?Sized,
{
    assemble_details(&[PriorityGroup::from(group)], fetch).await
}

/// Assembles one table per failover level, in priority order.
pub async fn assemble_failover<F>(scheme: &FailoverScheme, fetch: &F) -> Vec<GroupTable>
where
    F: FetchUpstreamDetail + ?Sized,
{
    let mut levels = Vec::with_capacity(scheme.failover_groups.len());
    for groups in &scheme.failover_groups {
        levels.push(assemble_details(groups, fetch).await);
    }
    levels
}

/// Each group's share of the set's total locality weight. Shares are only
/// defined when every group declares a weight and the total is non-zero.
fn group_weights(groups: &[PriorityGroup]) -> Vec<GroupWeight> {
    let declared = groups
        .iter()
        .map(|group| group.locality_weight)
        .collect::<Option<Vec<_>>>();
    let Some(weights) = declared else {
        return vec![GroupWeight::Equal; groups.len()];
    };

    let denominator = weights.iter().copied().map(u64::from).sum::<u64>();
    if denominator == 0 {
        return vec![GroupWeight::Equal; groups.len()];
    }

    weights
        .into_iter()
        .map(|weight| {
            GroupWeight::Share(Ratio {
                numerator: weight.into(),
                denominator,
            })
        })
        .collect()
}

fn serialize_detail<S: Serializer>(
    detail: &Result<UpstreamDetail, FetchError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    enum Outcome<'a> {
        Fetched(&'a UpstreamDetail),
        Error(&'a str),
    }

    match detail {
        Ok(detail) => Outcome::Fetched(detail),
        Err(error) => Outcome::Error(&error.message),
    }
    .serialize(serializer)
}

// === impl PriorityGroup ===

impl From<&UpstreamGroup> for PriorityGroup {
    fn from(group: &UpstreamGroup) -> Self {
        Self {
            cluster: None,
            locality_weight: None,
            upstreams: group.destinations.clone(),
        }
    }
}

// === impl GroupTable ===

impl GroupTable {
    pub fn rows(&self) -> impl Iterator<Item = &UpstreamRow> + '_ {
        self.groups.iter().flat_map(|group| group.rows.iter())
    }

    /// Fails the whole table on its first failed fetch.
    pub fn into_strict(self) -> Result<Self, FetchError> {
        let failure = self
            .rows()
            .find_map(|row| row.detail.as_ref().err().cloned());
        match failure {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

// === impl Ratio ===

impl Ratio {
    pub fn percent(&self) -> f64 {
        self.numerator as f64 * 100.0 / self.denominator as f64
    }
}

impl fmt::Display for GroupWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Share(ratio) => write!(f, "{:.1}%", ratio.percent()),
            Self::Equal => write!(f, "equal"),
        }
    }
}
