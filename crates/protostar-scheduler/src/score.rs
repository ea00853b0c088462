//! Node scoring: balanced-resource and least-requested, combined and capped
//! at [`MAX_PRIORITY`].
//!
//! Denominators are the node's raw capacity. The predicate already filtered
//! on capacity minus usage; ranking deliberately compares against the
//! hardware totals.

use crate::error::SnapshotError;
use crate::snapshot;
use k8s_openapi::api::core::v1::{Node, Pod};
use protostar_core::ResourceVector;
use tracing::debug;

/// Upper bound of every score this module produces.
pub const MAX_PRIORITY: f64 = 10.0;

fn fraction_of_capacity(requested: i64, capacity: i64) -> f64 {
    if capacity == 0 {
        return 1.0;
    }
    requested as f64 / capacity as f64
}

/// Reward nodes where the pod leaves CPU, memory, and pod utilization close
/// to each other: `(1 - variance) * 10`, or 0 once any dimension would be
/// saturated.
pub fn balanced_resource_score(requested: &ResourceVector, capacity: &ResourceVector) -> f64 {
    let cpu = fraction_of_capacity(requested.cpu_millicores, capacity.cpu_millicores);
    let memory = fraction_of_capacity(requested.memory_kib, capacity.memory_kib);
    let pods = fraction_of_capacity(requested.pods, capacity.pods);

    if cpu >= 1.0 || memory >= 1.0 || pods >= 1.0 {
        return 0.0;
    }

    let mean = (cpu + memory + pods) / 3.0;
    let variance =
        ((cpu - mean).powi(2) + (memory - mean).powi(2) + (pods - mean).powi(2)) / 3.0;

    (1.0 - variance) * MAX_PRIORITY
}

fn least_requested_ratio(requested: i64, capacity: i64) -> f64 {
    if capacity == 0 || requested > capacity {
        return 0.0;
    }
    (capacity - requested) as f64 * MAX_PRIORITY / capacity as f64
}

/// Reward nodes with headroom: the mean over the three dimensions of
/// `(capacity - requested) * 10 / capacity`.
pub fn least_requested_score(requested: &ResourceVector, capacity: &ResourceVector) -> f64 {
    let cpu = least_requested_ratio(requested.cpu_millicores, capacity.cpu_millicores);
    let memory = least_requested_ratio(requested.memory_kib, capacity.memory_kib);
    let pods = least_requested_ratio(requested.pods, capacity.pods);

    (cpu + memory + pods) / 3.0
}

/// Combined score: the two scores accumulated, then halved once.
pub fn composite_score(requested: &ResourceVector, capacity: &ResourceVector) -> f64 {
    (balanced_resource_score(requested, capacity) + least_requested_score(requested, capacity))
        / 2.0
}

/// Pick the highest-scoring node for the pod. Ties break to the earliest
/// node in list order, so a stable input ordering gives a stable choice.
pub fn select_node(pod: &Pod, nodes: &[Node]) -> Result<Option<Node>, SnapshotError> {
    let requested = snapshot::requested(pod)?;
    let mut best: Option<(&Node, f64)> = None;

    for node in nodes {
        let capacity = snapshot::capacity(node)?;
        let score = composite_score(&requested, &capacity);

        debug!(
            node = %node.metadata.name.as_deref().unwrap_or("unknown"),
            score,
            "Node scored"
        );

        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((node, score)),
        }
    }

    Ok(best.map(|(node, _)| node.clone()))
}
