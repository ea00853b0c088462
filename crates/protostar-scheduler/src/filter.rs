use crate::error::SnapshotError;
use crate::snapshot;
use k8s_openapi::api::core::v1::{Node, Pod};
use protostar_core::ResourceVector;
use std::collections::HashMap;
use tracing::debug;

/// Result of testing one node against a pod's request
#[derive(Debug, Clone)]
pub struct FilterResult {
    /// Node name
    pub node_name: String,
    /// Whether the node passed the filter
    pub passed: bool,
    /// Reason for failure (if any)
    pub reason: Option<String>,
}

impl FilterResult {
    fn pass(node_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            passed: true,
            reason: None,
        }
    }

    fn fail(node_name: &str, dimension: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            passed: false,
            reason: Some(format!(
                "fit failure on node ({}): Insufficient {}",
                node_name, dimension
            )),
        }
    }
}

/// Nodes that survived the feasibility filter, plus the reasons for the ones
/// that did not.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub feasible: Vec<Node>,
    pub failures: Vec<String>,
}

/// Feasibility predicate: keep each node whose free resources cover the
/// pod's request on every dimension.
///
/// An empty survivor set is a normal outcome; the caller decides what to
/// report. Only malformed quantities are errors.
pub fn filter_nodes(
    pod: &Pod,
    nodes: &[Node],
    used: &HashMap<String, ResourceVector>,
) -> Result<FilterOutcome, SnapshotError> {
    let requested = snapshot::requested(pod)?;
    let mut outcome = FilterOutcome::default();

    for node in nodes {
        let node_name = node.metadata.name.as_deref().unwrap_or("unknown");
        let free = snapshot::allocatable(node, used)?;

        debug!(
            node = %node_name,
            cpu_m = free.cpu_millicores,
            memory_kib = free.memory_kib,
            pods = free.pods,
            "Resource allocatable"
        );

        let result = check_fit(node_name, &requested, &free);
        if result.passed {
            outcome.feasible.push(node.clone());
        } else if let Some(reason) = result.reason {
            outcome.failures.push(reason);
        }
    }

    Ok(outcome)
}

/// Test a single node, reporting the first failing dimension.
fn check_fit(node_name: &str, requested: &ResourceVector, free: &ResourceVector) -> FilterResult {
    if free.covers(requested) {
        return FilterResult::pass(node_name);
    }
    if free.cpu_millicores < requested.cpu_millicores {
        return FilterResult::fail(node_name, "CPU");
    }
    if free.memory_kib < requested.memory_kib {
        return FilterResult::fail(node_name, "Memory");
    }
    FilterResult::fail(node_name, "Pod")
}
