//! Point-in-time resource accounting over one node list and one pod list.
//!
//! A snapshot is consistent within itself; two snapshots may disagree. The
//! API server arbitrates, so stale reads only cost a rejected binding.

use crate::error::SnapshotError;
use k8s_openapi::api::core::v1::{Node, Pod};
use protostar_core::{quantity, ResourceVector};
use std::collections::HashMap;

/// Sum each bound pod's requests into its node's entry.
///
/// Every node starts at zero. Each pod adds its containers' parsed requests
/// and exactly one to the node's pod count, regardless of container count.
/// Pods bound to nodes outside the node list carry no weight here. A parse
/// failure is attributed to the bound pod that carries the bad value.
pub fn used_by_node(
    nodes: &[Node],
    pods: &[Pod],
) -> Result<HashMap<String, ResourceVector>, SnapshotError> {
    let mut used: HashMap<String, ResourceVector> = nodes
        .iter()
        .filter_map(|node| node.metadata.name.clone())
        .map(|name| (name, ResourceVector::default()))
        .collect();

    for pod in pods {
        let Some(spec) = pod.spec.as_ref() else {
            continue;
        };
        let Some(node_name) = spec.node_name.as_deref().filter(|name| !name.is_empty()) else {
            continue;
        };
        let Some(entry) = used.get_mut(node_name) else {
            continue;
        };

        let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
        for container in &spec.containers {
            if let Some(requests) = container
                .resources
                .as_ref()
                .and_then(|resources| resources.requests.as_ref())
            {
                *entry += ResourceVector::new(
                    quantity::parse_cpu(requests).map_err(|e| SnapshotError::pod(pod_name, e))?,
                    quantity::parse_memory(requests)
                        .map_err(|e| SnapshotError::pod(pod_name, e))?,
                    0,
                );
            }
        }
        // One pod per pod, however many containers it runs
        entry.pods += 1;
    }

    Ok(used)
}

/// Node capacity minus what its bound pods already request.
///
/// Negative values are deliberate: an over-committed node fails the fit
/// check on its own.
pub fn allocatable(
    node: &Node,
    used: &HashMap<String, ResourceVector>,
) -> Result<ResourceVector, SnapshotError> {
    let capacity = capacity(node)?;
    let node_name = node.metadata.name.as_deref().unwrap_or_default();
    let used = used.get(node_name).copied().unwrap_or_default();

    Ok(capacity - used)
}

/// Parsed capacity block of a node. Missing status parses as all-zero.
pub fn capacity(node: &Node) -> Result<ResourceVector, SnapshotError> {
    let node_name = node.metadata.name.as_deref().unwrap_or_default();
    match node
        .status
        .as_ref()
        .and_then(|status| status.capacity.as_ref())
    {
        Some(capacity) => ResourceVector::from_resource_list(capacity)
            .map_err(|e| SnapshotError::node(node_name, e)),
        None => Ok(ResourceVector::default()),
    }
}

/// Total resources the pod asks for: container requests summed for CPU and
/// memory, and a pod count of one.
pub fn requested(pod: &Pod) -> Result<ResourceVector, SnapshotError> {
    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
    let mut total = ResourceVector {
        pods: 1,
        ..Default::default()
    };

    if let Some(spec) = pod.spec.as_ref() {
        for container in &spec.containers {
            if let Some(requests) = container
                .resources
                .as_ref()
                .and_then(|resources| resources.requests.as_ref())
            {
                total.cpu_millicores +=
                    quantity::parse_cpu(requests).map_err(|e| SnapshotError::pod(pod_name, e))?;
                total.memory_kib += quantity::parse_memory(requests)
                    .map_err(|e| SnapshotError::pod(pod_name, e))?;
            }
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{Container, PodSpec, ResourceRequirements};
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
    use std::collections::BTreeMap;

    fn quantities(entries: &[(&str, &str)]) -> BTreeMap<String, Quantity> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Quantity(v.to_string())))
            .collect()
    }

    fn create_test_node(name: &str, cpu: &str, memory: &str, pods: &str) -> Node {
        let mut node = Node::default();
        node.metadata.name = Some(name.to_string());
        node.status = Some(Default::default());
        node.status.as_mut().unwrap().capacity =
            Some(quantities(&[("cpu", cpu), ("memory", memory), ("pods", pods)]));
        node
    }

    fn container(cpu: &str, memory: &str) -> Container {
        Container {
            name: "main".to_string(),
            resources: Some(ResourceRequirements {
                requests: Some(quantities(&[("cpu", cpu), ("memory", memory)])),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn create_test_pod(name: &str, node_name: &str, containers: Vec<Container>) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(name.to_string());
        pod.spec = Some(PodSpec {
            node_name: (!node_name.is_empty()).then(|| node_name.to_string()),
            containers,
            ..Default::default()
        });
        pod
    }

    #[test]
    fn test_used_sums_bound_pods() {
        let nodes = vec![
            create_test_node("node-a", "2", "4096Mi", "10"),
            create_test_node("node-b", "2", "4096Mi", "10"),
        ];
        let pods = vec![
            create_test_pod("p1", "node-a", vec![container("500m", "512Mi")]),
            create_test_pod("p2", "node-a", vec![container("250m", "256Mi")]),
            create_test_pod("p3", "node-b", vec![container("100m", "128Mi")]),
            create_test_pod("unbound", "", vec![container("1", "1024Mi")]),
        ];

        let used = used_by_node(&nodes, &pods).unwrap();

        assert_eq!(
            used["node-a"],
            ResourceVector::new(750, 768 * 1024, 2)
        );
        assert_eq!(used["node-b"], ResourceVector::new(100, 128 * 1024, 1));
    }

    #[test]
    fn test_used_counts_one_pod_per_pod() {
        let nodes = vec![create_test_node("node-a", "2", "4096Mi", "10")];
        let pods = vec![create_test_pod(
            "multi",
            "node-a",
            vec![container("100m", "128Mi"), container("200m", "256Mi")],
        )];

        let used = used_by_node(&nodes, &pods).unwrap();

        // CPU and memory accumulate per container, the pod count does not
        assert_eq!(used["node-a"], ResourceVector::new(300, 384 * 1024, 1));
    }

    #[test]
    fn test_used_ignores_unknown_nodes() {
        let nodes = vec![create_test_node("node-a", "2", "4096Mi", "10")];
        let pods = vec![create_test_pod(
            "ghost",
            "node-gone",
            vec![container("1", "1024Mi")],
        )];

        let used = used_by_node(&nodes, &pods).unwrap();
        assert_eq!(used["node-a"], ResourceVector::default());
        assert_eq!(used.len(), 1);
    }

    #[test]
    fn test_allocatable_subtracts_used() {
        let node = create_test_node("node-a", "1", "2048Mi", "10");
        let nodes = vec![node.clone()];
        let pods = vec![create_test_pod(
            "p1",
            "node-a",
            vec![container("800m", "1024Mi")],
        )];

        let used = used_by_node(&nodes, &pods).unwrap();
        let free = allocatable(&node, &used).unwrap();

        assert_eq!(free, ResourceVector::new(200, 1024 * 1024, 9));
    }

    #[test]
    fn test_allocatable_can_go_negative() {
        let node = create_test_node("node-a", "1", "2048Mi", "10");
        let nodes = vec![node.clone()];
        let pods = vec![create_test_pod(
            "p1",
            "node-a",
            vec![container("1500m", "1024Mi")],
        )];

        let used = used_by_node(&nodes, &pods).unwrap();
        let free = allocatable(&node, &used).unwrap();

        assert_eq!(free.cpu_millicores, -500);
    }

    #[test]
    fn test_requested_counts_single_pod() {
        let pod = create_test_pod(
            "p1",
            "",
            vec![container("500m", "512Mi"), container("500m", "512Mi")],
        );

        let requested = requested(&pod).unwrap();
        assert_eq!(requested, ResourceVector::new(1000, 1024 * 1024, 1));
    }

    #[test]
    fn test_requested_of_empty_pod() {
        let pod = create_test_pod("p1", "", vec![]);
        assert_eq!(requested(&pod).unwrap(), ResourceVector::new(0, 0, 1));
    }

    #[test]
    fn test_malformed_request_names_offending_pod() {
        let nodes = vec![create_test_node("node-a", "2", "4096Mi", "10")];
        let pods = vec![
            create_test_pod("fine", "node-a", vec![container("100m", "128Mi")]),
            create_test_pod("bad", "node-a", vec![container("lots", "512Mi")]),
        ];

        let err = used_by_node(&nodes, &pods).unwrap_err();
        match err {
            SnapshotError::PodQuantity { pod_name, .. } => assert_eq!(pod_name, "bad"),
            other => panic!("expected PodQuantity, got {other}"),
        }
    }

    #[test]
    fn test_malformed_capacity_names_offending_node() {
        let node = create_test_node("node-a", "banana", "4096Mi", "10");

        let err = capacity(&node).unwrap_err();
        match err {
            SnapshotError::NodeQuantity { node_name, .. } => assert_eq!(node_name, "node-a"),
            other => panic!("expected NodeQuantity, got {other}"),
        }
    }
}
