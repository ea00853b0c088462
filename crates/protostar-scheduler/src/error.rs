use miette::Diagnostic;
use protostar_client::ClientError;
use protostar_core::QuantityError;
use thiserror::Error;

/// A malformed resource quantity, attributed to the object that carries it.
///
/// The distinction matters for reporting: a bound pod anywhere in the
/// cluster can poison a snapshot, and the warning has to name that pod, not
/// whichever pod happened to be mid-placement.
#[derive(Error, Debug, Diagnostic)]
pub enum SnapshotError {
    /// A pod's container requests failed to parse
    #[error("invalid quantity on pod ({pod_name}): {source}")]
    #[diagnostic(
        code(protostar::scheduler::pod_quantity),
        help("Fix the container resource requests on the named pod")
    )]
    PodQuantity {
        pod_name: String,
        source: QuantityError,
    },

    /// A node's capacity block failed to parse
    #[error("invalid quantity on node ({node_name}): {source}")]
    #[diagnostic(
        code(protostar::scheduler::node_quantity),
        help("Fix the capacity reported in the named node's status")
    )]
    NodeQuantity {
        node_name: String,
        source: QuantityError,
    },
}

impl SnapshotError {
    /// Attribute a parse failure to a pod
    pub fn pod(pod_name: impl Into<String>, source: QuantityError) -> Self {
        Self::PodQuantity {
            pod_name: pod_name.into(),
            source,
        }
    }

    /// Attribute a parse failure to a node
    pub fn node(node_name: impl Into<String>, source: QuantityError) -> Self {
        Self::NodeQuantity {
            node_name: node_name.into(),
            source,
        }
    }
}

/// Scheduler error type
#[derive(Error, Debug, Diagnostic)]
pub enum SchedulerError {
    /// No node passed the feasibility filter; the pod stays pending and is
    /// retried on the next reconcile sweep
    #[error("Unable to schedule pod ({pod_name}): failed to fit in any node")]
    #[diagnostic(
        code(protostar::scheduler::unschedulable),
        help("Free node resources or lower the pod's requests; a FailedScheduling event carries the per-node reasons")
    )]
    Unschedulable { pod_name: String },

    /// API client error
    #[error("API client error: {0}")]
    #[diagnostic(
        code(protostar::scheduler::client_error),
        help("Transient API-server failures resolve on the next reconcile sweep")
    )]
    Client(#[from] ClientError),

    /// A resource quantity in the snapshot could not be parsed
    #[error("Resource quantity error: {0}")]
    #[diagnostic(
        code(protostar::scheduler::quantity_error),
        help("Fix the malformed resource quantity on the named pod or node")
    )]
    Snapshot(#[from] SnapshotError),
}

/// Result type for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

impl SchedulerError {
    /// Create an Unschedulable error
    pub fn unschedulable(pod_name: impl Into<String>) -> Self {
        Self::Unschedulable {
            pod_name: pod_name.into(),
        }
    }
}
