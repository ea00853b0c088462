use crate::error::{Result, SchedulerError, SnapshotError};
use crate::filter;
use crate::score;
use crate::snapshot;
use k8s_openapi::api::core::v1::{Binding, Node, ObjectReference, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use protostar_client::{ApiClient, PodWatch};
use protostar_core::events;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Configuration for the scheduler control loop
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Name pods opt into via the scheduler annotation
    pub scheduler_name: String,
    /// Interval between reconcile sweeps of unbound pods
    pub reconcile_interval: Duration,
    /// Pause after a watch event before placing, giving the API server time
    /// to settle after pod creation
    pub settle_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scheduler_name: protostar_core::DEFAULT_SCHEDULER_NAME.to_string(),
            reconcile_interval: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Outcome of the pure placement decision over one snapshot.
enum Placement {
    Node(Node),
    Unschedulable(Vec<String>),
}

/// Pod scheduler: watch-driven placement plus a periodic reconcile sweep.
///
/// Both paths funnel through [`Scheduler::schedule_pod`] under one lock, so
/// at most one placement decision is in flight at a time and every decision
/// sees a snapshot no concurrent binding can invalidate.
pub struct Scheduler {
    client: Arc<ApiClient>,
    config: SchedulerConfig,
    /// Event source component, derived from the scheduler name
    component: String,
    processor_lock: Mutex<()>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(client: Arc<ApiClient>, config: SchedulerConfig) -> Self {
        let component = format!("{}-scheduler", config.scheduler_name);
        Self {
            client,
            config,
            component,
            processor_lock: Mutex::new(()),
        }
    }

    /// Run the watch loop and the reconcile loop until the token cancels.
    ///
    /// Placement errors are logged and never end the loops.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        info!(
            scheduler = %self.config.scheduler_name,
            "Starting scheduler"
        );

        let watch = self.client.watch_unbound_pods(token.clone());

        tokio::try_join!(
            self.run_watch(watch, token.clone()),
            self.run_reconciler(token),
        )?;

        Ok(())
    }

    /// Consume the unbound-pod watch: each added pod is placed after a short
    /// settle delay, under the processor lock.
    async fn run_watch(&self, mut watch: PodWatch, token: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Stopped watch loop");
                    return Ok(());
                }
                Some(err) = watch.errors.recv() => {
                    warn!(error = %err, "Watch stream error");
                }
                Some(pod) = watch.pods.recv() => {
                    if !protostar_core::opted_in(&pod, &self.config.scheduler_name) {
                        debug!(pod = %pod_name(&pod), "Pod is not ours, skipping");
                        continue;
                    }

                    let _guard = self.processor_lock.lock().await;
                    tokio::time::sleep(self.config.settle_delay).await;
                    if let Err(e) = self.schedule_pod(&pod).await {
                        warn!(pod = %pod_name(&pod), error = %e, "Failed to schedule pod");
                    }
                }
                else => {
                    // Watch task is gone; nothing left to consume.
                    info!("Stopped watch loop");
                    return Ok(());
                }
            }
        }
    }

    /// Periodically sweep unbound pods the watch may have missed.
    async fn run_reconciler(&self, token: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Stopped reconciliation loop");
                    return Ok(());
                }
                _ = tokio::time::sleep(self.config.reconcile_interval) => {
                    if let Err(e) = self.schedule_pending_pods().await {
                        error!(error = %e, "Reconcile sweep failed");
                    }
                }
            }
        }
    }

    /// One reconcile sweep: place every unbound pod that opted into this
    /// scheduler, in the order the API server returned them.
    pub async fn schedule_pending_pods(&self) -> Result<()> {
        let _guard = self.processor_lock.lock().await;

        let pods = self.client.list_unbound_pods(&self.config.scheduler_name).await?;
        if !pods.is_empty() {
            debug!(count = pods.len(), "Reconciling unbound pods");
        }

        for pod in &pods {
            if let Err(e) = self.schedule_pod(pod).await {
                warn!(pod = %pod_name(pod), error = %e, "Failed to schedule pod");
            }
        }

        Ok(())
    }

    /// Place one pod: snapshot, filter, score, bind, emit events.
    ///
    /// Callers must hold the processor lock (or otherwise guarantee no
    /// concurrent placement).
    pub async fn schedule_pod(&self, pod: &Pod) -> Result<()> {
        let name = pod_name(pod);

        let nodes = self.client.list_nodes().await?;
        let pods = self.client.list_pods().await?;

        match self.decide(pod, &nodes, &pods) {
            Ok(Placement::Node(node)) => self.bind(pod, &node).await,
            Ok(Placement::Unschedulable(failures)) => {
                self.emit(events::failed_scheduling(pod, &failures, &self.component))
                    .await;
                Err(SchedulerError::unschedulable(name))
            }
            Err(e) => {
                // A malformed quantity poisons the whole snapshot. The
                // warning goes on the pod that carries the bad value, which
                // may not be the pod being placed.
                let subject = match &e {
                    SnapshotError::PodQuantity { pod_name, .. } => pods
                        .iter()
                        .find(|p| p.metadata.name.as_deref() == Some(pod_name.as_str()))
                        .unwrap_or(pod),
                    SnapshotError::NodeQuantity { .. } => pod,
                };
                self.emit(events::invalid_resources(subject, &e.to_string(), &self.component))
                    .await;
                Err(e.into())
            }
        }
    }

    /// The pure placement decision over one snapshot.
    fn decide(
        &self,
        pod: &Pod,
        nodes: &[Node],
        pods: &[Pod],
    ) -> std::result::Result<Placement, SnapshotError> {
        let used = snapshot::used_by_node(nodes, pods)?;
        let outcome = filter::filter_nodes(pod, nodes, &used)?;

        if outcome.feasible.is_empty() {
            return Ok(Placement::Unschedulable(outcome.failures));
        }

        match score::select_node(pod, &outcome.feasible)? {
            Some(node) => Ok(Placement::Node(node)),
            None => Ok(Placement::Unschedulable(outcome.failures)),
        }
    }

    /// Claim the placement: POST the binding, then record the event.
    async fn bind(&self, pod: &Pod, node: &Node) -> Result<()> {
        let pod_name = pod_name(pod);
        let node_name = node.metadata.name.clone().unwrap_or_default();

        let binding = Binding {
            metadata: ObjectMeta {
                name: Some(pod_name.clone()),
                ..Default::default()
            },
            target: ObjectReference {
                api_version: Some("v1".to_string()),
                kind: Some("Node".to_string()),
                name: Some(node_name.clone()),
                ..Default::default()
            },
        };

        self.client.post_binding(&pod_name, &binding).await?;
        info!(pod = %pod_name, node = %node_name, "Successfully assigned pod");

        self.emit(events::scheduled(pod, &node_name, &self.component))
            .await;
        Ok(())
    }

    /// Events are best-effort; a failed POST costs observability, not
    /// correctness.
    async fn emit(&self, event: k8s_openapi::api::core::v1::Event) {
        if let Err(e) = self.client.post_event(&event).await {
            warn!(error = %e, "Failed to post event");
        }
    }
}

fn pod_name(pod: &Pod) -> String {
    pod.metadata.name.clone().unwrap_or_default()
}
