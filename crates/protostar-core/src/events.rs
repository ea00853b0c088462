//! Construction of core/v1 Events recording scheduling outcomes.
//!
//! The API server is the only audience; these helpers pin the exact field
//! shapes the events endpoint expects (RFC3339 UTC timestamps, generateName,
//! involvedObject reference).

use chrono::Utc;
use k8s_openapi::api::core::v1::{Event, EventSource, ObjectReference, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};

/// Reason recorded on events for successful placements.
pub const REASON_SCHEDULED: &str = "Scheduled";

/// Reason recorded on events for placements that found no feasible node.
pub const REASON_FAILED_SCHEDULING: &str = "FailedScheduling";

/// Normal event: the pod was bound to a node.
pub fn scheduled(pod: &Pod, node_name: &str, component: &str) -> Event {
    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
    let message = format!("Successfully assigned {} to {}", pod_name, node_name);
    pod_event(pod, component, REASON_SCHEDULED, "Normal", message)
}

/// Warning event: no node passed the feasibility filter.
///
/// The message carries every per-node rejection reason, one per line.
pub fn failed_scheduling(pod: &Pod, failures: &[String], component: &str) -> Event {
    let pod_name = pod.metadata.name.as_deref().unwrap_or_default();
    let message = format!(
        "pod ({}) failed to fit in any node\n{}",
        pod_name,
        failures.join("\n")
    );
    pod_event(pod, component, REASON_FAILED_SCHEDULING, "Warning", message)
}

/// Warning event: a resource quantity the scheduler cannot parse.
///
/// Posted against the pod carrying the malformed value; `detail` is expected
/// to name the offending object.
pub fn invalid_resources(pod: &Pod, detail: &str, component: &str) -> Event {
    let message = format!("unable to compute resource fit: {}", detail);
    pod_event(pod, component, REASON_FAILED_SCHEDULING, "Warning", message)
}

fn pod_event(pod: &Pod, component: &str, reason: &str, event_type: &str, message: String) -> Event {
    let pod_name = pod.metadata.name.clone().unwrap_or_default();
    let timestamp = Time(Utc::now());

    Event {
        count: Some(1),
        message: Some(message),
        metadata: ObjectMeta {
            generate_name: Some(format!("{}-", pod_name)),
            ..Default::default()
        },
        reason: Some(reason.to_string()),
        first_timestamp: Some(timestamp.clone()),
        last_timestamp: Some(timestamp),
        type_: Some(event_type.to_string()),
        source: Some(EventSource {
            component: Some(component.to_string()),
            ..Default::default()
        }),
        involved_object: ObjectReference {
            kind: Some("Pod".to_string()),
            name: Some(pod_name),
            namespace: Some("default".to_string()),
            uid: pod.metadata.uid.clone(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pod(name: &str, uid: &str) -> Pod {
        let mut pod = Pod::default();
        pod.metadata.name = Some(name.to_string());
        pod.metadata.uid = Some(uid.to_string());
        pod
    }

    #[test]
    fn test_scheduled_event() {
        let pod = test_pod("nginx", "uid-1");
        let event = scheduled(&pod, "node-a", "hightower-scheduler");

        assert_eq!(event.reason.as_deref(), Some(REASON_SCHEDULED));
        assert_eq!(event.type_.as_deref(), Some("Normal"));
        assert_eq!(event.count, Some(1));
        assert_eq!(
            event.message.as_deref(),
            Some("Successfully assigned nginx to node-a")
        );
        assert_eq!(event.metadata.generate_name.as_deref(), Some("nginx-"));
        assert_eq!(
            event.source.and_then(|s| s.component).as_deref(),
            Some("hightower-scheduler")
        );
        assert_eq!(event.involved_object.kind.as_deref(), Some("Pod"));
        assert_eq!(event.involved_object.namespace.as_deref(), Some("default"));
        assert_eq!(event.involved_object.uid.as_deref(), Some("uid-1"));
        assert!(event.first_timestamp.is_some());
        assert_eq!(event.first_timestamp, event.last_timestamp);
    }

    #[test]
    fn test_failed_scheduling_event() {
        let pod = test_pod("nginx", "uid-1");
        let failures = vec![
            "fit failure on node (node-a): Insufficient CPU".to_string(),
            "fit failure on node (node-b): Insufficient Memory".to_string(),
        ];
        let event = failed_scheduling(&pod, &failures, "hightower-scheduler");

        assert_eq!(event.reason.as_deref(), Some(REASON_FAILED_SCHEDULING));
        assert_eq!(event.type_.as_deref(), Some("Warning"));

        let message = event.message.unwrap();
        assert!(message.starts_with("pod (nginx) failed to fit in any node\n"));
        assert!(message.contains("Insufficient CPU"));
        assert!(message.contains("node-b"));
    }
}
