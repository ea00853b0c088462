//! Protostar Core - shared types for the protostar pod scheduler
//!
//! This crate provides:
//! - Re-exports of the k8s-openapi core/v1 types the scheduler speaks
//! - Integer resource vectors and the quantity parser
//! - Event construction for scheduling outcomes
//! - Error types with miette diagnostics

pub mod error;
pub mod events;
pub mod quantity;
pub mod resources;

// Re-export commonly used types
pub use error::{QuantityError, Result};
pub use resources::ResourceVector;

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Binding, Event, Node, Pod};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Annotation a pod sets to opt into a named scheduler.
pub const SCHEDULER_ANNOTATION: &str = "scheduler.alpha.kubernetes.io/name";

/// Scheduler name pods opt into when none is configured.
pub const DEFAULT_SCHEDULER_NAME: &str = "hightower";

/// Check whether a pod has opted into the named scheduler.
pub fn opted_in(pod: &Pod, scheduler_name: &str) -> bool {
    pod.metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(SCHEDULER_ANNOTATION))
        .is_some_and(|name| name == scheduler_name)
}
