//! Protostar Scheduler - placement engine and control loop
//!
//! This crate provides:
//! - Cluster snapshot accounting (per-node used and allocatable resources)
//! - The feasibility predicate with per-node rejection reasons
//! - Balanced-resource and least-requested scoring
//! - The `Scheduler` control loop: watch-driven placement plus a periodic
//!   reconcile sweep, serialized by a single lock

pub mod error;
pub mod filter;
pub mod scheduler;
pub mod score;
pub mod snapshot;

// Re-export commonly used types
pub use error::{Result, SchedulerError, SnapshotError};
pub use scheduler::{Scheduler, SchedulerConfig};
