//! Protostar Client - HTTP client for the Kubernetes-style API server
//!
//! This crate provides:
//! - `ApiClient` covering the five endpoints the scheduler uses
//!   (list nodes, list pods, list unbound pods, post binding, post event)
//! - A reconnecting watch of unbound pods as a channel pair

pub mod client;
pub mod error;
pub mod watch;

// Re-export commonly used types
pub use client::ApiClient;
pub use error::{ClientError, Result};
pub use watch::{PodWatch, WatchEvent, WatchEventType};
