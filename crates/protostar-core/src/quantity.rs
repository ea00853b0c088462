//! Parsing of Kubernetes resource-quantity strings into integer scalars.
//!
//! The scheduler accounts in integers only: CPU in millicores, memory in
//! KiB, pods as a count. These parsers are the single point of
//! normalization; everything downstream compares like with like.

use crate::error::{QuantityError, Result};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

/// A `resources` block as it appears on container requests and node status.
pub type ResourceList = BTreeMap<String, Quantity>;

/// Parse the `cpu` entry of a resource list into millicores.
///
/// Absent key parses as 0. A trailing `m` marks millicores; anything else is
/// read as fractional cores and truncated to millicores ("1.5" -> 1500).
pub fn parse_cpu(resources: &ResourceList) -> Result<i64> {
    let Some(Quantity(cpu)) = resources.get("cpu") else {
        return Ok(0);
    };

    if let Some(millicores) = cpu.strip_suffix('m') {
        return millicores
            .parse::<i64>()
            .ok()
            .filter(|m| *m >= 0)
            .ok_or_else(|| QuantityError::invalid_cpu(cpu));
    }

    match cpu.parse::<f64>() {
        Ok(cores) if cores.is_finite() && cores >= 0.0 => Ok((cores * 1000.0) as i64),
        _ => Err(QuantityError::invalid_cpu(cpu)),
    }
}

/// Parse the `memory` entry of a resource list into KiB.
///
/// Absent key parses as 0, as does a value with no recognized binary suffix.
/// `Ki` values are taken as-is and `Mi` values multiplied by 1024, so the
/// canonical unit is KiB.
pub fn parse_memory(resources: &ResourceList) -> Result<i64> {
    let Some(Quantity(memory)) = resources.get("memory") else {
        return Ok(0);
    };

    if let Some(kib) = memory.strip_suffix("Ki") {
        return kib
            .parse::<i64>()
            .ok()
            .filter(|m| *m >= 0)
            .ok_or_else(|| QuantityError::invalid_memory(memory));
    }

    if let Some(mib) = memory.strip_suffix("Mi") {
        return mib
            .parse::<i64>()
            .ok()
            .filter(|m| *m >= 0)
            .map(|m| m * 1024)
            .ok_or_else(|| QuantityError::invalid_memory(memory));
    }

    Ok(0)
}

/// Parse the `pods` entry of a resource list into a count.
pub fn parse_pods(resources: &ResourceList) -> Result<i64> {
    let Some(Quantity(pods)) = resources.get("pods") else {
        return Ok(0);
    };

    pods.parse::<i64>()
        .ok()
        .filter(|p| *p >= 0)
        .ok_or_else(|| QuantityError::invalid_pods(pods))
}
