use crate::error::Result;
use crate::quantity::{self, ResourceList};
use std::ops::{AddAssign, Sub};

/// Integer resource totals: CPU in millicores, memory in KiB, pods as a count.
///
/// Used for node capacity, per-node usage, and per-pod requests. Values may
/// go negative after subtraction; an over-committed node shows up as a
/// negative allocatable and fails the fit check on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceVector {
    pub cpu_millicores: i64,
    pub memory_kib: i64,
    pub pods: i64,
}

impl ResourceVector {
    pub fn new(cpu_millicores: i64, memory_kib: i64, pods: i64) -> Self {
        Self {
            cpu_millicores,
            memory_kib,
            pods,
        }
    }

    /// Parse all three dimensions out of a resource list (e.g. node capacity).
    pub fn from_resource_list(resources: &ResourceList) -> Result<Self> {
        Ok(Self {
            cpu_millicores: quantity::parse_cpu(resources)?,
            memory_kib: quantity::parse_memory(resources)?,
            pods: quantity::parse_pods(resources)?,
        })
    }

    /// Whether every dimension of `other` fits within this vector.
    pub fn covers(&self, other: &ResourceVector) -> bool {
        self.cpu_millicores >= other.cpu_millicores
            && self.memory_kib >= other.memory_kib
            && self.pods >= other.pods
    }
}

impl AddAssign for ResourceVector {
    fn add_assign(&mut self, rhs: ResourceVector) {
        self.cpu_millicores += rhs.cpu_millicores;
        self.memory_kib += rhs.memory_kib;
        self.pods += rhs.pods;
    }
}

impl Sub for ResourceVector {
    type Output = ResourceVector;

    fn sub(self, rhs: ResourceVector) -> ResourceVector {
        ResourceVector {
            cpu_millicores: self.cpu_millicores - rhs.cpu_millicores,
            memory_kib: self.memory_kib - rhs.memory_kib,
            pods: self.pods - rhs.pods,
        }
    }
}
