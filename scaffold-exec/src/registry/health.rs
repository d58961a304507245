use std::collections::BTreeMap;

use scaffold_core::types::ToolType;

use crate::registry::ToolMetadata;

/// Rough per-instance footprint used by the memory estimate.
pub const ESTIMATED_INSTANCE_BYTES: u64 = 64 * 1024;

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RegistryStats {
    pub registrations: usize,
    pub cached_instances: usize,
    pub instances_by_type: BTreeMap<String, usize>,
    pub total_executions: u64,
    pub total_failures: u64,
    pub estimated_memory_bytes: u64,
    pub evictions: u64,
}

impl RegistryStats {
    pub fn cache_ratio(&self) -> f64 {
        if self.registrations == 0 {
            return 0.0;
        }
        self.cached_instances as f64 / self.registrations as f64
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub issues: Vec<String>,
    pub stats: RegistryStats,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ToolDescriptor {
    pub tool_type: ToolType,
    pub name: String,
    pub metadata: ToolMetadata,
    pub cached_instances: usize,
}
