use std::collections::BTreeSet;
use std::time::Duration;

use scaffold_core::types::ToolType;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Cached instances idle for longer than this are evicted.
    pub instance_ttl: Duration,
    pub eviction_interval: Duration,
    pub max_cached_instances: usize,
    /// Health check flags estimated instance memory above this.
    pub memory_threshold_bytes: u64,
    /// Health check flags more cached instances per registration than this.
    pub max_cache_ratio: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            instance_ttl: Duration::from_secs(30 * 60),
            eviction_interval: Duration::from_secs(10 * 60),
            max_cached_instances: 100,
            memory_threshold_bytes: 256 * 1024 * 1024,
            max_cache_ratio: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ToolMetadata {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    pub builtin: bool,
}

impl ToolMetadata {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn builtin(mut self) -> Self {
        self.builtin = true;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Reuse a cached instance for the same options. `false` returns an
    /// uncached instance the caller must clean up.
    pub reuse: bool,
    /// Passed to the factory; part of the cache key.
    pub options: serde_json::Value,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            reuse: true,
            options: serde_json::Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub tool_type: Option<ToolType>,
    pub name_contains: Option<String>,
    pub tag: Option<String>,
    pub builtin: Option<bool>,
}
