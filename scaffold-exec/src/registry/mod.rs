//! Catalog of tool factories plus a bounded cache of live tool instances.

mod config;
mod health;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Instant;

use scaffold_core::types::ToolType;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::tool::{Tool, ToolError, ToolInstance};

pub use config::{RegistryConfig, ResolveOptions, SearchCriteria, ToolMetadata};
pub use health::{HealthReport, RegistryStats, ToolDescriptor, ESTIMATED_INSTANCE_BYTES};

/// Name under which the built-in tools are registered.
pub const DEFAULT_TOOL_NAME: &str = "default";

pub type ToolFactory = Arc<dyn Fn(&Value) -> Result<Box<dyn Tool>, ToolError> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("tool '{name}' of type {tool} is already registered")]
    Duplicate { tool: ToolType, name: String },
    #[error("no tool '{name}' registered for type {tool}")]
    NotRegistered { tool: ToolType, name: String },
    #[error("tool factory failed: {0}")]
    Factory(#[from] ToolError),
}

struct Registration {
    factory: ToolFactory,
    metadata: ToolMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    tool: ToolType,
    name: String,
    options_hash: String,
}

struct CacheEntry {
    instance: Arc<ToolInstance>,
    created_at: Instant,
    last_accessed: Instant,
}

#[derive(Default)]
struct State {
    registrations: BTreeMap<(ToolType, String), Registration>,
    cache: HashMap<CacheKey, CacheEntry>,
    evictions: u64,
}

/// Injected, process-wide tool registry.
pub struct ToolRegistry {
    config: RegistryConfig,
    state: Mutex<State>,
    eviction_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ToolRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::default()),
            eviction_task: std::sync::Mutex::new(None),
        }
    }

    /// A registry with every built-in tool registered under [`DEFAULT_TOOL_NAME`].
    pub fn with_builtins(config: RegistryConfig) -> Self {
        let mut state = State::default();
        for (tool, metadata, factory) in crate::tools::builtin_registrations() {
            state
                .registrations
                .insert((tool, DEFAULT_TOOL_NAME.to_string()), Registration { factory, metadata });
        }
        Self {
            config,
            state: Mutex::new(state),
            eviction_task: std::sync::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub async fn register(
        &self,
        tool: ToolType,
        name: impl Into<String>,
        factory: ToolFactory,
        metadata: ToolMetadata,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut state = self.state.lock().await;
        let key = (tool, name.clone());
        if state.registrations.contains_key(&key) {
            return Err(RegistryError::Duplicate { tool, name });
        }
        debug!(%tool, %name, "registered tool");
        state.registrations.insert(key, Registration { factory, metadata });
        Ok(())
    }

    /// Drop a registration and clean up its cached instances.
    pub async fn unregister(&self, tool: ToolType, name: &str) -> bool {
        let evicted = {
            let mut state = self.state.lock().await;
            if state.registrations.remove(&(tool, name.to_string())).is_none() {
                return false;
            }
            let keys: Vec<CacheKey> = state
                .cache
                .keys()
                .filter(|k| k.tool == tool && k.name == name)
                .cloned()
                .collect();
            keys.iter()
                .filter_map(|k| state.cache.remove(k))
                .map(|e| e.instance)
                .collect::<Vec<_>>()
        };
        cleanup_all(evicted).await;
        true
    }

    pub async fn is_registered(&self, tool: ToolType, name: &str) -> bool {
        self.state
            .lock()
            .await
            .registrations
            .contains_key(&(tool, name.to_string()))
    }

    /// Create or reuse an instance for `(tool, name, options)`.
    pub async fn resolve(
        &self,
        tool: ToolType,
        name: &str,
        opts: ResolveOptions,
    ) -> Result<Arc<ToolInstance>, RegistryError> {
        let key = CacheKey {
            tool,
            name: name.to_string(),
            options_hash: options_hash(&opts.options),
        };

        let (instance, evicted) = {
            let mut state = self.state.lock().await;
            if opts.reuse {
                if let Some(entry) = state.cache.get_mut(&key) {
                    if !entry.instance.is_cleaned_up() {
                        entry.last_accessed = Instant::now();
                        return Ok(entry.instance.clone());
                    }
                }
            }

            let registration = state
                .registrations
                .get(&(tool, name.to_string()))
                .ok_or_else(|| RegistryError::NotRegistered {
                    tool,
                    name: name.to_string(),
                })?;
            let instance = Arc::new(ToolInstance::new((registration.factory)(&opts.options)?, name));

            if !opts.reuse {
                return Ok(instance);
            }

            let evicted = enforce_capacity(&mut state, self.config.max_cached_instances, self.config.instance_ttl);
            let now = Instant::now();
            state.cache.insert(
                key,
                CacheEntry {
                    instance: instance.clone(),
                    created_at: now,
                    last_accessed: now,
                },
            );
            (instance, evicted)
        };

        cleanup_all(evicted).await;
        Ok(instance)
    }

    /// Evict instances idle past the TTL, then trim to capacity. Returns how many were evicted.
    pub async fn evict_expired(&self) -> usize {
        let evicted = {
            let mut state = self.state.lock().await;
            let ttl = self.config.instance_ttl;
            let expired: Vec<CacheKey> = state
                .cache
                .iter()
                .filter(|(_, e)| e.last_accessed.elapsed() > ttl)
                .map(|(k, _)| k.clone())
                .collect();
            let mut evicted: Vec<Arc<ToolInstance>> = expired
                .iter()
                .filter_map(|k| state.cache.remove(k))
                .map(|e| e.instance)
                .collect();
            while state.cache.len() > self.config.max_cached_instances {
                match pop_lru(&mut state.cache) {
                    Some(i) => evicted.push(i),
                    None => break,
                }
            }
            state.evictions += evicted.len() as u64;
            evicted
        };
        let n = evicted.len();
        if n > 0 {
            info!(evicted = n, "evicted idle tool instances");
        }
        cleanup_all(evicted).await;
        n
    }

    /// Run [`ToolRegistry::evict_expired`] on the configured interval until reset or dropped.
    pub fn start_eviction(self: &Arc<Self>) {
        let mut slot = self.eviction_task.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_some() {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        let period = self.config.eviction_interval;
        *slot = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(registry) = weak.upgrade() else {
                    break;
                };
                registry.evict_expired().await;
            }
        }));
    }

    pub fn stop_eviction(&self) {
        if let Some(handle) = self
            .eviction_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            handle.abort();
        }
    }

    pub async fn search(&self, criteria: &SearchCriteria) -> Vec<ToolDescriptor> {
        let state = self.state.lock().await;
        state
            .registrations
            .iter()
            .filter(|((tool, name), reg)| {
                criteria.tool_type.map_or(true, |t| t == *tool)
                    && criteria
                        .name_contains
                        .as_deref()
                        .map_or(true, |n| name.contains(n))
                    && criteria
                        .tag
                        .as_deref()
                        .map_or(true, |t| reg.metadata.tags.contains(t))
                    && criteria.builtin.map_or(true, |b| reg.metadata.builtin == b)
            })
            .map(|((tool, name), reg)| ToolDescriptor {
                tool_type: *tool,
                name: name.clone(),
                metadata: reg.metadata.clone(),
                cached_instances: state
                    .cache
                    .keys()
                    .filter(|k| k.tool == *tool && &k.name == name)
                    .count(),
            })
            .collect()
    }

    pub async fn stats(&self) -> RegistryStats {
        let state = self.state.lock().await;
        let mut stats = RegistryStats {
            registrations: state.registrations.len(),
            cached_instances: state.cache.len(),
            evictions: state.evictions,
            ..Default::default()
        };
        for (key, entry) in &state.cache {
            *stats
                .instances_by_type
                .entry(key.tool.as_str().to_string())
                .or_default() += 1;
            let m = entry.instance.metrics();
            stats.total_executions += m.executions;
            stats.total_failures += m.failures;
        }
        stats.estimated_memory_bytes = state.cache.len() as u64 * ESTIMATED_INSTANCE_BYTES;
        stats
    }

    pub async fn check_health(&self) -> HealthReport {
        let stats = self.stats().await;
        let mut issues = Vec::new();
        if stats.registrations == 0 {
            issues.push("no tools are registered".to_string());
        }
        if stats.estimated_memory_bytes > self.config.memory_threshold_bytes {
            issues.push(format!(
                "estimated instance memory {} bytes exceeds threshold {} bytes",
                stats.estimated_memory_bytes, self.config.memory_threshold_bytes
            ));
        }
        if stats.cache_ratio() > self.config.max_cache_ratio {
            issues.push(format!(
                "{} cached instances for {} registrations (ratio {:.1} > {:.1})",
                stats.cached_instances,
                stats.registrations,
                stats.cache_ratio(),
                self.config.max_cache_ratio
            ));
        }
        if !issues.is_empty() {
            warn!(issues = issues.len(), "tool registry health check found issues");
        }
        HealthReport {
            healthy: issues.is_empty(),
            issues,
            stats,
        }
    }

    /// Drop every registration and cached instance, and stop the eviction task.
    pub async fn reset(&self) {
        self.stop_eviction();
        let evicted: Vec<Arc<ToolInstance>> = {
            let mut state = self.state.lock().await;
            state.registrations.clear();
            state.evictions = 0;
            state.cache.drain().map(|(_, e)| e.instance).collect()
        };
        cleanup_all(evicted).await;
    }

    /// Age of the oldest cached instance.
    pub async fn oldest_instance_age(&self) -> Option<std::time::Duration> {
        let state = self.state.lock().await;
        state.cache.values().map(|e| e.created_at.elapsed()).max()
    }
}

impl Drop for ToolRegistry {
    fn drop(&mut self) {
        self.stop_eviction();
    }
}

fn options_hash(options: &Value) -> String {
    let canonical = serde_json::to_string(options).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

fn pop_lru(cache: &mut HashMap<CacheKey, CacheEntry>) -> Option<Arc<ToolInstance>> {
    let oldest = cache
        .iter()
        .min_by_key(|(_, entry)| entry.last_accessed)
        .map(|(k, _)| k.clone())?;
    cache.remove(&oldest).map(|e| e.instance)
}

/// Make room for one more entry: expired entries first, then least recently used.
fn enforce_capacity(
    state: &mut State,
    max_entries: usize,
    ttl: std::time::Duration,
) -> Vec<Arc<ToolInstance>> {
    let mut evicted = Vec::new();
    if state.cache.len() < max_entries {
        return evicted;
    }
    let expired: Vec<CacheKey> = state
        .cache
        .iter()
        .filter(|(_, e)| e.last_accessed.elapsed() > ttl)
        .map(|(k, _)| k.clone())
        .collect();
    for k in expired {
        if let Some(e) = state.cache.remove(&k) {
            evicted.push(e.instance);
        }
    }
    while !state.cache.is_empty() && state.cache.len() >= max_entries {
        match pop_lru(&mut state.cache) {
            Some(i) => evicted.push(i),
            None => break,
        }
    }
    state.evictions += evicted.len() as u64;
    evicted
}

async fn cleanup_all(instances: Vec<Arc<ToolInstance>>) {
    for instance in instances {
        if let Err(e) = instance.cleanup().await {
            warn!(tool = %instance.tool_type(), error = %e, "evicted tool cleanup failed");
        }
    }
}
