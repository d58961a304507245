use std::sync::Arc;
use std::time::Duration;

use scaffold_core::ToolType;
use scaffold_exec::registry::{
    RegistryConfig, RegistryError, ResolveOptions, SearchCriteria, ToolFactory, ToolMetadata,
    ToolRegistry, DEFAULT_TOOL_NAME,
};
use scaffold_exec::tool::{Tool, ToolError};
use scaffold_exec::tools::ShellTool;
use serde_json::{json, Value};

fn shell_factory() -> ToolFactory {
    Arc::new(|_opts: &Value| -> Result<Box<dyn Tool>, ToolError> { Ok(Box::new(ShellTool)) })
}

fn with_options(options: Value) -> ResolveOptions {
    ResolveOptions {
        options,
        ..Default::default()
    }
}

#[tokio::test]
async fn builtins_cover_every_tool_type() {
    let registry = ToolRegistry::with_builtins(RegistryConfig::default());
    for tool in ToolType::ALL {
        assert!(registry.is_registered(tool, DEFAULT_TOOL_NAME).await, "{tool}");
    }
    let builtin = registry
        .search(&SearchCriteria {
            builtin: Some(true),
            ..Default::default()
        })
        .await;
    assert_eq!(builtin.len(), ToolType::ALL.len());
    let fs = registry
        .search(&SearchCriteria {
            tag: Some("filesystem".into()),
            ..Default::default()
        })
        .await;
    assert!(fs.iter().any(|d| d.tool_type == ToolType::Template));
    assert!(fs.iter().all(|d| d.tool_type != ToolType::Shell));
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let registry = ToolRegistry::new(RegistryConfig::default());
    registry
        .register(ToolType::Shell, "bash", shell_factory(), ToolMetadata::new("bash"))
        .await
        .unwrap();
    let err = registry
        .register(ToolType::Shell, "bash", shell_factory(), ToolMetadata::new("bash"))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Duplicate { .. }));
}

#[tokio::test]
async fn unknown_tool_is_not_registered_error() {
    let registry = ToolRegistry::new(RegistryConfig::default());
    let err = registry
        .resolve(ToolType::Ai, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotRegistered { .. }));
}

#[tokio::test]
async fn instances_are_cached_per_options() {
    let registry = ToolRegistry::new(RegistryConfig::default());
    registry
        .register(ToolType::Shell, DEFAULT_TOOL_NAME, shell_factory(), ToolMetadata::new("sh"))
        .await
        .unwrap();

    let a = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap();
    let b = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let c = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, with_options(json!({"shell": "bash"})))
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &c));

    let fresh = registry
        .resolve(
            ToolType::Shell,
            DEFAULT_TOOL_NAME,
            ResolveOptions {
                reuse: false,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&a, &fresh));
    assert_eq!(registry.stats().await.cached_instances, 2);
}

#[tokio::test]
async fn capacity_evicts_least_recently_used() {
    let registry = ToolRegistry::new(RegistryConfig {
        max_cached_instances: 2,
        ..Default::default()
    });
    registry
        .register(ToolType::Shell, DEFAULT_TOOL_NAME, shell_factory(), ToolMetadata::new("sh"))
        .await
        .unwrap();

    let first = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, with_options(json!(1)))
        .await
        .unwrap();
    for n in 2..=3 {
        registry
            .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, with_options(json!(n)))
            .await
            .unwrap();
    }
    let stats = registry.stats().await;
    assert_eq!(stats.cached_instances, 2);
    assert_eq!(stats.evictions, 1);
    assert!(first.is_cleaned_up());
}

#[tokio::test]
async fn idle_instances_expire() {
    let registry = ToolRegistry::new(RegistryConfig {
        instance_ttl: Duration::from_millis(10),
        ..Default::default()
    });
    registry
        .register(ToolType::Shell, DEFAULT_TOOL_NAME, shell_factory(), ToolMetadata::new("sh"))
        .await
        .unwrap();
    let instance = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(registry.evict_expired().await, 1);
    assert!(instance.is_cleaned_up());
    assert_eq!(registry.stats().await.cached_instances, 0);

    let again = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap();
    assert!(!Arc::ptr_eq(&instance, &again));
}

#[tokio::test]
async fn health_flags_memory_pressure() {
    let registry = ToolRegistry::new(RegistryConfig {
        memory_threshold_bytes: 1,
        ..Default::default()
    });
    let empty = registry.check_health().await;
    assert!(!empty.healthy);
    assert!(empty.issues[0].contains("no tools"));

    registry
        .register(ToolType::Shell, DEFAULT_TOOL_NAME, shell_factory(), ToolMetadata::new("sh"))
        .await
        .unwrap();
    registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap();
    let report = registry.check_health().await;
    assert!(!report.healthy);
    assert!(report.issues.iter().any(|i| i.contains("memory")));

    registry.reset().await;
    let stats = registry.stats().await;
    assert_eq!(stats.registrations, 0);
    assert_eq!(stats.cached_instances, 0);
}

#[tokio::test]
async fn unregister_cleans_cached_instances() {
    let registry = ToolRegistry::new(RegistryConfig::default());
    registry
        .register(ToolType::Shell, DEFAULT_TOOL_NAME, shell_factory(), ToolMetadata::new("sh"))
        .await
        .unwrap();
    let instance = registry
        .resolve(ToolType::Shell, DEFAULT_TOOL_NAME, ResolveOptions::default())
        .await
        .unwrap();
    assert!(registry.unregister(ToolType::Shell, DEFAULT_TOOL_NAME).await);
    assert!(instance.is_cleaned_up());
    assert!(!registry.unregister(ToolType::Shell, DEFAULT_TOOL_NAME).await);
}
