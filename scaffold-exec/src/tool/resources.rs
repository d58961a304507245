use std::sync::Mutex;

use tracing::{debug, warn};

type CleanupFn = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// Cleanup actions registered while a resource is live.
///
/// Actions run in reverse registration order. A failing action is logged and
/// collected; the remaining actions still run.
#[derive(Default)]
pub struct ResourceScope {
    actions: Mutex<Vec<(String, CleanupFn)>>,
}

impl ResourceScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, name: impl Into<String>, cleanup: F)
    where
        F: FnOnce() -> Result<(), String> + Send + 'static,
    {
        let mut actions = self.actions.lock().unwrap_or_else(|e| e.into_inner());
        actions.push((name.into(), Box::new(cleanup)));
    }

    /// Drop a registration without running it (the resource was handed off).
    pub fn release(&self, name: &str) -> bool {
        let mut actions = self.actions.lock().unwrap_or_else(|e| e.into_inner());
        match actions.iter().rposition(|(n, _)| n == name) {
            Some(idx) => {
                actions.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every registered action once. Returns the failures.
    pub fn cleanup(&self) -> Vec<String> {
        let actions = std::mem::take(&mut *self.actions.lock().unwrap_or_else(|e| e.into_inner()));
        let mut failures = Vec::new();
        for (name, action) in actions.into_iter().rev() {
            match action() {
                Ok(()) => debug!(resource = %name, "released resource"),
                Err(e) => {
                    warn!(resource = %name, error = %e, "resource cleanup failed");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }
        failures
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        let pending = self.actions.get_mut().map(|a| a.len()).unwrap_or(0);
        if pending > 0 {
            self.cleanup();
        }
    }
}

impl std::fmt::Debug for ResourceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceScope").field("pending", &self.len()).finish()
    }
}
