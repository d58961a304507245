use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

/// Bounds how many steps of one step list run at once.
///
/// Each step list (top level, group, sub-recipe) gets its own limits so a
/// group holding a permit never waits on permits its children need.
#[derive(Clone)]
pub struct ConcurrencyLimits {
    global: Arc<Semaphore>,
}

impl ConcurrencyLimits {
    pub fn new(limit: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(limit.max(1))),
        }
    }

    pub fn available(&self) -> usize {
        self.global.available_permits()
    }

    pub async fn acquire(&self) -> ConcurrencyPermit {
        let permit = match self.global.clone().acquire_owned().await {
            Ok(p) => Some(p),
            Err(_) => {
                // Only reachable if the semaphore is closed, which nothing does.
                warn!("concurrency semaphore closed; running unbounded");
                None
            }
        };
        ConcurrencyPermit { _global: permit }
    }
}

pub struct ConcurrencyPermit {
    _global: Option<OwnedSemaphorePermit>,
}
