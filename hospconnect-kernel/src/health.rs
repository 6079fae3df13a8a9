use crate::store::{Collection, DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    /// Nombre de documents par collection
    pub collections: BTreeMap<String, usize>,
    pub persistent: bool,
    pub memory_usage_mb: f32,
}

#[derive(Debug, Clone)]
pub struct HealthTracker {
    start_time: Instant,
    persistent: bool,
}

impl HealthTracker {
    pub fn new(persistent: bool) -> Self {
        Self {
            start_time: Instant::now(),
            persistent,
        }
    }

    pub fn get_health(&self, store: &dyn DocumentStore) -> Result<KernelHealth, StoreError> {
        let mut collections = BTreeMap::new();
        for collection in Collection::ALL {
            collections.insert(collection.to_string(), store.count(collection)?);
        }

        Ok(KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            collections,
            persistent: self.persistent,
            memory_usage_mb: get_memory_usage_mb(),
        })
    }
}

fn get_memory_usage_mb() -> f32 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            let kb = status
                .lines()
                .find(|line| line.starts_with("VmRSS:"))
                .and_then(|line| line.split_whitespace().nth(1))
                .and_then(|kb| kb.parse::<u64>().ok());
            if let Some(kb) = kb {
                return (kb as f32) / 1024.0;
            }
        }
    }

    // inconnu hors Linux
    0.0
}
