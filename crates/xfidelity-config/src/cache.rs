use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::model::ExecutionConfig;

/// Process-wide, archetype-keyed cache. A failed `getConfig` build is
/// never inserted; two successive `getConfig` calls for the same
/// archetype return the identical `Arc` (checked with `Arc::ptr_eq` in
/// tests), not merely an equal value.
pub struct ConfigCache {
    entries: Mutex<HashMap<String, Arc<ExecutionConfig>>>,
}

impl ConfigCache {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn global() -> &'static ConfigCache {
        static CACHE: OnceLock<ConfigCache> = OnceLock::new();
        CACHE.get_or_init(ConfigCache::new)
    }

    pub fn get(&self, archetype: &str) -> Option<Arc<ExecutionConfig>> {
        self.entries.lock().expect("config cache mutex poisoned").get(archetype).cloned()
    }

    pub fn insert(&self, archetype: String, config: Arc<ExecutionConfig>) {
        self.entries
            .lock()
            .expect("config cache mutex poisoned")
            .insert(archetype, config);
    }

    pub fn clear(&self) {
        self.entries.lock().expect("config cache mutex poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CoreOptions;
    use xfidelity_exemptions::ExemptionStore;
    use xfidelity_schema::ArchetypeConfig;

    fn sample_config() -> Arc<ExecutionConfig> {
        Arc::new(ExecutionConfig {
            archetype: ArchetypeConfig::from_json(r#"{"name":"x","rules":[],"config":{}}"#).unwrap(),
            rules: vec![],
            exemptions: ExemptionStore::default(),
            options: CoreOptions::default(),
        })
    }

    #[test]
    fn stores_and_returns_same_identity() {
        let cache = ConfigCache::new();
        let config = sample_config();
        cache.insert("x".to_string(), config.clone());
        let fetched = cache.get("x").unwrap();
        assert!(Arc::ptr_eq(&config, &fetched));
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = ConfigCache::new();
        cache.insert("x".to_string(), sample_config());
        cache.clear();
        assert!(cache.get("x").is_none());
    }
}
