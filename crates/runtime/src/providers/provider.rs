//! Memoizing model resolution.

use super::cache::LruCache;
use super::{BackendFactory, ModelId};
use crate::Result;
use crate::model::ToolSpec;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

/// Default number of backends kept alive.
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Resolves model ids to backends bound to one tool registry.
///
/// Each id is constructed once and reused while it stays in the cache. The
/// cache is shared by every run holding this provider and is serialized by a
/// mutex; construction happens under the lock so concurrent first uses of an
/// id still build a single backend.
pub struct ModelProvider<F: BackendFactory> {
    factory: F,
    tools: Vec<ToolSpec>,
    cache: Mutex<LruCache<ModelId, Arc<F::Backend>>>,
}

impl<F: BackendFactory> ModelProvider<F> {
    pub fn new(factory: F, tools: Vec<ToolSpec>) -> Self {
        Self::with_capacity(factory, tools, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(factory: F, tools: Vec<ToolSpec>, capacity: usize) -> Self {
        Self {
            factory,
            tools,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Tools every backend from this provider is bound to.
    pub fn tools(&self) -> &[ToolSpec] {
        &self.tools
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of cached backends.
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    /// Get the backend for `model`, constructing it on first use.
    pub fn resolve(&self, model: ModelId) -> Result<Arc<F::Backend>> {
        let mut cache = self.lock();
        if let Some(backend) = cache.get(&model) {
            debug!(%model, "model cache hit");
            return Ok(backend);
        }

        let backend = Arc::new(self.factory.create(model, &self.tools)?);
        if let Some(evicted) = cache.insert(model, Arc::clone(&backend)) {
            debug!(%evicted, "evicted model from cache");
        }
        info!(%model, cached = cache.len(), "model backend ready");
        Ok(backend)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<ModelId, Arc<F::Backend>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedFactory;

    fn spec(name: &str) -> ToolSpec {
        ToolSpec::single_string(name, "test tool", "query", "input")
    }

    #[test]
    fn resolve_is_memoized() {
        let provider = ModelProvider::new(ScriptedFactory::new(Vec::new()), vec![spec("A")]);

        let first = provider.resolve(ModelId::OpenAi).unwrap();
        let second = provider.resolve(ModelId::OpenAi).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provider.factory().created(), 1);
        assert_eq!(provider.cached(), 1);
    }

    #[test]
    fn distinct_ids_get_distinct_backends() {
        let provider = ModelProvider::new(ScriptedFactory::new(Vec::new()), vec![spec("A")]);

        provider.resolve(ModelId::OpenAi).unwrap();
        provider.resolve(ModelId::Anthropic).unwrap();
        provider.resolve(ModelId::OpenAi).unwrap();

        assert_eq!(provider.factory().created(), 2);
        assert_eq!(provider.cached(), 2);
    }

    #[test]
    fn cache_respects_its_bound() {
        let provider =
            ModelProvider::with_capacity(ScriptedFactory::new(Vec::new()), Vec::new(), 1);

        provider.resolve(ModelId::OpenAi).unwrap();
        provider.resolve(ModelId::Anthropic).unwrap();
        assert_eq!(provider.cached(), 1);

        // OpenAi was evicted, so it is rebuilt.
        provider.resolve(ModelId::OpenAi).unwrap();
        assert_eq!(provider.factory().created(), 3);
    }

    #[test]
    fn tools_are_bound_at_construction() {
        let provider =
            ModelProvider::new(ScriptedFactory::new(Vec::new()), vec![spec("A"), spec("B")]);
        provider.resolve(ModelId::Anthropic).unwrap();
        assert_eq!(provider.factory().bound_tools(), vec!["A", "B"]);
    }

    #[test]
    fn factory_errors_are_not_cached() {
        let provider = ModelProvider::new(
            ScriptedFactory::new(Vec::new()).failing_for(ModelId::Anthropic),
            Vec::new(),
        );
        assert!(provider.resolve(ModelId::Anthropic).is_err());
        assert_eq!(provider.cached(), 0);
    }
}
