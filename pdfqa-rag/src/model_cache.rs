//! Lazily loaded, process-lifetime model instances.
//!
//! Model weights are expensive to load, so providers hold them in a
//! [`ModelCache`]: the first [`get`](ModelCache::get) runs the loader, later
//! calls share the same `Arc`, and [`reset`](ModelCache::reset) drops the
//! instance so the next call loads it again. The cache is an ordinary value
//! owned by whoever constructs the provider, so tests can inject stubs.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::error::{QaError, Result};

type Loader<T> = Box<dyn Fn() -> Result<T> + Send + Sync>;

/// A lazily constructed, shareable model instance.
pub struct ModelCache<T> {
    name: String,
    loader: Loader<T>,
    slot: Mutex<Option<Arc<T>>>,
}

impl<T: Send + Sync> ModelCache<T> {
    /// Create an empty cache that will build its value with `loader`.
    pub fn new(
        name: impl Into<String>,
        loader: impl Fn() -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), loader: Box::new(loader), slot: Mutex::new(None) }
    }

    /// The model name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the cached instance, loading it first if necessary.
    ///
    /// Concurrent callers wait for a single load.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ModelUnavailable`] if the loader fails. A failed load
    /// leaves the cache empty, so the next call tries again.
    pub async fn get(&self) -> Result<Arc<T>> {
        let mut slot = self.slot.lock().await;
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        info!(model = %self.name, "loading model");
        let model = (self.loader)().map_err(|e| {
            error!(model = %self.name, error = %e, "model failed to load");
            if matches!(e, QaError::ModelUnavailable { .. }) {
                e
            } else {
                QaError::model_unavailable(&self.name, e.to_string())
            }
        })?;
        let model = Arc::new(model);
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Whether an instance is currently cached.
    pub async fn is_loaded(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Drop the cached instance. Outstanding `Arc`s stay valid.
    pub async fn reset(&self) {
        if self.slot.lock().await.take().is_some() {
            info!(model = %self.name, "model cache reset");
        }
    }
}

impl<T> fmt::Debug for ModelCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCache").field("name", &self.name).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_cache(loads: Arc<AtomicUsize>) -> ModelCache<String> {
        ModelCache::new("stub", move || {
            let n = loads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("weights-{n}"))
        })
    }

    #[tokio::test]
    async fn loads_once_and_shares_instance() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(Arc::clone(&loads));
        assert!(!cache.is_loaded().await);

        let first = cache.get().await.unwrap();
        let second = cache.get().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded().await);
    }

    #[tokio::test]
    async fn reset_forces_reload() {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = counting_cache(Arc::clone(&loads));

        let first = cache.get().await.unwrap();
        cache.reset().await;
        assert!(!cache.is_loaded().await);
        let second = cache.get().await.unwrap();

        assert_eq!(*first, "weights-0");
        assert_eq!(*second, "weights-1");
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn load_failure_maps_to_model_unavailable_and_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let cache: ModelCache<u32> = ModelCache::new("broken", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(QaError::ConfigError("missing weights".to_string()))
        });

        let err = cache.get().await.unwrap_err();
        assert!(matches!(err, QaError::ModelUnavailable { ref model, .. } if model == "broken"));
        assert!(cache.get().await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!cache.is_loaded().await);
    }
}
