use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::resources::TableName;

use super::{Result, TableHandle, TableStore};

pub struct CacheOptions {
    max_capacity: usize,
    time_to_live: Duration,
    time_to_idle: Duration,
}

/// Caches table handles that are known to exist.
///
/// The first lookup of a table resolves its handle and creates the table if
/// needed. Failed lookups are not cached.
#[derive(Clone)]
pub struct TableCache {
    store: Arc<dyn TableStore>,
    inner: moka::future::Cache<String, Arc<dyn TableHandle>>,
}

impl TableCache {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self::with_options(store, CacheOptions::default())
    }

    pub fn with_options(store: Arc<dyn TableStore>, options: CacheOptions) -> Self {
        let inner = moka::future::Cache::builder()
            .max_capacity(options.max_capacity as u64)
            .time_to_live(options.time_to_live)
            .time_to_idle(options.time_to_idle)
            .build();

        Self { store, inner }
    }

    pub async fn get(&self, name: &TableName) -> Result<Arc<dyn TableHandle>> {
        let store = self.store.clone();
        let name = name.clone();
        let handle = self
            .inner
            .try_get_with(name.storage_key(), async move {
                debug!(table = %name, "resolving table");
                let handle = store.table(&name);
                handle.ensure_exists().await?;
                Ok(handle)
            })
            .await
            .map_err(Arc::unwrap_or_clone)?;
        Ok(handle)
    }

    pub async fn invalidate(&self, name: &TableName) {
        self.inner.invalidate(&name.storage_key()).await;
    }
}

impl CacheOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_capacity(mut self, max_capacity: usize) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = time_to_live;
        self
    }

    pub fn with_time_to_idle(mut self, time_to_idle: Duration) -> Self {
        self.time_to_idle = time_to_idle;
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_capacity: 256,
            time_to_live: Duration::from_secs(60 * 60), // 1 hour
            time_to_idle: Duration::from_secs(10 * 60), // 10 minutes
        }
    }
}
